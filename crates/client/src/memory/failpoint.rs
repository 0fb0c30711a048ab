//! Fail-point state for the in-memory client
//!
//! Models the server's `failCommand` debugging switch: once configured,
//! commands named in `data.failCommands` fail with the configured error
//! until the armed count is exhausted or the fail point is disabled.

use specdrive_core::{ClientError, Document};

/// How long a fail point stays armed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailMode {
    /// Trip the next `n` matching commands
    Times(u32),
    /// Trip every matching command until disabled
    AlwaysOn,
}

/// A configured fail point
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FailPoint {
    mode: FailMode,
    commands: Vec<String>,
    error_code: i64,
    error_message: String,
}

/// Result of parsing a `configureFailPoint` admin command
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConfigureAction {
    /// Install (or replace) the named fail point
    Install {
        /// Fail-point name
        name: String,
        /// Parsed state
        fail_point: FailPoint,
    },
    /// Remove the named fail point
    Disable {
        /// Fail-point name
        name: String,
    },
}

impl FailPoint {
    /// Parse a `configureFailPoint` command document
    ///
    /// Accepted shape:
    /// `{"configureFailPoint": <name>, "mode": {"times": n} | "alwaysOn" | "off",
    ///   "data": {"failCommands": [...], "errorCode": n, "errmsg": s}}`
    pub(crate) fn parse(command: &Document) -> Result<ConfigureAction, ClientError> {
        let name = command
            .get_str("configureFailPoint")
            .map_err(|e| ClientError::InvalidArgument(e.to_string()))?
            .to_string();

        let mode = match command.get("mode") {
            Some(serde_json::Value::String(s)) if s == "off" => {
                return Ok(ConfigureAction::Disable { name });
            }
            Some(serde_json::Value::String(s)) if s == "alwaysOn" => FailMode::AlwaysOn,
            Some(serde_json::Value::Object(map)) => {
                let times = map.get("times").and_then(|v| v.as_u64()).ok_or_else(|| {
                    ClientError::InvalidArgument("mode document requires 'times'".to_string())
                })?;
                FailMode::Times(times as u32)
            }
            _ => {
                return Err(ClientError::InvalidArgument(
                    "configureFailPoint requires a 'mode'".to_string(),
                ));
            }
        };

        let data = command
            .get_document_opt("data")
            .map_err(|e| ClientError::InvalidArgument(e.to_string()))?
            .unwrap_or_default();
        let commands = match data.get("failCommands") {
            None => Vec::new(),
            Some(serde_json::Value::Array(values)) => values
                .iter()
                .map(|v| {
                    v.as_str().map(str::to_string).ok_or_else(|| {
                        ClientError::InvalidArgument("failCommands must be strings".to_string())
                    })
                })
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(ClientError::InvalidArgument(
                    "failCommands must be an array".to_string(),
                ));
            }
        };
        let error_code = data
            .get_i64_opt("errorCode")
            .map_err(|e| ClientError::InvalidArgument(e.to_string()))?
            .unwrap_or(1);
        let error_message = match data.get("errmsg") {
            Some(serde_json::Value::String(s)) => s.clone(),
            _ => format!("fail point '{name}' triggered"),
        };

        Ok(ConfigureAction::Install {
            name,
            fail_point: FailPoint {
                mode,
                commands,
                error_code,
                error_message,
            },
        })
    }

    /// Trip the fail point for a command, if it applies
    ///
    /// Decrements the armed count on a `times` mode fail point.
    pub(crate) fn trip(&mut self, command_name: &str) -> Option<ClientError> {
        if !self.commands.iter().any(|c| c == command_name) {
            return None;
        }
        match self.mode {
            FailMode::AlwaysOn => {}
            FailMode::Times(0) => return None,
            FailMode::Times(n) => self.mode = FailMode::Times(n - 1),
        }
        Some(ClientError::operation_with_code(
            self.error_code,
            self.error_message.clone(),
        ))
    }

    /// Whether the fail point can never trip again
    pub(crate) fn exhausted(&self) -> bool {
        self.mode == FailMode::Times(0)
    }
}
