//! Outcome and expectation verification
//!
//! Checks run in a fixed order so failure messages point at the most
//! specific divergence: collection state first, then error presence, then
//! the operation result, and finally the recorded command-started events.

use crate::loader::{Expectation, Outcome};
use crate::matcher::{check_match, values_equivalent};
use serde_json::{json, Value};
use specdrive_client::CommandStartedEvent;
use specdrive_core::{ClientError, Document, Error, Result};

/// Verify one operation's captured result against the declared outcome
///
/// `actual_collection` is the post-operation contents of the outcome's
/// target collection, fetched by the caller only when the outcome declares
/// a collection check.
///
/// Aggregations that end in `$out` report their outcome through the
/// collection contents, so when a collection check is declared for an
/// `aggregate` operation the result value itself is not compared.
///
/// # Errors
///
/// Returns [`Error::Assertion`] describing the first divergence.
pub fn verify_operation(
    operation_name: &str,
    outcome: &Outcome,
    result: &std::result::Result<Value, ClientError>,
    actual_collection: Option<&[Document]>,
) -> Result<()> {
    let mut skip_result_check = false;
    if let Some(collection) = &outcome.collection {
        if let Some(expected) = &collection.data {
            let actual = actual_collection.ok_or_else(|| {
                Error::Assertion("collection outcome declared but no contents captured".into())
            })?;
            verify_collection_contents(expected, actual)?;
        }
        if operation_name == "aggregate" {
            skip_result_check = true;
        }
    }

    match result {
        Err(error) if !outcome.error => {
            return Err(Error::Assertion(format!(
                "operation {operation_name} raised an unexpected error: {error}"
            )));
        }
        Ok(_) if outcome.error => {
            return Err(Error::Assertion(format!(
                "operation {operation_name} was expected to raise an error but succeeded"
            )));
        }
        _ => {}
    }

    if skip_result_check {
        return Ok(());
    }
    if let (Some(expected), Ok(actual)) = (&outcome.result, result) {
        let wrapped_actual = json!({ "result": actual });
        let wrapped_expected = json!({ "result": expected });
        check_match(Some(&wrapped_actual), &wrapped_expected)
            .map_err(|message| Error::Assertion(format!("result mismatch at {message}")))?;
    }
    Ok(())
}

fn verify_collection_contents(expected: &[Document], actual: &[Document]) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(Error::Assertion(format!(
            "collection contains {} documents, expected {}",
            actual.len(),
            expected.len()
        )));
    }
    for (index, (expected_doc, actual_doc)) in expected.iter().zip(actual).enumerate() {
        // representation-insensitive: a driver may hand back 2.0 for 2
        if !values_equivalent(&expected_doc.to_value(), &actual_doc.to_value()) {
            return Err(Error::Assertion(format!(
                "collection document {index} is {}, expected {}",
                actual_doc.to_json_string(),
                expected_doc.to_json_string()
            )));
        }
    }
    Ok(())
}

/// Verify recorded command-started events against the declared list
///
/// The comparison is ordered and the counts must agree exactly; declared
/// fields absent from an expectation are not compared.
///
/// # Errors
///
/// Returns [`Error::Assertion`] describing the first divergence.
pub fn verify_expectations(
    expected: &[Expectation],
    actual: &[CommandStartedEvent],
) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(Error::Assertion(format!(
            "recorded {} command-started events, expected {}",
            actual.len(),
            expected.len()
        )));
    }
    for (index, (expectation, event)) in expected.iter().zip(actual).enumerate() {
        let declared = &expectation.command_started_event;
        if let Some(name) = &declared.command_name {
            if name != &event.command_name {
                return Err(Error::Assertion(format!(
                    "event {index}: command name is {}, expected {name}",
                    event.command_name
                )));
            }
        }
        if let Some(database) = &declared.database_name {
            if database != &event.database_name {
                return Err(Error::Assertion(format!(
                    "event {index}: database is {}, expected {database}",
                    event.database_name
                )));
            }
        }
        if let Some(command) = &declared.command {
            check_match(Some(&event.command.to_value()), &command.to_value()).map_err(
                |message| Error::Assertion(format!("event {index}: command mismatch at {message}")),
            )?;
        }
    }
    Ok(())
}
