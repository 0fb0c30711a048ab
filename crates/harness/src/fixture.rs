//! Collection fixture setup
//!
//! Each case starts from a known collection state: existing documents are
//! removed with a `deleteMany({})` rather than a drop, so the collection
//! handle stays valid and the delete itself exercises the client, then the
//! declared seed documents are inserted in order.

use specdrive_client::Collection;
use specdrive_core::{Document, Result};
use tracing::debug;

/// Reset a collection to exactly the given document set
///
/// # Errors
///
/// Returns an error when the clearing delete or the seeding insert is
/// rejected by the client.
pub fn initialize_collection(collection: &dyn Collection, data: &[Document]) -> Result<()> {
    collection.delete_many(Document::new())?;
    if !data.is_empty() {
        collection.insert_many(data.to_vec())?;
    }
    debug!(
        collection = collection.name(),
        documents = data.len(),
        "collection initialized"
    );
    Ok(())
}
