use serde::{Deserialize, Serialize};

use crate::model::{TokenKey, TokenRecord};

/// Mutation intent applied to the canonical token collection.
///
/// Events describe what should change; folding them into the collection is
/// the projection's job and happens in one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenEvent {
    /// Replace the whole collection with a persisted snapshot.
    FromStorage(Vec<TokenRecord>),
    /// Upsert one record by its identity tuple.
    Add(TokenRecord),
    /// Replace the collection with the fully-updated sequence computed by
    /// the emitter.
    SetBalance(Vec<TokenRecord>),
    /// Drop the record matching the key, if present.
    Remove(TokenKey),
}
