// Public modules that are part of the API
pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod monitoring;
pub mod store;
pub mod sync;

// Re-export common types
pub use catalog::{StaticCatalog, TokenCatalog};
pub use crate::config::Settings;
pub use gateway::{BlockchainGateway, RpcGateway};
pub use store::{fold, TokenStore};
pub use sync::TokenSynchronizer;

pub use tokensync_types::{
    to_decimal_amount, AccountRef, ImportedToken, TokenEvent, TokenKey, TokenMetadata, TokenRecord,
};

pub use error::{Result, SyncError};
