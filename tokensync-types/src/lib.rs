pub mod amount;
pub mod events;
pub mod model;

pub use amount::to_decimal_amount;
pub use events::TokenEvent;
pub use model::{AccountRef, ImportedToken, TokenKey, TokenMetadata, TokenRecord};
