use serde::{Deserialize, Serialize};

/// A token as described by the reference catalog or resolved from the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Chain-specific token identifier
    pub address: String,
    /// Token symbol (e.g. "DAI", "GNO")
    pub symbol: String,
    /// Human-readable token name
    pub name: String,
    /// Fixes the raw-to-decimal conversion factor for balances
    pub decimals: u8,
}

/// The account a token gets attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRef {
    /// Chain/network the account lives on
    pub network: String,
    /// On-chain address of the account
    pub descriptor: String,
    /// Distinguishes accounts that collide on `descriptor` under different
    /// device or session states
    pub state_id: String,
}

/// Identity tuple of a tracked token. No two records in a collection may
/// share this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenKey {
    pub address: String,
    pub owner_address: String,
    pub owner_state_id: String,
}

/// Per-account tracked view of a token's identity and balance.
///
/// Only `balance` and `loaded` ever change after creation; every other field
/// is fixed the moment the record is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub network: String,
    pub owner_address: String,
    pub owner_state_id: String,
    /// Decimal-string amount, already scaled by `decimals`
    pub balance: String,
    /// False while the first balance fetch is still pending
    pub loaded: bool,
}

impl TokenRecord {
    /// The record's identity tuple.
    pub fn key(&self) -> TokenKey {
        TokenKey {
            address: self.address.clone(),
            owner_address: self.owner_address.clone(),
            owner_state_id: self.owner_state_id.clone(),
        }
    }

    /// Builds the record created the instant a user chooses to track a
    /// token: balance unknown, fetch pending.
    pub fn unloaded(candidate: &TokenMetadata, account: &AccountRef) -> Self {
        Self {
            address: candidate.address.clone(),
            symbol: candidate.symbol.clone(),
            name: candidate.name.clone(),
            decimals: candidate.decimals,
            network: account.network.clone(),
            owner_address: account.descriptor.clone(),
            owner_state_id: account.state_id.clone(),
            balance: "0".to_string(),
            loaded: false,
        }
    }
}

/// One entry of a bulk import, e.g. from an initial account scan that
/// already supplied balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedToken {
    pub address: String,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub decimals: u8,
    /// Raw integer amount in base units, unscaled
    pub raw_balance: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dai() -> TokenMetadata {
        TokenMetadata {
            address: "0xA".to_string(),
            symbol: "DAI".to_string(),
            name: "Dai".to_string(),
            decimals: 18,
        }
    }

    fn account() -> AccountRef {
        AccountRef {
            network: "eth".to_string(),
            descriptor: "0xOwner".to_string(),
            state_id: "state-1".to_string(),
        }
    }

    #[test]
    fn unloaded_record_starts_with_pending_balance() {
        let record = TokenRecord::unloaded(&dai(), &account());
        assert_eq!(record.balance, "0");
        assert!(!record.loaded);
        assert_eq!(record.network, "eth");
        assert_eq!(record.owner_address, "0xOwner");
        assert_eq!(record.owner_state_id, "state-1");
    }

    #[test]
    fn key_carries_the_full_identity_tuple() {
        let record = TokenRecord::unloaded(&dai(), &account());
        let key = record.key();
        assert_eq!(key.address, "0xA");
        assert_eq!(key.owner_address, "0xOwner");
        assert_eq!(key.owner_state_id, "state-1");
    }

    #[test]
    fn record_round_trips_through_serde() {
        let record = TokenRecord::unloaded(&dai(), &account());
        let json = serde_json::to_string(&record).unwrap();
        let back: TokenRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
