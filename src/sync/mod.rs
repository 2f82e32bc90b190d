use futures::future;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokensync_types::{AccountRef, ImportedToken, TokenEvent, TokenMetadata, TokenRecord};
use tracing::{debug, info, warn};

use crate::catalog::{StaticCatalog, TokenCatalog};
use crate::config::Settings;
use crate::error::{log_error, Result};
use crate::gateway::{BlockchainGateway, RpcGateway};
use crate::store::TokenStore;

/// Orchestrates the token ledger: two-phase search, attaching and removing
/// tokens, and keeping balances synchronized with the chain.
///
/// The synchronizer never touches the collection directly; it emits mutation
/// events that the store folds. Balance fetches run as detached tasks and a
/// fetch that fails simply never produces its event, leaving the record
/// pending until an explicit refresh.
#[derive(Clone)]
pub struct TokenSynchronizer {
    catalog: Arc<dyn TokenCatalog>,
    gateway: Arc<dyn BlockchainGateway>,
    store: TokenStore,
    strict_balance_match: bool,
}

impl TokenSynchronizer {
    pub fn new(
        catalog: Arc<dyn TokenCatalog>,
        gateway: Arc<dyn BlockchainGateway>,
        store: TokenStore,
    ) -> Self {
        Self {
            catalog,
            gateway,
            store,
            strict_balance_match: false,
        }
    }

    /// Builds a synchronizer wired to the JSON-RPC gateway and the catalog
    /// file named in the settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let gateway = RpcGateway::new(Duration::from_millis(settings.gateway_timeout_ms))?
            .with_endpoint(settings.network.clone(), settings.rpc_url.clone());
        let catalog = match &settings.catalog_path {
            Some(path) => StaticCatalog::from_file(path)?,
            None => StaticCatalog::new(),
        };

        Ok(
            Self::new(Arc::new(catalog), Arc::new(gateway), TokenStore::new())
                .with_strict_balance_match(settings.strict_balance_match),
        )
    }

    /// When set, a balance update that matches more than one tracked record
    /// is dropped instead of updating the first match.
    pub fn with_strict_balance_match(mut self, strict: bool) -> Self {
        self.strict_balance_match = strict;
        self
    }

    /// The state container holding the projected collection.
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Two-phase token search: the local catalog first, one remote lookup
    /// only when the catalog has nothing.
    ///
    /// An empty query is treated as the literal prefix `0x`, so it matches
    /// anything address-like. `None` means no match anywhere, which is
    /// distinct from a local hit list.
    pub async fn search(&self, query: &str, network: &str) -> Option<Vec<TokenMetadata>> {
        let normalized = if query.is_empty() {
            "0x".to_string()
        } else {
            query.to_lowercase()
        };

        let known = self.catalog.list_known(network).await;
        let matches: Vec<TokenMetadata> = known
            .into_iter()
            .filter(|t| {
                t.symbol.to_lowercase().contains(&normalized)
                    || t.address.to_lowercase().contains(&normalized)
                    || t.name.to_lowercase().contains(&normalized)
            })
            .collect();

        if !matches.is_empty() {
            counter!("tokensync_catalog_hits", 1);
            debug!(
                query = %normalized,
                network = %network,
                matches = matches.len(),
                "Search served from local catalog"
            );
            return Some(matches);
        }

        counter!("tokensync_gateway_lookups", 1);
        match self.gateway.resolve_token(&normalized, network).await {
            Ok(Some(resolved)) => {
                info!(
                    address = %resolved.address,
                    symbol = %resolved.symbol,
                    network = %network,
                    "Resolved token remotely"
                );
                Some(vec![resolved])
            }
            Ok(None) => {
                debug!(query = %normalized, network = %network, "No token found for query");
                None
            }
            Err(e) => {
                log_error(&e, "token search remote fallback");
                None
            }
        }
    }

    /// Attaches a token to an account. The record appears in the collection
    /// immediately with its balance pending; the balance resolves through a
    /// detached fetch task.
    pub fn add(&self, candidate: &TokenMetadata, account: &AccountRef) {
        let record = TokenRecord::unloaded(candidate, account);
        info!(
            address = %record.address,
            owner = %record.owner_address,
            network = %record.network,
            "Tracking token"
        );
        self.store.apply(TokenEvent::Add(record.clone()));

        let this = self.clone();
        tokio::spawn(async move {
            counter!("tokensync_balance_fetches", 1);
            match this.gateway.fetch_balance(&record).await {
                Ok(balance) => {
                    this.set_balance(&record.address, &record.owner_address, &balance);
                }
                Err(e) => {
                    counter!("tokensync_balance_fetch_failures", 1);
                    log_error(&e, "initial balance fetch");
                }
            }
        });
    }

    /// Bulk-creates already-loaded records, e.g. from an initial account
    /// scan whose source supplied balances. Raw amounts are scaled by each
    /// token's decimals; absent fields get their zero values.
    pub fn bulk_import(&self, account: &AccountRef, tokens: Vec<ImportedToken>) {
        info!(
            owner = %account.descriptor,
            network = %account.network,
            tokens = tokens.len(),
            "Importing resolved tokens"
        );
        for token in tokens {
            let balance = tokensync_types::to_decimal_amount(
                token.raw_balance.as_deref().unwrap_or("0"),
                token.decimals,
            );
            let record = TokenRecord {
                address: token.address,
                symbol: token.symbol.unwrap_or_default(),
                name: token.name.unwrap_or_default(),
                decimals: token.decimals,
                network: account.network.clone(),
                owner_address: account.descriptor.clone(),
                owner_state_id: account.state_id.clone(),
                balance,
                loaded: true,
            };
            self.store.apply(TokenEvent::Add(record));
        }
    }

    /// Routes a fetched balance onto the matching record and marks it
    /// loaded.
    ///
    /// Matching is deliberately relaxed to (token address, owner address),
    /// ignoring network and owner state. With several state-ids tracking the
    /// same pair this can match more than one record; the first match wins
    /// and the ambiguity is logged, unless strict matching drops the update
    /// instead. No match is a silent no-op, which is how a stale fetch for
    /// an already-removed token dies.
    pub fn set_balance(&self, token_address: &str, owner_address: &str, balance: &str) {
        let strict = self.strict_balance_match;
        let token_address = token_address.to_string();
        let owner_address = owner_address.to_string();
        let balance = balance.to_string();

        self.store.apply_with(move |current| {
            let matches: Vec<usize> = current
                .iter()
                .enumerate()
                .filter(|(_, t)| t.address == token_address && t.owner_address == owner_address)
                .map(|(index, _)| index)
                .collect();

            let index = match matches.as_slice() {
                [] => {
                    debug!(
                        address = %token_address,
                        owner = %owner_address,
                        "No tracked record for balance update"
                    );
                    return None;
                }
                [index] => *index,
                [first, ..] => {
                    warn!(
                        address = %token_address,
                        owner = %owner_address,
                        candidates = matches.len(),
                        "Balance update matches more than one record"
                    );
                    if strict {
                        return None;
                    }
                    *first
                }
            };

            let mut next = current.to_vec();
            next[index].balance = balance;
            next[index].loaded = true;
            Some(TokenEvent::SetBalance(next))
        });
    }

    /// Stops tracking one record, identified by its full identity tuple.
    /// Removing a record that is not tracked is a no-op.
    pub fn remove(&self, record: &TokenRecord) {
        debug!(
            address = %record.address,
            owner = %record.owner_address,
            "Removing tracked token"
        );
        self.store.apply(TokenEvent::Remove(record.key()));
    }

    /// Replaces the collection with a persisted snapshot (startup
    /// rehydration).
    pub fn rehydrate(&self, snapshot: Vec<TokenRecord>) {
        self.store.apply(TokenEvent::FromStorage(snapshot));
    }

    /// Re-fetches the balance for one tracked record. This is the explicit
    /// recovery path for a fetch that never resolved; there are no hidden
    /// retries.
    pub async fn refresh(&self, record: &TokenRecord) {
        counter!("tokensync_balance_fetches", 1);
        match self.gateway.fetch_balance(record).await {
            Ok(balance) => {
                self.set_balance(&record.address, &record.owner_address, &balance);
            }
            Err(e) => {
                counter!("tokensync_balance_fetch_failures", 1);
                log_error(&e, "balance refresh");
            }
        }
    }

    /// Re-fetches every record still waiting on its first balance.
    pub async fn refresh_pending(&self) {
        let pending: Vec<TokenRecord> = self
            .store
            .snapshot()
            .into_iter()
            .filter(|t| !t.loaded)
            .collect();
        if pending.is_empty() {
            return;
        }

        info!(records = pending.len(), "Refreshing pending balances");
        future::join_all(pending.iter().map(|record| self.refresh(record))).await;
    }
}
