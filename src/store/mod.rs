use parking_lot::RwLock;
use std::sync::Arc;
use tokensync_types::{TokenEvent, TokenRecord};
use tokio::sync::watch;
use tracing::debug;

/// Applies one mutation event to a collection, producing the next value.
/// Pure; never mutates its input.
///
/// Add is a keyed upsert by the identity tuple: a record whose key already
/// exists replaces the old one in place, so duplicates are structurally
/// impossible. SetBalance is a straight replace with the collection the
/// emitter computed.
pub fn fold(current: &[TokenRecord], event: &TokenEvent) -> Vec<TokenRecord> {
    match event {
        TokenEvent::FromStorage(snapshot) => snapshot.clone(),
        TokenEvent::Add(record) => {
            let mut next = current.to_vec();
            match next.iter().position(|t| t.key() == record.key()) {
                Some(index) => next[index] = record.clone(),
                None => next.push(record.clone()),
            }
            next
        }
        TokenEvent::SetBalance(collection) => collection.clone(),
        TokenEvent::Remove(key) => current.iter().filter(|t| &t.key() != key).cloned().collect(),
    }
}

/// Single-writer container for the canonical token collection.
///
/// Every mutation funnels through `apply`/`apply_with`, whose write lock
/// serializes events without any further coordination. Readers clone
/// snapshots or follow the watch feed; neither blocks the writer for long.
#[derive(Clone)]
pub struct TokenStore {
    inner: Arc<RwLock<Vec<TokenRecord>>>,
    notify: Arc<watch::Sender<Vec<TokenRecord>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        let (notify, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(RwLock::new(Vec::new())),
            notify: Arc::new(notify),
        }
    }

    /// Folds one event into the collection.
    pub fn apply(&self, event: TokenEvent) {
        let mut guard = self.inner.write();
        let next = fold(&guard, &event);
        debug!(
            event = event_kind(&event),
            records = next.len(),
            "Applied token event"
        );
        *guard = next;
        let _ = self.notify.send(guard.clone());
    }

    /// Lets an emitter compute its event against the current collection and
    /// fold it inside the same critical section, so the read and the apply
    /// cannot interleave with another writer. Returning `None` applies
    /// nothing.
    pub fn apply_with<F>(&self, emit: F)
    where
        F: FnOnce(&[TokenRecord]) -> Option<TokenEvent>,
    {
        let mut guard = self.inner.write();
        if let Some(event) = emit(&guard) {
            let next = fold(&guard, &event);
            debug!(
                event = event_kind(&event),
                records = next.len(),
                "Applied token event"
            );
            *guard = next;
            let _ = self.notify.send(guard.clone());
        }
    }

    /// Clones the current collection.
    pub fn snapshot(&self) -> Vec<TokenRecord> {
        self.inner.read().clone()
    }

    /// Subscribes to collection changes; the receiver observes the snapshot
    /// resulting from every applied event.
    pub fn subscribe(&self) -> watch::Receiver<Vec<TokenRecord>> {
        self.notify.subscribe()
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

fn event_kind(event: &TokenEvent) -> &'static str {
    match event {
        TokenEvent::FromStorage(_) => "from_storage",
        TokenEvent::Add(_) => "add",
        TokenEvent::SetBalance(_) => "set_balance",
        TokenEvent::Remove(_) => "remove",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokensync_types::TokenKey;

    fn record(address: &str, owner: &str, state: &str) -> TokenRecord {
        TokenRecord {
            address: address.to_string(),
            symbol: "TKN".to_string(),
            name: "Token".to_string(),
            decimals: 18,
            network: "eth".to_string(),
            owner_address: owner.to_string(),
            owner_state_id: state.to_string(),
            balance: "0".to_string(),
            loaded: false,
        }
    }

    #[test]
    fn add_appends_new_keys() {
        let first = record("0xA", "0xO", "s1");
        let second = record("0xB", "0xO", "s1");

        let one = fold(&[], &TokenEvent::Add(first.clone()));
        let two = fold(&one, &TokenEvent::Add(second.clone()));
        assert_eq!(two, vec![first, second]);
    }

    #[test]
    fn add_upserts_in_place_on_key_collision() {
        let first = record("0xA", "0xO", "s1");
        let second = record("0xB", "0xO", "s1");
        let mut replacement = record("0xA", "0xO", "s1");
        replacement.balance = "5".to_string();
        replacement.loaded = true;

        let current = vec![first, second.clone()];
        let next = fold(&current, &TokenEvent::Add(replacement.clone()));

        assert_eq!(next.len(), 2);
        assert_eq!(next[0], replacement);
        assert_eq!(next[1], second);
    }

    #[test]
    fn records_differing_only_in_state_id_coexist() {
        let first = record("0xA", "0xO", "s1");
        let second = record("0xA", "0xO", "s2");

        let one = fold(&[], &TokenEvent::Add(first));
        let two = fold(&one, &TokenEvent::Add(second));
        assert_eq!(two.len(), 2);
    }

    #[test]
    fn from_storage_replaces_wholesale() {
        let current = vec![record("0xA", "0xO", "s1")];
        let snapshot = vec![record("0xB", "0xO", "s1"), record("0xC", "0xO", "s1")];

        let next = fold(&current, &TokenEvent::FromStorage(snapshot.clone()));
        assert_eq!(next, snapshot);
    }

    #[test]
    fn set_balance_is_a_straight_replace() {
        let current = vec![record("0xA", "0xO", "s1")];
        let mut updated = current.clone();
        updated[0].balance = "42".to_string();
        updated[0].loaded = true;

        let next = fold(&current, &TokenEvent::SetBalance(updated.clone()));
        assert_eq!(next, updated);
    }

    #[test]
    fn remove_drops_exactly_the_matching_key() {
        let keep = record("0xA", "0xO", "s1");
        let drop = record("0xA", "0xO", "s2");
        let current = vec![keep.clone(), drop.clone()];

        let next = fold(&current, &TokenEvent::Remove(drop.key()));
        assert_eq!(next, vec![keep]);
    }

    #[test]
    fn remove_of_absent_key_is_a_noop() {
        let current = vec![record("0xA", "0xO", "s1")];
        let key = TokenKey {
            address: "0xZ".to_string(),
            owner_address: "0xO".to_string(),
            owner_state_id: "s1".to_string(),
        };

        let next = fold(&current, &TokenEvent::Remove(key));
        assert_eq!(next, current);
    }

    #[test]
    fn fold_never_mutates_its_input() {
        let current = vec![record("0xA", "0xO", "s1")];
        let before = current.clone();
        let _ = fold(&current, &TokenEvent::Add(record("0xB", "0xO", "s1")));
        assert_eq!(current, before);
    }

    #[tokio::test]
    async fn store_applies_and_notifies() {
        let store = TokenStore::new();
        let mut rx = store.subscribe();

        store.apply(TokenEvent::Add(record("0xA", "0xO", "s1")));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn apply_with_runs_against_current_state() {
        let store = TokenStore::new();
        store.apply(TokenEvent::Add(record("0xA", "0xO", "s1")));

        store.apply_with(|current| {
            assert_eq!(current.len(), 1);
            let mut next = current.to_vec();
            next[0].balance = "9".to_string();
            next[0].loaded = true;
            Some(TokenEvent::SetBalance(next))
        });

        let snapshot = store.snapshot();
        assert_eq!(snapshot[0].balance, "9");
        assert!(snapshot[0].loaded);
    }

    #[tokio::test]
    async fn apply_with_none_changes_nothing() {
        let store = TokenStore::new();
        store.apply(TokenEvent::Add(record("0xA", "0xO", "s1")));
        let before = store.snapshot();

        store.apply_with(|_| None);
        assert_eq!(store.snapshot(), before);
    }
}
