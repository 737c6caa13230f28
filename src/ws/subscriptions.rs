//! Watched-address tracking for the push channel.

use super::MessageOut;
use crate::shared::PubkeyStr;
use crate::store::SyncState;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
struct WatchEntry {
    /// Id of the subscribe request issued for this entry.
    request: Option<u64>,
    /// Server-assigned id, known once the subscribe call is confirmed.
    subscription: Option<u64>,
    slot: u64,
    last_payload: Option<Vec<u8>>,
}

/// Addresses currently watched and the last payload seen for each.
///
/// Pure bookkeeping: every method returns the messages to send and never
/// touches the network, so the transport can replay them after a reconnect.
#[derive(Debug, Clone)]
pub struct WatchSet {
    commitment: String,
    next_id: u64,
    watched: BTreeMap<PubkeyStr, WatchEntry>,
    /// Request id of an unconfirmed subscribe → address.
    pending: HashMap<u64, PubkeyStr>,
    /// Confirmed subscription id → address.
    by_subscription: HashMap<u64, PubkeyStr>,
}

impl WatchSet {
    pub fn new(commitment: &str) -> Self {
        Self {
            commitment: commitment.to_string(),
            next_id: 1,
            watched: BTreeMap::new(),
            pending: HashMap::new(),
            by_subscription: HashMap::new(),
        }
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn subscribe_msg(&mut self, address: &PubkeyStr) -> MessageOut {
        let id = self.take_id();
        self.pending.insert(id, address.clone());
        if let Some(entry) = self.watched.get_mut(address) {
            entry.request = Some(id);
        }
        MessageOut::account_subscribe(id, address, &self.commitment)
    }

    /// Start watching `address`. `None` if it is already watched.
    pub fn watch(&mut self, address: &PubkeyStr) -> Option<MessageOut> {
        if self.watched.contains_key(address) {
            return None;
        }
        self.watched.insert(address.clone(), WatchEntry::default());
        Some(self.subscribe_msg(address))
    }

    /// Stop watching `address` and drop its payload.
    ///
    /// An unconfirmed subscription is cancelled when its confirmation arrives.
    pub fn unwatch(&mut self, address: &PubkeyStr) -> Option<MessageOut> {
        let entry = self.watched.remove(address)?;
        let subscription = entry.subscription?;
        self.by_subscription.remove(&subscription);
        let id = self.take_id();
        Some(MessageOut::account_unsubscribe(id, subscription))
    }

    /// Make the watched set equal `relevant`.
    pub fn reconcile(&mut self, relevant: &BTreeSet<PubkeyStr>) -> Vec<MessageOut> {
        let stale: Vec<PubkeyStr> = self
            .watched
            .keys()
            .filter(|a| !relevant.contains(*a))
            .cloned()
            .collect();

        let mut out: Vec<MessageOut> = stale.iter().filter_map(|a| self.unwatch(a)).collect();
        out.extend(relevant.iter().filter_map(|a| self.watch(a)));
        out
    }

    /// Record a response to request `id`.
    ///
    /// Returns an unsubscribe when the request no longer backs a watched
    /// entry: the address was unwatched, and possibly watched again under a
    /// newer request, while this one was in flight.
    pub fn on_response(&mut self, id: u64, result: &serde_json::Value) -> Option<MessageOut> {
        let address = self.pending.remove(&id)?;
        let subscription = result.as_u64()?;

        match self.watched.get_mut(&address) {
            Some(entry) if entry.request == Some(id) => {
                entry.subscription = Some(subscription);
                self.by_subscription.insert(subscription, address);
                None
            }
            _ => {
                let id = self.take_id();
                Some(MessageOut::account_unsubscribe(id, subscription))
            }
        }
    }

    /// Record a subscribe failure for request `id`; the address stays watched
    /// and is retried on the next [`WatchSet::resubscribe_all`].
    pub fn on_error(&mut self, id: u64) -> Option<PubkeyStr> {
        self.pending.remove(&id)
    }

    /// Store a payload for `subscription`. Returns the address when the
    /// payload is newer than what was held.
    pub fn on_notification(
        &mut self,
        subscription: u64,
        slot: u64,
        payload: Vec<u8>,
    ) -> Option<PubkeyStr> {
        let address = self.by_subscription.get(&subscription)?;
        let entry = self.watched.get_mut(address)?;
        if entry.last_payload.is_some() && slot < entry.slot {
            return None;
        }
        entry.slot = slot;
        entry.last_payload = Some(payload);
        Some(address.clone())
    }

    /// Forget server-side ids and issue a fresh subscribe per watched address.
    /// Call after a reconnect.
    pub fn resubscribe_all(&mut self) -> Vec<MessageOut> {
        self.pending.clear();
        self.by_subscription.clear();
        let addresses: Vec<PubkeyStr> = self.watched.keys().cloned().collect();
        addresses
            .iter()
            .map(|a| {
                if let Some(entry) = self.watched.get_mut(a) {
                    entry.subscription = None;
                }
                self.subscribe_msg(a)
            })
            .collect()
    }

    pub fn last_payload(&self, address: &PubkeyStr) -> Option<&[u8]> {
        self.watched.get(address)?.last_payload.as_deref()
    }

    pub fn is_watched(&self, address: &PubkeyStr) -> bool {
        self.watched.contains_key(address)
    }

    pub fn addresses(&self) -> impl Iterator<Item = &PubkeyStr> {
        self.watched.keys()
    }

    pub fn len(&self) -> usize {
        self.watched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }
}

/// Addresses worth watching for a snapshot: the current account and the
/// selected market's bid and ask accounts.
pub fn relevant_addresses(state: &SyncState) -> BTreeSet<PubkeyStr> {
    let mut out = BTreeSet::new();
    if let Some(address) = state.accounts.current_address() {
        out.insert(address.clone());
    }
    out.insert(state.market.config.bids_key.clone());
    out.insert(state.market.config.asks_key.clone());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn addr(s: &str) -> PubkeyStr {
        PubkeyStr::new(s)
    }

    fn set(items: &[&str]) -> BTreeSet<PubkeyStr> {
        items.iter().map(|s| addr(s)).collect()
    }

    #[test]
    fn test_watch_is_idempotent() {
        let mut ws = WatchSet::new("processed");
        let msg = ws.watch(&addr("a")).unwrap();
        assert_eq!(msg.method, "accountSubscribe");
        assert!(ws.watch(&addr("a")).is_none());
        assert_eq!(ws.len(), 1);
    }

    #[test]
    fn test_reconcile_adds_and_removes() {
        let mut ws = WatchSet::new("processed");
        let out = ws.reconcile(&set(&["a", "b"]));
        assert_eq!(out.len(), 2);
        ws.on_response(out[0].id, &json!(100));
        ws.on_response(out[1].id, &json!(101));

        let out = ws.reconcile(&set(&["b", "c"]));
        let methods: Vec<_> = out.iter().map(|m| m.method).collect();
        assert_eq!(methods, ["accountUnsubscribe", "accountSubscribe"]);
        assert_eq!(out[0].params, json!([100]));
        assert!(!ws.is_watched(&addr("a")));
        assert!(ws.is_watched(&addr("c")));
    }

    #[test]
    fn test_notification_stores_latest_payload() {
        let mut ws = WatchSet::new("processed");
        let sub = ws.watch(&addr("a")).unwrap();
        ws.on_response(sub.id, &json!(7));

        assert_eq!(ws.on_notification(7, 10, vec![1]), Some(addr("a")));
        assert_eq!(ws.last_payload(&addr("a")), Some(&[1u8][..]));
        // Older slot is ignored.
        assert_eq!(ws.on_notification(7, 9, vec![2]), None);
        assert_eq!(ws.last_payload(&addr("a")), Some(&[1u8][..]));
        // Unknown subscription.
        assert_eq!(ws.on_notification(8, 11, vec![3]), None);
    }

    #[test]
    fn test_unwatch_drops_payload() {
        let mut ws = WatchSet::new("processed");
        let sub = ws.watch(&addr("a")).unwrap();
        ws.on_response(sub.id, &json!(7));
        ws.on_notification(7, 1, vec![1]);
        assert!(ws.unwatch(&addr("a")).is_some());
        assert!(ws.last_payload(&addr("a")).is_none());
        assert!(ws.on_notification(7, 2, vec![2]).is_none());
    }

    #[test]
    fn test_unwatch_before_confirmation_cancels_later() {
        let mut ws = WatchSet::new("processed");
        let sub = ws.watch(&addr("a")).unwrap();
        assert!(ws.unwatch(&addr("a")).is_none());
        let cancel = ws.on_response(sub.id, &json!(55)).unwrap();
        assert_eq!(cancel.method, "accountUnsubscribe");
        assert_eq!(cancel.params, json!([55]));
    }

    #[test]
    fn test_rewatch_before_confirmation_cancels_the_first_subscription() {
        let mut ws = WatchSet::new("processed");
        let first = ws.watch(&addr("a")).unwrap();
        assert!(ws.unwatch(&addr("a")).is_none());
        let second = ws.watch(&addr("a")).unwrap();

        let cancel = ws.on_response(first.id, &json!(100)).unwrap();
        assert_eq!(cancel.method, "accountUnsubscribe");
        assert_eq!(cancel.params, json!([100]));
        assert!(ws.on_response(second.id, &json!(200)).is_none());

        assert!(ws.on_notification(100, 1, vec![1]).is_none());
        assert_eq!(ws.on_notification(200, 1, vec![2]), Some(addr("a")));
        let gone = ws.unwatch(&addr("a")).unwrap();
        assert_eq!(gone.params, json!([200]));
    }

    #[test]
    fn test_resubscribe_all_reissues_every_address() {
        let mut ws = WatchSet::new("processed");
        for m in ws.reconcile(&set(&["a", "b"])) {
            ws.on_response(m.id, &json!(m.id + 100));
        }
        let again = ws.resubscribe_all();
        assert_eq!(again.len(), 2);
        assert!(again.iter().all(|m| m.method == "accountSubscribe"));
        // Old subscription ids are forgotten.
        assert!(ws.on_notification(101, 1, vec![]).is_none());
    }

    #[test]
    fn test_relevant_addresses_tracks_selection() {
        use crate::domain::account::fixtures::account;
        use crate::domain::group::fixtures::group_config;

        let mut state = SyncState::new(group_config()).unwrap();
        let relevant = relevant_addresses(&state);
        assert_eq!(relevant.len(), 2);
        assert!(relevant.contains(&state.market.config.bids_key));

        state.accounts.current = Some(account("acct", "o", &[]));
        assert!(relevant_addresses(&state).contains(&addr("acct")));
    }
}
