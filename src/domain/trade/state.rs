//! Trade history container for the selected account.

use super::TradeHistoryEntry;
use std::cmp::Ordering;

/// Trade history ordered newest first.
///
/// Entries without a timestamp have not been indexed yet and sort ahead of
/// every timestamped entry. The sequence is only ever replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeHistory {
    entries: Vec<TradeHistoryEntry>,
}

impl TradeHistory {
    pub fn new(mut entries: Vec<TradeHistoryEntry>) -> Self {
        entries.sort_by(newest_first);
        Self { entries }
    }

    pub fn entries(&self) -> &[TradeHistoryEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&TradeHistoryEntry> {
        self.entries.first()
    }

    /// Fills on a single market, preserving order.
    pub fn for_market<'a>(
        &'a self,
        market_name: &'a str,
    ) -> impl Iterator<Item = &'a TradeHistoryEntry> + 'a {
        self.entries.iter().filter(move |e| e.market_name == market_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn newest_first(a: &TradeHistoryEntry, b: &TradeHistoryEntry) -> Ordering {
    match (a.timestamp, b.timestamp) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => y.cmp(&x),
    }
}
