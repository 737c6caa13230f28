//! Route resolver: turns navigation parameters into store selections.
//!
//! A route carries an optional market token (`?name=BTC-PERP`, `?name=BTC/USDC`)
//! and an optional account address (`?pubkey=<base58>`). The two are resolved
//! independently and may run in either order. Bad input is never an error to
//! the caller: it becomes a redirect.

use crate::actions::RefreshOutcome;
use crate::client::SyncClient;
use crate::domain::market::MarketToken;
use crate::error::InputError;
use crate::network::{ACCOUNT_ROUTE, DEFAULT_ROUTE};
use crate::shared::PubkeyStr;
use crate::store::Transition;
use crate::store::UpdateOutcome;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct RouteQuery {
    name: Option<String>,
    pubkey: Option<String>,
}

/// Navigation parameters the resolver consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub market: Option<String>,
    pub account: Option<String>,
}

impl Route {
    /// Parse a path with an optional query string, e.g. `/?name=BTC-PERP`.
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let (path, query) = match raw.split_once('?') {
            Some((path, query)) => (path, query),
            None => (raw, ""),
        };
        let query: RouteQuery = serde_urlencoded::from_str(query)
            .map_err(|e| InputError::MalformedRoute(format!("{}: {}", raw, e)))?;

        Ok(Self {
            path: path.to_string(),
            market: query.name.filter(|s| !s.trim().is_empty()),
            account: query.pubkey.filter(|s| !s.trim().is_empty()),
        })
    }

    pub fn with_market(mut self, token: &str) -> Self {
        self.market = Some(token.to_string());
        self
    }

    pub fn with_account(mut self, address: &str) -> Self {
        self.account = Some(address.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketResolution {
    /// No market token in the route.
    NotRequested,
    /// The token named no configured market.
    Redirect(&'static str),
    /// The market is already selected.
    Unchanged,
    Selected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountResolution {
    /// No account token in the route.
    NotRequested,
    /// Malformed address, or no account lives there.
    Redirect(&'static str),
    /// The group is not loaded yet; resolve again once it is.
    Deferred,
    /// The account is already selected.
    Unchanged,
    Observed(PubkeyStr),
    /// A newer account selection was made while the fetch was in flight.
    Superseded,
    /// The remote failed; an error notification was emitted.
    Failed,
}

/// Combined result of one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOutcome {
    pub market: MarketResolution,
    pub account: AccountResolution,
}

impl RouteOutcome {
    /// Where to navigate, if anywhere. A market redirect wins.
    pub fn redirect(&self) -> Option<&'static str> {
        match (&self.market, &self.account) {
            (MarketResolution::Redirect(to), _) => Some(*to),
            (_, AccountResolution::Redirect(to)) => Some(*to),
            _ => None,
        }
    }
}

pub struct Routes<'a> {
    pub(crate) client: &'a SyncClient,
}

impl<'a> Routes<'a> {
    /// Resolve both route parameters.
    pub async fn resolve(&self, route: &Route) -> RouteOutcome {
        let (market, account) = futures_util::join!(
            self.resolve_market(route.market.as_deref()),
            self.resolve_account(route.account.as_deref()),
        );
        let outcome = RouteOutcome { market, account };
        tracing::debug!(path = %route.path, ?outcome, "route resolved");
        outcome
    }

    /// Parse and resolve a raw path. A malformed query redirects to the
    /// default route.
    pub async fn resolve_path(&self, raw: &str) -> RouteOutcome {
        match Route::parse(raw) {
            Ok(route) => self.resolve(&route).await,
            Err(e) => {
                tracing::debug!(error = %e, "unparseable route");
                RouteOutcome {
                    market: MarketResolution::Redirect(DEFAULT_ROUTE),
                    account: AccountResolution::NotRequested,
                }
            }
        }
    }

    pub async fn resolve_market(&self, token: Option<&str>) -> MarketResolution {
        let Some(token) = token else {
            return MarketResolution::NotRequested;
        };
        let parsed = match MarketToken::parse(token) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "market token rejected");
                return MarketResolution::Redirect(DEFAULT_ROUTE);
            }
        };

        let snapshot = self.client.snapshot().await;
        let Some(config) = snapshot
            .group
            .config
            .market_by_base_symbol_and_kind(&parsed.base_symbol, parsed.kind)
            .cloned()
        else {
            tracing::debug!(market = %parsed, "no configured market");
            return MarketResolution::Redirect(DEFAULT_ROUTE);
        };
        if snapshot.market.name == config.name {
            return MarketResolution::Unchanged;
        }

        let name = config.name.clone();
        match self.client.commit(Transition::SelectMarket(config)).await {
            Some(UpdateOutcome::Changed) => {
                tracing::info!(market = %name, "market selected");
                MarketResolution::Selected(name)
            }
            _ => MarketResolution::Unchanged,
        }
    }

    pub async fn resolve_account(&self, token: Option<&str>) -> AccountResolution {
        let Some(token) = token else {
            return AccountResolution::NotRequested;
        };
        let address = match PubkeyStr::parse(token) {
            Ok(address) => address,
            Err(e) => {
                tracing::debug!(error = %e, "account token rejected");
                return AccountResolution::Redirect(ACCOUNT_ROUTE);
            }
        };

        // Taken before any await so a later route supersedes this one.
        let ticket = self.client.store.begin_account_selection();
        let snapshot = self.client.snapshot().await;
        if !snapshot.group.is_loaded() {
            return AccountResolution::Deferred;
        }
        if snapshot.accounts.current_address() == Some(&address) {
            return AccountResolution::Unchanged;
        }

        let actions = self.client.actions();
        match actions.observe_account(&address, ticket).await {
            Ok(RefreshOutcome::Published) => {
                actions.fetch_trade_history().await;
                actions.reload_orders().await;
                AccountResolution::Observed(address)
            }
            Ok(RefreshOutcome::Stale) => {
                tracing::debug!(account = %address, "superseded by a newer route");
                AccountResolution::Superseded
            }
            Ok(_) => AccountResolution::Unchanged,
            Err(e) if e.is_not_found() => {
                tracing::debug!(account = %address, "observed account not found");
                AccountResolution::Redirect(ACCOUNT_ROUTE)
            }
            Err(e) => {
                self.client.report("Could not load account", &e).await;
                AccountResolution::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_market_and_account() {
        let route = Route::parse("/?name=BTC-PERP&pubkey=abc").unwrap();
        assert_eq!(route.path, "/");
        assert_eq!(route.market.as_deref(), Some("BTC-PERP"));
        assert_eq!(route.account.as_deref(), Some("abc"));
    }

    #[test]
    fn test_parse_decodes_slash() {
        let route = Route::parse("/?name=BTC%2FUSDC").unwrap();
        assert_eq!(route.market.as_deref(), Some("BTC/USDC"));
        assert!(route.account.is_none());
    }

    #[test]
    fn test_parse_without_query() {
        let route = Route::parse("/account").unwrap();
        assert_eq!(route, Route {
            path: "/account".into(),
            market: None,
            account: None,
        });
    }

    #[test]
    fn test_empty_params_are_absent() {
        let route = Route::parse("/?name=&pubkey=").unwrap();
        assert!(route.market.is_none());
        assert!(route.account.is_none());
    }

    #[test]
    fn test_redirect_prefers_market() {
        let outcome = RouteOutcome {
            market: MarketResolution::Redirect(DEFAULT_ROUTE),
            account: AccountResolution::Redirect(ACCOUNT_ROUTE),
        };
        assert_eq!(outcome.redirect(), Some(DEFAULT_ROUTE));

        let outcome = RouteOutcome {
            market: MarketResolution::Unchanged,
            account: AccountResolution::Redirect(ACCOUNT_ROUTE),
        };
        assert_eq!(outcome.redirect(), Some(ACCOUNT_ROUTE));
    }
}
