use dl_api_types::{Destination, QueryParams};
use dl_routes::{DispatchError, RouteHandler, RouteRegistry};
use std::sync::Arc;
use tracing::warn;
use url::Url;

pub const HOME_PATH: &str = "/home";
pub const BUY_PATH: &str = "/buy";
pub const SELL_PATH: &str = "/sell";
pub const SWAP_PATH: &str = "/swap";
pub const NOTIFICATIONS_PATH: &str = "/notifications";

pub const DEFAULT_ROUTE: &str = "/";
pub const SWAP_ROUTE: &str = "/cross-chain/swaps/prepare-swap-page";
pub const NOTIFICATIONS_ROUTE: &str = "/notifications";

pub const DEFAULT_PORTFOLIO_URL: &str = "https://portfolio.metamask.io";

/// Registers every built-in route.
///
/// `portfolio_url` is the base for the buy/sell redirects. Reads
/// `DEEP_LINK_PORTFOLIO_URL` when `None` (default: [`DEFAULT_PORTFOLIO_URL`]).
pub fn register_builtin_routes(
    registry: &mut RouteRegistry,
    portfolio_url: Option<String>,
) -> Result<(), DispatchError> {
    let portfolio_url = portfolio_url
        .or_else(|| std::env::var("DEEP_LINK_PORTFOLIO_URL").ok())
        .unwrap_or_else(|| DEFAULT_PORTFOLIO_URL.to_owned());
    let portfolio = Url::parse(portfolio_url.trim_end_matches('/'))?;

    registry.register(Arc::new(HomeRoute));
    registry.register(Arc::new(PortfolioRoute::buy(&portfolio)?));
    registry.register(Arc::new(PortfolioRoute::sell(&portfolio)?));
    registry.register(Arc::new(SwapRoute));
    registry.register(Arc::new(NotificationsRoute));
    Ok(())
}

pub struct HomeRoute;

impl RouteHandler for HomeRoute {
    fn pathname(&self) -> &str {
        HOME_PATH
    }

    fn handle(&self, params: &QueryParams) -> Result<Destination, DispatchError> {
        Ok(Destination::Navigate {
            path: DEFAULT_ROUTE.to_owned(),
            query: params.clone(),
        })
    }
}

/// Redirects to a portfolio page, forwarding every parameter.
pub struct PortfolioRoute {
    pathname: &'static str,
    target: Url,
}

impl PortfolioRoute {
    pub fn buy(portfolio: &Url) -> Result<Self, DispatchError> {
        Ok(Self {
            pathname: BUY_PATH,
            target: portfolio.join("buy")?,
        })
    }

    pub fn sell(portfolio: &Url) -> Result<Self, DispatchError> {
        Ok(Self {
            pathname: SELL_PATH,
            target: portfolio.join("sell")?,
        })
    }
}

impl RouteHandler for PortfolioRoute {
    fn pathname(&self) -> &str {
        self.pathname
    }

    fn handle(&self, params: &QueryParams) -> Result<Destination, DispatchError> {
        let mut redirect_to = self.target.clone();
        if !params.is_empty() {
            redirect_to.set_query(Some(&params.to_query_string()));
        }
        Ok(Destination::Redirect { redirect_to })
    }
}

pub struct SwapRoute;

impl RouteHandler for SwapRoute {
    fn pathname(&self) -> &str {
        SWAP_PATH
    }

    fn handle(&self, params: &QueryParams) -> Result<Destination, DispatchError> {
        let mut query = QueryParams::new();

        for name in ["from", "to"] {
            if let Some(value) = params.get(name) {
                query.append(name, value);
            }
        }

        if let Some(amount) = params.get("amount") {
            if !is_decimal_amount(amount) {
                warn!("swap deep link carries malformed amount '{amount}'");
                return Err(DispatchError::InvalidParam {
                    name: "amount".to_owned(),
                    reason: "expected a non-negative decimal".to_owned(),
                });
            }
            query.append("amount", amount);
        }

        query.append("swaps", "true");

        Ok(Destination::Navigate {
            path: SWAP_ROUTE.to_owned(),
            query,
        })
    }
}

pub struct NotificationsRoute;

impl RouteHandler for NotificationsRoute {
    fn pathname(&self) -> &str {
        NOTIFICATIONS_PATH
    }

    fn handle(&self, params: &QueryParams) -> Result<Destination, DispatchError> {
        let path = match params.get("id") {
            Some(id) if id.trim().is_empty() => {
                return Err(DispatchError::InvalidParam {
                    name: "id".to_owned(),
                    reason: "notification id cannot be empty".to_owned(),
                });
            }
            Some(id) => format!("{NOTIFICATIONS_ROUTE}/{}", id.trim()),
            None => NOTIFICATIONS_ROUTE.to_owned(),
        };

        Ok(Destination::Navigate {
            path,
            query: QueryParams::new(),
        })
    }
}

fn is_decimal_amount(value: &str) -> bool {
    let mut parts = value.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();

    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    match fraction {
        Some(fraction) => {
            (!whole.is_empty() || !fraction.is_empty()) && digits(whole) && digits(fraction)
        }
        None => !whole.is_empty() && digits(whole),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn registry() -> RouteRegistry {
        let mut registry = RouteRegistry::default();
        register_builtin_routes(&mut registry, Some("https://portfolio.test/".to_owned()))
            .unwrap();
        registry
    }

    #[test]
    fn registers_every_route() {
        let registry = registry();
        for path in [HOME_PATH, BUY_PATH, SELL_PATH, SWAP_PATH, NOTIFICATIONS_PATH] {
            assert!(registry.route(path).is_some(), "missing {path}");
        }
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn home_navigates_to_default_route_with_params() {
        let destination = HomeRoute.handle(&params(&[("utm", "x")])).unwrap();
        assert_eq!(
            destination,
            Destination::Navigate {
                path: "/".to_owned(),
                query: params(&[("utm", "x")]),
            }
        );
    }

    #[test]
    fn buy_redirects_with_forwarded_params() {
        let registry = registry();
        let destination = registry
            .route("/BUY")
            .unwrap()
            .handle(&params(&[("chainId", "1"), ("address", "0xabc")]))
            .unwrap();
        let Destination::Redirect { redirect_to } = destination else {
            panic!("expected redirect");
        };
        assert_eq!(
            redirect_to.as_str(),
            "https://portfolio.test/buy?chainId=1&address=0xabc"
        );
    }

    #[test]
    fn sell_without_params_has_no_query() {
        let portfolio = Url::parse("https://portfolio.test").unwrap();
        let destination = PortfolioRoute::sell(&portfolio)
            .unwrap()
            .handle(&QueryParams::new())
            .unwrap();
        let Destination::Redirect { redirect_to } = destination else {
            panic!("expected redirect");
        };
        assert_eq!(redirect_to.as_str(), "https://portfolio.test/sell");
    }

    #[test]
    fn swap_keeps_known_params_and_flags_swaps() {
        let destination = SwapRoute
            .handle(&params(&[
                ("from", "eip155:1/slip44:60"),
                ("amount", "1.5"),
                ("utm", "drop-me"),
            ]))
            .unwrap();
        assert_eq!(
            destination,
            Destination::Navigate {
                path: SWAP_ROUTE.to_owned(),
                query: params(&[
                    ("from", "eip155:1/slip44:60"),
                    ("amount", "1.5"),
                    ("swaps", "true"),
                ]),
            }
        );
    }

    #[test]
    fn swap_rejects_malformed_amount() {
        for amount in ["", "-1", "1e5", "abc", ".", "1.2.3"] {
            let result = SwapRoute.handle(&params(&[("amount", amount)]));
            assert!(
                matches!(result, Err(DispatchError::InvalidParam { ref name, .. }) if name == "amount"),
                "accepted amount {amount:?}"
            );
        }
    }

    #[test]
    fn notifications_with_and_without_id() {
        assert_eq!(
            NotificationsRoute.handle(&QueryParams::new()).unwrap(),
            Destination::Navigate {
                path: "/notifications".to_owned(),
                query: QueryParams::new(),
            }
        );
        assert_eq!(
            NotificationsRoute.handle(&params(&[("id", "abc-1")])).unwrap(),
            Destination::Navigate {
                path: "/notifications/abc-1".to_owned(),
                query: QueryParams::new(),
            }
        );
        assert!(NotificationsRoute.handle(&params(&[("id", " ")])).is_err());
    }

    #[test]
    fn decimal_amounts() {
        for ok in ["0", "10", "1.5", ".5", "5."] {
            assert!(is_decimal_amount(ok), "{ok}");
        }
    }
}
