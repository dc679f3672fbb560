use dl_api_types::{Destination, QueryParams};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("missing parameter: {0}")]
    MissingParam(String),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParam { name: String, reason: String },

    #[error("invalid destination url: {0}")]
    InvalidDestination(String),
}

impl From<url::ParseError> for DispatchError {
    fn from(err: url::ParseError) -> Self {
        DispatchError::InvalidDestination(err.to_string())
    }
}

/// Converts the query of a matched deep link into a [`Destination`].
pub trait RouteHandler: Send + Sync {
    /// Pathname this handler answers, e.g. `/swap`.
    fn pathname(&self) -> &str;
    fn handle(&self, params: &QueryParams) -> Result<Destination, DispatchError>;
}

/// Route backed by a plain function or closure.
pub struct FnRoute<F> {
    pathname: String,
    handler: F,
}

impl<F> FnRoute<F>
where
    F: Fn(&QueryParams) -> Result<Destination, DispatchError> + Send + Sync,
{
    pub fn new(pathname: impl Into<String>, handler: F) -> Self {
        Self {
            pathname: pathname.into(),
            handler,
        }
    }
}

impl<F> RouteHandler for FnRoute<F>
where
    F: Fn(&QueryParams) -> Result<Destination, DispatchError> + Send + Sync,
{
    fn pathname(&self) -> &str {
        &self.pathname
    }

    fn handle(&self, params: &QueryParams) -> Result<Destination, DispatchError> {
        (self.handler)(params)
    }
}

/// Static pathname -> handler table. Pathnames are stored and looked up
/// lowercased.
#[derive(Default)]
pub struct RouteRegistry {
    routes: HashMap<String, Arc<dyn RouteHandler>>,
}

impl RouteRegistry {
    pub fn register(&mut self, route: Arc<dyn RouteHandler>) {
        self.routes.insert(route.pathname().to_lowercase(), route);
    }

    pub fn route(&self, pathname: &str) -> Option<Arc<dyn RouteHandler>> {
        self.routes.get(&pathname.to_lowercase()).cloned()
    }

    pub fn pathnames(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn navigate_to(path: &'static str) -> impl Fn(&QueryParams) -> Result<Destination, DispatchError> {
        move |params| {
            Ok(Destination::Navigate {
                path: path.to_owned(),
                query: params.clone(),
            })
        }
    }

    #[test]
    fn lookup_ignores_case() {
        let mut registry = RouteRegistry::default();
        registry.register(Arc::new(FnRoute::new("/Home", navigate_to("/"))));

        assert!(registry.route("/home").is_some());
        assert!(registry.route("/HOME").is_some());
        assert!(registry.route("/away").is_none());
        assert_eq!(registry.pathnames().collect::<Vec<_>>(), vec!["/home"]);
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let mut registry = RouteRegistry::default();
        registry.register(Arc::new(FnRoute::new("/a", navigate_to("/one"))));
        registry.register(Arc::new(FnRoute::new("/a", navigate_to("/two"))));
        assert_eq!(registry.len(), 1);

        let destination = registry
            .route("/a")
            .unwrap()
            .handle(&QueryParams::new())
            .unwrap();
        assert_eq!(
            destination,
            Destination::Navigate {
                path: "/two".to_owned(),
                query: QueryParams::new(),
            }
        );
    }

    #[test]
    fn handler_errors_are_returned() {
        let route = FnRoute::new("/strict", |params: &QueryParams| {
            params
                .get("id")
                .ok_or_else(|| DispatchError::MissingParam("id".to_owned()))?;
            Ok(Destination::Navigate {
                path: "/".to_owned(),
                query: QueryParams::new(),
            })
        });
        assert_eq!(
            route.handle(&QueryParams::new()),
            Err(DispatchError::MissingParam("id".to_owned()))
        );
    }

    #[test]
    fn url_errors_convert_to_invalid_destination() {
        let err: DispatchError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, DispatchError::InvalidDestination(_)));
    }
}
