use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use url::Url;
use url::form_urlencoded;

/// Outcome of checking the `sig` parameter of a deep link.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignatureStatus {
    Missing,
    Valid,
    Invalid,
}

impl SignatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureStatus::Missing => "missing",
            SignatureStatus::Valid => "valid",
            SignatureStatus::Invalid => "invalid",
        }
    }
}

/// Ordered query parameter list with repeated keys, serialized the way
/// `application/x-www-form-urlencoded` does it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_url(url: &Url) -> Self {
        url.query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(key, _)| key == name)
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Removes every occurrence of `name`.
    pub fn remove(&mut self, name: &str) {
        self.0.retain(|(key, _)| key != name);
    }

    /// Stable sort by key. Keys compare by UTF-16 code units so the order
    /// matches what browsers produce for `URLSearchParams.sort()`.
    pub fn sort(&mut self) {
        self.0.sort_by(|(a, _), (b, _)| utf16_cmp(a, b));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.0 {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

impl FromIterator<(String, String)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn utf16_cmp(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

/// Where a dispatched deep link sends the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Destination {
    Redirect { redirect_to: Url },
    Navigate { path: String, query: QueryParams },
}

/// Deep link captured before onboarding finished, as stored in the
/// `deferred_deeplink` cookie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeferredDeepLink {
    /// Milliseconds since the Unix epoch.
    pub created_at: f64,
    #[serde(default)]
    pub referring_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum DeferredDeepLinkRoute {
    Redirect { url: String },
    Navigate { route: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepLinkUrlRequest {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalizeResponse {
    pub canonical: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub signature: SignatureStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResponse {
    pub matched: bool,
    pub route: Option<String>,
    pub signature: Option<SignatureStatus>,
    pub destination: Option<Destination>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeferredResolveResponse {
    pub route: Option<DeferredDeepLinkRoute>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_keep_repeated_keys_in_order() {
        let url = Url::parse("https://example.com/?a=1&b=2&a=3").unwrap();
        let params = QueryParams::from_url(&url);
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get_all("a").collect::<Vec<_>>(), vec!["1", "3"]);
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut params: QueryParams = [("b", "1"), ("a", "2"), ("b", "0"), ("a", "1")]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        params.sort();
        assert_eq!(params.to_query_string(), "a=2&a=1&b=1&b=0");
    }

    #[test]
    fn sort_uses_utf16_order() {
        // U+FF21 sorts before U+1F600 in UTF-8 but after it in UTF-16.
        let mut params = QueryParams::new();
        params.append("\u{1F600}", "x");
        params.append("\u{FF21}", "y");
        params.sort();
        let keys: Vec<_> = params.iter().map(|(k, _)| k.to_owned()).collect();
        assert_eq!(keys, vec!["\u{1F600}".to_owned(), "\u{FF21}".to_owned()]);
    }

    #[test]
    fn query_string_uses_form_encoding() {
        let mut params = QueryParams::new();
        params.append("sig_params", "a,b");
        params.append("q", "hello world*");
        assert_eq!(params.to_query_string(), "sig_params=a%2Cb&q=hello+world*");
    }

    #[test]
    fn remove_drops_every_occurrence() {
        let url = Url::parse("https://example.com/?sig=1&a=2&sig=3").unwrap();
        let mut params = QueryParams::from_url(&url);
        params.remove("sig");
        assert!(!params.contains("sig"));
        assert_eq!(params.to_query_string(), "a=2");
    }

    #[test]
    fn deferred_route_serializes_with_type_tag() {
        let route = DeferredDeepLinkRoute::Navigate {
            route: "/home?x=1".to_owned(),
        };
        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(json["type"], "Navigate");
        assert_eq!(json["route"], "/home?x=1");
    }

    #[test]
    fn deferred_link_reads_camel_case_cookie() {
        let link: DeferredDeepLink =
            serde_json::from_str(r#"{"createdAt":1700000000000,"referringLink":"https://x.test/a"}"#)
                .unwrap();
        assert_eq!(link.created_at, 1_700_000_000_000.0);
        assert_eq!(link.referring_link.as_deref(), Some("https://x.test/a"));
    }
}
