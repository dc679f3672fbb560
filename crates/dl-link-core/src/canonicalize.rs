use dl_api_types::QueryParams;
use url::Url;

/// Signature parameter.
pub const SIG_PARAM: &str = "sig";

/// Comma-separated list of the parameters covered by the signature.
pub const SIG_PARAMS_PARAM: &str = "sig_params";

/// Deterministic, signable form of `url`: origin, path, and the
/// policy-filtered query sorted by key.
///
/// With a non-empty `sig_params`, only the listed parameters (every
/// occurrence, in original order) plus the `sig_params` declaration itself
/// take part. Without it, everything except `sig` does.
pub fn canonicalize(url: &Url) -> String {
    let query = canonical_params(url).to_query_string();

    let mut canonical = url.origin().ascii_serialization();
    canonical.push_str(url.path());
    if !query.is_empty() {
        canonical.push('?');
        canonical.push_str(&query);
    }
    canonical
}

pub(crate) fn canonical_params(url: &Url) -> QueryParams {
    let original = QueryParams::from_url(url);

    let mut params = match original.get(SIG_PARAMS_PARAM).filter(|value| !value.is_empty()) {
        Some(allow_list) => {
            let mut selected = QueryParams::new();
            for name in allow_list.split(',') {
                for value in original.get_all(name) {
                    selected.append(name, value);
                }
            }
            selected.append(SIG_PARAMS_PARAM, allow_list);
            selected
        }
        None => {
            let mut all = original.clone();
            all.remove(SIG_PARAM);
            all
        }
    };

    params.sort();
    params
}
