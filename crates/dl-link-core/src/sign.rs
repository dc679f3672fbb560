use dl_api_types::QueryParams;
use dl_crypto::{Signer, bytes_to_sig};
use url::Url;

use crate::DeepLinkError;
use crate::canonicalize::{SIG_PARAM, SIG_PARAMS_PARAM, canonicalize};

/// Issuer side: returns `url` with a `sig` over its canonical form.
///
/// Any existing `sig`/`sig_params` are dropped first. With `signed_params`,
/// a `sig_params` declaration is added so that only those parameters are
/// covered and others can be appended later.
pub fn sign_url(
    url: &Url,
    signer: &dyn Signer,
    signed_params: Option<&[&str]>,
) -> Result<Url, DeepLinkError> {
    let mut params = QueryParams::from_url(url);
    params.remove(SIG_PARAM);
    params.remove(SIG_PARAMS_PARAM);
    if let Some(names) = signed_params {
        params.append(SIG_PARAMS_PARAM, names.join(","));
    }

    let mut signed = url.clone();
    set_query(&mut signed, &params);

    let canonical = canonicalize(&signed);
    let signature = signer
        .sign(canonical.as_bytes())
        .map_err(DeepLinkError::Signing)?;

    params.append(SIG_PARAM, bytes_to_sig(&signature));
    set_query(&mut signed, &params);
    Ok(signed)
}

fn set_query(url: &mut Url, params: &QueryParams) {
    if params.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&params.to_query_string()));
    }
}
