//! OAuth 1.0a request signing (HMAC-SHA1)

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use sha1::Sha1;
use x_autopost_domain::Credentials;

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 percent-encoding (everything but unreserved characters)
pub(crate) fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Per-request values that make a signature unique
#[derive(Debug, Clone)]
pub(crate) struct OAuthNonce {
    pub nonce: String,
    pub timestamp: i64,
}

/// Build the `Authorization: OAuth ...` header value for a request
///
/// `request_params` are query and form-body parameters; JSON bodies are not
/// part of the signature.
pub(crate) fn authorization_header(
    method: &str,
    url: &str,
    request_params: &[(&str, &str)],
    credentials: &Credentials,
    nonce: &OAuthNonce,
) -> String {
    let timestamp = nonce.timestamp.to_string();
    let mut oauth_params = vec![
        ("oauth_consumer_key", credentials.api_key.expose_secret()),
        ("oauth_nonce", nonce.nonce.as_str()),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", credentials.access_token.expose_secret()),
        ("oauth_version", "1.0"),
    ];

    let signature = sign(method, url, &oauth_params, request_params, credentials);
    oauth_params.push(("oauth_signature", signature.as_str()));
    oauth_params.sort_by(|a, b| a.0.cmp(b.0));

    let fields = oauth_params
        .iter()
        .map(|(key, value)| format!("{}=\"{}\"", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {}", fields)
}

fn sign(
    method: &str,
    url: &str,
    oauth_params: &[(&str, &str)],
    request_params: &[(&str, &str)],
    credentials: &Credentials,
) -> String {
    let base = signature_base_string(method, url, oauth_params, request_params);
    let key = format!(
        "{}&{}",
        percent_encode(credentials.api_secret.expose_secret()),
        percent_encode(credentials.access_token_secret.expose_secret())
    );

    // HMAC accepts keys of any length
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(base.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

fn signature_base_string(
    method: &str,
    url: &str,
    oauth_params: &[(&str, &str)],
    request_params: &[(&str, &str)],
) -> String {
    let mut encoded: Vec<(String, String)> = oauth_params
        .iter()
        .chain(request_params.iter())
        .map(|(key, value)| (percent_encode(key), percent_encode(value)))
        .collect();
    encoded.sort();

    let parameter_string = encoded
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&parameter_string)
    )
}
