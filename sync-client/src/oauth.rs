//! OAuth 1.0a request signing.
//!
//! Every API request carries an `Authorization: OAuth ...` header whose
//! HMAC-SHA1 signature covers the method, the URL without query string,
//! and every request parameter (query string or form body) together with
//! the `oauth_*` protocol parameters.
//!
//! The encoding and sort order must match the server's verifier bit for
//! bit; [`OAuthSigner::sign_with`] exists so tests can pin the nonce and
//! timestamp against a known-good header.

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine,
};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;
use sha1::Sha1;
use std::fmt;
use thiserror::Error;
use twablet_sync_types::{Parameters, RequestMethod};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Everything outside the RFC 3986 unreserved set
/// (`ALPHA / DIGIT / "-" / "." / "_" / "~"`).
pub const OAUTH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'!')
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*')
    .add(b'+')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Size of the random nonce before encoding.
pub const NONCE_SIZE: usize = 32;

/// Signing errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The system clock is before the Unix epoch.
    #[error("system clock error: {0}")]
    Clock(String),

    /// The OS random source failed.
    #[error("random source error: {0}")]
    Random(String),

    /// The HMAC key was rejected.
    #[error("invalid signing key: {0}")]
    Key(String),
}

/// Application (consumer) credentials.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ConsumerCredentials {
    /// Consumer key.
    #[serde(default)]
    pub key: String,
    /// Consumer secret.
    #[serde(default)]
    pub secret: String,
}

impl ConsumerCredentials {
    /// Create credentials from key and secret.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    /// Both halves are present.
    pub fn is_valid(&self) -> bool {
        !self.key.is_empty() && !self.secret.is_empty()
    }
}

impl fmt::Debug for ConsumerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerCredentials")
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Percent-encode `s` with [`OAUTH_ENCODE_SET`].
pub fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

/// Signs requests on behalf of one consumer.
#[derive(Debug, Clone)]
pub struct OAuthSigner {
    consumer: ConsumerCredentials,
}

impl OAuthSigner {
    /// Create a signer for `consumer`.
    pub fn new(consumer: ConsumerCredentials) -> Self {
        Self { consumer }
    }

    /// `Authorization` header value for a request, with a fresh nonce and
    /// the current time.
    pub fn sign(
        &self,
        method: RequestMethod,
        url: &str,
        params: &Parameters,
        token: &str,
        token_secret: &str,
    ) -> Result<String, AuthError> {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| AuthError::Clock(e.to_string()))?
            .as_secs()
            .to_string();
        let nonce = generate_nonce()?;
        self.sign_with(method, url, params, token, token_secret, &nonce, &timestamp)
    }

    /// `Authorization` header value with a caller-chosen nonce and timestamp.
    #[allow(clippy::too_many_arguments)]
    pub fn sign_with(
        &self,
        method: RequestMethod,
        url: &str,
        params: &Parameters,
        token: &str,
        token_secret: &str,
        nonce: &str,
        timestamp: &str,
    ) -> Result<String, AuthError> {
        let mut oauth_params = Parameters::new();
        oauth_params.insert("oauth_consumer_key".into(), self.consumer.key.clone());
        oauth_params.insert("oauth_nonce".into(), nonce.to_string());
        oauth_params.insert("oauth_signature_method".into(), "HMAC-SHA1".into());
        oauth_params.insert("oauth_timestamp".into(), timestamp.to_string());
        oauth_params.insert("oauth_version".into(), "1.0".into());
        if !token.is_empty() {
            oauth_params.insert("oauth_token".into(), token.to_string());
        }

        // Sort on the encoded form; encoding can change byte order.
        let mut encoded: Vec<(String, String)> = oauth_params
            .iter()
            .chain(params.iter())
            .map(|(k, v)| (percent_encode(k), percent_encode(v)))
            .collect();
        encoded.sort();
        let param_string = encoded
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let base_string = format!(
            "{}&{}&{}",
            method.as_str(),
            percent_encode(url),
            percent_encode(&param_string)
        );
        let signing_key = format!(
            "{}&{}",
            percent_encode(&self.consumer.secret),
            percent_encode(token_secret)
        );
        let signature = hmac_sha1(&signing_key, &base_string)?;
        oauth_params.insert("oauth_signature".into(), signature);

        let header = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {}", header))
    }
}

fn generate_nonce() -> Result<String, AuthError> {
    let mut bytes = [0u8; NONCE_SIZE];
    getrandom::getrandom(&mut bytes).map_err(|e| AuthError::Random(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn hmac_sha1(key: &str, data: &str) -> Result<String, AuthError> {
    type HmacSha1 = Hmac<Sha1>;

    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).map_err(|e| AuthError::Key(e.to_string()))?;
    mac.update(data.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
