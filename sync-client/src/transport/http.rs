//! HTTP transport backed by reqwest.
//!
//! GET parameters travel in the query string; POST parameters travel as an
//! `application/x-www-form-urlencoded` body. Both use the OAuth encoding so
//! the bytes on the wire are exactly the bytes that were signed.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;
use twablet_sync_types::{Parameters, RequestMethod};

use super::{ApiRequest, Transport, TransportError};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::oauth::{percent_encode, OAuthSigner};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Signs requests with OAuth 1.0a and sends them over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
    signer: OAuthSigner,
}

fn encode_pairs(parameters: &Parameters) -> String {
    parameters
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

impl HttpTransport {
    /// Build a transport from client configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.request_timeout_secs))
            .build()?;
        let mut base_url = config.api.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            client,
            base_url,
            user_agent: config.api.user_agent.clone(),
            signer: OAuthSigner::new(config.consumer.clone()),
        })
    }

    /// Base URL every endpoint path is joined to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sign and assemble the HTTP request for `request`.
    pub fn build_request(&self, request: &ApiRequest) -> Result<reqwest::Request, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let authorization = self
            .signer
            .sign(
                request.method,
                &url,
                &request.parameters,
                &request.account.token,
                &request.account.token_secret,
            )
            .map_err(|e| TransportError::Signing(e.to_string()))?;
        let encoded = encode_pairs(&request.parameters);

        let builder = match request.method {
            RequestMethod::Get => {
                let full_url = if encoded.is_empty() {
                    url
                } else {
                    format!("{}?{}", url, encoded)
                };
                self.client.get(full_url)
            }
            RequestMethod::Post => self
                .client
                .post(url)
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(encoded),
        };
        builder
            .header(AUTHORIZATION, authorization)
            .header(USER_AGENT, self.user_agent.as_str())
            .build()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<Vec<u8>, TransportError> {
        let http_request = self.build_request(request)?;
        tracing::debug!("{} {}", http_request.method(), http_request.url());

        let response = self.client.execute(http_request).await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::ConnectionFailed(e.to_string())
            }
        })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        if status.is_success() {
            Ok(body.to_vec())
        } else {
            tracing::warn!("{} {} failed with {}", request.method, request.path, status);
            Err(TransportError::Http {
                status: status.as_u16(),
                body: body.to_vec(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::ConsumerCredentials;
    use twablet_sync_types::{parameters, Account, Query, TweetItemKind, TweetListKind};

    fn transport(base_url: &str) -> HttpTransport {
        let mut config = ClientConfig::default();
        config.api.base_url = base_url.to_string();
        config.consumer = ConsumerCredentials::new("ck", "cs");
        HttpTransport::new(&config).unwrap()
    }

    fn account() -> Account {
        Account::new("A", "1", "a", "token", "secret")
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        assert_eq!(
            transport("https://api.example.com/1.1").base_url(),
            "https://api.example.com/1.1/"
        );
    }

    #[test]
    fn get_puts_encoded_parameters_in_query_string() {
        let query = TweetListKind::Search.query(&parameters([("q", "rust lang")]));
        let request = ApiRequest::new(&account(), &query, Parameters::new());
        let built = transport("https://api.twitter.com/1.1/")
            .build_request(&request)
            .unwrap();

        assert_eq!(built.method(), reqwest::Method::GET);
        assert_eq!(
            built.url().as_str(),
            "https://api.twitter.com/1.1/search/tweets.json?count=100&include_entities=true&q=rust%20lang"
        );
        assert!(built.body().is_none());
        let auth = built.headers()[AUTHORIZATION].to_str().unwrap();
        assert!(auth.starts_with("OAuth "));
        assert!(auth.contains("oauth_token=\"token\""));
    }

    #[test]
    fn post_sends_form_body() {
        let query = TweetItemKind::StatusUpdate.query(&parameters([("status", "Hi & bye!")]));
        let request = ApiRequest::new(&account(), &query, Parameters::new());
        let built = transport("https://api.twitter.com/1.1/")
            .build_request(&request)
            .unwrap();

        assert_eq!(built.method(), reqwest::Method::POST);
        assert_eq!(
            built.url().as_str(),
            "https://api.twitter.com/1.1/statuses/update.json"
        );
        assert_eq!(built.headers()[CONTENT_TYPE], FORM_CONTENT_TYPE);
        let body = built.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, b"status=Hi%20%26%20bye%21");
    }

    #[test]
    fn parameterless_get_has_no_query_string() {
        let query = Query::new(RequestMethod::Get, "account/settings.json", Parameters::new());
        let request = ApiRequest::new(&account(), &query, Parameters::new());
        let built = transport("https://api.twitter.com/1.1/")
            .build_request(&request)
            .unwrap();
        assert_eq!(built.url().query(), None);
    }
}
