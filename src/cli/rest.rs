// src/cli/rest.rs

//! A thin JSON-over-HTTP adapter for actions that call remote services.
//!
//! Every exchange goes through one `execute` call: the response status,
//! reason phrase, parsed body and redirect link come back in a single
//! `Response` record. Retries and caching are the caller's business.

use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use serde_json::Value;
use thiserror::Error;

use crate::core::properties::ProxyConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum RestError {
    #[error("Could not build the HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Request to '{url}' failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// What came back from the service.
#[derive(Debug, Default)]
pub struct Response {
    pub status_code: u16,
    pub reason: String,
    /// The parsed body. When the body was a JSON array, only the first
    /// element is retained.
    pub result: Option<Value>,
    /// The `error` member of the body, when the service reported one.
    pub error: Option<Value>,
    /// The `Location` header, populated on redirects.
    pub link: Option<String>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// A blocking HTTP client preconfigured for JSON exchanges, optionally
/// routed through an authenticated proxy.
pub struct RestClient {
    client: Client,
}

impl RestClient {
    /// Build a client. When proxy credentials carry a domain, the username
    /// is qualified `DOMAIN\user` for servers expecting the NTLM form.
    pub fn new(proxy: Option<&ProxyConfig>) -> Result<Self, RestError> {
        let mut builder = Client::builder().timeout(REQUEST_TIMEOUT);

        if let Some(cfg) = proxy {
            let mut url = format!("http://{}", cfg.host);
            if let Some(port) = cfg.port {
                url.push_str(&format!(":{}", port));
            }
            let user = match &cfg.domain {
                Some(domain) => format!("{}\\{}", domain, cfg.user),
                None => cfg.user.clone(),
            };
            let proxy = reqwest::Proxy::all(&url)
                .map_err(RestError::Client)?
                .basic_auth(&user, &cfg.password);
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(RestError::Client)?;
        Ok(Self { client })
    }

    /// Perform one JSON exchange with the service.
    pub fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Response, RestError> {
        let request = self.request(method, url, body);
        self.finish(request, url)
    }

    /// Same as `execute`, with HTTP basic credentials on the request.
    pub fn execute_with_auth(
        &self,
        method: Method,
        url: &str,
        user: &str,
        password: &str,
        body: Option<&Value>,
    ) -> Result<Response, RestError> {
        let request = self
            .request(method, url, body)
            .basic_auth(user, Some(password));
        self.finish(request, url)
    }

    fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> reqwest::blocking::RequestBuilder {
        log::debug!("{} {}", method, url);
        let mut request = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }

    fn finish(
        &self,
        request: reqwest::blocking::RequestBuilder,
        url: &str,
    ) -> Result<Response, RestError> {
        let raw = request.send().map_err(|e| RestError::Request {
            url: url.to_string(),
            source: e,
        })?;

        let status = raw.status();
        let mut response = Response {
            status_code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            link: raw
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            ..Response::default()
        };

        let text = raw.text().map_err(|e| RestError::Request {
            url: url.to_string(),
            source: e,
        })?;
        if text.trim().is_empty() {
            return Ok(response);
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(mut records)) => {
                if records.len() > 1 {
                    log::warn!(
                        "Response contained {} records; only the first is retained",
                        records.len()
                    );
                }
                if !records.is_empty() {
                    response.result = Some(records.swap_remove(0));
                }
            }
            Ok(value) => {
                response.error = value.get("error").cloned();
                response.result = Some(value);
            }
            Err(e) => {
                log::debug!("Response body was not JSON ({}), discarding", e);
            }
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_classification() {
        let mut response = Response {
            status_code: 204,
            ..Response::default()
        };
        assert!(response.is_success());
        response.status_code = 301;
        assert!(!response.is_success());
        response.status_code = 500;
        assert!(!response.is_success());
    }

    #[test]
    fn test_client_builds_with_and_without_proxy() {
        assert!(RestClient::new(None).is_ok());
        let proxy = ProxyConfig {
            host: "proxy.example.com".to_string(),
            port: Some(8080),
            user: "alice".to_string(),
            password: "secret".to_string(),
            domain: Some("CORP".to_string()),
        };
        assert!(RestClient::new(Some(&proxy)).is_ok());
    }
}
