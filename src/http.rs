//! HTTP backend for the Algolia REST APIs.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use crate::client::{AlgoliaBackend, ApiRequest};
use crate::config::TransportOptions;
use crate::tools::ToolError;

/// A pooled client honouring the timeout and proxy of `transport`.
fn build_http_client(transport: &TransportOptions) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();
    if let Some(timeout) = transport.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(proxy_url) = &transport.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
    }
    builder.build()
}

/// Turn a non-2xx response into an API error, preferring the JSON `message` field.
pub fn handle_error_response(status: StatusCode, body: &str) -> ToolError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body.to_string()
            }
        });

    ToolError::Api {
        status: status.as_u16(),
        message,
    }
}

/// [`AlgoliaBackend`] over a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    transport_options: TransportOptions,
    base_url: Option<Url>,
}

impl HttpBackend {
    pub fn new(transport_options: TransportOptions) -> Result<Self, ToolError> {
        let client = build_http_client(&transport_options)?;
        Ok(Self {
            client,
            transport_options,
            base_url: None,
        })
    }

    /// Route every host through one base URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ToolError> {
        let url = Url::parse(base_url)
            .map_err(|e| ToolError::Error(format!("invalid base URL `{}`: {}", base_url, e)))?;
        self.base_url = Some(url);
        Ok(self)
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url, ToolError> {
        let mut url = match &self.base_url {
            Some(base) => base.clone(),
            None => {
                let base = request.host.base_url();
                Url::parse(&base)
                    .map_err(|e| ToolError::Error(format!("invalid host `{}`: {}", base, e)))?
            }
        };

        let shown = url.to_string();
        url.path_segments_mut()
            .map_err(|_| ToolError::Error(format!("URL `{}` cannot take a path", shown)))?
            .pop_if_empty()
            .extend(&request.segments);

        if !request.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        Ok(url)
    }
}

#[async_trait]
impl AlgoliaBackend for HttpBackend {
    async fn send(&self, request: ApiRequest) -> Result<Value, ToolError> {
        let url = self.url_for(&request)?;
        debug!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), url);
        for (key, value) in &self.transport_options.headers {
            builder = builder.header(key, value);
        }

        if let Some(auth) = &request.auth {
            builder = builder
                .header("x-algolia-application-id", &auth.app_id)
                .header("x-algolia-api-key", &auth.api_key);
        }

        if let Some(body) = &request.body {
            debug!("Request body: {}", body);
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("Response {} ({} bytes): {}", status, text.len(), text);

        if !status.is_success() {
            return Err(handle_error_response(status, &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Host;

    #[test]
    fn test_error_response_prefers_message_field() {
        let err = handle_error_response(
            StatusCode::NOT_FOUND,
            r#"{"message":"Index does not exist","status":404}"#,
        );
        match err {
            ToolError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Index does not exist");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_error_response_falls_back_to_body() {
        let err = handle_error_response(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(err, ToolError::Api { status: 502, ref message } if message == "upstream down"));
    }

    #[test]
    fn test_url_encodes_segments() {
        let backend = HttpBackend::new(TransportOptions::new()).unwrap();
        let request = ApiRequest::get(Host::Search("APP".into()), "/1/indexes")
            .segment("my index")
            .segment("a/b")
            .query("q", "x y");

        let url = backend.url_for(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://app.algolia.net/1/indexes/my%20index/a%2Fb?q=x+y"
        );
    }

    #[test]
    fn test_base_url_override() {
        let backend = HttpBackend::new(TransportOptions::new())
            .unwrap()
            .with_base_url("http://127.0.0.1:9000")
            .unwrap();
        let request = ApiRequest::get(Host::Status, "/1/status");

        assert_eq!(
            backend.url_for(&request).unwrap().as_str(),
            "http://127.0.0.1:9000/1/status"
        );
    }

    #[test]
    fn test_base_url_without_path_is_rejected() {
        let backend = HttpBackend::new(TransportOptions::new())
            .unwrap()
            .with_base_url("mailto:ops@example.com")
            .unwrap();
        let request = ApiRequest::get(Host::Status, "/1/status");

        match backend.url_for(&request).unwrap_err() {
            ToolError::Error(message) => {
                assert_eq!(message, "URL `mailto:ops@example.com` cannot take a path")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
