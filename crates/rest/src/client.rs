// SPDX-License-Identifier: MIT

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backoff::{self, CLIENT_ERROR_MAX_ATTEMPTS};
use crate::error::RestError;

struct Inner {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    secret: String,
}

/// Thin, `Clone`-able handle to the control plane's REST API.
///
/// Every request is HMAC-signed (see [`crate::auth`]) and retried
/// according to the split transient/client-error policy in
/// [`RestClient::execute`]. Cloning is cheap: it bumps an `Arc`.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<Inner>,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        // The control plane may present a self-signed cert, so host
        // verification is left to it rather than enforced here.
        #[allow(clippy::expect_used)]
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .expect("static reqwest client configuration is always valid");

        Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.into(),
                api_key: api_key.into(),
                secret: secret.into(),
            }),
        }
    }

    /// Send a request, retrying transient failures forever and client
    /// errors up to [`CLIENT_ERROR_MAX_ATTEMPTS`] times before surfacing
    /// them to the caller.
    pub async fn execute(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, RestError> {
        let mut transient_attempt = 0u32;
        let mut client_attempt = 0u32;

        loop {
            let body_str = body.map(|b| b.to_string()).unwrap_or_default();
            let header = crate::auth::sign(
                &self.inner.api_key,
                &self.inner.secret,
                method.as_str(),
                path_and_query,
                &body_str,
            );
            let url = format!("{}{}", self.inner.base_url, path_and_query);
            let mut request = self
                .inner
                .http
                .request(method.clone(), &url)
                .header(reqwest::header::AUTHORIZATION, header);
            if let Some(b) = body {
                request = request.json(b);
            }

            let outcome = request.send().await;

            let response = match outcome {
                Ok(resp) => resp,
                Err(err) => {
                    transient_attempt += 1;
                    let wait = backoff::transient_delay(transient_attempt + 1);
                    tracing::warn!(error = %err, attempt = transient_attempt, delay_secs = wait.as_secs(), "transport error, retrying");
                    tokio::time::sleep(wait).await;
                    continue;
                }
            };

            if response.status().is_success() {
                return Ok(response);
            }

            if response.status().is_server_error() {
                transient_attempt += 1;
                let wait = backoff::transient_delay(transient_attempt + 1);
                tracing::warn!(status = %response.status(), attempt = transient_attempt, delay_secs = wait.as_secs(), "transient REST error, retrying");
                tokio::time::sleep(wait).await;
                continue;
            }

            client_attempt += 1;
            let status = response.status();
            if client_attempt >= CLIENT_ERROR_MAX_ATTEMPTS {
                let body = response.text().await.unwrap_or_default();
                return Err(RestError::Http { path: path_and_query.to_string(), status: status.as_u16(), body });
            }
            let wait = backoff::client_error_delay(client_attempt);
            tracing::warn!(status = %status, attempt = client_attempt, delay_secs = wait.as_secs(), "client REST error, retrying");
            tokio::time::sleep(wait).await;
        }
    }

    pub async fn get_json(&self, path_and_query: &str) -> Result<Value, RestError> {
        let resp = self.execute(Method::GET, path_and_query, None).await?;
        Ok(resp.json().await?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T, RestError> {
        let resp = self.execute(Method::GET, path_and_query, None).await?;
        Ok(resp.json().await?)
    }

    /// `PATCH` a resource, accepting the control plane's `202 Accepted` as
    /// the only success status.
    pub async fn patch(&self, path: &str, body: &Value) -> Result<(), RestError> {
        let resp = self.execute(Method::PATCH, path, Some(body)).await?;
        if resp.status() != StatusCode::ACCEPTED && !resp.status().is_success() {
            return Err(RestError::Http {
                path: path.to_string(),
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, RestError> {
        let resp = self.execute(Method::POST, path, Some(body)).await?;
        Ok(resp.json().await?)
    }

    /// List a resource, following `meta.next` pagination links until
    /// exhausted. Each page's `objects` array is deserialized as `T`.
    pub async fn list<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<Vec<T>, RestError> {
        let mut out = Vec::new();
        let mut next: Option<String> = Some(path_and_query.to_string());

        while let Some(page_path) = next.take() {
            let page: Value = self.get_json(&page_path).await?;
            let objects = page
                .get("objects")
                .and_then(Value::as_array)
                .ok_or(RestError::MissingField("objects"))?;
            for obj in objects {
                out.push(serde_json::from_value(obj.clone())?);
            }

            next = page
                .get("meta")
                .and_then(|m| m.get("next"))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
        }

        Ok(out)
    }
}
