/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, anyhow};
use base64::prelude::*;
use http::{HeaderMap, HeaderValue, StatusCode, header};
use serde_json::Value;
use thiserror::Error;

use super::ApiShape;
use crate::config::LibratoSinkConfig;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("error response: {code} {body}")]
    ErrorResponse { code: StatusCode, body: String },
    #[error("measurements rejected: {0}")]
    Rejected(Value),
}

/// Delivers one encoded batch to the remote API.
pub trait PayloadSender {
    fn post(
        &self,
        shape: ApiShape,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<(), SubmitError>>;
}

pub struct HttpSender {
    client: reqwest::Client,
    tagged_url: String,
    legacy_url: String,
    timeout: Duration,
}

impl HttpSender {
    pub fn new(config: &LibratoSinkConfig) -> anyhow::Result<Self> {
        let static_headers = build_static_headers(config)?;
        let client = reqwest::Client::builder()
            .default_headers(static_headers)
            .timeout(config.flush_timeout)
            .build()
            .context("failed to build http client")?;
        Ok(HttpSender {
            client,
            tagged_url: format!("{}{}", config.api, ApiShape::Tagged.api_path()),
            legacy_url: format!("{}{}", config.api, ApiShape::Legacy.api_path()),
            timeout: config.flush_timeout,
        })
    }

    fn url(&self, shape: ApiShape) -> &str {
        match shape {
            ApiShape::Tagged => &self.tagged_url,
            ApiShape::Legacy => &self.legacy_url,
        }
    }

    fn map_request_error(&self, e: reqwest::Error) -> SubmitError {
        if e.is_timeout() {
            SubmitError::Timeout(self.timeout)
        } else {
            SubmitError::Request(e)
        }
    }
}

impl PayloadSender for HttpSender {
    async fn post(&self, shape: ApiShape, body: Vec<u8>) -> Result<(), SubmitError> {
        let rsp = self
            .client
            .post(self.url(shape))
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let code = rsp.status();
        let body = rsp.text().await.map_err(|e| self.map_request_error(e))?;
        check_response(code, &body)
    }
}

fn build_static_headers(config: &LibratoSinkConfig) -> anyhow::Result<HeaderMap> {
    let mut static_headers = HeaderMap::new();
    static_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    let user_agent = HeaderValue::from_str(&crate::build::user_agent())
        .map_err(|e| anyhow!("invalid user agent value: {e}"))?;
    static_headers.insert(header::USER_AGENT, user_agent);
    static_headers.insert(header::AUTHORIZATION, basic_auth(config)?);
    Ok(static_headers)
}

fn basic_auth(config: &LibratoSinkConfig) -> anyhow::Result<HeaderValue> {
    let credentials = BASE64_STANDARD.encode(format!("{}:{}", config.email, config.token));
    let mut value = HeaderValue::from_str(&format!("Basic {credentials}"))
        .map_err(|e| anyhow!("invalid authorization value: {e}"))?;
    value.set_sensitive(true);
    Ok(value)
}

/// The tagged API may accept a payload only partially, reporting the
/// rejected part in an `errors` member of a 2xx response.
fn check_response(code: StatusCode, body: &str) -> Result<(), SubmitError> {
    if !code.is_success() {
        return Err(SubmitError::ErrorResponse {
            code,
            body: body.to_string(),
        });
    }

    if !body.contains("errors") {
        return Ok(());
    }
    let Ok(Value::Object(mut map)) = serde_json::from_str::<Value>(body) else {
        return Ok(());
    };
    match map.remove("errors") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Array(a)) if a.is_empty() => Ok(()),
        Some(Value::Object(o)) if o.is_empty() => Ok(()),
        Some(errors) => Err(SubmitError::Rejected(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn auth_header() {
        let config = crate::config::load_str(
            "librato:\n  email: john@example.com\n  token: abc\n  host: web1\n",
        )
        .unwrap();
        let value = basic_auth(&config).unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "Basic am9obkBleGFtcGxlLmNvbTphYmM="
        );
        assert!(value.is_sensitive());
    }

    #[test]
    fn response_ok() {
        assert!(check_response(StatusCode::OK, "").is_ok());
        assert!(check_response(StatusCode::ACCEPTED, "{\"errors\":[]}").is_ok());
        assert!(check_response(StatusCode::OK, "{\"errors\":{}}").is_ok());
        assert!(check_response(StatusCode::OK, "no errors here").is_ok());
    }

    #[test]
    fn response_rejected() {
        let r = check_response(StatusCode::ACCEPTED, r#"{"errors":[{"param":"name"}]}"#);
        match r {
            Err(SubmitError::Rejected(v)) => assert_eq!(v, json!([{"param": "name"}])),
            _ => panic!("expect rejected"),
        }
    }

    #[test]
    fn response_error() {
        let r = check_response(StatusCode::UNAUTHORIZED, "Credentials are required");
        match r {
            Err(SubmitError::ErrorResponse { code, body }) => {
                assert_eq!(code, StatusCode::UNAUTHORIZED);
                assert_eq!(body, "Credentials are required");
            }
            _ => panic!("expect error response"),
        }
    }
}
