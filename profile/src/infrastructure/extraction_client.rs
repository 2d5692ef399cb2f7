// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP Extraction Client
//!
//! Anti-corruption layer for the natural-language extraction service.
//! `POST {endpoint}/extract` with the dream text; the service answers either
//! with the pattern object itself or with `{"content": "<model text>"}`, in
//! which case the object is recovered from the text.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::domain::engine_config::{resolve_secret, ExtractionConfig};
use crate::domain::{ExtractionError, ExtractionRequest, ExtractionResult, PatternExtractor};

pub struct HttpPatternExtractor {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpPatternExtractor {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn from_config(config: &ExtractionConfig) -> anyhow::Result<Self> {
        let api_key = config.api_key.as_deref().map(resolve_secret).transpose()?;
        Self::new(
            config.endpoint.clone(),
            api_key,
            Duration::from_secs(config.timeout_seconds),
        )
    }
}

fn parse_body(body: Value) -> Result<ExtractionResult, ExtractionError> {
    match body {
        Value::Object(mut fields) if fields.len() == 1 && fields.contains_key("content") => {
            match fields.remove("content") {
                Some(Value::String(text)) => ExtractionResult::from_model_output(&text),
                Some(other) => Ok(ExtractionResult::from(other)),
                None => Ok(ExtractionResult::default()),
            }
        }
        Value::Object(_) => Ok(ExtractionResult::from(body)),
        other => Err(ExtractionError::Malformed(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

#[async_trait]
impl PatternExtractor for HttpPatternExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, ExtractionError> {
        let url = format!("{}/extract", self.endpoint.trim_end_matches('/'));
        debug!("Calling extraction service at {}", url);

        let mut builder = self.client.post(&url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ExtractionError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Status { status, body });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ExtractionError::Malformed(format!("Failed to parse response: {}", e)))?;

        parse_body(body)
    }
}
