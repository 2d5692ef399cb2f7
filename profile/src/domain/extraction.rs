// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Extraction Boundary
//!
//! The natural-language extraction service is an external collaborator. Its
//! output is untrusted: any field may be missing, mistyped or out of range.
//! [`ExtractionResult`] is the only place untyped JSON lives; the pattern
//! builder turns it into a strict `PatternRecord` and nothing downstream
//! looks at raw JSON again.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw extraction fields exactly as the service returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionResult {
    pub symbols: Option<Value>,
    pub emotions: Option<Value>,
    pub archetype_hints: Option<Value>,
    pub vividness_score: Option<Value>,
    pub abstractness_score: Option<Value>,
}

impl From<Value> for ExtractionResult {
    /// Never fails: a non-object payload yields an empty result, which the
    /// builder fills with defaults.
    fn from(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Self::default();
        };
        Self {
            symbols: fields.remove("symbols"),
            emotions: fields.remove("emotions"),
            archetype_hints: fields.remove("archetype_hints"),
            vividness_score: fields.remove("vividness_score"),
            abstractness_score: fields.remove("abstractness_score"),
        }
    }
}

impl ExtractionResult {
    /// Recover the JSON object from model text that may wrap it in Markdown
    /// fences or surrounding prose.
    pub fn from_model_output(text: &str) -> Result<Self, ExtractionError> {
        let start = text
            .find('{')
            .ok_or_else(|| ExtractionError::Malformed("no JSON object in model output".to_string()))?;
        let end = text
            .rfind('}')
            .filter(|end| *end > start)
            .ok_or_else(|| ExtractionError::Malformed("unterminated JSON object in model output".to_string()))?;

        let value: Value = serde_json::from_str(&text[start..=end])
            .map_err(|e| ExtractionError::Malformed(e.to_string()))?;
        Ok(Self::from(value))
    }
}

/// Input handed to the extraction service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub text: String,
    /// A prior interpretation of the dream, if the user already has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
}

/// Port for the external extraction service.
#[async_trait]
pub trait PatternExtractor: Send + Sync {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, ExtractionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Extraction service unreachable: {0}")]
    Network(String),

    #[error("Extraction service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed extraction response: {0}")]
    Malformed(String),

    #[error("No extraction service configured")]
    NotConfigured,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_non_object_is_empty() {
        assert_eq!(ExtractionResult::from(json!([1, 2, 3])), ExtractionResult::default());
        assert_eq!(ExtractionResult::from(Value::Null), ExtractionResult::default());
    }

    #[test]
    fn test_from_model_output_strips_fences() {
        let text = "Here you go:\n```json\n{\"symbols\": [\"water\"], \"vividness_score\": 0.9}\n```";
        let result = ExtractionResult::from_model_output(text).unwrap();
        assert_eq!(result.symbols, Some(json!(["water"])));
        assert_eq!(result.vividness_score, Some(json!(0.9)));
        assert!(result.emotions.is_none());
    }

    #[test]
    fn test_from_model_output_without_object() {
        let err = ExtractionResult::from_model_output("I could not analyze this dream.").unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed(_)));
    }
}
