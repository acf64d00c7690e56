//! Detection → policy → redaction → provider, in one call.
//!
//! The provider is an opaque async capability: it receives the redacted
//! prompt and returns text or fails. It is awaited at most once per request
//! and never retried here; timeouts and cancellation belong to the caller.

use crate::detector::{detect_with, ScanOptions};
use crate::policy::{evaluate, PolicyDecision, PolicyRules, RequestContext};
use crate::redactor::{redact, RedactionResult};
use crate::types::DetectionResult;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error text attached to responses the policy refused to forward
pub const BLOCKED_MESSAGE: &str = "Request blocked by privacy policy";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider_name = Some(provider.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_name = Some(model.into());
        self
    }

    pub fn context(&self) -> RequestContext {
        RequestContext {
            provider_name: self.provider_name.clone(),
            model_name: self.model_name.clone(),
            stream: self.stream,
        }
    }
}

/// Everything the pipeline computed for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub detection: DetectionResult,
    pub policy: PolicyDecision,
    pub redaction: RedactionResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_used: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: ResponseMetadata,
}

impl ChatResponse {
    pub fn is_blocked(&self) -> bool {
        self.metadata.policy.block
    }
}

/// The provider failed. `source` is the provider's own error, untouched.
#[derive(Debug, Error)]
#[error("provider call failed: {source}")]
pub struct ProviderFailure<E> {
    #[source]
    pub source: E,
    /// Detection, policy and redaction computed before the call
    pub metadata: Box<ResponseMetadata>,
}

/// Privacy pipeline bound to one policy.
#[derive(Debug, Clone)]
pub struct Pipeline {
    rules: PolicyRules,
    scan: ScanOptions,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PolicyRules::default())
    }
}

impl Pipeline {
    pub fn new(rules: PolicyRules) -> Self {
        let scan = ScanOptions::from(&rules);
        Self { rules, scan }
    }

    pub fn rules(&self) -> &PolicyRules {
        &self.rules
    }

    /// Run one request through the pipeline.
    ///
    /// A blocked request is a normal response: `error` is set, the redaction
    /// echoes the prompt with an empty mapping, and `invoke_provider` is
    /// never called.
    pub async fn run<F, Fut, E>(
        &self,
        request: &ChatRequest,
        invoke_provider: F,
    ) -> Result<ChatResponse, ProviderFailure<E>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        let detection = detect_with(&request.prompt, &self.scan);
        let policy = evaluate(&detection, &request.context(), Some(&self.rules));

        if policy.block {
            info!(
                provider = ?request.provider_name,
                entities = detection.entities.len(),
                sensitivity = detection.sensitivity,
                "request blocked by privacy policy"
            );
            return Ok(ChatResponse {
                content: None,
                error: Some(BLOCKED_MESSAGE.to_string()),
                metadata: ResponseMetadata {
                    detection,
                    policy,
                    redaction: RedactionResult::unchanged(&request.prompt),
                    provider_used: None,
                },
            });
        }

        let redaction = redact(&request.prompt, &detection, &policy.redactions);
        let prompt = redaction.redacted_text.clone();
        let metadata = ResponseMetadata {
            detection,
            policy,
            redaction,
            provider_used: request.provider_name.clone(),
        };

        debug!(
            provider = ?request.provider_name,
            redactions = metadata.redaction.mapping.len(),
            "invoking provider"
        );

        match invoke_provider(prompt).await {
            Ok(content) => Ok(ChatResponse {
                content: Some(content),
                error: None,
                metadata,
            }),
            Err(source) => {
                warn!(provider = ?request.provider_name, "provider call failed");
                Err(ProviderFailure {
                    source,
                    metadata: Box::new(metadata),
                })
            }
        }
    }
}

static DEFAULT_PIPELINE: Lazy<Pipeline> = Lazy::new(Pipeline::default);

/// Run `request` under the built-in policy.
pub async fn run<F, Fut, E>(
    request: &ChatRequest,
    invoke_provider: F,
) -> Result<ChatResponse, ProviderFailure<E>>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<String, E>>,
{
    DEFAULT_PIPELINE.run(request, invoke_provider).await
}
