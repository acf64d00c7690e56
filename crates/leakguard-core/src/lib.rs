//! leakguard-core - sensitive-data scanning for LLM prompts
//!
//! Scans free-form text for secrets and personal data, scores how sensitive
//! it is, decides where the text may be sent, and rewrites it with numbered
//! placeholders that can be mapped back to the originals.
//!
//! ```text
//!   prompt ──► detector ──► DetectionResult ──► policy ──► PolicyDecision
//!                                  │                           │
//!                                  └──────────► redactor ◄─────┘
//!                                                   │
//!                                          RedactionResult ──► provider
//! ```
//!
//! Detection, evaluation and redaction are pure and synchronous. The
//! [`Pipeline`] is the only async entry point; it awaits the caller's
//! provider capability once and does nothing else that can suspend.

pub mod catalog;
pub mod detector;
pub mod error;
pub mod pipeline;
pub mod policy;
pub mod redactor;
pub mod summary;
pub mod types;

pub use catalog::{describe, DetectorRule, RuleInfo};
pub use detector::{detect, detect_with, luhn_valid, ScanOptions};
pub use error::{Error, Result};
pub use pipeline::{
    run, ChatRequest, ChatResponse, Pipeline, ProviderFailure, ResponseMetadata, BLOCKED_MESSAGE,
};
pub use policy::{
    evaluate, Disposition, PolicyBuilder, PolicyDecision, PolicyRules, RequestContext,
    SensitivityThresholds,
};
pub use redactor::{redact, RedactionMappingEntry, RedactionResult};
pub use summary::PrivacySummary;
pub use types::{DetectedEntity, DetectionResult, EntityType, Severity};
