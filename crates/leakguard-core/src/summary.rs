//! Roll-up of pipeline metadata across a conversation, for privacy panels.

use crate::pipeline::ResponseMetadata;
use crate::types::EntityType;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacySummary {
    /// Responses inspected
    pub total: usize,
    /// Responses whose sensitivity reached the high threshold
    pub high_sensitivity: usize,
    /// Placeholders substituted across all responses
    pub redactions: usize,
    /// Responses for which the policy allowed no provider at all
    pub without_providers: usize,
    pub entity_counts: BTreeMap<EntityType, usize>,
}

impl PrivacySummary {
    pub fn collect<'a, I>(responses: I, high_threshold: f64) -> Self
    where
        I: IntoIterator<Item = &'a ResponseMetadata>,
    {
        let mut summary = Self::default();
        for metadata in responses {
            summary.record(metadata, high_threshold);
        }
        summary
    }

    pub fn record(&mut self, metadata: &ResponseMetadata, high_threshold: f64) {
        self.total += 1;
        if metadata.detection.sensitivity >= high_threshold {
            self.high_sensitivity += 1;
        }
        if metadata.policy.allowed_providers.is_empty() {
            self.without_providers += 1;
        }
        self.redactions += metadata.redaction.mapping.len();
        for entity in &metadata.detection.entities {
            *self.entity_counts.entry(entity.entity_type).or_insert(0) += 1;
        }
    }
}
