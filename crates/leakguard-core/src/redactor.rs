use crate::types::{DetectedEntity, DetectionResult, EntityType};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};
use zeroize::Zeroize;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[A-Z_]+_\d+\]").expect("placeholder pattern must compile"));

/// One replaced span. `start`/`end` locate the placeholder in the redacted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionMappingEntry {
    pub placeholder: String,
    /// Original text, zeroized on drop
    pub original: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// UTF-8 byte offset of the placeholder in `redacted_text`
    pub start: usize,
    /// UTF-8 byte offset one past the placeholder, not a character index
    pub end: usize,
}

impl Zeroize for RedactionMappingEntry {
    fn zeroize(&mut self) {
        self.original.zeroize();
    }
}

impl Drop for RedactionMappingEntry {
    fn drop(&mut self) {
        self.zeroize();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactionResult {
    pub redacted_text: String,
    pub mapping: Vec<RedactionMappingEntry>,
}

impl RedactionResult {
    /// Text passed through untouched, with an empty mapping
    pub fn unchanged(text: &str) -> Self {
        Self {
            redacted_text: text.to_string(),
            mapping: Vec::new(),
        }
    }

    /// Put every original back at its placeholder span.
    ///
    /// Entries whose span does not fit the redacted text are left as-is.
    pub fn restore(&self) -> String {
        let text = &self.redacted_text;
        let mut restored = String::with_capacity(text.len());
        let mut last_idx = 0;

        for entry in &self.mapping {
            let Some(between) = text.get(last_idx..entry.start) else {
                continue;
            };
            if text.get(entry.start..entry.end).is_none() {
                continue;
            }
            restored.push_str(between);
            restored.push_str(&entry.original);
            last_idx = entry.end;
        }

        restored.push_str(&text[last_idx..]);
        restored
    }

    /// Swap placeholders found anywhere in `text` (e.g. a provider reply)
    /// for their originals. Unknown placeholders are kept verbatim.
    pub fn rehydrate(&self, text: &str) -> String {
        if self.mapping.is_empty() {
            return text.to_string();
        }

        let originals: HashMap<&str, &str> = self
            .mapping
            .iter()
            .map(|e| (e.placeholder.as_str(), e.original.as_str()))
            .collect();

        PLACEHOLDER
            .replace_all(text, |caps: &Captures| {
                let token = &caps[0];
                originals.get(token).copied().unwrap_or(token).to_string()
            })
            .into_owned()
    }
}

/// Replace every entity whose type is listed in `redact_types` with a
/// numbered placeholder such as `[EMAIL_2]`.
///
/// Entities are applied left to right in original-text order regardless of
/// their order in `detection`. Counters are per type and start at 1.
/// Unlisted types are left in place and do not consume a counter.
pub fn redact(
    original: &str,
    detection: &DetectionResult,
    redact_types: &[EntityType],
) -> RedactionResult {
    if original.is_empty() {
        return RedactionResult::unchanged(original);
    }

    let mut sorted: Vec<&DetectedEntity> = detection.entities.iter().collect();
    sorted.sort_by_key(|e| e.start);

    let mut redacted = String::with_capacity(original.len());
    let mut mapping = Vec::new();
    let mut counters: HashMap<EntityType, usize> = HashMap::new();
    let mut last_idx = 0;

    for entity in sorted {
        if !redact_types.contains(&entity.entity_type) {
            continue;
        }

        if entity.start < last_idx {
            warn!(
                entity_type = %entity.entity_type,
                start = entity.start,
                "skipping entity overlapping an earlier redaction"
            );
            continue;
        }

        let Some(span) = original.get(entity.start..entity.end) else {
            warn!(
                entity_type = %entity.entity_type,
                start = entity.start,
                end = entity.end,
                "skipping entity outside the text"
            );
            continue;
        };

        let counter = counters.entry(entity.entity_type).or_insert(0);
        *counter += 1;
        let placeholder = entity.entity_type.placeholder(*counter);

        redacted.push_str(&original[last_idx..entity.start]);
        let start = redacted.len();
        redacted.push_str(&placeholder);

        mapping.push(RedactionMappingEntry {
            placeholder,
            original: span.to_string(),
            entity_type: entity.entity_type,
            start,
            end: redacted.len(),
        });

        last_idx = entity.end;
    }

    redacted.push_str(&original[last_idx..]);

    debug!(replaced = mapping.len(), "redaction applied");

    RedactionResult {
        redacted_text: redacted,
        mapping,
    }
}
