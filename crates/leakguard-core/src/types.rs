use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Categories of sensitive data the detector can emit.
///
/// Design principles:
/// - Closed set: adding a category means adding a catalog rule as well
/// - No heap allocations in enum (all variants are `Copy`)
/// - `Unknown` is a parse fallback only, no rule ever emits it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Email,
    Phone,
    Address,
    IpAddress,
    CreditCard,
    Ssn,
    ApiKey,
    SecretKey,
    #[serde(alias = "JWT")]
    AccessToken,
    PrivateKey,
    Mnemonic,
    Wallet,
    Password,
    CustomLiteral,
    #[serde(other)]
    Unknown,
}

impl EntityType {
    /// Every variant, in declaration order.
    pub const ALL: [EntityType; 15] = [
        Self::Email,
        Self::Phone,
        Self::Address,
        Self::IpAddress,
        Self::CreditCard,
        Self::Ssn,
        Self::ApiKey,
        Self::SecretKey,
        Self::AccessToken,
        Self::PrivateKey,
        Self::Mnemonic,
        Self::Wallet,
        Self::Password,
        Self::CustomLiteral,
        Self::Unknown,
    ];

    /// Tag used in placeholders and serialized metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "EMAIL",
            Self::Phone => "PHONE",
            Self::Address => "ADDRESS",
            Self::IpAddress => "IP_ADDRESS",
            Self::CreditCard => "CREDIT_CARD",
            Self::Ssn => "SSN",
            Self::ApiKey => "API_KEY",
            Self::SecretKey => "SECRET_KEY",
            Self::AccessToken => "ACCESS_TOKEN",
            Self::PrivateKey => "PRIVATE_KEY",
            Self::Mnemonic => "MNEMONIC",
            Self::Wallet => "WALLET",
            Self::Password => "PASSWORD",
            Self::CustomLiteral => "CUSTOM_LITERAL",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Placeholder for the `ordinal`-th redacted occurrence, e.g. `[EMAIL_2]`
    pub fn placeholder(&self, ordinal: usize) -> String {
        format!("[{}_{}]", self.as_str(), ordinal)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse sensitivity tier attached to a rule and its detections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Informative confidence attached to detections; not used in scoring
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Low => 0.35,
            Self::Medium => 0.65,
            Self::High => 0.9,
        }
    }
}

/// A single accepted match.
///
/// `start`/`end` are UTF-8 byte offsets into the scanned text, half-open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedEntity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Byte offset of the first matched byte (always a char boundary)
    pub start: usize,
    /// Byte offset one past the match, not a character index
    pub end: usize,
    /// Matched text, zeroized on drop
    pub text: String,
    pub severity: Severity,
    pub confidence: f64,
    pub description: String,
}

impl DetectedEntity {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Half-open overlap test against `[start, end)`
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start.max(start) < self.end.min(end)
    }
}

impl Zeroize for DetectedEntity {
    fn zeroize(&mut self) {
        self.text.zeroize();
    }
}

impl Drop for DetectedEntity {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Output of one scan: entities in rule order plus the normalized score.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    pub entities: Vec<DetectedEntity>,
    pub sensitivity: f64,
}

impl DetectionResult {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// True when at least one entity of `entity_type` was accepted
    pub fn contains(&self, entity_type: EntityType) -> bool {
        self.entities.iter().any(|e| e.entity_type == entity_type)
    }

    /// Distinct entity types in first-seen order
    pub fn types(&self) -> Vec<EntityType> {
        let mut seen = Vec::new();
        for entity in &self.entities {
            if !seen.contains(&entity.entity_type) {
                seen.push(entity.entity_type);
            }
        }
        seen
    }
}
