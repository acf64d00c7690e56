//! Static table of detector rules.
//!
//! The catalog is built once per process and never mutated. Rules are kept
//! sorted by descending weight; ties keep declaration order. The detector
//! walks them in that order, so a heavier rule always claims a span first.

use crate::detector::luhn_valid;
use crate::types::{EntityType, Severity};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Pure predicate run against a matched substring before it is accepted.
pub type Validator = fn(&str) -> bool;

/// Immutable detector rule. Rules only differ in data.
#[derive(Debug)]
pub struct DetectorRule {
    pub entity_type: EntityType,
    pub description: &'static str,
    pub severity: Severity,
    /// Contribution to the raw sensitivity sum for every accepted match
    pub weight: u32,
    /// Union of patterns, evaluated in declaration order
    pub patterns: Vec<Regex>,
    pub validator: Option<Validator>,
}

impl DetectorRule {
    fn new(
        entity_type: EntityType,
        description: &'static str,
        severity: Severity,
        weight: u32,
        patterns: &[&str],
    ) -> Self {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p).expect("built-in detector pattern must compile"))
            .collect();
        Self {
            entity_type,
            description,
            severity,
            weight,
            patterns,
            validator: None,
        }
    }

    fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Runs the validator, if any. Rules without one accept every match.
    pub fn validate(&self, candidate: &str) -> bool {
        self.validator.map_or(true, |validate| validate(candidate))
    }
}

/// Presentation metadata for one rule, safe to hand to UI layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleInfo {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub description: &'static str,
    pub severity: Severity,
    pub weight: u32,
}

/// Ordered rule list plus the precomputed weight total.
#[derive(Debug)]
pub struct Catalog {
    rules: Vec<DetectorRule>,
    max_weight: u32,
}

impl Catalog {
    fn builtin() -> Self {
        let mut rules = vec![
            DetectorRule::new(
                EntityType::PrivateKey,
                "PEM-encoded private key block",
                Severity::High,
                10,
                &[r"-----BEGIN (?:[A-Z0-9]+ )*PRIVATE KEY-----[\s\S]*?-----END (?:[A-Z0-9]+ )*PRIVATE KEY-----"],
            ),
            DetectorRule::new(
                EntityType::SecretKey,
                "Cloud access key ID or secret access key",
                Severity::High,
                9,
                &[
                    r"\b(?:AKIA|ASIA)[A-Z0-9]{12,}\b",
                    r#"(?i)\baws_secret_access_key["']?\s*[:=]\s*["']?[A-Za-z0-9/+]{40}"#,
                ],
            ),
            DetectorRule::new(
                EntityType::Mnemonic,
                "Wallet seed phrase (12 to 24 lowercase words alone on a line)",
                Severity::High,
                9,
                // BIP-39 phrase lengths only: 12, 15, 18, 21 or 24 words.
                &[r"(?mR)^(?:[a-z]{3,8} ){11}(?:(?:[a-z]{3,8} ){3}){0,4}[a-z]{3,8}$"],
            ),
            DetectorRule::new(
                EntityType::ApiKey,
                "API key for a hosted service",
                Severity::High,
                8,
                &[
                    r"\b(?:sk|pk)-[A-Za-z0-9]{10,}\b",
                    r"\bgh[pousr]_[A-Za-z0-9]{36,}\b",
                    r"\bAIza[0-9A-Za-z_-]{35}",
                ],
            ),
            DetectorRule::new(
                EntityType::AccessToken,
                "Bearer or JSON Web Token",
                Severity::High,
                8,
                &[
                    r"\beyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+",
                    r"(?i)\bbearer\s+[A-Za-z0-9._~+/-]{20,}=*",
                ],
            ),
            DetectorRule::new(
                EntityType::CreditCard,
                "Payment card number (Luhn-checked)",
                Severity::High,
                7,
                &[r"\b(?:\d[ -]?){12,18}\d\b"],
            )
            .with_validator(luhn_valid),
            DetectorRule::new(
                EntityType::Ssn,
                "US Social Security Number",
                Severity::High,
                7,
                &[r"\b\d{3}-\d{2}-\d{4}\b"],
            ),
            DetectorRule::new(
                EntityType::Wallet,
                "Ethereum or Bitcoin wallet address",
                Severity::Medium,
                6,
                &[
                    r"\b0x[a-fA-F0-9]{40}\b",
                    r"\bbc1[a-z0-9]{25,59}\b",
                    r"\b[13][a-km-zA-HJ-NP-Z1-9]{25,34}\b",
                ],
            ),
            DetectorRule::new(
                EntityType::Password,
                "Password assignment",
                Severity::Medium,
                6,
                &[r"(?i)\b(?:password|passwd|pwd|pass)\s*[:=]\s*\S+"],
            ),
            // Patterns come from the caller's custom literals at scan time.
            DetectorRule::new(
                EntityType::CustomLiteral,
                "Custom literal configured in policy",
                Severity::Medium,
                5,
                &[],
            ),
            DetectorRule::new(
                EntityType::IpAddress,
                "IPv4 address",
                Severity::Medium,
                4,
                &[r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b"],
            ),
            DetectorRule::new(
                EntityType::Email,
                "Email address",
                Severity::Medium,
                4,
                &[r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"],
            ),
            DetectorRule::new(
                EntityType::Phone,
                "Phone number",
                Severity::Medium,
                3,
                &[r"\b(?:\+?\d{1,3}[ .-]?)?(?:\(?\d{2,4}\)?[ .-]?)?\d{3,4}[ .-]?\d{4}\b"],
            ),
            DetectorRule::new(
                EntityType::Address,
                "Street address",
                Severity::Low,
                2,
                &[r"\b\d{1,5}\s+(?:[A-Z][a-z]+\s+){1,3}(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Court|Ct|Way|Place|Pl)\b\.?"],
            ),
        ];

        // Stable: equal weights keep declaration order.
        rules.sort_by(|a, b| b.weight.cmp(&a.weight));
        let max_weight = rules.iter().map(|r| r.weight).sum();

        Self { rules, max_weight }
    }

    pub fn rules(&self) -> &[DetectorRule] {
        &self.rules
    }

    pub fn max_weight(&self) -> u32 {
        self.max_weight
    }

    pub fn rule_for(&self, entity_type: EntityType) -> Option<&DetectorRule> {
        self.rules.iter().find(|r| r.entity_type == entity_type)
    }

    pub fn describe(&self) -> Vec<RuleInfo> {
        self.rules
            .iter()
            .map(|r| RuleInfo {
                entity_type: r.entity_type,
                description: r.description,
                severity: r.severity,
                weight: r.weight,
            })
            .collect()
    }
}

static CATALOG: Lazy<Catalog> = Lazy::new(Catalog::builtin);

/// The process-wide catalog
pub fn catalog() -> &'static Catalog {
    &CATALOG
}

/// Rules in evaluation order (descending weight)
pub fn rules() -> &'static [DetectorRule] {
    CATALOG.rules()
}

/// Sum of all rule weights; the sensitivity denominator
pub fn max_weight() -> u32 {
    CATALOG.max_weight()
}

/// Read-only rule metadata for presentation layers
pub fn describe() -> Vec<RuleInfo> {
    CATALOG.describe()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_sorted_by_descending_weight() {
        let weights: Vec<_> = rules().iter().map(|r| r.weight).collect();
        let mut sorted = weights.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(weights, sorted);
    }

    #[test]
    fn test_ties_keep_declaration_order() {
        let order: Vec<_> = rules().iter().map(|r| r.entity_type).collect();
        let pos = |t| order.iter().position(|x| *x == t).unwrap();
        assert!(pos(EntityType::SecretKey) < pos(EntityType::Mnemonic));
        assert!(pos(EntityType::ApiKey) < pos(EntityType::AccessToken));
        assert!(pos(EntityType::CreditCard) < pos(EntityType::Ssn));
        assert!(pos(EntityType::IpAddress) < pos(EntityType::Email));
    }

    #[test]
    fn test_max_weight_is_sum() {
        let sum: u32 = rules().iter().map(|r| r.weight).sum();
        assert_eq!(max_weight(), sum);
        assert!(max_weight() > 0);
    }

    #[test]
    fn test_every_rule_has_positive_weight() {
        assert!(rules().iter().all(|r| r.weight > 0));
    }

    #[test]
    fn test_only_credit_card_validates() {
        for rule in rules() {
            assert_eq!(
                rule.validator.is_some(),
                rule.entity_type == EntityType::CreditCard,
                "unexpected validator on {}",
                rule.entity_type
            );
        }
    }

    #[test]
    fn test_unknown_has_no_rule() {
        assert!(catalog().rule_for(EntityType::Unknown).is_none());
        for entity_type in EntityType::ALL {
            if entity_type != EntityType::Unknown {
                assert!(catalog().rule_for(entity_type).is_some(), "{entity_type} missing");
            }
        }
    }

    #[test]
    fn test_describe_matches_rules() {
        let info = describe();
        assert_eq!(info.len(), rules().len());
        assert_eq!(info[0].entity_type, EntityType::PrivateKey);
        assert_eq!(info[0].severity, Severity::High);
    }

    #[test]
    fn test_rule_validate_defaults_to_accept() {
        let email = catalog().rule_for(EntityType::Email).unwrap();
        assert!(email.validate("anything"));
        let card = catalog().rule_for(EntityType::CreditCard).unwrap();
        assert!(!card.validate("1234 1234 1234 1234"));
    }
}
