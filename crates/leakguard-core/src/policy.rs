use crate::error::Result;
use crate::types::{DetectionResult, EntityType};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

const DEFAULT_HIGH_THRESHOLD: f64 = 0.7;

/// Per-entity-type instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Only local providers may see the text
    LocalOnly,
    /// Replace the span with a placeholder before sending
    Redact,
    /// No special handling; unrecognised values land here too
    #[serde(rename = "none", other)]
    Allow,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityThresholds {
    #[serde(default = "default_high")]
    pub high: f64,
}

fn default_high() -> f64 {
    DEFAULT_HIGH_THRESHOLD
}

impl Default for SensitivityThresholds {
    fn default() -> Self {
        Self {
            high: DEFAULT_HIGH_THRESHOLD,
        }
    }
}

/// Routing and redaction policy, supplied by the caller on every evaluation.
///
/// Fields missing from a parsed document fall back to an empty entity map,
/// a 0.7 high threshold and empty provider lists. `Default` is the built-in
/// policy used when no rules are supplied at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRules {
    #[serde(default)]
    pub entities: BTreeMap<EntityType, Disposition>,
    #[serde(default)]
    pub sensitivity_thresholds: SensitivityThresholds,
    #[serde(default, rename = "localProviders", alias = "local_providers")]
    pub local_providers: Vec<String>,
    #[serde(default, rename = "defaultProviders", alias = "default_providers")]
    pub default_providers: Vec<String>,
    #[serde(default, alias = "customLiterals")]
    pub custom_literals: Vec<String>,
    #[serde(default, alias = "disabledEntities")]
    pub disabled_entities: Vec<EntityType>,
}

impl Default for PolicyRules {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PolicyRules {
    /// Policy with no dispositions, the default threshold and no providers
    pub fn empty() -> Self {
        Self {
            entities: BTreeMap::new(),
            sensitivity_thresholds: SensitivityThresholds::default(),
            local_providers: Vec::new(),
            default_providers: Vec::new(),
            custom_literals: Vec::new(),
            disabled_entities: Vec::new(),
        }
    }

    /// Built-in policy: secrets and financial identifiers stay local,
    /// contact details and passwords are redacted.
    pub fn builtin() -> Self {
        PolicyBuilder::default()
            .local_only(EntityType::SecretKey)
            .local_only(EntityType::ApiKey)
            .local_only(EntityType::AccessToken)
            .local_only(EntityType::PrivateKey)
            .local_only(EntityType::CreditCard)
            .local_only(EntityType::Ssn)
            .local_only(EntityType::Mnemonic)
            .redact(EntityType::Wallet)
            .redact(EntityType::Email)
            .redact(EntityType::Phone)
            .redact(EntityType::Password)
            .redact(EntityType::CustomLiteral)
            .high_threshold(DEFAULT_HIGH_THRESHOLD)
            .local_providers(["Ollama", "LMStudio", "5ire"])
            .build()
    }

    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    /// Parse a JSON policy document
    pub fn from_json_str(document: &str) -> Result<Self> {
        Ok(serde_json::from_str(document)?)
    }

    /// Parse a YAML policy document
    pub fn from_yaml_str(document: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(document)?)
    }

    pub fn disposition(&self, entity_type: EntityType) -> Disposition {
        self.entities
            .get(&entity_type)
            .copied()
            .unwrap_or(Disposition::Allow)
    }

    /// High threshold clamped to [0, 1]; NaN falls back to 0.7
    pub fn high_threshold(&self) -> f64 {
        let high = self.sensitivity_thresholds.high;
        if high.is_nan() {
            DEFAULT_HIGH_THRESHOLD
        } else {
            high.clamp(0.0, 1.0)
        }
    }
}

/// Builder for PolicyRules, starting from an empty policy
pub struct PolicyBuilder {
    rules: PolicyRules,
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self {
            rules: PolicyRules::empty(),
        }
    }
}

impl From<PolicyRules> for PolicyBuilder {
    fn from(rules: PolicyRules) -> Self {
        Self { rules }
    }
}

impl PolicyBuilder {
    pub fn disposition(mut self, entity_type: EntityType, disposition: Disposition) -> Self {
        self.rules.entities.insert(entity_type, disposition);
        self
    }

    pub fn local_only(self, entity_type: EntityType) -> Self {
        self.disposition(entity_type, Disposition::LocalOnly)
    }

    pub fn redact(self, entity_type: EntityType) -> Self {
        self.disposition(entity_type, Disposition::Redact)
    }

    pub fn high_threshold(mut self, high: f64) -> Self {
        self.rules.sensitivity_thresholds.high = high;
        self
    }

    pub fn local_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.local_providers = providers.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.default_providers = providers.into_iter().map(Into::into).collect();
        self
    }

    pub fn custom_literals<I, S>(mut self, literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.custom_literals = literals.into_iter().map(Into::into).collect();
        self
    }

    pub fn disable(mut self, entity_type: EntityType) -> Self {
        if !self.rules.disabled_entities.contains(&entity_type) {
            self.rules.disabled_entities.push(entity_type);
        }
        self
    }

    pub fn build(self) -> PolicyRules {
        self.rules
    }
}

/// What the caller asked for. Only `provider_name` influences the decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl RequestContext {
    pub fn for_provider(provider: impl Into<String>) -> Self {
        Self {
            provider_name: Some(provider.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDecision {
    /// Providers permitted to receive the request, in configured order
    pub allowed_providers: Vec<String>,
    /// One entry per entity whose type must be redacted
    pub redactions: Vec<EntityType>,
    pub block: bool,
}

static DEFAULT_RULES: Lazy<PolicyRules> = Lazy::new(PolicyRules::builtin);

/// Evaluate a detection against policy rules; `None` uses the built-in policy.
pub fn evaluate(
    detection: &DetectionResult,
    context: &RequestContext,
    rules: Option<&PolicyRules>,
) -> PolicyDecision {
    let rules = rules.unwrap_or(&DEFAULT_RULES);

    let local_only = detection
        .entities
        .iter()
        .find(|e| rules.disposition(e.entity_type) == Disposition::LocalOnly)
        .map(|e| e.entity_type);

    let route_local = local_only.is_some() || detection.sensitivity >= rules.high_threshold();
    let allowed_providers = if route_local {
        rules.local_providers.clone()
    } else {
        rules.default_providers.clone()
    };

    let redactions: Vec<EntityType> = detection
        .entities
        .iter()
        .filter(|e| rules.disposition(e.entity_type) == Disposition::Redact)
        .map(|e| e.entity_type)
        .collect();

    let mut block = allowed_providers.is_empty();

    if let Some(requested) = context.provider_name.as_deref() {
        if !allowed_providers.is_empty() && !allowed_providers.iter().any(|p| p == requested) {
            info!(provider = requested, "requested provider not permitted by policy");
            block = true;
        }
    }

    debug!(
        local_only = ?local_only,
        sensitivity = detection.sensitivity,
        allowed = allowed_providers.len(),
        redactions = redactions.len(),
        block,
        "policy evaluated"
    );

    PolicyDecision {
        allowed_providers,
        redactions,
        block,
    }
}
