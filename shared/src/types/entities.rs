//! Configuration entities owned by the store: LLM configs, prompts and schedules

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use uuid::Uuid;

use super::{LlmId, PromptId, ScheduleId};

/// A configured model endpoint: which provider, which model, which credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub id: LlmId,
    pub name: String,
    pub provider: String,
    pub model: String,
    /// Empty means "use the provider's bootstrap credential"
    #[serde(default)]
    pub credential: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Free-form provider options (max_tokens, web_search, ...)
    #[serde(default)]
    pub config: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LlmConfig {
    pub fn new(name: impl Into<String>, provider: impl Into<String>, model: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            provider: provider.into(),
            model: model.into(),
            credential: String::new(),
            base_url: None,
            enabled: true,
            config: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = credential.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// A reusable instruction sent verbatim to every configured provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: PromptId,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            tags: Vec::new(),
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Sampling temperature of a schedule: a fixed value or a fresh draw per prompt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TemperatureRepr", into = "TemperatureRepr")]
pub enum TemperatureSetting {
    Fixed(f32),
    Random,
}

impl TemperatureSetting {
    /// Validated fixed temperature
    pub fn fixed(value: f32) -> Result<Self, String> {
        if !(0.0..=2.0).contains(&value) {
            return Err(format!("Temperature {value} must be between 0.0 and 2.0"));
        }
        Ok(TemperatureSetting::Fixed(value))
    }

    /// Resolve into a concrete temperature; `Random` draws uniformly from [0, 1)
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        match self {
            TemperatureSetting::Fixed(value) => *value,
            TemperatureSetting::Random => rng.gen::<f32>(),
        }
    }
}

impl Default for TemperatureSetting {
    fn default() -> Self {
        TemperatureSetting::Fixed(0.7)
    }
}

impl fmt::Display for TemperatureSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureSetting::Fixed(value) => write!(f, "{value}"),
            TemperatureSetting::Random => write!(f, "random"),
        }
    }
}

impl std::str::FromStr for TemperatureSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("random") {
            return Ok(TemperatureSetting::Random);
        }
        let value: f32 = trimmed
            .parse()
            .map_err(|_| format!("Invalid temperature '{s}': expected a number or \"random\""))?;
        TemperatureSetting::fixed(value)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TemperatureRepr {
    Number(f32),
    Text(String),
}

impl TryFrom<TemperatureRepr> for TemperatureSetting {
    type Error = String;

    fn try_from(repr: TemperatureRepr) -> Result<Self, Self::Error> {
        match repr {
            TemperatureRepr::Number(value) => TemperatureSetting::fixed(value),
            TemperatureRepr::Text(text) => text.parse(),
        }
    }
}

impl From<TemperatureSetting> for TemperatureRepr {
    fn from(setting: TemperatureSetting) -> Self {
        match setting {
            TemperatureSetting::Fixed(value) => TemperatureRepr::Number(value),
            TemperatureSetting::Random => TemperatureRepr::Text("random".to_string()),
        }
    }
}

/// Recurring binding of prompts, LLMs and cron timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    pub prompt_ids: BTreeSet<PromptId>,
    pub llm_ids: BTreeSet<LlmId>,
    /// Standard 5-field cron expression
    pub cron: String,
    #[serde(default)]
    pub temperature: TemperatureSetting,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    /// Earliest due time for an enabled schedule, `None` while disabled
    #[serde(default)]
    pub next_run: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    pub fn new(name: impl Into<String>, cron: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            prompt_ids: BTreeSet::new(),
            llm_ids: BTreeSet::new(),
            cron: cron.into(),
            temperature: TemperatureSetting::default(),
            enabled: true,
            last_run: None,
            next_run: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_prompts(mut self, prompt_ids: impl IntoIterator<Item = PromptId>) -> Self {
        self.prompt_ids = prompt_ids.into_iter().collect();
        self
    }

    pub fn with_llms(mut self, llm_ids: impl IntoIterator<Item = LlmId>) -> Self {
        self.llm_ids = llm_ids.into_iter().collect();
        self
    }

    pub fn with_temperature(mut self, temperature: TemperatureSetting) -> Self {
        self.temperature = temperature;
        self
    }

    /// Whether the tick loop should trigger this schedule at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.next_run.is_some_and(|next| next <= now)
    }
}

fn default_enabled() -> bool {
    true
}
