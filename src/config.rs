//! Configuration for the provider endpoint, generation parameters
//! and persona selection. Loaded once at startup, immutable after.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::persona::{Persona, PersonaKind};

pub const DEFAULT_ENDPOINT: &str
  = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

pub const ENV_API_KEY: &str = "GITA_GUIDE_API_KEY";
pub const ENV_API_KEY_FALLBACK: &str = "GROQ_API_KEY";
pub const ENV_ENDPOINT: &str = "GITA_GUIDE_ENDPOINT";
pub const ENV_MODEL: &str = "GITA_GUIDE_MODEL";

/// Persistent warning shown while no credential is configured
pub const MISSING_KEY_MESSAGE: &str
  = "API key is missing. Set GITA_GUIDE_API_KEY or GROQ_API_KEY.";

/// Provider endpoint configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig
{   /// Full chat-completions URL
    pub endpoint_url: String
  , /// Bearer credential; never written back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>
  , /// Provider-specific headers (e.g. referer, title)
    pub extra_headers: BTreeMap<String, String>
}

impl ProviderConfig
{   pub fn new(endpoint_url: impl Into<String>, api_key: Option<String>)
      -> Self
    {   ProviderConfig
        {   endpoint_url: endpoint_url.into()
          , api_key
          , extra_headers: BTreeMap::new()
        }
    }

    pub fn with_header(
      mut self
    , name: impl Into<String>
    , value: impl Into<String>
    ) -> Self
    {   self.extra_headers.insert(name.into(), value.into());
        self
    }

    /// The key, if present and not blank
    pub fn api_key(&self) -> Option<&str>
    {   self.api_key.as_deref()
          .map(str::trim)
          .filter(|k| !k.is_empty())
    }

    pub fn has_api_key(&self) -> bool
    {   self.api_key().is_some()
    }
}

impl Default for ProviderConfig
{   fn default() -> Self
    {   ProviderConfig::new(DEFAULT_ENDPOINT, None)
    }
}

impl fmt::Debug for ProviderConfig
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("ProviderConfig")
          .field("endpoint_url", &self.endpoint_url)
          .field("api_key", &self.api_key().map(|_| "<redacted>"))
          .field("extra_headers", &self.extra_headers)
          .finish()
    }
}

/// Generation parameters sent with every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig
{   /// Model identifier
    pub model: String
  , /// Overrides the persona default when set
    pub max_tokens: Option<u32>
  , /// Sampling temperature, 0.0 ..= 2.0
    pub temperature: f32
  , /// Nucleus sampling, 0.0 ..= 1.0
    pub top_p: Option<f32>
}

impl Default for GenerationConfig
{   fn default() -> Self
    {   GenerationConfig
        {   model: DEFAULT_MODEL.to_string()
          , max_tokens: None
          , temperature: DEFAULT_TEMPERATURE
          , top_p: None
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig
{   /// Endpoint and credential
    pub provider: ProviderConfig
  , /// Model and sampling parameters
    pub generation: GenerationConfig
  , /// Built-in persona to start from
    pub persona: PersonaKind
  , /// Replaces the persona's system prompt
    pub system_prompt: Option<String>
  , /// Rewrite `### heading` lines in responses
    pub normalize_headings: Option<bool>
}

impl AppConfig
{   pub fn from_json_str(json: &str) -> Result<Self, Error>
    {   serde_json::from_str(json).map_err(|e| {
          Error::InvalidConfiguration(format!("config parse: {}", e))
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, Error>
    {   debug!("Reading config from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| {
          Error::InvalidConfiguration(
            format!("cannot read {}: {}", path.display(), e)
          )
        })?;
        Self::from_json_str(&text)
    }

    /// Optional file, then process environment
    pub fn load(path: Option<&Path>) -> Result<Self, Error>
    {   let mut config = match path
        {   Some(p) => Self::from_json_file(p)?
          , None => AppConfig::default()
        };
        config.apply_env_with(|name| std::env::var(name).ok());
        info!(
          "Config loaded: endpoint={} model={} persona={:?} key={}",
          config.provider.endpoint_url,
          config.generation.model,
          config.persona,
          if config.provider.has_api_key() { "set" } else { "missing" }
        );
        Ok(config)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
      F: Fn(&str) -> Option<String>
    {   let non_empty = |name: &str| {
          lookup(name).filter(|v| !v.trim().is_empty())
        };

        if let Some(key) = non_empty(ENV_API_KEY)
          .or_else(|| non_empty(ENV_API_KEY_FALLBACK))
        {   self.provider.api_key = Some(key);
        }
        if let Some(url) = non_empty(ENV_ENDPOINT)
        {   self.provider.endpoint_url = url;
        }
        if let Some(model) = non_empty(ENV_MODEL)
        {   self.generation.model = model;
        }
    }

    /// Persona with config overrides applied
    pub fn persona(&self) -> Persona
    {   let mut persona = Persona::from_kind(self.persona);
        if let Some(prompt) = &self.system_prompt
        {   persona = persona.with_system_prompt(prompt.clone());
        }
        if let Some(enabled) = self.normalize_headings
        {   persona = persona.with_heading_normalization(enabled);
        }
        persona
    }
}
