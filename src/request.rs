//! Request composition and the chat-completion wire types

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::config::{GenerationConfig, ProviderConfig, MISSING_KEY_MESSAGE};
use crate::error::Error;
use crate::persona::Persona;

/// A fully composed request, ready for the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidanceRequest
{   /// Persona instructions
    pub system_prompt: String
  , /// Trimmed, never empty
    pub user_message: String
  , /// Model identifier
    pub model: String
  , /// Max tokens to generate
    pub max_tokens: u32
  , /// Temperature for sampling
    pub temperature: f32
  , /// Nucleus sampling
    pub top_p: Option<f32>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

/// JSON body of `POST /chat/completions`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionBody
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , pub max_tokens: u32
  , pub temperature: f32
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>
}

impl From<&GuidanceRequest> for ChatCompletionBody
{   fn from(request: &GuidanceRequest) -> Self
    {   ChatCompletionBody
        {   model: request.model.clone()
          , messages: vec![
              ChatMessage
              {   role: "system".to_string()
                , content: request.system_prompt.clone()
              }
            , ChatMessage
              {   role: "user".to_string()
                , content: request.user_message.clone()
              }
            ]
          , max_tokens: request.max_tokens
          , temperature: request.temperature
          , top_p: request.top_p
        }
    }
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Usage
{   #[serde(default)]
    pub prompt_tokens: Option<u64>
  , #[serde(default)]
    pub completion_tokens: Option<u64>
  , #[serde(default)]
    pub total_tokens: Option<u64>
}

/// Unformatted completion text as returned by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCompletion
{   pub text: String
  , pub usage: Option<Usage>
}

/// Build a request from user input.
///
/// Blank input is rejected before the credential is checked, so an
/// unconfigured session still ignores empty submits silently.
pub fn compose(
  user_message: &str
, persona: &Persona
, generation: &GenerationConfig
, config: &ProviderConfig
) -> Result<GuidanceRequest, Error>
{   let user_message = user_message.trim();
    if user_message.is_empty()
    {   trace!("compose: empty input");
        return Err(Error::EmptyInput);
    }

    if !config.has_api_key()
    {   return Err(Error::MissingApiKey(
          MISSING_KEY_MESSAGE.to_string()
        ));
    }

    let max_tokens = generation.max_tokens
      .unwrap_or(persona.default_max_tokens);
    if max_tokens == 0
    {   return Err(Error::InvalidConfiguration(
          "max_tokens must be positive".to_string()
        ));
    }
    if !(0.0..=2.0).contains(&generation.temperature)
    {   return Err(Error::InvalidConfiguration(
          format!("temperature {} outside 0..=2", generation.temperature)
        ));
    }
    if let Some(top_p) = generation.top_p
    {   if !(0.0..=1.0).contains(&top_p)
        {   return Err(Error::InvalidConfiguration(
              format!("top_p {} outside 0..=1", top_p)
            ));
        }
    }

    debug!(
      "Composed request: persona={} model={} chars={}",
      persona.name, generation.model, user_message.len()
    );

    Ok(GuidanceRequest
    {   system_prompt: persona.system_prompt.clone()
      , user_message: user_message.to_string()
      , model: generation.model.clone()
      , max_tokens
      , temperature: generation.temperature
      , top_p: generation.top_p
    })
}

/// Headers for the completion call, in send order.
/// Extra headers cannot replace the credential or content type.
pub fn transport_headers(config: &ProviderConfig)
  -> Result<Vec<(String, String)>, Error>
{   let api_key = config.api_key()
      .ok_or_else(|| {
        Error::MissingApiKey(MISSING_KEY_MESSAGE.to_string())
      })?;

    let mut headers = vec![
      ("Authorization".to_string(), format!("Bearer {}", api_key))
    , ("Content-Type".to_string(), "application/json".to_string())
    ];

    for (name, value) in &config.extra_headers
    {   if name.eq_ignore_ascii_case("authorization")
          || name.eq_ignore_ascii_case("content-type")
        {   warn!("Ignoring extra header that would override {}", name);
            continue;
        }
        headers.push((name.clone(), value.clone()));
    }

    Ok(headers)
}
