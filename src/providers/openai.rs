//! OpenAI-compatible chat completions (Groq, OpenRouter, OpenAI, ...)

use async_trait::async_trait;
use log::{debug, error, trace};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::error::{Error, TransportFailure};
use crate::request::{
  transport_headers, ChatCompletionBody, ChatMessage, GuidanceRequest,
  RawCompletion, Usage,
};

// ===== Response Types =====

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse
{   pub choices: Vec<Choice>
  , #[serde(default)]
    pub usage: Option<Usage>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ChatMessage
  , #[serde(default)]
    pub finish_reason: Option<String>
}

/// Parse a success body into the first choice's content
pub fn parse_completion_body(body: &str)
  -> Result<RawCompletion, Error>
{   let response: ChatCompletionResponse
      = serde_json::from_str(body).map_err(|e| {
        error!("Parse error: {}", e);
        Error::ParseError(e.to_string())
      })?;

    let text = response.choices.into_iter()
      .next()
      .map(|c| c.message.content)
      .ok_or_else(|| {
        error!("No choices in response");
        Error::NoChoicesInResponse
      })?;

    Ok(RawCompletion
    {   text
      , usage: response.usage
    })
}

fn header_map(config: &ProviderConfig) -> Result<HeaderMap, Error>
{   let mut headers = HeaderMap::new();
    for (name, value) in transport_headers(config)?
    {   let name = HeaderName::from_bytes(name.as_bytes())
          .map_err(|e| {
            Error::InvalidConfiguration(
              format!("header name {}: {}", name, e)
            )
          })?;
        let value = HeaderValue::from_str(&value)
          .map_err(|e| {
            Error::InvalidConfiguration(
              format!("header value for {}: {}", name, e)
            )
          })?;
        headers.insert(name, value);
    }
    Ok(headers)
}

// ===== HTTP Transport =====

/// reqwest-backed transport for any OpenAI-compatible endpoint
#[derive(Debug, Clone, Default)]
pub struct HttpTransport
{   http_client: reqwest::Client
}

impl HttpTransport
{   pub fn new() -> Self
    {   debug!("Creating HttpTransport");
        HttpTransport
        {   http_client: reqwest::Client::new()
        }
    }

    pub fn with_client(http_client: reqwest::Client) -> Self
    {   HttpTransport { http_client }
    }
}

#[async_trait]
impl super::Transport for HttpTransport
{   async fn send(
      &self
    , request: &GuidanceRequest
    , config: &ProviderConfig
    ) -> Result<RawCompletion, Error>
    {   debug!("Sending completion request to {}", config.endpoint_url);

        let headers = header_map(config)?;
        let body = ChatCompletionBody::from(request);
        trace!("Completion request model={} max_tokens={}",
          body.model, body.max_tokens);

        let response = self.http_client
          .post(&config.endpoint_url)
          .headers(headers)
          .json(&body)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            Error::Transport(TransportFailure::network(e.to_string()))
          })?;

        let status = response.status();
        trace!("Completion response status: {}", status);

        let text = response.text().await.map_err(|e| {
          error!("Failed reading body: {}", e);
          Error::Transport(TransportFailure::network(e.to_string()))
        })?;

        if !status.is_success()
        {   error!("Provider error {}: {}", status, text);
            return Err(Error::Transport(
              TransportFailure::http(status.as_u16(), text)
            ));
        }

        let completion = parse_completion_body(&text)?;
        debug!(
          "Completion received: {} chars, usage={:?}",
          completion.text.len(), completion.usage
        );
        Ok(completion)
    }
}
