use std::fmt;
use log::trace;

/// Shown whenever a failure carries no provider-supplied message
pub const FALLBACK_MESSAGE: &str
  = "Something went wrong. Please try again.";

/// What is known about a failed transport call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure
{   /// HTTP status, if a response arrived at all
    pub status: Option<u16>
  , /// Raw response body, if one was read
    pub body: Option<String>
  , /// Short description for logs
    pub reason: String
}

impl TransportFailure
{   /// Failure before any response arrived (connect, DNS, IO)
    pub fn network(reason: impl Into<String>) -> Self
    {   TransportFailure
        {   status: None
          , body: None
          , reason: reason.into()
        }
    }

    /// Non-success HTTP response
    pub fn http(status: u16, body: impl Into<String>) -> Self
    {   TransportFailure
        {   status: Some(status)
          , body: Some(body.into())
          , reason: format!("HTTP status {}", status)
        }
    }
}

/// Custom error type for guidance operations
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// API key is missing for the provider
    MissingApiKey(String)
  , /// User input was empty after trimming
    EmptyInput
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Network failure or non-success HTTP response
    Transport(TransportFailure)
  , /// Failed to parse API response
    ParseError(String)
  , /// No choices in API response
    NoChoicesInResponse
  , /// Writing to the clipboard failed
    Clipboard(String)
  , /// Reading user input failed
    Io(String)
  , /// Backend task is gone
    Disconnected
}

impl Error
{   /// Message suitable for an inline error block or a notification
    pub fn user_message(&self) -> String
    {   match self
        {   Error::Transport(failure) => extract_message(failure)
          , Error::ParseError(_) | Error::NoChoicesInResponse => {
              FALLBACK_MESSAGE.to_string()
            }
          , Error::MissingApiKey(msg) => msg.clone()
          , other => other.to_string()
        }
    }
}

/// Pull `error.message` out of a provider error body.
/// Falls back to [`FALLBACK_MESSAGE`] when the body is absent,
/// not JSON, or lacks a non-empty message string.
pub fn extract_message(failure: &TransportFailure) -> String
{   let message = failure.body.as_deref()
      .and_then(|body| {
        serde_json::from_str::<serde_json::Value>(body).ok()
      })
      .and_then(|v| {
        v.get("error")?
          .get("message")?
          .as_str()
          .map(|s| s.to_string())
      })
      .filter(|s| !s.trim().is_empty());

    match message
    {   Some(msg) => msg
      , None => {
          trace!("No provider message in failure: {}", failure.reason);
          FALLBACK_MESSAGE.to_string()
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::MissingApiKey(msg) => {
              write!(f, "Missing API key: {}", msg)
            }
          , Error::EmptyInput => {
              write!(f, "Input is empty")
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Transport(failure) => {
              write!(f, "Transport error: {}", failure.reason)
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::NoChoicesInResponse => {
              write!(f, "API response contained no choices")
            }
          , Error::Clipboard(msg) => {
              write!(f, "Clipboard error: {}", msg)
            }
          , Error::Io(msg) => {
              write!(f, "I/O error: {}", msg)
            }
          , Error::Disconnected => {
              write!(f, "Guidance backend disconnected")
            }
        }
    }
}

impl std::error::Error for Error {}
