//! Request lifecycle as an explicit state machine.
//!
//! ```text
//!   Idle ──submit──▶ Pending ──resolve(ok)──▶ Succeeded
//!    ▲                  │                         │
//!    │                  └──resolve(err)─▶ Failed  │
//!    └────────── edit ◀─────────────────────┴─────┘
//! ```
//!
//! The session never performs I/O; the backend drives it.

use std::sync::Arc;
use log::{debug, info, warn};

use crate::config::{GenerationConfig, ProviderConfig};
use crate::error::Error;
use crate::format::{format, FormattedGuidance};
use crate::persona::Persona;
use crate::request::{compose, GuidanceRequest, RawCompletion};
use crate::{IgnoreReason, Notice, Snapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase
{   /// Nothing shown, ready for a submit
    Idle
  , /// One request in flight, identified by its sequence token
    Pending { seq: u64 }
  , /// Last request succeeded
    Succeeded
    {   raw: String
      , formatted: FormattedGuidance
    }
  , /// Last request failed; message is display-ready
    Failed { message: String }
}

impl Phase
{   pub fn is_failed(&self) -> bool
    {   matches!(self, Phase::Failed { .. })
    }
}

/// Result of asking the session to start a request
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome
{   /// Nothing happened
    Ignored(IgnoreReason)
  , /// Caller must send `request` and later resolve with `seq`
    Issued
    {   seq: u64
      , request: GuidanceRequest
    }
  , /// Request could not be composed; phase is now Failed
    Rejected { message: String }
}

pub struct GuidanceSession
{   input: String
  , phase: Phase
  , copied: bool
  , copy_token: u64
  , config_warning: Option<String>
  , next_seq: u64
  , persona: Persona
  , generation: GenerationConfig
  , provider: Arc<ProviderConfig>
}

impl GuidanceSession
{   pub fn new(
      provider: Arc<ProviderConfig>
    , persona: Persona
    , generation: GenerationConfig
    ) -> Self
    {   let config_warning = if provider.has_api_key()
        {   None
        } else
        {   warn!("No API key configured; requests will fail");
            Some(crate::config::MISSING_KEY_MESSAGE.to_string())
        };

        GuidanceSession
        {   input: String::new()
          , phase: Phase::Idle
          , copied: false
          , copy_token: 0
          , config_warning
          , next_seq: 1
          , persona
          , generation
          , provider
        }
    }

    /// One-time notification for a degraded configuration
    pub fn startup_notice(&self) -> Option<Notice>
    {   self.config_warning.clone().map(Notice::MissingConfig)
    }

    pub fn provider(&self) -> &Arc<ProviderConfig>
    {   &self.provider
    }

    pub fn phase(&self) -> &Phase
    {   &self.phase
    }

    pub fn input(&self) -> &str
    {   &self.input
    }

    pub fn is_in_flight(&self) -> bool
    {   matches!(self.phase, Phase::Pending { .. })
    }

    /// Replace the input text. A finished result is dismissed;
    /// an in-flight request is left alone.
    pub fn edit_input(&mut self, text: impl Into<String>)
    {   self.input = text.into();
        if matches!(self.phase, Phase::Succeeded { .. } | Phase::Failed { .. })
        {   debug!("Input edited; dismissing previous result");
            self.phase = Phase::Idle;
        }
        self.copied = false;
    }

    pub fn begin_submit(&mut self) -> SubmitOutcome
    {   if let Phase::Pending { seq } = self.phase
        {   debug!("Submit ignored: request {} still in flight", seq);
            return SubmitOutcome::Ignored(IgnoreReason::InFlight);
        }

        let composed = compose(
          &self.input
        , &self.persona
        , &self.generation
        , &self.provider
        );

        match composed
        {   Ok(request) => {
              let seq = self.next_seq;
              self.next_seq += 1;
              self.phase = Phase::Pending { seq };
              self.copied = false;
              info!("Request {} issued", seq);
              SubmitOutcome::Issued { seq, request }
            }
          , Err(Error::EmptyInput) => {
              debug!("Submit ignored: empty input");
              SubmitOutcome::Ignored(IgnoreReason::EmptyInput)
            }
          , Err(e) => {
              warn!("Request not composed: {}", e);
              let message = e.user_message();
              self.phase = Phase::Failed { message: message.clone() };
              self.copied = false;
              SubmitOutcome::Rejected { message }
            }
        }
    }

    /// Fold a transport result into the phase. Results for any
    /// sequence token other than the pending one are dropped.
    pub fn resolve(
      &mut self
    , seq: u64
    , result: Result<RawCompletion, Error>
    ) -> Option<Notice>
    {   match self.phase
        {   Phase::Pending { seq: pending } if pending == seq => {}
          , _ => {
              warn!("Dropping stale result for request {}", seq);
              return None;
            }
        }

        match result
        {   Ok(completion) => {
              info!("Request {} succeeded", seq);
              let formatted = format(&completion.text, &self.persona.format);
              self.phase = Phase::Succeeded
              {   raw: completion.text
                , formatted
              };
              Some(Notice::Succeeded)
            }
          , Err(e) => {
              warn!("Request {} failed: {}", seq, e);
              let message = e.user_message();
              self.phase = Phase::Failed { message: message.clone() };
              Some(Notice::Failed(message))
            }
        }
    }

    /// Text the copy action would place on the clipboard
    pub fn copy_text(&self) -> Option<String>
    {   match &self.phase
        {   Phase::Succeeded { formatted, .. } => {
              Some(formatted.clipboard_text())
            }
          , _ => None
        }
    }

    /// Raise the copied indicator. The returned token identifies
    /// this copy for [`GuidanceSession::clear_copied`].
    pub fn mark_copied(&mut self) -> u64
    {   self.copy_token += 1;
        self.copied = true;
        self.copy_token
    }

    /// Drop the indicator unless a later copy has raised it again
    pub fn clear_copied(&mut self, token: u64) -> bool
    {   if token != self.copy_token || !self.copied
        {   return false;
        }
        self.copied = false;
        true
    }

    pub fn snapshot(&self) -> Snapshot
    {   Snapshot
        {   input: self.input.clone()
          , phase: self.phase.clone()
          , copied: self.copied
          , config_warning: self.config_warning.clone()
        }
    }
}
