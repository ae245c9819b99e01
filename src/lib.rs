pub mod error;
pub mod config;
pub mod persona;
pub mod providers;
pub mod request;
pub mod format;
pub mod session;
pub mod clipboard;
pub mod client;

pub use client::GuidanceBackend;
pub use config::{AppConfig, GenerationConfig, ProviderConfig};
pub use error::{Error, TransportFailure};
pub use format::{FormatOptions, FormatPolicy, FormattedGuidance};
pub use persona::{Persona, PersonaKind};
pub use request::{GuidanceRequest, RawCompletion};
pub use session::Phase;

/*

gita-guide: one question in, one formatted answer out.

gita-guide/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports and the backend API types
│   ├── main.rs         # Terminal front end
│   ├── error.rs        # Error taxonomy and message extraction
│   ├── config.rs       # Provider, generation and persona config
│   ├── persona.rs      # System prompt + formatting presets
│   ├── request.rs      # Request composer and wire types
│   ├── providers/      # Transport trait and HTTP implementation
│   │   ├── mod.rs
│   │   └── openai.rs   # OpenAI-compatible chat completions
│   ├── format.rs       # Response formatter
│   ├── session.rs      # Idle/Pending/Succeeded/Failed machine
│   ├── clipboard.rs    # Copy action target
│   └── client.rs       # Backend task owning the session
└── tests/

*/

/// GUIDANCE API INTERFACE:

// ===== Notices =====

/// Transient notifications for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice
{   /// Credential missing at startup; sent once
    MissingConfig(String)
  , /// A request completed
    Succeeded
  , /// A request failed, or could not be composed
    Failed(String)
  , /// Copy action wrote to the clipboard
    Copied
  , /// Copy action failed
    CopyFailed(String)
}

pub type NoticeSender
  = tokio::sync::mpsc::UnboundedSender<Notice>;
pub type NoticeReceiver
  = tokio::sync::mpsc::UnboundedReceiver<Notice>;

// ===== Submit =====

/// Why a submit had no effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason
{   /// Input was empty after trimming
    EmptyInput
  , /// A previous request has not resolved yet
    InFlight
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReply
{   /// Request handed to the transport
    Issued { seq: u64 }
  , /// Submit was a no-op
    Ignored(IgnoreReason)
  , /// Request could not be composed; session is now Failed
    Rejected(String)
}

pub type SubmitReplySender
  = tokio::sync::mpsc::UnboundedSender<SubmitReply>;

// ===== Copy =====

/// `Ok(false)` when there is nothing to copy
pub type CopyReply = Result<bool, crate::error::Error>;
pub type CopyReplySender
  = tokio::sync::mpsc::UnboundedSender<CopyReply>;

// ===== Snapshot =====

/// Read-only view of the session for renderers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot
{   pub input: String
  , pub phase: crate::session::Phase
  , pub copied: bool
  , /// Persistent warning while the configuration is degraded
    pub config_warning: Option<String>
}

pub type SnapshotSender
  = tokio::sync::mpsc::UnboundedSender<Snapshot>;

// ===== Shutdown =====

pub type ShutdownReply = Result<(), crate::error::Error>;
pub type ShutdownReplySender
  = tokio::sync::mpsc::UnboundedSender<ShutdownReply>;
