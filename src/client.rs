use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use log::{debug, error, info, trace};

use crate::clipboard::Clipboard;
use crate::config::AppConfig;
use crate::error::{Error, TransportFailure};
use crate::providers::Transport;
use crate::request::RawCompletion;
use crate::session::{GuidanceSession, SubmitOutcome};
use crate::{
  CopyReply, CopyReplySender, Notice, NoticeReceiver, NoticeSender,
  ShutdownReply, ShutdownReplySender, Snapshot, SnapshotSender,
  SubmitReply, SubmitReplySender,
};

/// Union of all commands the backend task accepts
pub enum SessionCommand
{   EditInput { text: String }
  , Submit { reply: SubmitReplySender }
  , Copy { reply: CopyReplySender }
  , Snapshot { reply: SnapshotSender }
  , Shutdown { reply: ShutdownReplySender }
}

/// How long the copied indicator stays raised after a copy
pub const COPIED_INDICATOR: Duration = Duration::from_secs(2);

/// A transport result travelling back to the backend loop
struct Resolution
{   seq: u64
  , result: Result<RawCompletion, Error>
}

/// Work finished off the loop, reported back to it
enum Internal
{   Resolved(Resolution)
  , CopiedExpired(u64)
}

/// Delivers exactly one resolution per issued request. If the
/// request task ends without calling `finish` (panic, abort) the
/// drop path reports a failure so the session leaves Pending.
struct Completion
{   seq: u64
  , tx: Option<mpsc::UnboundedSender<Internal>>
}

impl Completion
{   fn new(seq: u64, tx: mpsc::UnboundedSender<Internal>) -> Self
    {   Completion { seq, tx: Some(tx) }
    }

    fn finish(mut self, result: Result<RawCompletion, Error>)
    {   if let Some(tx) = self.tx.take()
        {   let _ = tx.send(Internal::Resolved(
              Resolution { seq: self.seq, result }
            ));
        }
    }
}

impl Drop for Completion
{   fn drop(&mut self)
    {   if let Some(tx) = self.tx.take()
        {   error!("Request {} ended without a result", self.seq);
            let _ = tx.send(Internal::Resolved(Resolution
            {   seq: self.seq
              , result: Err(Error::Transport(TransportFailure::network(
                  "request task ended without a result"
                )))
            }));
        }
    }
}

/// Backend state: the session plus its collaborators
pub struct BackendState
{   pub session: GuidanceSession
  , pub transport: Arc<dyn Transport>
  , pub clipboard: Box<dyn Clipboard>
  , notice_tx: NoticeSender
}

impl BackendState
{   pub fn new(
      config: &AppConfig
    , transport: Arc<dyn Transport>
    , clipboard: Box<dyn Clipboard>
    , notice_tx: NoticeSender
    ) -> Self
    {   debug!("Initializing BackendState");
        let session = GuidanceSession::new(
          Arc::new(config.provider.clone())
        , config.persona()
        , config.generation.clone()
        );
        BackendState
        {   session
          , transport
          , clipboard
          , notice_tx
        }
    }

    fn notify(&self, notice: Notice)
    {   trace!("Notice: {:?}", notice);
        let _ = self.notice_tx.send(notice);
    }

    fn handle_submit(
      &mut self
    , done_tx: &mpsc::UnboundedSender<Internal>
    ) -> SubmitReply
    {   match self.session.begin_submit()
        {   SubmitOutcome::Issued { seq, request } => {
              let transport = Arc::clone(&self.transport);
              let provider = Arc::clone(self.session.provider());
              let completion = Completion::new(seq, done_tx.clone());
              tokio::spawn(async move {
                let result = transport.send(&request, &provider).await;
                completion.finish(result);
              });
              SubmitReply::Issued { seq }
            }
          , SubmitOutcome::Rejected { message } => {
              self.notify(Notice::Failed(message.clone()));
              SubmitReply::Rejected(message)
            }
          , SubmitOutcome::Ignored(reason) => {
              SubmitReply::Ignored(reason)
            }
        }
    }

    fn handle_resolution(&mut self, resolution: Resolution)
    {   debug!("Resolution for request {}", resolution.seq);
        if let Some(notice)
          = self.session.resolve(resolution.seq, resolution.result)
        {   self.notify(notice);
        }
    }

    fn handle_copy(
      &mut self
    , done_tx: &mpsc::UnboundedSender<Internal>
    ) -> CopyReply
    {   let Some(text) = self.session.copy_text()
        else
        {   debug!("Copy requested with nothing to copy");
            return Ok(false);
        };

        match self.clipboard.write_text(&text)
        {   Ok(()) => {
              let token = self.session.mark_copied();
              let done_tx = done_tx.clone();
              tokio::spawn(async move {
                tokio::time::sleep(COPIED_INDICATOR).await;
                let _ = done_tx.send(Internal::CopiedExpired(token));
              });
              self.notify(Notice::Copied);
              Ok(true)
            }
          , Err(e) => {
              error!("Copy failed: {}", e);
              self.notify(Notice::CopyFailed(e.user_message()));
              Err(e)
            }
        }
    }
}

/// Public API for the guidance backend - owns the task
pub struct GuidanceBackend
{   tx: mpsc::UnboundedSender<SessionCommand>
  , _task_handle: tokio::task::JoinHandle<()>
}

impl GuidanceBackend
{   /// Create and spawn a new backend.
    /// Returns immediately; notices arrive on the returned receiver.
    pub fn new(
      config: &AppConfig
    , transport: Arc<dyn Transport>
    , clipboard: Box<dyn Clipboard>
    ) -> (Self, NoticeReceiver)
    {   debug!("Creating GuidanceBackend with task ownership");
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let state = BackendState::new(
          config, transport, clipboard, notice_tx
        );

        let _task_handle = tokio::spawn(async move {
          run_backend_loop(cmd_rx, state).await
        });

        (GuidanceBackend { tx: cmd_tx, _task_handle }, notice_rx)
    }

    fn send(&self, cmd: SessionCommand) -> Result<(), Error>
    {   self.tx.send(cmd).map_err(|_| {
          error!("Backend channel closed");
          Error::Disconnected
        })
    }

    /// Replace the input text
    pub fn edit_input(&self, text: impl Into<String>)
      -> Result<(), Error>
    {   self.send(SessionCommand::EditInput { text: text.into() })
    }

    /// Trigger a submit. Resolves as soon as the request is issued
    /// or ignored; the outcome arrives later as a notice.
    pub async fn submit(&self) -> Result<SubmitReply, Error>
    {   let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
        self.send(SessionCommand::Submit { reply: reply_tx })?;
        reply_rx.recv().await.ok_or(Error::Disconnected)
    }

    /// Copy the current formatted result
    pub async fn copy(&self) -> CopyReply
    {   let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
        self.send(SessionCommand::Copy { reply: reply_tx })?;
        reply_rx.recv().await.ok_or(Error::Disconnected)?
    }

    pub async fn snapshot(&self) -> Result<Snapshot, Error>
    {   let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
        self.send(SessionCommand::Snapshot { reply: reply_tx })?;
        reply_rx.recv().await.ok_or(Error::Disconnected)
    }

    /// Gracefully shutdown the backend. A request still in flight
    /// is not awaited.
    pub async fn shutdown(self) -> ShutdownReply
    {   debug!("Shutting down GuidanceBackend");
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
        self.send(SessionCommand::Shutdown { reply: reply_tx })?;
        reply_rx.recv().await.ok_or(Error::Disconnected)?
    }
}

/// Main backend event loop
///
/// Commands are handled one at a time and never await network work;
/// transport calls run on their own tasks and come back through
/// `done_rx`.
async fn run_backend_loop(
  mut cmd_rx: mpsc::UnboundedReceiver<SessionCommand>
, mut state: BackendState
)
{   debug!("Starting GuidanceBackend event loop");
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();

    if let Some(notice) = state.session.startup_notice()
    {   state.notify(notice);
    }

    loop
    { tokio::select!
      { cmd = cmd_rx.recv() => {
          match cmd
          {   Some(SessionCommand::EditInput { text }) => {
                trace!("Received EditInput");
                state.session.edit_input(text);
              }
            , Some(SessionCommand::Submit { reply }) => {
                debug!("Received Submit");
                let _ = reply.send(state.handle_submit(&done_tx));
              }
            , Some(SessionCommand::Copy { reply }) => {
                debug!("Received Copy");
                let _ = reply.send(state.handle_copy(&done_tx));
              }
            , Some(SessionCommand::Snapshot { reply }) => {
                let _ = reply.send(state.session.snapshot());
              }
            , Some(SessionCommand::Shutdown { reply }) => {
                let _ = reply.send(Ok(()));
                info!("GuidanceBackend shutting down");
                break;
              }
            , None => {
                debug!("Command channel closed");
                break;
              }
          }
        }
      , Some(internal) = done_rx.recv() => {
          match internal
          {   Internal::Resolved(resolution) => {
                state.handle_resolution(resolution);
              }
            , Internal::CopiedExpired(token) => {
                if state.session.clear_copied(token)
                {   trace!("Copied indicator {} expired", token);
                }
              }
          }
        }
      }
    }
}
