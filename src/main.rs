use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{debug, error};
use tokio::io::{AsyncBufReadExt, BufReader};

use gita_guide::clipboard::SystemClipboard;
use gita_guide::providers::HttpTransport;
use gita_guide::{
  AppConfig, Error, FormattedGuidance, GuidanceBackend, Notice,
  NoticeReceiver, PersonaKind, Phase, SubmitReply,
};

/// Ask for guidance from the terminal
#[derive(Parser, Debug)]
#[command(name = "gita-guide", version, about = "Life guidance from a hosted LLM")]
struct Cli
{   /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>
  , /// Persona to use (gita or points); overrides the config file
    #[arg(long)]
    persona: Option<PersonaKind>
  , /// Copy each answer to the clipboard once it arrives
    #[arg(long, default_value_t = false)]
    copy: bool
  , /// Question to ask; omit for interactive mode
    prompt: Option<String>
}

#[tokio::main]
async fn main()
{   env_logger::init();
    let cli = Cli::parse();

    match run(cli).await
    {   Ok(true) => {}
      , Ok(false) => std::process::exit(1)
      , Err(e) => {
          error!("{}", e);
          eprintln!("error: {}", e);
          std::process::exit(1);
        }
    }
}

/// Terminal side of one backend
struct Shell
{   backend: GuidanceBackend
  , notices: NoticeReceiver
  , success_message: String
  , copy: bool
}

/// Returns false when a one-shot question ended in failure
async fn run(cli: Cli) -> Result<bool, Error>
{   let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(persona) = cli.persona
    {   config.persona = persona;
    }

    let (backend, notices) = GuidanceBackend::new(
      &config
    , Arc::new(HttpTransport::new())
    , Box::new(SystemClipboard)
    );
    let mut shell = Shell
    {   backend
      , notices
      , success_message: config.persona().success_message
      , copy: cli.copy
    };

    let succeeded = match cli.prompt
    {   Some(prompt) => !shell.ask(prompt).await?.is_failed()
      , None => {
          shell.interactive().await?;
          true
        }
    };

    shell.backend.shutdown().await?;
    Ok(succeeded)
}

impl Shell
{   async fn interactive(&mut self) -> Result<(), Error>
    {   eprintln!("Share what's on your mind (Enter to send, :copy, :quit)");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines.next_line().await
          .map_err(|e| Error::Io(e.to_string()))?
        {   let command = line.trim().to_string();
            if command == ":quit"
            {   break;
            } else if command == ":copy"
            {   if let Ok(false) = self.backend.copy().await
                {   eprintln!("(nothing to copy)");
                }
                self.drain_notices();
            } else
            {   self.ask(line).await?;
            }
        }
        Ok(())
    }

    /// Edit, submit, then wait for the outcome notice and render it.
    /// Returns the phase the request settled in.
    async fn ask(&mut self, prompt: String) -> Result<Phase, Error>
    {   self.backend.edit_input(prompt)?;
        match self.backend.submit().await?
        {   SubmitReply::Issued { seq } => {
              debug!("Waiting for request {}", seq);
              eprintln!("Seeking guidance…");
              while let Some(notice) = self.notices.recv().await
              {   let done = matches!(notice, Notice::Succeeded | Notice::Failed(_));
                  self.print_notice(&notice);
                  if done
                  {   break;
                  }
              }
            }
          , SubmitReply::Ignored(reason) => {
              debug!("Submit ignored: {:?}", reason);
              self.drain_notices();
              return Ok(self.backend.snapshot().await?.phase);
            }
          , SubmitReply::Rejected(_) => {}
        }

        self.drain_notices();
        let phase = self.backend.snapshot().await?.phase;
        render(&phase);

        if self.copy && matches!(phase, Phase::Succeeded { .. })
        {   // failures already arrive as a CopyFailed notice
            let _ = self.backend.copy().await;
            self.drain_notices();
        }
        Ok(phase)
    }

    fn drain_notices(&mut self)
    {   while let Ok(notice) = self.notices.try_recv()
        {   self.print_notice(&notice);
        }
    }

    fn print_notice(&self, notice: &Notice)
    {   match notice
        {   Notice::MissingConfig(msg) => eprintln!("[warn] {}", msg)
          , Notice::Succeeded => eprintln!("[ok] {}", self.success_message)
          , Notice::Failed(msg) => eprintln!("[error] {}", msg)
          , Notice::Copied => eprintln!("[ok] Copied to clipboard")
          , Notice::CopyFailed(_) => eprintln!("[error] Failed to copy")
        }
    }
}

fn render(phase: &Phase)
{   match phase
    {   Phase::Succeeded { formatted, .. } => {
          let bullet = matches!(formatted, FormattedGuidance::Points(_));
          for line in formatted.lines()
          {   if bullet
              {   println!("• {}", line);
              } else
              {   println!("{}", line);
              }
          }
        }
      , Phase::Failed { message } => eprintln!("✗ {}", message)
      , Phase::Idle | Phase::Pending { .. } => {}
    }
}

