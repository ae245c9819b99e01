//! Clipboard access for the copy action

use log::debug;

use crate::error::Error;

pub trait Clipboard: Send
{   fn write_text(&mut self, text: &str) -> Result<(), Error>;
}

/// OS clipboard via arboard. Opened per write so a missing display
/// only fails the copy, not startup.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard
{   fn write_text(&mut self, text: &str) -> Result<(), Error>
    {   debug!("Writing {} chars to system clipboard", text.len());
        let mut board = arboard::Clipboard::new()
          .map_err(|e| Error::Clipboard(e.to_string()))?;
        board.set_text(text.to_string())
          .map_err(|e| Error::Clipboard(e.to_string()))
    }
}
