//! Response formatting: turns raw completion text into display text.
//!
//! Every function here is pure and total. Malformed markdown degrades
//! to less formatting, never to an error.

use std::sync::LazyLock;
use regex::Regex;
use serde::{Deserialize, Serialize};

const EMPHASIS: &str = "**";

static HEADING_3: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?m)^###[ \t]+(\S.*?)[ \t\r]*$")
    .expect("heading pattern is valid")
});

static COLON_BREAK: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r":\s*").expect("colon pattern is valid")
});

/// How a completion is turned into display text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatPolicy
{   /// Drop emphasis markers, keep the text whole
    #[default]
    PlainStrip
  , /// Drop emphasis markers and break into trimmed points
    PointWise
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormatOptions
{   pub policy: FormatPolicy
  , /// Rewrite `### text` lines as `─ text ─`
    pub normalize_headings: bool
}

/// Display-ready projection of a completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattedGuidance
{   /// Pre-formatted text with embedded newlines
    Text(String)
  , /// Ordered, trimmed, non-empty points
    Points(Vec<String>)
}

impl FormattedGuidance
{   /// Exactly what the copy action puts on the clipboard
    pub fn clipboard_text(&self) -> String
    {   match self
        {   FormattedGuidance::Text(text) => text.clone()
          , FormattedGuidance::Points(points) => points.join("\n")
        }
    }

    /// Display lines; may be called any number of times
    pub fn lines(&self) -> Box<dyn Iterator<Item = &str> + '_>
    {   match self
        {   FormattedGuidance::Text(text) => Box::new(text.lines())
          , FormattedGuidance::Points(points) => {
              Box::new(points.iter().map(String::as_str))
            }
        }
    }

    pub fn is_empty(&self) -> bool
    {   match self
        {   FormattedGuidance::Text(text) => text.trim().is_empty()
          , FormattedGuidance::Points(points) => points.is_empty()
        }
    }
}

/// Apply `options` to a raw completion
pub fn format(raw: &str, options: &FormatOptions) -> FormattedGuidance
{   let text = if options.normalize_headings
    {   normalize_headings(raw)
    } else
    {   raw.to_string()
    };

    match options.policy
    {   FormatPolicy::PlainStrip => {
          FormattedGuidance::Text(strip_emphasis(&text))
        }
      , FormatPolicy::PointWise => {
          FormattedGuidance::Points(split_points(&text))
        }
    }
}

/// Remove every literal `**`
pub fn strip_emphasis(text: &str) -> String
{   text.replace(EMPHASIS, "")
}

/// `### Title` becomes `─ Title ─`; deeper headings are left alone
pub fn normalize_headings(text: &str) -> String
{   HEADING_3.replace_all(text, "─ $1 ─").into_owned()
}

/// Point-wise split.
///
/// An emphasized label such as `**Step One:**` opens a new point,
/// every colon ends a line, and the result is trimmed with blank
/// lines dropped.
pub fn split_points(text: &str) -> Vec<String>
{   let unmarked = strip_emphasis_breaking_labels(text);
    COLON_BREAK.replace_all(&unmarked, ":\n")
      .split('\n')
      .map(str::trim)
      .filter(|line| !line.is_empty())
      .map(str::to_string)
      .collect()
}

fn strip_emphasis_breaking_labels(text: &str) -> String
{   let parts: Vec<&str> = text.split(EMPHASIS).collect();
    // an even part count means the final marker has no partner
    let last_unpaired = parts.len() % 2 == 0;
    let mut out = String::with_capacity(text.len());

    for (i, part) in parts.iter().enumerate()
    {   let emphasized = i % 2 == 1
          && !(last_unpaired && i == parts.len() - 1);
        if emphasized && part.trim_end().ends_with(':')
        {   out.push('\n');
        }
        out.push_str(part);
    }
    out
}
