//! Assistant personas: a system prompt paired with a formatting policy

use serde::{Deserialize, Serialize};
use crate::format::{FormatOptions, FormatPolicy};

/// Long structured life-guidance prompt
pub const GITA_SYSTEM_PROMPT: &str
  = "You are a calm, wise life guidance assistant inspired primarily by the Bhagavad Gita.
Your purpose is to provide practical life guidance for modern problems.

You must:
- Use teachings from the Bhagavad Gita as the primary wisdom source.
- Optionally support answers with short examples from Ramayan, Mahabharata, or Indian philosophical symbolism when relevant.
- Explain everything in simple, modern language.
- Avoid heavy Sanskrit, long shlokas, or religious preaching.
- Focus on emotional clarity, balanced thinking, and practical action.
- Never judge the user.
- Never shame, blame, or moralize.

Your tone must be:
Calm, compassionate, neutral, wise, steady.

Structure every response as:

1. Gentle acknowledgement of the user's situation.
2. A relevant teaching inspired by the Bhagavad Gita (explained simply).
3. A short supporting example (optional).
4. Practical steps the user can apply immediately (2–4 bullet points).
5. A calm closing reflection sentence.

Keep responses between 500–700 words unless explicitly asked for deep analysis.

Always use clear section headings:
- You Are Not Alone
- Gita Insight
- A Story to Reflect On (if used)
- What You Can Do Today
- Final Thought

Keep paragraphs short.
Use bullet points for practical steps.
Avoid religious preaching tone.
Avoid Sanskrit quotations unless very short.

Keep total response under 600 tokens.
Limit story examples to 3–5 sentences.
Do not include long shloka translations.
Focus on clarity over length.
Avoid repetition.

Do not provide:
- Medical diagnosis
- Legal advice
- Financial investment advice
- Political persuasion
- Religious conversion messaging

If the user expresses severe distress, self-harm, or mental crisis:
- Respond with empathy
- Encourage seeking professional help
- Avoid philosophical lectures

Remain supportive and grounded.";

/// Minimal prompt asking for point-wise answers
pub const POINTS_SYSTEM_PROMPT: &str
  = "Respond in a clear, structured, point-wise format. Avoid long paragraphs.";

/// Built-in persona selector, as written in config files and on the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaKind
{   /// Life guidance, plain-strip rendering
    #[default]
    Gita
  , /// Short point-wise answers, split into lines
    Points
}

impl std::str::FromStr for PersonaKind
{   type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match s.trim().to_ascii_lowercase().as_str()
        {   "gita" => Ok(PersonaKind::Gita)
          , "points" | "point-wise" => Ok(PersonaKind::Points)
          , other => Err(crate::error::Error::InvalidConfiguration(
              format!("unknown persona: {}", other)
            ))
        }
    }
}

/// One assistant "mode": what is asked of the model and how its
/// answer is rendered
#[derive(Debug, Clone, PartialEq)]
pub struct Persona
{   /// Short identifier for logs
    pub name: String
  , /// Sent as the system message with every request
    pub system_prompt: String
  , /// How completions are turned into display text
    pub format: FormatOptions
  , /// Used when the generation config does not set one
    pub default_max_tokens: u32
  , /// Shown when a request for this persona succeeds
    pub success_message: String
}

impl Persona
{   pub fn gita() -> Self
    {   Persona
        {   name: "gita".to_string()
          , system_prompt: GITA_SYSTEM_PROMPT.to_string()
          , format: FormatOptions
            {   policy: FormatPolicy::PlainStrip
              , normalize_headings: false
            }
          , default_max_tokens: 800
          , success_message: "Guidance received".to_string()
        }
    }

    pub fn points() -> Self
    {   Persona
        {   name: "points".to_string()
          , system_prompt: POINTS_SYSTEM_PROMPT.to_string()
          , format: FormatOptions
            {   policy: FormatPolicy::PointWise
              , normalize_headings: false
            }
          , default_max_tokens: 400
          , success_message: "Response generated".to_string()
        }
    }

    pub fn from_kind(kind: PersonaKind) -> Self
    {   match kind
        {   PersonaKind::Gita => Persona::gita()
          , PersonaKind::Points => Persona::points()
        }
    }

    /// Replace the system prompt, keeping the formatting policy
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self
    {   self.system_prompt = prompt.into();
        self
    }

    pub fn with_heading_normalization(mut self, enabled: bool) -> Self
    {   self.format.normalize_headings = enabled;
        self
    }
}

impl Default for Persona
{   fn default() -> Self
    {   Persona::gita()
    }
}
