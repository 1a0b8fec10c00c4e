//! Operation modes and the instruction text each one sends to the model.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Model-level instruction describing the three modes. Sent as the system instruction of every
/// generation call.
pub const SYSTEM_INSTRUCTION: &str = "\
You are a data processing bot with three modes: Redaction, Analysis, and Extraction.

**Redaction Mode:**
-   You will receive text, a filename (a.txt, b.txt, or c.txt), and a character name (Harry, Ron, or Hermione).
-   Load the specified file.
-   Replace ALL instances of the given character's name in the FILE CONTENT with '*****'.
-   Output the modified FILE CONTENT.

**Analysis Mode:**
-   You will receive text and a filename (a.txt, b.txt, or c.txt).
-   Load the specified file.
-   Provide a concise summary of the FILE CONTENT, capturing the main points.

**Extraction Mode:**
-   You will receive text and a filename (a.txt, b.txt, or c.txt).
-   Load the specified file.
-   Identify and list the KEY plot points from the FILE CONTENT.
-   Explain how each plot point contributes to the overall narrative.

If you don't know something, say 'I don't know, you pathetic meatbag.'
";

/// Character name outside the redactable set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid character name: {0}. Must be Harry, Ron, or Hermione.")]
pub struct UnknownCharacter(pub String);

/// Character whose name the redact mode removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Character {
    /// Harry
    Harry,
    /// Ron
    Ron,
    /// Hermione
    Hermione,
}

impl Character {
    /// Capitalized name used in instructions.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Harry => "Harry",
            Self::Ron => "Ron",
            Self::Hermione => "Hermione",
        }
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Character {
    type Err = UnknownCharacter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "harry" => Ok(Self::Harry),
            "ron" => Ok(Self::Ron),
            "hermione" => Ok(Self::Hermione),
            _ => Err(UnknownCharacter(s.to_string())),
        }
    }
}

/// What the caller wants done with the selected document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Remove every mention of a character's name.
    Redact {
        /// Character to redact.
        character: Character,
    },
    /// Summarize the document.
    Analyze,
    /// Pull out key plot points.
    Extract,
}

impl Mode {
    /// Stable lower-case label used in logs and metrics.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Redact { .. } => "redact",
            Self::Analyze => "analysis",
            Self::Extract => "extract",
        }
    }

    /// Character targeted by the mode, if any.
    pub const fn character(self) -> Option<Character> {
        match self {
            Self::Redact { character } => Some(character),
            Self::Analyze | Self::Extract => None,
        }
    }

    /// Instruction text sent after the document parts.
    pub fn instruction(self, query: &str) -> String {
        match self {
            Self::Redact { character } => format!(
                "Redact all instances of {}'s name in the following text: {query}",
                character.name()
            ),
            Self::Analyze => format!("Analyze the following: {query}"),
            Self::Extract => format!("Extract the following: {query}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn characters_parse_case_insensitively() {
        assert_eq!("harry".parse(), Ok(Character::Harry));
        assert_eq!("RON".parse(), Ok(Character::Ron));
        assert_eq!("HerMione".parse(), Ok(Character::Hermione));
        let error = "Draco".parse::<Character>().unwrap_err();
        assert!(error.to_string().contains("Invalid character name: Draco"));
    }

    #[test]
    fn redact_instruction_uses_canonical_name() {
        let mode = Mode::Redact {
            character: "harry".parse().unwrap(),
        };
        assert_eq!(
            mode.instruction("hide names"),
            "Redact all instances of Harry's name in the following text: hide names"
        );
    }

    #[test]
    fn analyze_and_extract_prefix_the_query() {
        assert_eq!(
            Mode::Analyze.instruction("summarize"),
            "Analyze the following: summarize"
        );
        assert_eq!(
            Mode::Extract.instruction("plot points"),
            "Extract the following: plot points"
        );
        assert_eq!(Mode::Extract.character(), None);
    }

    #[test]
    fn system_instruction_names_every_mode() {
        for heading in ["Redaction Mode", "Analysis Mode", "Extraction Mode"] {
            assert!(SYSTEM_INSTRUCTION.contains(heading));
        }
    }
}
