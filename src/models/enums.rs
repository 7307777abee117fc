use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(NoteFormat {
    Text => "text",
    Raw => "raw",
    Verbose => "verbose",
    Summary => "summary",
    Json => "json",
    Yaml => "yaml",
    Markdown => "markdown",
});

impl NoteFormat {
    /// File extension used when a note is exported in this format.
    pub fn ext(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Markdown => "md",
            Self::Text | Self::Raw | Self::Verbose | Self::Summary => "txt",
        }
    }
}

impl Default for NoteFormat {
    fn default() -> Self {
        Self::Text
    }
}

str_enum!(SectionAnnotatorType {
    None => "none",
    RegularExpression => "regular_expression",
    Human => "human",
    Model => "model",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn note_format_round_trip() {
        for (variant, s) in [
            (NoteFormat::Text, "text"),
            (NoteFormat::Raw, "raw"),
            (NoteFormat::Verbose, "verbose"),
            (NoteFormat::Summary, "summary"),
            (NoteFormat::Json, "json"),
            (NoteFormat::Yaml, "yaml"),
            (NoteFormat::Markdown, "markdown"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(NoteFormat::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn note_format_extensions() {
        assert_eq!(NoteFormat::Json.ext(), "json");
        assert_eq!(NoteFormat::Yaml.ext(), "yaml");
        assert_eq!(NoteFormat::Markdown.ext(), "md");
        assert_eq!(NoteFormat::Verbose.ext(), "txt");
    }

    #[test]
    fn annotator_serializes_as_str() {
        let json = serde_json::to_string(&SectionAnnotatorType::RegularExpression).unwrap();
        assert_eq!(json, "\"regular_expression\"");
    }

    #[test]
    fn invalid_enum_rejected() {
        assert!(NoteFormat::from_str("docx").is_err());
        assert!(SectionAnnotatorType::from_str("").is_err());
    }
}
