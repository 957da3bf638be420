//! Bibliographic format codes and their static metadata.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

// ---------------------------------------------------------------------------
// Format table macro
// ---------------------------------------------------------------------------

macro_rules! define_formats {
    ($(
        $(#[$doc:meta])*
        $variant:ident => $code:literal, $human:literal, $mime:literal, $ext:literal;
    )*) => {
        /// Canonical bibliographic format code.
        ///
        /// Variants are declared in code order so that `Ord` yields the
        /// canonical listing order used by the reverse indices.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum FormatCode {
            $(
                $(#[$doc])*
                #[serde(rename = $code)]
                $variant,
            )*
        }

        impl FormatCode {
            /// Every known format, in canonical order.
            pub const ALL: &'static [FormatCode] = &[$(FormatCode::$variant,)*];

            /// The short code passed to converters (`bib`, `ris`, `xml`, ...).
            pub fn code(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)*
                }
            }

            /// Human-readable name (e.g. `"Word 2007 Bibliography"`).
            pub fn human_name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $human,)*
                }
            }

            /// Preferred MIME type.
            pub fn mime_type(&self) -> &'static str {
                match self {
                    $(Self::$variant => $mime,)*
                }
            }

            /// Preferred file extension, including the leading dot.
            pub fn extension(&self) -> &'static str {
                match self {
                    $(Self::$variant => $ext,)*
                }
            }

            /// Look up a format by its canonical code.
            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

define_formats! {
    /// NASA Astrophysics Data System tagged format (export only).
    Ads      => "ads",      "ADS Tagged Format",      "text/plain",                             ".ads";
    /// BibTeX
    Bibtex   => "bib",      "BibTeX",                 "application/x-bibtex",                   ".bib";
    /// BibLaTeX (import only).
    Biblatex => "biblatex", "BibLaTeX",               "application/x-bibtex",                   ".bib";
    /// Copac library catalogue export.
    Copac    => "copac",    "Copac",                  "text/plain",                             ".txt";
    /// EBI XML
    Ebi      => "ebi",      "EBI XML",                "application/xml",                        ".xml";
    /// EndNote refer/tagged format.
    EndNote  => "end",      "EndNote",                "application/x-endnote-refer",            ".end";
    /// EndNote XML library.
    EndNoteXml => "endx",   "EndNote XML",            "application/x-endnote-library",          ".xml";
    /// ISI Web of Science.
    Isi      => "isi",      "ISI",                    "application/x-inst-for-scientific-info", ".isi";
    /// PubMed XML.
    PubMed   => "med",      "PubMed",                 "text/x-pubmed",                          ".xml";
    /// PubMed NBIB (MEDLINE).
    Nbib     => "nbib",     "NBIB MEDLINE",           "application/nbib",                       ".nbib";
    /// Research Information Systems.
    Ris      => "ris",      "RIS",                    "application/x-research-info-systems",    ".ris";
    /// Word 2007 bibliography XML.
    WordBib  => "wordbib",  "Word 2007 Bibliography", "application/xml",                        ".xml";
    /// Metadata Object Description Schema, the hub format.
    Mods     => "xml",      "MODS",                   "application/mods+xml",                   ".xml";
}

/// Symbolic names accepted in addition to the canonical codes.
const ALIASES: &[(&str, FormatCode)] = &[
    ("NASA_ASTROPHYSICS_DATA_SYSTEM", FormatCode::Ads),
    ("ADS", FormatCode::Ads),
    ("BIBTEX", FormatCode::Bibtex),
    ("BIBLATEX", FormatCode::Biblatex),
    ("COPAC", FormatCode::Copac),
    ("EBI", FormatCode::Ebi),
    ("ENDNOTE", FormatCode::EndNote),
    ("ENDNOTE_REFER", FormatCode::EndNote),
    ("ENDNOTE_TAGGED", FormatCode::EndNote),
    ("ENDNOTE_XML", FormatCode::EndNoteXml),
    ("ISI", FormatCode::Isi),
    ("ISI_WEB_OF_SCIENCE", FormatCode::Isi),
    ("PUBMED", FormatCode::PubMed),
    ("PUBMED_XML", FormatCode::PubMed),
    ("NBIB", FormatCode::Nbib),
    ("PUBMED_NBIB", FormatCode::Nbib),
    ("RIS", FormatCode::Ris),
    ("RIS_RESEARCH_INFORMATION_SYSTEMS", FormatCode::Ris),
    ("WORDBIB", FormatCode::WordBib),
    ("WORD_2007_BIBLIOGRAPHY", FormatCode::WordBib),
    ("MODS", FormatCode::Mods),
    ("METADATA_OBJECT_DESCRIPTION_SCHEMA", FormatCode::Mods),
];

impl FormatCode {
    /// The hub format every non-direct conversion is routed through.
    pub const HUB: FormatCode = FormatCode::Mods;

    /// Look up a format by symbolic alias (`"ENDNOTE_REFER"`, `"MODS"`, ...).
    ///
    /// Matching is case-insensitive.
    pub fn from_alias(alias: &str) -> Option<Self> {
        ALIASES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(alias))
            .map(|(_, code)| *code)
    }

    /// Look up a format by its human-readable name.
    pub fn from_human_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.human_name().eq_ignore_ascii_case(name))
    }

    /// Whether this is the hub format.
    pub fn is_hub(&self) -> bool {
        *self == Self::HUB
    }
}

impl fmt::Display for FormatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Parses a canonical code first, then a symbolic alias.
impl FromStr for FormatCode {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
            .or_else(|| Self::from_alias(s))
            .ok_or_else(|| RegistryError::UnknownFormat {
                value: s.to_string(),
            })
    }
}

/// Which side of a conversion a format is used on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The format is read (conversion source).
    Import,
    /// The format is written (conversion target).
    Export,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import => write!(f, "import"),
            Self::Export => write!(f, "export"),
        }
    }
}
