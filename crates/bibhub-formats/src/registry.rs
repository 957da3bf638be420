//! The validated format registry.
//!
//! One canonical table (see [`FormatCode`]) drives everything here: the
//! MIME and extension reverse indices are generated from it, then extended
//! with the non-standard MIME types that publishers actually send.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::error::RegistryError;
use crate::format::{Direction, FormatCode};

/// Formats the standard bibutils build can read.
const STANDARD_IMPORTABLE: &[FormatCode] = &[
    FormatCode::Bibtex,
    FormatCode::Biblatex,
    FormatCode::Copac,
    FormatCode::Ebi,
    FormatCode::EndNote,
    FormatCode::EndNoteXml,
    FormatCode::Isi,
    FormatCode::PubMed,
    FormatCode::Nbib,
    FormatCode::Ris,
    FormatCode::WordBib,
    FormatCode::Mods,
];

/// Formats the standard bibutils build can write.
const STANDARD_EXPORTABLE: &[FormatCode] = &[
    FormatCode::Ads,
    FormatCode::Bibtex,
    FormatCode::EndNote,
    FormatCode::Isi,
    FormatCode::Ris,
    FormatCode::WordBib,
    FormatCode::Mods,
];

/// MIME types seen in the wild that are not any format's preferred type.
const MIME_ALIASES: &[(&str, &[FormatCode])] = &[
    (
        "application/xml",
        &[
            FormatCode::EndNoteXml,
            FormatCode::PubMed,
            FormatCode::Mods,
        ],
    ),
    (
        "text/plain",
        &[
            FormatCode::Bibtex,
            FormatCode::Biblatex,
            FormatCode::EndNote,
            FormatCode::Isi,
            FormatCode::Nbib,
            FormatCode::Ris,
        ],
    ),
    ("text/x-bibtex", &[FormatCode::Bibtex]),
    ("text/x-endnote-library", &[FormatCode::EndNoteXml]),
    ("text/x-endnote-refer", &[FormatCode::EndNote]),
    ("text/mods+xml", &[FormatCode::Mods]),
    ("text/x-research-info-systems", &[FormatCode::Ris]),
    ("text/x-inst-for-scientific-info", &[FormatCode::Isi]),
    // Nature
    ("text/application/x-research-info-systems", &[FormatCode::Ris]),
    // Cell
    ("text/ris", &[FormatCode::Ris]),
];

/// Registry of importable/exportable formats and lookup indices.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    /// Formats accepted as conversion sources.
    importable: BTreeSet<FormatCode>,
    /// Formats accepted as conversion targets.
    exportable: BTreeSet<FormatCode>,
    /// MIME type (lowercase) to candidate formats.
    by_mime: HashMap<String, Vec<FormatCode>>,
    /// Extension (lowercase, dotted) to candidate formats.
    by_extension: HashMap<String, Vec<FormatCode>>,
}

impl FormatRegistry {
    /// Build and validate a registry edition.
    pub fn new(
        importable: impl IntoIterator<Item = FormatCode>,
        exportable: impl IntoIterator<Item = FormatCode>,
    ) -> Result<Self, RegistryError> {
        let importable: BTreeSet<_> = importable.into_iter().collect();
        let exportable: BTreeSet<_> = exportable.into_iter().collect();

        let registry = Self {
            importable,
            exportable,
            by_mime: build_mime_index(),
            by_extension: build_extension_index(),
        };
        registry.validate()?;

        debug!(
            importable = registry.importable.len(),
            exportable = registry.exportable.len(),
            mime_types = registry.by_mime.len(),
            "Format registry built"
        );

        Ok(registry)
    }

    /// The standard bibutils edition.
    pub fn standard() -> Result<Self, RegistryError> {
        Self::new(
            STANDARD_IMPORTABLE.iter().copied(),
            STANDARD_EXPORTABLE.iter().copied(),
        )
    }

    fn validate(&self) -> Result<(), RegistryError> {
        let hub = FormatCode::HUB;
        if !self.importable.contains(&hub) {
            return Err(RegistryError::HubNotImportable { hub });
        }
        if !self.exportable.contains(&hub) {
            return Err(RegistryError::HubNotExportable { hub });
        }

        for code in self.importable.union(&self.exportable) {
            if code.human_name().is_empty() {
                return Err(RegistryError::MissingMetadata {
                    code: *code,
                    field: "human name",
                });
            }
            if !code.mime_type().contains('/') {
                return Err(RegistryError::MissingMetadata {
                    code: *code,
                    field: "MIME type",
                });
            }
            if code.extension().len() < 2 || !code.extension().starts_with('.') {
                return Err(RegistryError::MissingMetadata {
                    code: *code,
                    field: "file extension",
                });
            }
        }

        Ok(())
    }

    /// The hub format all indirect conversions pass through.
    pub fn hub(&self) -> FormatCode {
        FormatCode::HUB
    }

    /// Whether `code` can be used as a conversion source.
    pub fn is_importable(&self, code: FormatCode) -> bool {
        self.importable.contains(&code)
    }

    /// Whether `code` can be used as a conversion target.
    pub fn is_exportable(&self, code: FormatCode) -> bool {
        self.exportable.contains(&code)
    }

    /// Whether `code` is supported in the given direction.
    pub fn supports(&self, code: FormatCode, direction: Direction) -> bool {
        match direction {
            Direction::Import => self.is_importable(code),
            Direction::Export => self.is_exportable(code),
        }
    }

    /// Importable formats in canonical order.
    pub fn importable(&self) -> impl Iterator<Item = FormatCode> + '_ {
        self.importable.iter().copied()
    }

    /// Exportable formats in canonical order.
    pub fn exportable(&self) -> impl Iterator<Item = FormatCode> + '_ {
        self.exportable.iter().copied()
    }

    /// Candidate formats for a MIME type. Parameters (`; charset=...`) are
    /// ignored.
    pub fn formats_for_mime(&self, mime: &str) -> &[FormatCode] {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        self.by_mime
            .get(&essence.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Candidate formats for a file extension, with or without the dot.
    pub fn formats_for_extension(&self, extension: &str) -> &[FormatCode] {
        let ext = extension.trim().to_ascii_lowercase();
        let key = if ext.starts_with('.') {
            ext
        } else {
            format!(".{ext}")
        };
        self.by_extension
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn build_mime_index() -> HashMap<String, Vec<FormatCode>> {
    let mut index: HashMap<String, Vec<FormatCode>> = HashMap::new();
    for code in FormatCode::ALL {
        index
            .entry(code.mime_type().to_string())
            .or_default()
            .push(*code);
    }
    for (mime, codes) in MIME_ALIASES {
        index
            .entry((*mime).to_string())
            .or_default()
            .extend_from_slice(codes);
    }
    for codes in index.values_mut() {
        codes.sort_unstable();
        codes.dedup();
    }
    index
}

fn build_extension_index() -> HashMap<String, Vec<FormatCode>> {
    let mut index: HashMap<String, Vec<FormatCode>> = HashMap::new();
    for code in FormatCode::ALL {
        index
            .entry(code.extension().to_string())
            .or_default()
            .push(*code);
    }
    index
}
