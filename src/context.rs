//! Parse and insert context shared by every metadata node

use serde::{Deserialize, Serialize};
use std::fmt;

/// Newest AppStream API version this crate writes
pub const API_VERSION_NEWEST: f64 = 0.9;

/// Releases written per `<releases>` block unless configured otherwise
pub const DEFAULT_MAX_RELEASES: usize = 3;

/// Kind of document a tree was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Unknown,
    /// Distro catalog (`.xml.gz`, `.yml`)
    Appstream,
    /// Upstream `.appdata.xml`
    Appdata,
    /// Upstream `.metainfo.xml`
    Metainfo,
    Desktop,
    Inf,
}

/// How `<description>` translations are laid out in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionFormat {
    /// One `<description xml:lang="…">` element per locale
    PerLocaleTags,
    /// A single `<description>` whose paragraphs carry their own `xml:lang`
    EmbeddedLocales,
}

impl SourceKind {
    /// Map a source kind name; unknown names give [`SourceKind::Unknown`]
    pub fn from_name(name: &str) -> Self {
        match name {
            "appstream" => SourceKind::Appstream,
            "appdata" => SourceKind::Appdata,
            "metainfo" => SourceKind::Metainfo,
            "desktop" => SourceKind::Desktop,
            "inf" => SourceKind::Inf,
            _ => SourceKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Unknown => "unknown",
            SourceKind::Appstream => "appstream",
            SourceKind::Appdata => "appdata",
            SourceKind::Metainfo => "metainfo",
            SourceKind::Desktop => "desktop",
            SourceKind::Inf => "inf",
        }
    }

    /// Guess the source kind from a file name
    pub fn guess(filename: &str) -> Self {
        const SUFFIXES: &[(&str, SourceKind)] = &[
            (".xml.gz", SourceKind::Appstream),
            (".yml", SourceKind::Appstream),
            (".yml.gz", SourceKind::Appstream),
            (".desktop", SourceKind::Desktop),
            (".desktop.in", SourceKind::Desktop),
            (".appdata.xml", SourceKind::Appdata),
            (".appdata.xml.in", SourceKind::Appdata),
            (".metainfo.xml", SourceKind::Metainfo),
            (".metainfo.xml.in", SourceKind::Metainfo),
            (".xml", SourceKind::Appstream),
            (".inf", SourceKind::Inf),
        ];
        SUFFIXES
            .iter()
            .find(|(suffix, _)| filename.ends_with(suffix))
            .map(|(_, kind)| *kind)
            .unwrap_or(SourceKind::Unknown)
    }

    pub fn description_format(&self) -> DescriptionFormat {
        match self {
            SourceKind::Appstream => DescriptionFormat::PerLocaleTags,
            _ => DescriptionFormat::EmbeddedLocales,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settings threaded through every insert and parse call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeContext {
    /// Target AppStream API version; gates which fields are written
    pub version: f64,
    /// Document the tree came from; selects the description layout
    pub source_kind: SourceKind,
    /// Upper bound on releases written per `<releases>` block
    pub max_releases: usize,
}

impl NodeContext {
    pub fn new(version: f64, source_kind: SourceKind) -> Self {
        Self {
            version,
            source_kind,
            max_releases: DEFAULT_MAX_RELEASES,
        }
    }

    pub fn with_max_releases(mut self, max_releases: usize) -> Self {
        self.max_releases = max_releases;
        self
    }

    pub fn description_format(&self) -> DescriptionFormat {
        self.source_kind.description_format()
    }
}

impl Default for NodeContext {
    fn default() -> Self {
        Self::new(API_VERSION_NEWEST, SourceKind::Appstream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_source_kind() {
        assert_eq!(SourceKind::guess("fedora-23.xml.gz"), SourceKind::Appstream);
        assert_eq!(SourceKind::guess("Components-amd64.yml.gz"), SourceKind::Appstream);
        assert_eq!(SourceKind::guess("gimp.appdata.xml"), SourceKind::Appdata);
        assert_eq!(SourceKind::guess("gimp.appdata.xml.in"), SourceKind::Appdata);
        assert_eq!(SourceKind::guess("font.metainfo.xml"), SourceKind::Metainfo);
        assert_eq!(SourceKind::guess("catalog.xml"), SourceKind::Appstream);
        assert_eq!(SourceKind::guess("gimp.desktop"), SourceKind::Desktop);
        assert_eq!(SourceKind::guess("firmware.inf"), SourceKind::Inf);
        assert_eq!(SourceKind::guess("README"), SourceKind::Unknown);
    }

    #[test]
    fn test_source_kind_names() {
        for kind in [
            SourceKind::Appstream,
            SourceKind::Appdata,
            SourceKind::Metainfo,
            SourceKind::Desktop,
            SourceKind::Inf,
        ] {
            assert_eq!(SourceKind::from_name(kind.as_str()), kind);
        }
        assert_eq!(SourceKind::from_name("AppStream"), SourceKind::Unknown);
    }

    #[test]
    fn test_description_format() {
        assert_eq!(
            SourceKind::Appstream.description_format(),
            DescriptionFormat::PerLocaleTags
        );
        assert_eq!(
            SourceKind::Metainfo.description_format(),
            DescriptionFormat::EmbeddedLocales
        );
    }
}
