//! Checksums attached to a release
//!
//! A checksum stores a precomputed digest together with the algorithm that
//! produced it. Unknown algorithm or target names never fail a parse; they
//! degrade to [`ChecksumKind::Invalid`] and [`ChecksumTarget::Unknown`].

use serde::Serialize;
use std::fmt;

use crate::dep11::Dep11Node;
use crate::error::Result;
use crate::node::{InsertFlags, Node};

/// Digest algorithm of a checksum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumKind {
    Md5,
    Sha1,
    Sha256,
    Sha512,
    /// Unset or unrecognised algorithm
    #[default]
    Invalid,
}

impl ChecksumKind {
    /// Map an algorithm name, ignoring ASCII case
    pub fn from_name(name: &str) -> Self {
        [
            ChecksumKind::Md5,
            ChecksumKind::Sha1,
            ChecksumKind::Sha256,
            ChecksumKind::Sha512,
        ]
        .into_iter()
        .find(|kind| kind.as_str().is_some_and(|n| n.eq_ignore_ascii_case(name)))
        .unwrap_or(ChecksumKind::Invalid)
    }

    /// Lowercase algorithm name, `None` for [`ChecksumKind::Invalid`]
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            ChecksumKind::Md5 => Some("md5"),
            ChecksumKind::Sha1 => Some("sha1"),
            ChecksumKind::Sha256 => Some("sha256"),
            ChecksumKind::Sha512 => Some("sha512"),
            ChecksumKind::Invalid => None,
        }
    }
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().unwrap_or("invalid"))
    }
}

/// What the digest was computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumTarget {
    #[default]
    Unknown,
    /// The downloadable archive
    Container,
    /// The payload inside the archive
    Content,
}

impl ChecksumTarget {
    pub fn from_name(name: &str) -> Self {
        match name {
            "container" => ChecksumTarget::Container,
            "content" => ChecksumTarget::Content,
            _ => ChecksumTarget::Unknown,
        }
    }

    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            ChecksumTarget::Container => Some("container"),
            ChecksumTarget::Content => Some("content"),
            ChecksumTarget::Unknown => None,
        }
    }
}

/// A digest of one release artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Checksum {
    kind: ChecksumKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    target: ChecksumTarget,
}

impl Checksum {
    /// Create an empty checksum
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a checksum for a named file
    pub fn for_file(
        kind: ChecksumKind,
        filename: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            filename: Some(filename.into()),
            value: Some(value.into()),
            target: ChecksumTarget::Unknown,
        }
    }

    pub fn kind(&self) -> ChecksumKind {
        self.kind
    }

    /// Source file the digest was computed over
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// The digest, stored verbatim
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn target(&self) -> ChecksumTarget {
        self.target
    }

    pub fn set_kind(&mut self, kind: ChecksumKind) {
        self.kind = kind;
    }

    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = Some(filename.into());
    }

    /// Set the filename from the first `len` bytes of `filename`, or all of
    /// it when `len` is `None`. The cut is moved back to a character boundary.
    pub fn set_filename_len(&mut self, filename: &str, len: Option<usize>) {
        let mut end = len.map_or(filename.len(), |len| len.min(filename.len()));
        while !filename.is_char_boundary(end) {
            end -= 1;
        }
        self.filename = Some(filename[..end].to_string());
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }

    pub fn set_target(&mut self, target: ChecksumTarget) {
        self.target = target;
    }

    /// Append a `<checksum>` element to `parent` and return it
    pub fn insert<'a>(&self, parent: &'a mut Node) -> &'a mut Node {
        let mut attributes = Vec::with_capacity(3);
        if let Some(kind) = self.kind.as_str() {
            attributes.push(("type", kind));
        }
        if let Some(filename) = self.filename.as_deref() {
            attributes.push(("filename", filename));
        }
        if let Some(target) = self.target.as_str() {
            attributes.push(("target", target));
        }
        parent.insert("checksum", self.value.as_deref(), InsertFlags::NONE, &attributes)
    }

    /// Populate from a `<checksum>` element, consuming its filename and text
    pub fn parse(&mut self, node: &mut Node) -> Result<()> {
        if let Some(kind) = node.attribute("type") {
            self.kind = ChecksumKind::from_name(kind);
            if self.kind == ChecksumKind::Invalid {
                tracing::debug!("unknown checksum type '{}'", kind);
            }
        }
        if let Some(target) = node.attribute("target") {
            self.target = ChecksumTarget::from_name(target);
        }
        if let Some(filename) = node.take_attribute("filename") {
            self.filename = Some(filename);
        }
        if let Some(value) = node.take_data() {
            self.value = Some(value);
        }
        Ok(())
    }

    /// Populate from a DEP-11 checksum mapping
    pub fn parse_dep11(&mut self, node: &Dep11Node) -> Result<()> {
        for child in node.children() {
            let Some(value) = child.value() else {
                continue;
            };
            match child.key() {
                Some("value") => self.set_value(value),
                Some("type") => self.kind = ChecksumKind::from_name(value),
                Some("filename") => self.set_filename(value),
                Some("target") => self.target = ChecksumTarget::from_name(value),
                _ => {}
            }
        }
        Ok(())
    }
}
