//! A single upstream release
//!
//! Releases carry a version, a timestamp, download locations, checksums of
//! the published artifacts and a localized description. They are read from
//! and written to AppStream/AppData trees and DEP-11 documents, and sort
//! newest-first with [`Release::compare`].

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::checksum::{Checksum, ChecksumTarget};
use crate::context::{DescriptionFormat, NodeContext};
use crate::dep11::Dep11Node;
use crate::error::{Error, Result};
use crate::localized::{insert_localized, localized_unwrap, DEFAULT_LOCALE};
use crate::node::{nodes_to_xml, InsertFlags, Node};
use crate::version::vercmp;

/// One published version of a software item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Release {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    /// Seconds since the epoch, 0 when unset
    timestamp: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    locations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    checksums: Vec<Checksum>,
    /// `None` until a description has been set or parsed
    #[serde(skip_serializing_if = "Option::is_none")]
    descriptions: Option<BTreeMap<String, String>>,
}

impl Release {
    /// Create an empty release
    pub fn new() -> Self {
        Self::default()
    }

    /// Order two releases newest-first.
    ///
    /// Versions decide when both are set and comparable; otherwise, or when
    /// they are equal, the later timestamp comes first.
    pub fn compare(a: &Release, b: &Release) -> Ordering {
        vercmp(a.version(), b.version())
            .map(Ordering::reverse)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The timestamp as a UTC date, `None` when unset
    pub fn date(&self) -> Option<DateTime<Utc>> {
        if self.timestamp == 0 {
            return None;
        }
        let secs = i64::try_from(self.timestamp).ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// First download location, typically the preferred mirror
    pub fn location_default(&self) -> Option<&str> {
        self.locations.first().map(String::as_str)
    }

    pub fn checksums(&self) -> &[Checksum] {
        &self.checksums
    }

    /// First checksum computed over `filename`
    pub fn checksum_by_filename(&self, filename: &str) -> Option<&Checksum> {
        self.checksums
            .iter()
            .find(|c| c.filename() == Some(filename))
    }

    /// First checksum with the given target
    pub fn checksum_by_target(&self, target: ChecksumTarget) -> Option<&Checksum> {
        self.checksums.iter().find(|c| c.target() == target)
    }

    /// Description markup for `locale`, or the untranslated text for `None`
    pub fn description(&self, locale: Option<&str>) -> Option<&str> {
        self.descriptions
            .as_ref()?
            .get(locale.unwrap_or(DEFAULT_LOCALE))
            .map(String::as_str)
    }

    /// All description markup keyed by locale
    pub fn descriptions(&self) -> Option<&BTreeMap<String, String>> {
        self.descriptions.as_ref()
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = Some(version.into());
    }

    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    /// Set pre-escaped description markup; `None` sets the untranslated text
    pub fn set_description(&mut self, locale: Option<&str>, markup: impl Into<String>) {
        self.descriptions
            .get_or_insert_with(BTreeMap::new)
            .insert(locale.unwrap_or(DEFAULT_LOCALE).to_string(), markup.into());
    }

    /// Add a download location unless it is already known
    pub fn add_location(&mut self, location: impl Into<String>) {
        let location = location.into();
        if self.locations.contains(&location) {
            return;
        }
        self.locations.push(location);
    }

    pub fn add_checksum(&mut self, checksum: Checksum) {
        self.checksums.push(checksum);
    }

    /// Fold another release of the same version into this one.
    ///
    /// A donor description replaces ours and brings its timestamp along; the
    /// timestamp is also taken when ours is unset. Locations are added,
    /// checksums only when no checksum for the same filename exists.
    pub fn merge(&mut self, donor: Release) {
        let description = donor.description(None).map(str::to_owned);
        let has_description = description.is_some();
        if let Some(description) = description {
            self.set_description(None, description);
        }
        if has_description || self.timestamp == 0 {
            self.timestamp = donor.timestamp;
        }
        for location in donor.locations {
            self.add_location(location);
        }
        for checksum in donor.checksums {
            if self
                .checksums
                .iter()
                .any(|c| c.filename() == checksum.filename())
            {
                continue;
            }
            self.checksums.push(checksum);
        }
    }

    /// Append a `<release>` element to `parent` and return it.
    ///
    /// Locations and checksums need API version 0.9, descriptions 0.6.
    pub fn insert<'a>(&self, parent: &'a mut Node, ctx: &NodeContext) -> &'a mut Node {
        let node = parent.insert("release", None, InsertFlags::NONE, &[]);
        if self.timestamp > 0 {
            node.add_attribute("timestamp", self.timestamp.to_string());
        }
        if let Some(version) = &self.version {
            node.add_attribute("version", version.as_str());
        }
        if ctx.version >= 0.9 {
            for location in &self.locations {
                node.insert("location", Some(location.as_str()), InsertFlags::NONE, &[]);
            }
            for checksum in &self.checksums {
                checksum.insert(node);
            }
        }
        if let Some(descriptions) = &self.descriptions {
            if ctx.version >= 0.6 {
                insert_localized(
                    node,
                    "description",
                    descriptions,
                    InsertFlags::PRE_ESCAPED | InsertFlags::DEDUPE_LANG,
                );
            }
        }
        node
    }

    /// Populate from a `<release>` element.
    ///
    /// The version attribute and the text of `<location>` and `<checksum>`
    /// children are consumed. A failing checksum or an invalid AppData
    /// description aborts the parse and leaves the release half-populated.
    pub fn parse(&mut self, node: &mut Node, ctx: &NodeContext) -> Result<()> {
        tracing::trace!("parsing release {:?}", node.attribute("version"));

        if let Some(timestamp) = node.attribute("timestamp") {
            self.timestamp = parse_timestamp(timestamp);
        }
        if let Some(version) = node.take_attribute("version") {
            self.version = Some(version);
        }

        self.locations.clear();
        for child in node.children_mut().iter_mut() {
            if child.tag() != "location" {
                continue;
            }
            if let Some(location) = child.take_data() {
                self.add_location(location);
            }
        }

        self.checksums.clear();
        let checksum_nodes = node
            .children_mut()
            .iter_mut()
            .filter(|n| n.tag() == "checksum");
        for (index, child) in checksum_nodes.enumerate() {
            let mut checksum = Checksum::new();
            checksum.parse(child).map_err(|e| Error::Checksum {
                index,
                source: Box::new(e),
            })?;
            self.checksums.push(checksum);
        }

        match ctx.description_format() {
            DescriptionFormat::PerLocaleTags => {
                for child in node.children() {
                    if child.tag() != "description" || !child.has_children() {
                        continue;
                    }
                    let markup = nodes_to_xml(child.children());
                    self.set_description(child.attribute("xml:lang"), markup);
                }
            }
            DescriptionFormat::EmbeddedLocales => {
                if let Some(description) = node.find("description") {
                    let descriptions = localized_unwrap(description).map_err(|e| {
                        tracing::warn!(
                            "release {:?}: invalid description: {}",
                            self.version,
                            e
                        );
                        e
                    })?;
                    self.descriptions = Some(descriptions);
                }
            }
        }

        Ok(())
    }

    /// Populate from a DEP-11 release mapping.
    ///
    /// As with [`Release::parse`], locations and checksums present in the
    /// mapping replace the ones already held.
    pub fn parse_dep11(&mut self, node: &Dep11Node) -> Result<()> {
        for child in node.children() {
            match child.key() {
                Some("version") => {
                    if let Some(version) = child.value() {
                        self.set_version(version);
                    }
                }
                Some("unix-timestamp") => {
                    if let Some(timestamp) = child.value() {
                        self.timestamp = parse_timestamp(timestamp);
                    }
                }
                Some("description") => {
                    for text in child.children() {
                        if let Some(markup) = text.value() {
                            self.set_description(text.key(), markup);
                        }
                    }
                }
                Some("locations") => {
                    self.locations.clear();
                    for location in child.children() {
                        if let Some(url) = location.value().or(location.key()) {
                            self.add_location(url);
                        }
                    }
                }
                Some("checksums") => {
                    self.checksums.clear();
                    for item in child.children() {
                        let mut checksum = Checksum::new();
                        checksum.parse_dep11(item)?;
                        self.checksums.push(checksum);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Decimal epoch seconds; anything unparsable counts as unset
fn parse_timestamp(value: &str) -> u64 {
    value.trim().parse().unwrap_or_else(|_| {
        tracing::debug!("ignoring malformed timestamp '{}'", value);
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::ChecksumKind;
    use crate::context::SourceKind;

    fn release(version: Option<&str>, timestamp: u64) -> Release {
        let mut r = Release::new();
        if let Some(v) = version {
            r.set_version(v);
        }
        r.set_timestamp(timestamp);
        r
    }

    fn parse(xml: &str, kind: SourceKind) -> Result<Release> {
        let mut root = Node::from_xml(xml)?;
        let node = root.find_mut("release").expect("fixture has a <release>");
        let mut release = Release::new();
        release.parse(node, &NodeContext::new(0.9, kind))?;
        Ok(release)
    }

    #[test]
    fn test_compare_by_version() {
        let newer = release(Some("2.0"), 0);
        let older = release(Some("1.0"), 0);
        assert_eq!(Release::compare(&newer, &older), Ordering::Less);
        assert_eq!(Release::compare(&older, &newer), Ordering::Greater);
    }

    #[test]
    fn test_compare_falls_back_to_timestamp() {
        let later = release(None, 200);
        let earlier = release(None, 100);
        assert_eq!(Release::compare(&later, &earlier), Ordering::Less);
        assert_eq!(Release::compare(&earlier, &later), Ordering::Greater);

        let later = release(Some("1.0"), 200);
        let earlier = release(Some("1.0"), 100);
        assert_eq!(Release::compare(&later, &earlier), Ordering::Less);

        let a = release(None, 100);
        let b = release(None, 100);
        assert_eq!(Release::compare(&a, &b), Ordering::Equal);
    }

    #[test]
    fn test_version_beats_timestamp() {
        let newer = release(Some("2.0"), 100);
        let older = release(Some("1.0"), 200);
        assert_eq!(Release::compare(&newer, &older), Ordering::Less);
    }

    #[test]
    fn test_add_location_dedupes() {
        let mut r = Release::new();
        r.add_location("https://a");
        r.add_location("https://a");
        r.add_location("https://b");
        assert_eq!(r.locations(), ["https://a", "https://b"]);
        assert_eq!(r.location_default(), Some("https://a"));
        assert_eq!(Release::new().location_default(), None);
    }

    #[test]
    fn test_checksum_lookup() {
        let mut r = Release::new();
        r.add_checksum(Checksum::for_file(ChecksumKind::Sha1, "a.tar.gz", "aaa"));
        r.add_checksum(Checksum::for_file(ChecksumKind::Sha1, "b.tar.gz", "bbb"));
        r.add_checksum(Checksum::for_file(ChecksumKind::Md5, "a.tar.gz", "ccc"));

        assert_eq!(r.checksum_by_filename("a.tar.gz").and_then(Checksum::value), Some("aaa"));
        assert!(r.checksum_by_filename("c.tar.gz").is_none());

        let mut content = Checksum::for_file(ChecksumKind::Sha256, "fw.bin", "ddd");
        content.set_target(ChecksumTarget::Content);
        r.add_checksum(content);
        assert_eq!(
            r.checksum_by_target(ChecksumTarget::Content).and_then(Checksum::value),
            Some("ddd")
        );
        assert!(r.checksum_by_target(ChecksumTarget::Container).is_none());
    }

    #[test]
    fn test_descriptions() {
        let mut r = Release::new();
        assert_eq!(r.description(None), None);
        assert!(r.descriptions().is_none());

        r.set_description(None, "<p>Fixes</p>");
        r.set_description(Some("de"), "<p>Fehler</p>");
        r.set_description(Some("de"), "<p>Korrekturen</p>");
        assert_eq!(r.description(None), Some("<p>Fixes</p>"));
        assert_eq!(r.description(Some("C")), Some("<p>Fixes</p>"));
        assert_eq!(r.description(Some("de")), Some("<p>Korrekturen</p>"));
        assert_eq!(r.description(Some("fr")), None);
    }

    #[test]
    fn test_date() {
        assert_eq!(release(None, 0).date(), None);
        let date = release(None, 1_000_000_000).date().unwrap();
        assert_eq!(date.to_rfc3339(), "2001-09-09T01:46:40+00:00");
    }

    #[test]
    fn test_insert_respects_api_version() {
        let mut r = release(Some("1.0"), 42);
        r.add_location("https://a");
        r.add_checksum(Checksum::for_file(ChecksumKind::Sha256, "a.tar.xz", "00"));
        r.set_description(None, "<p>Hi</p>");

        let mut root = Node::root();
        r.insert(&mut root, &NodeContext::new(0.5, SourceKind::Appstream));
        assert_eq!(root.to_xml(), r#"<release timestamp="42" version="1.0"/>"#);

        let mut root = Node::root();
        r.insert(&mut root, &NodeContext::new(0.8, SourceKind::Appstream));
        assert_eq!(
            root.to_xml(),
            r#"<release timestamp="42" version="1.0"><description><p>Hi</p></description></release>"#
        );

        let mut root = Node::root();
        r.insert(&mut root, &NodeContext::new(0.9, SourceKind::Appstream));
        assert_eq!(
            root.to_xml(),
            concat!(
                r#"<release timestamp="42" version="1.0">"#,
                r#"<location>https://a</location>"#,
                r#"<checksum type="sha256" filename="a.tar.xz">00</checksum>"#,
                r#"<description><p>Hi</p></description>"#,
                r#"</release>"#
            )
        );
    }

    #[test]
    fn test_insert_omits_unset_fields() {
        let mut root = Node::root();
        Release::new().insert(&mut root, &NodeContext::default());
        assert_eq!(root.to_xml(), "<release/>");
    }

    #[test]
    fn test_parse_malformed_timestamp_is_zero() {
        let r = parse(
            r#"<release timestamp="yesterday" version="1.0"/>"#,
            SourceKind::Appstream,
        )
        .unwrap();
        assert_eq!(r.timestamp(), 0);
        assert_eq!(r.version(), Some("1.0"));
    }

    #[test]
    fn test_parse_appstream_descriptions() {
        let r = parse(
            r#"<release version="1.0">
                 <description xml:lang="de"><p>Hallo</p></description>
                 <description xml:lang="en"><p>Hello</p></description>
                 <description xml:lang="fr"/>
               </release>"#,
            SourceKind::Appstream,
        )
        .unwrap();
        let descriptions = r.descriptions().unwrap();
        assert_eq!(descriptions.len(), 2);
        assert_eq!(r.description(Some("de")), Some("<p>Hallo</p>"));
        assert_eq!(r.description(Some("en")), Some("<p>Hello</p>"));

        let r = parse(
            r#"<release><description><p>Default</p><ul><li>x</li></ul></description></release>"#,
            SourceKind::Appstream,
        )
        .unwrap();
        assert_eq!(r.description(None), Some("<p>Default</p><ul><li>x</li></ul>"));
    }

    #[test]
    fn test_parse_appdata_description() {
        let r = parse(
            r#"<release version="1.0">
                 <description>
                   <p>Fixes</p>
                   <p xml:lang="de">Korrekturen</p>
                 </description>
               </release>"#,
            SourceKind::Appdata,
        )
        .unwrap();
        assert_eq!(r.description(None), Some("<p>Fixes</p>"));
        assert_eq!(r.description(Some("de")), Some("<p>Korrekturen</p>"));
    }

    #[test]
    fn test_parse_appstream_description_with_inline_markup() {
        let r = parse(
            r#"<release version="1.0">
                 <description><p>Use <code>foo --bar</code> instead of baz.</p></description>
               </release>"#,
            SourceKind::Appstream,
        )
        .unwrap();
        assert_eq!(
            r.description(None),
            Some("<p>Use <code>foo --bar</code> instead of baz.</p>")
        );

        let mut root = Node::root();
        r.insert(&mut root, &NodeContext::default());
        assert!(root
            .to_xml()
            .contains("<description><p>Use <code>foo --bar</code> instead of baz.</p></description>"));
    }

    #[test]
    fn test_parse_appdata_description_with_inline_markup() {
        let r = parse(
            r#"<release version="1.0">
                 <description>
                   <p>Press <em>Ctrl</em> now</p>
                   <p xml:lang="de">Jetzt <em>Strg</em> drücken</p>
                 </description>
               </release>"#,
            SourceKind::Appdata,
        )
        .unwrap();
        assert_eq!(r.description(None), Some("<p>Press <em>Ctrl</em> now</p>"));
        assert_eq!(
            r.description(Some("de")),
            Some("<p>Jetzt <em>Strg</em> drücken</p>")
        );
    }

    #[test]
    fn test_parse_appdata_invalid_description_fails() {
        let err = parse(
            r#"<release version="1.0"><description><blink>x</blink></description></release>"#,
            SourceKind::Metainfo,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidMarkup(_)));
    }

    #[test]
    fn test_parse_replaces_locations_and_checksums() {
        let mut root = Node::from_xml(
            r#"<release>
                 <location>https://b</location>
                 <location>https://b</location>
                 <checksum type="sha1" filename="b.zip">bb</checksum>
               </release>"#,
        )
        .unwrap();
        let mut r = Release::new();
        r.add_location("https://stale");
        r.add_checksum(Checksum::for_file(ChecksumKind::Md5, "stale.zip", "00"));
        r.parse(root.find_mut("release").unwrap(), &NodeContext::default())
            .unwrap();
        assert_eq!(r.locations(), ["https://b"]);
        assert_eq!(r.checksums().len(), 1);
        assert_eq!(r.checksums()[0].filename(), Some("b.zip"));
    }

    #[test]
    fn test_merge() {
        let mut existing = release(Some("1.0"), 100);
        existing.add_location("https://a");
        existing.add_checksum(Checksum::for_file(ChecksumKind::Sha1, "a.zip", "old"));

        let mut donor = release(Some("1.0"), 200);
        donor.set_description(None, "<p>Notes</p>");
        donor.add_location("https://a");
        donor.add_location("https://b");
        donor.add_checksum(Checksum::for_file(ChecksumKind::Sha1, "a.zip", "new"));
        donor.add_checksum(Checksum::for_file(ChecksumKind::Sha1, "b.zip", "bbb"));

        existing.merge(donor);
        assert_eq!(existing.timestamp(), 200);
        assert_eq!(existing.description(None), Some("<p>Notes</p>"));
        assert_eq!(existing.locations(), ["https://a", "https://b"]);
        assert_eq!(existing.checksums().len(), 2);
        assert_eq!(
            existing.checksum_by_filename("a.zip").and_then(Checksum::value),
            Some("old")
        );
    }

    #[test]
    fn test_merge_keeps_timestamp_without_description() {
        let mut existing = release(Some("1.0"), 100);
        existing.merge(release(Some("1.0"), 200));
        assert_eq!(existing.timestamp(), 100);

        let mut unset = release(Some("1.0"), 0);
        unset.merge(release(Some("1.0"), 200));
        assert_eq!(unset.timestamp(), 200);
    }

    #[test]
    fn test_parse_dep11() {
        let node = Dep11Node::item()
            .with_child(Dep11Node::scalar("version", "3.2"))
            .with_child(Dep11Node::scalar("unix-timestamp", "1400000000"))
            .with_child(
                Dep11Node::new("description")
                    .with_child(Dep11Node::scalar("C", "<p>Speedups</p>"))
                    .with_child(Dep11Node::scalar("de", "<p>Schneller</p>")),
            )
            .with_child(
                Dep11Node::new("locations")
                    .with_child(Dep11Node::new("https://a"))
                    .with_child(Dep11Node::new("https://a")),
            )
            .with_child(
                Dep11Node::new("checksums").with_child(
                    Dep11Node::item()
                        .with_child(Dep11Node::scalar("type", "sha256"))
                        .with_child(Dep11Node::scalar("value", "beef")),
                ),
            );

        let mut r = Release::new();
        r.parse_dep11(&node).unwrap();
        assert_eq!(r.version(), Some("3.2"));
        assert_eq!(r.timestamp(), 1_400_000_000);
        assert_eq!(r.description(Some("de")), Some("<p>Schneller</p>"));
        assert_eq!(r.locations(), ["https://a"]);
        assert_eq!(r.checksums()[0].value(), Some("beef"));

        r.parse_dep11(&node).unwrap();
        assert_eq!(r.locations(), ["https://a"]);
        assert_eq!(r.checksums().len(), 1);
    }
}
