//! The `<releases>` block of a catalog entry

use serde::Serialize;
use std::cmp::Ordering;

use crate::context::NodeContext;
use crate::error::Result;
use crate::node::{InsertFlags, Node};
use crate::release::Release;

/// Releases of one component, merged by version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReleaseSet {
    releases: Vec<Release>,
}

impl ReleaseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a release, merging it into an existing one with the same version
    pub fn add(&mut self, release: Release) {
        match self
            .releases
            .iter()
            .position(|r| r.version() == release.version())
        {
            Some(index) => {
                tracing::debug!("merging duplicate release {:?}", release.version());
                self.releases[index].merge(release);
            }
            None => self.releases.push(release),
        }
    }

    pub fn by_version(&self, version: &str) -> Option<&Release> {
        self.releases.iter().find(|r| r.version() == Some(version))
    }

    /// The release that sorts first
    pub fn newest(&self) -> Option<&Release> {
        self.releases.iter().reduce(|newest, r| {
            if Release::compare(r, newest) != Ordering::Greater {
                r
            } else {
                newest
            }
        })
    }

    /// Stable newest-first sort.
    ///
    /// `Release::compare` is not a total order once unversioned releases are
    /// mixed with versioned ones, so this is an insertion sort.
    pub fn sort(&mut self) {
        for i in 1..self.releases.len() {
            let mut j = i;
            while j > 0
                && Release::compare(&self.releases[j], &self.releases[j - 1]) == Ordering::Less
            {
                self.releases.swap(j, j - 1);
                j -= 1;
            }
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Release> {
        self.releases.iter()
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// Add every `<release>` child of a `<releases>` element
    pub fn parse(&mut self, node: &mut Node, ctx: &NodeContext) -> Result<()> {
        for child in node.children_mut().iter_mut() {
            if child.tag() != "release" {
                continue;
            }
            let mut release = Release::new();
            release.parse(child, ctx)?;
            self.add(release);
        }
        Ok(())
    }

    /// Sort and write the newest `ctx.max_releases` releases.
    ///
    /// Nothing is written for an empty set or API versions before 0.6.
    pub fn insert<'a>(
        &mut self,
        parent: &'a mut Node,
        ctx: &NodeContext,
    ) -> Option<&'a mut Node> {
        if self.releases.is_empty() || ctx.version < 0.6 {
            return None;
        }
        self.sort();
        let node = parent.insert("releases", None, InsertFlags::NONE, &[]);
        for release in self.releases.iter().take(ctx.max_releases) {
            release.insert(node, ctx);
        }
        Some(node)
    }
}

impl<'a> IntoIterator for &'a ReleaseSet {
    type Item = &'a Release;
    type IntoIter = std::slice::Iter<'a, Release>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Release> for ReleaseSet {
    fn from_iter<I: IntoIterator<Item = Release>>(iter: I) -> Self {
        let mut set = ReleaseSet::new();
        for release in iter {
            set.add(release);
        }
        set
    }
}
