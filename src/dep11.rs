//! Key/value tree for DEP-11 YAML documents
//!
//! Mappings become keyed nodes, sequence items become nodes without a key.
//! Tokenizing YAML is left to the caller.

/// One entry of a DEP-11 document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dep11Node {
    key: Option<String>,
    value: Option<String>,
    children: Vec<Dep11Node>,
}

impl Dep11Node {
    /// A mapping entry with no scalar value
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    /// A `key: value` scalar entry
    pub fn scalar(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
            children: Vec::new(),
        }
    }

    /// An anonymous sequence item
    pub fn item() -> Self {
        Self::default()
    }

    /// Builder-style append
    pub fn with_child(mut self, child: Dep11Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn children(&self) -> &[Dep11Node] {
        &self.children
    }
}
