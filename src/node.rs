//! Attributed tree used as the in-memory DOM for AppStream and AppData
//!
//! A [`Node`] owns its attributes and children. Parsers read attributes with
//! [`Node::attribute`] or consume them with [`Node::take_attribute`], so a
//! caller walking the tree afterwards only sees what nobody claimed.

use std::ops::BitOr;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};

/// Flags controlling how [`Node::insert`] stores text content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertFlags {
    /// Content is already markup and must not be escaped again
    pub pre_escaped: bool,
    /// Skip translations identical to the untranslated text
    pub dedupe_lang: bool,
}

impl InsertFlags {
    pub const NONE: Self = Self {
        pre_escaped: false,
        dedupe_lang: false,
    };

    pub const PRE_ESCAPED: Self = Self {
        pre_escaped: true,
        dedupe_lang: false,
    };

    pub const DEDUPE_LANG: Self = Self {
        pre_escaped: false,
        dedupe_lang: true,
    };
}

impl BitOr for InsertFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            pre_escaped: self.pre_escaped || rhs.pre_escaped,
            dedupe_lang: self.dedupe_lang || rhs.dedupe_lang,
        }
    }
}

/// A tagged node with optional text, ordered attributes and children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    tag: String,
    data: Option<String>,
    /// `data` holds raw markup rather than plain text
    markup: bool,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Node {
    /// Create a detached node with the given tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Create an unnamed document root
    pub fn root() -> Self {
        Self::default()
    }

    fn text(data: &str) -> Self {
        Self {
            data: Some(data.to_string()),
            ..Self::default()
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Text content, if any
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Remove and return the text content
    pub fn take_data(&mut self) -> Option<String> {
        self.markup = false;
        self.data.take()
    }

    /// Whether this is a run of text between the elements of mixed content,
    /// as in the `Use ` and ` instead` around `<code>` in a paragraph
    pub fn is_text(&self) -> bool {
        self.tag.is_empty() && self.data.is_some()
    }

    /// Whether the text content is raw markup written verbatim by [`Node::to_xml`]
    pub fn is_pre_escaped(&self) -> bool {
        self.markup
    }

    /// Look up an attribute without removing it
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Remove an attribute and return its value
    pub fn take_attribute(&mut self, key: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(index).1)
    }

    /// Set an attribute, replacing any existing value for the key
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Append an already built child
    pub fn push(&mut self, child: Node) -> &mut Node {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// First direct child with the given tag
    pub fn find(&self, tag: &str) -> Option<&Node> {
        self.children.iter().find(|n| n.tag == tag)
    }

    pub fn find_mut(&mut self, tag: &str) -> Option<&mut Node> {
        self.children.iter_mut().find(|n| n.tag == tag)
    }

    /// Create a child node and return it for further population.
    ///
    /// With [`InsertFlags::pre_escaped`] the content is parsed as a markup
    /// fragment so the child carries real element children; content that is
    /// not well-formed is kept verbatim and written back unescaped.
    pub fn insert(
        &mut self,
        tag: &str,
        data: Option<&str>,
        flags: InsertFlags,
        attributes: &[(&str, &str)],
    ) -> &mut Node {
        let mut node = Node::new(tag);
        for (key, value) in attributes {
            node.add_attribute(*key, *value);
        }
        if let Some(data) = data {
            if flags.pre_escaped {
                match Node::from_xml(data) {
                    Ok(fragment) => {
                        node.data = fragment.data;
                        node.children = fragment.children;
                    }
                    Err(e) => {
                        tracing::debug!("keeping unparsable markup verbatim in <{}>: {}", tag, e);
                        node.data = Some(data.to_string());
                        node.markup = true;
                    }
                }
            } else {
                node.data = Some(data.to_string());
            }
        }
        self.push(node)
    }

    /// Visit every node tagged `tag`, outermost first; matched nodes are not descended into.
    pub fn try_for_each_named<E, F>(&mut self, tag: &str, f: &mut F) -> std::result::Result<(), E>
    where
        F: FnMut(&mut Node) -> std::result::Result<(), E>,
    {
        if self.tag == tag {
            return f(self);
        }
        for child in &mut self.children {
            child.try_for_each_named(tag, f)?;
        }
        Ok(())
    }

    /// Parse an XML document or fragment into a tree under an unnamed root.
    ///
    /// Elements holding only text get it trimmed into [`Node::data`].
    /// Whitespace between child elements is dropped, unless the element also
    /// holds other text: then every run of text is kept as a text child in
    /// document order.
    pub fn from_xml(text: &str) -> Result<Node> {
        let mut reader = Reader::from_str(text);

        let mut stack = vec![Node::root()];
        loop {
            match reader.read_event()? {
                Event::Start(ref e) => {
                    stack.push(Self::from_start(e)?);
                }
                Event::Empty(ref e) => {
                    let node = Self::from_start(e)?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(node);
                    }
                }
                Event::End(ref e) => {
                    if stack.len() < 2 {
                        return Err(Error::InvalidMarkup(format!(
                            "unexpected closing tag </{}>",
                            String::from_utf8_lossy(e.name().as_ref())
                        )));
                    }
                    if let Some(mut node) = stack.pop() {
                        node.settle_content();
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(node);
                        }
                    }
                }
                Event::Text(ref t) => {
                    let text = t.unescape()?;
                    if let Some(node) = stack.last_mut() {
                        node.push_text(&text);
                    }
                }
                Event::CData(t) => {
                    let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                    if let Some(node) = stack.last_mut() {
                        node.push_text(&text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        match stack.len() {
            1 => {
                let mut root = stack.remove(0);
                root.settle_content();
                Ok(root)
            }
            _ => Err(Error::InvalidMarkup(format!(
                "unclosed element <{}>",
                stack.last().map(|n| n.tag.as_str()).unwrap_or_default()
            ))),
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(last) = self.children.last_mut().filter(|n| n.is_text()) {
            last.append_data(text);
            return;
        }
        self.children.push(Node::text(text));
    }

    /// Fold the raw text runs collected while parsing into their final shape
    fn settle_content(&mut self) {
        if self.children.iter().all(Node::is_text) {
            let text: String = self
                .children
                .drain(..)
                .filter_map(|child| child.data)
                .collect();
            let text = text.trim();
            if !text.is_empty() {
                self.append_data(text);
            }
            return;
        }

        let mixed = self
            .children
            .iter()
            .any(|child| child.is_text() && child.data().is_some_and(|t| !t.trim().is_empty()));
        if !mixed {
            self.children.retain(|child| !child.is_text());
            return;
        }

        if let Some(data) = self.children.first_mut().and_then(text_of) {
            *data = data.trim_start().to_string();
        }
        if let Some(data) = self.children.last_mut().and_then(text_of) {
            *data = data.trim_end().to_string();
        }
        self.children
            .retain(|child| !child.is_text() || child.data().is_some_and(|t| !t.is_empty()));
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Node> {
        let mut node = Node::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            node.attributes.push((key, value));
        }
        Ok(node)
    }

    fn append_data(&mut self, text: &str) {
        match &mut self.data {
            Some(data) => data.push_str(text),
            None => self.data = Some(text.to_string()),
        }
    }

    /// Render only the content of this node, without its own tag
    pub fn inner_xml(&self) -> String {
        let mut out = String::new();
        self.write_content(&mut out);
        out
    }

    /// Render this node as XML; an unnamed root renders only its children
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        if self.tag.is_empty() {
            self.write_content(out);
            return;
        }
        out.push('<');
        out.push_str(&self.tag);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.data.is_none() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        self.write_content(out);
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }

    fn write_content(&self, out: &mut String) {
        if let Some(data) = &self.data {
            if self.markup {
                out.push_str(data);
            } else {
                out.push_str(&escape(data.as_str()));
            }
        }
        for child in &self.children {
            child.write_xml(out);
        }
    }
}

fn text_of(node: &mut Node) -> Option<&mut String> {
    if node.is_text() {
        node.data.as_mut()
    } else {
        None
    }
}

/// Render a run of sibling nodes back to markup
pub fn nodes_to_xml(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_xml(&mut out);
    }
    out
}
