//! Locale-keyed text in AppStream and AppData trees

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::node::{InsertFlags, Node};

/// Locale key for untranslated text
pub const DEFAULT_LOCALE: &str = "C";

const LANG_ATTRIBUTE: &str = "xml:lang";

/// Emit one `name` child per locale in `values`.
///
/// Every locale except [`DEFAULT_LOCALE`] gets an `xml:lang` attribute. With
/// `dedupe_lang`, translations identical to the default text are dropped.
pub fn insert_localized(
    parent: &mut Node,
    name: &str,
    values: &BTreeMap<String, String>,
    flags: InsertFlags,
) {
    let untranslated = values.get(DEFAULT_LOCALE);
    for (locale, text) in values {
        let is_default = locale == DEFAULT_LOCALE;
        if flags.dedupe_lang && !is_default && Some(text) == untranslated {
            continue;
        }
        let lang = [(LANG_ATTRIBUTE, locale.as_str())];
        let attributes: &[(&str, &str)] = if is_default { &[] } else { &lang };
        parent.insert(name, Some(text.as_str()), flags, attributes);
    }
}

/// Split an AppData `<description>` holding every translation into one
/// markup string per locale.
///
/// Only `<p>`, `<ul>` and `<ol>` may appear at the top level and lists may
/// only hold `<li>`; anything else is rejected as invalid markup. Inline
/// markup inside paragraphs and list items is carried over unchanged.
pub fn localized_unwrap(node: &Node) -> Result<BTreeMap<String, String>> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();

    for child in node.children() {
        if child.is_text() {
            return Err(Error::InvalidMarkup(format!(
                "text outside of a paragraph in <{}>",
                node.tag()
            )));
        }
        match child.tag() {
            "p" => {
                let text = out.entry(locale_of(child).to_string()).or_default();
                text.push_str("<p>");
                text.push_str(&child.inner_xml());
                text.push_str("</p>");
            }
            list @ ("ul" | "ol") => {
                let mut opened = BTreeSet::new();
                for item in child.children() {
                    if item.is_text() {
                        return Err(Error::InvalidMarkup(format!(
                            "text outside of a list item in <{}>",
                            list
                        )));
                    }
                    if item.tag() != "li" {
                        return Err(Error::InvalidMarkup(format!(
                            "tag <{}> is not allowed in <{}>",
                            item.tag(),
                            list
                        )));
                    }
                    let locale = locale_of(item);
                    let text = out.entry(locale.to_string()).or_default();
                    if opened.insert(locale) {
                        text.push_str(&format!("<{}>", list));
                    }
                    text.push_str("<li>");
                    text.push_str(&item.inner_xml());
                    text.push_str("</li>");
                }
                for locale in opened {
                    if let Some(text) = out.get_mut(locale) {
                        text.push_str(&format!("</{}>", list));
                    }
                }
            }
            other => {
                return Err(Error::InvalidMarkup(format!(
                    "unknown tag <{}> in <{}>",
                    other,
                    node.tag()
                )));
            }
        }
    }

    Ok(out)
}

fn locale_of(node: &Node) -> &str {
    node.attribute(LANG_ATTRIBUTE).unwrap_or(DEFAULT_LOCALE)
}
