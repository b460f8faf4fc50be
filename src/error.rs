//! Error types for release metadata parsing

use thiserror::Error;

/// Result type for metadata operations
pub type Result<T> = std::result::Result<T, Error>;

/// Release metadata errors
///
/// Field-level problems (unknown checksum types, malformed timestamps) never
/// surface here; they degrade to unset values instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid markup: {0}")]
    InvalidMarkup(String),

    #[error("Failed to parse checksum {index}: {source}")]
    Checksum {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
