//! AppStream Release Metadata
//!
//! Release and checksum entities as found in software-center catalogs, with
//! readers and writers for the AppStream, AppData and DEP-11 tree formats.
//!
//! ## Features
//!
//! - **Version-gated output**: locations and checksums are only written for
//!   API version 0.9 and later, descriptions for 0.6 and later
//! - **Two description layouts**: per-locale `<description>` tags
//!   (AppStream) and a single tag with translated paragraphs (AppData)
//! - **Best-effort parsing**: unknown checksum types and malformed
//!   timestamps degrade to unset values instead of failing
//! - **Newest-first ordering**: free-form version strings with a timestamp
//!   fallback
//!
//! ## Example
//!
//! ```text
//! <release timestamp="1000000000" version="1.2.3">
//!   <location>https://example.com/app-1.2.3.tar.xz</location>
//!   <checksum type="sha256" filename="app-1.2.3.tar.xz">…</checksum>
//!   <description><p>Bug fixes</p></description>
//! </release>
//! ```

pub mod checksum;
pub mod config;
pub mod context;
pub mod dep11;
pub mod error;
pub mod localized;
pub mod node;
pub mod release;
pub mod releases;
pub mod version;

pub use checksum::{Checksum, ChecksumKind, ChecksumTarget};
pub use config::ToolConfig;
pub use context::{DescriptionFormat, NodeContext, SourceKind};
pub use dep11::Dep11Node;
pub use error::{Error, Result};
pub use node::{InsertFlags, Node};
pub use release::Release;
pub use releases::ReleaseSet;
pub use version::vercmp;
