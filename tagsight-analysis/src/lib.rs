//! # tagsight-analysis
//!
//! The intelligence layer of tagsight: given a document, a cursor position,
//! and a parsed [`tagsight_parser::html::HtmlDocument`], answer
//! "what is under the cursor and what documentation applies to it".
//!
//! Architecture
//!
//!     Feature code (hover today) resolves a position to a lexical construct
//!     by re-running the scanner over the narrow region of the enclosing
//!     node, then queries an ordered registry of data providers for
//!     documentation, and renders the result in the content format the
//!     client negotiated.
//!
//!     Everything is synchronous and side-effect-free; there is no transport,
//!     no IO, and no process state. A `OnceCell` per configured feature
//!     object memoizes the markdown-capability bit, nothing else is cached.
//!
//! Results are expressed in `lsp-types` vocabulary (`Hover`, `MarkupContent`,
//! `Range`) so embedders can hand them to any LSP stack unchanged.

pub mod data;
pub mod hover;
pub mod service;

pub use data::{
    generate_documentation, AttributeData, Description, DocumentationSettings, HtmlDataManager,
    HtmlDataProvider, HtmlDataV1, Reference, StaticDataProvider, TagData, ValueData, ValueSet,
};
pub use hover::{HoverSettings, HtmlHover};
pub use service::{HtmlLanguageService, LanguageServiceOptions};
