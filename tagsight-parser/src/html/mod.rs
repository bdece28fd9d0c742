//! HTML syntax support: scanner, parser, document model, element tables.
//!
//! Data flows one way: text goes through the [`Scanner`] token by token, the
//! parser folds the tokens into an arena-backed [`HtmlDocument`], and callers
//! answer position queries against that document, re-scanning narrow regions
//! when they need exact token boundaries back.

pub mod parser;
pub mod scanner;
pub mod tags;

pub use parser::{parse, strip_quotes, HtmlDocument, Node, NodeId};
pub use scanner::{Scanner, ScannerState, TokenKind};
pub use tags::{is_raw_text_element, is_void_element};
