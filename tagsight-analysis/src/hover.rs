//! Hover: resolve the lexical construct under a cursor position and render
//! the documentation that applies to it.
//!
//! The enclosing node only records element boundaries, so the exact range of
//! the construct under the cursor is recovered by re-running the scanner from
//! the relevant node boundary until a token of the sought kind covers the
//! offset. Precedence: end-tag name, start-tag name, attribute name,
//! attribute value. Each probe is a separate scan from the node's start;
//! attribute values are correlated back to their attribute name by a forward
//! scan that remembers the last name token seen before the value.

use lsp_textdocument::FullTextDocument;
use lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position, Range};
use once_cell::sync::OnceCell;

use tagsight_parser::html::{strip_quotes, HtmlDocument, Scanner, ScannerState, TokenKind};

use crate::data::{
    generate_documentation, DocumentationSettings, HtmlDataManager, HtmlDataProvider,
};
use crate::service::LanguageServiceOptions;

/// Switches for the parts of hover content; see [`DocumentationSettings`].
pub type HoverSettings = DocumentationSettings;

/// The hover feature. Holds the client's negotiated content format,
/// memoized once per instance.
pub struct HtmlHover {
    client_capabilities: Option<lsp_types::ClientCapabilities>,
    supports_markdown: OnceCell<bool>,
}

impl HtmlHover {
    pub fn new(options: &LanguageServiceOptions) -> Self {
        Self {
            client_capabilities: options.client_capabilities.clone(),
            supports_markdown: OnceCell::new(),
        }
    }

    /// Produce a hover for the construct at `position`, or `None` when there
    /// is nothing to show. Never fails: out-of-range positions and malformed
    /// markup resolve to `None`.
    pub fn do_hover(
        &self,
        document: &FullTextDocument,
        position: Position,
        html_document: &HtmlDocument,
        data_manager: &HtmlDataManager,
        settings: Option<&HoverSettings>,
    ) -> Option<Hover> {
        let supports_markdown = self.supports_markdown();
        let settings = settings.copied().unwrap_or_default();
        let text = document.get_content(None);
        let offset = document.offset_at(position) as usize;
        if offset > text.len() {
            return None;
        }

        let node = html_document.node(html_document.find_node_at(offset));
        let tag = node.tag.clone()?;
        let providers: Vec<&dyn HtmlDataProvider> = data_manager
            .providers_for(document.language_id())
            .collect();

        if let Some(end_tag_start) = node.end_tag_start {
            if offset >= end_tag_start {
                let range =
                    token_range(document, text, offset, TokenKind::EndTag, end_tag_start)?;
                return self.tag_hover(&providers, &tag, range, supports_markdown, &settings);
            }
        }

        if let Some(range) = token_range(document, text, offset, TokenKind::StartTag, node.start) {
            return self.tag_hover(&providers, &tag, range, supports_markdown, &settings);
        }

        if let Some(range) =
            token_range(document, text, offset, TokenKind::AttributeName, node.start)
        {
            let attribute = document.get_content(Some(range)).to_string();
            return self.attribute_hover(
                &providers,
                &tag,
                &attribute,
                range,
                supports_markdown,
                &settings,
            );
        }

        if let Some(range) =
            token_range(document, text, offset, TokenKind::AttributeValue, node.start)
        {
            let value = strip_quotes(document.get_content(Some(range)));
            let value_start = document.offset_at(range.start) as usize;
            if let Some(attribute) = attribute_before(text, node.start, value_start) {
                return self.value_hover(
                    &providers,
                    &tag,
                    &attribute,
                    &value,
                    range,
                    supports_markdown,
                    &settings,
                );
            }
        }

        None
    }

    fn tag_hover(
        &self,
        providers: &[&dyn HtmlDataProvider],
        tag: &str,
        range: Range,
        supports_markdown: bool,
        settings: &DocumentationSettings,
    ) -> Option<Hover> {
        for provider in providers {
            for candidate in provider.provide_tags() {
                if candidate.name.eq_ignore_ascii_case(tag) {
                    // A known tag always hovers, even with no recorded
                    // description: the content is present but empty.
                    let contents = generate_documentation(candidate, settings, supports_markdown)
                        .unwrap_or_else(|| MarkupContent {
                            kind: markup_kind(supports_markdown),
                            value: String::new(),
                        });
                    return Some(hover(contents, range));
                }
            }
        }
        None
    }

    fn attribute_hover(
        &self,
        providers: &[&dyn HtmlDataProvider],
        tag: &str,
        attribute: &str,
        range: Range,
        supports_markdown: bool,
        settings: &DocumentationSettings,
    ) -> Option<Hover> {
        for provider in providers {
            let mut found = None;
            for candidate in provider.provide_attributes(tag) {
                if candidate.name == attribute && candidate.description.is_some() {
                    found = generate_documentation(&candidate, settings, supports_markdown);
                }
            }
            if let Some(contents) = found {
                return Some(hover(contents, range));
            }
        }
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn value_hover(
        &self,
        providers: &[&dyn HtmlDataProvider],
        tag: &str,
        attribute: &str,
        value: &str,
        range: Range,
        supports_markdown: bool,
        settings: &DocumentationSettings,
    ) -> Option<Hover> {
        for provider in providers {
            let mut found = None;
            for candidate in provider.provide_values(tag, attribute) {
                if candidate.name == value && candidate.description.is_some() {
                    found = generate_documentation(&candidate, settings, supports_markdown);
                }
            }
            if let Some(contents) = found {
                return Some(hover(contents, range));
            }
        }
        None
    }

    /// Whether the client renders markdown hovers. Absent capabilities mean
    /// yes; present capabilities without a markdown content format mean no.
    fn supports_markdown(&self) -> bool {
        *self.supports_markdown.get_or_init(|| {
            let Some(capabilities) = &self.client_capabilities else {
                return true;
            };
            capabilities
                .text_document
                .as_ref()
                .and_then(|text_document| text_document.hover.as_ref())
                .and_then(|hover| hover.content_format.as_ref())
                .is_some_and(|formats| formats.contains(&MarkupKind::Markdown))
        })
    }
}

fn markup_kind(supports_markdown: bool) -> MarkupKind {
    if supports_markdown {
        MarkupKind::Markdown
    } else {
        MarkupKind::PlainText
    }
}

fn hover(contents: MarkupContent, range: Range) -> Hover {
    Hover {
        contents: HoverContents::Markup(contents),
        range: Some(range),
    }
}

/// Re-scan from `start_offset` until a token of `kind` covers `offset`;
/// return its range. Tokens ending before the offset are skipped, as is a
/// token of the wrong kind that merely touches the offset with its end.
fn token_range(
    document: &FullTextDocument,
    text: &str,
    offset: usize,
    kind: TokenKind,
    start_offset: usize,
) -> Option<Range> {
    let mut scanner = Scanner::new(text, start_offset, ScannerState::WithinContent, false);
    let mut token = scanner.scan();
    while token != TokenKind::Eos
        && (scanner.token_end() < offset || (scanner.token_end() == offset && token != kind))
    {
        token = scanner.scan();
    }
    if token == kind && offset <= scanner.token_end() {
        return Some(Range::new(
            document.position_at(scanner.token_offset() as u32),
            document.position_at(scanner.token_end() as u32),
        ));
    }
    None
}

/// The most recent attribute name scanned before `value_start`, starting
/// from the node's start offset.
fn attribute_before(text: &str, node_start: usize, value_start: usize) -> Option<String> {
    let mut scanner = Scanner::new(text, node_start, ScannerState::WithinContent, false);
    let mut token = scanner.scan();
    let mut attribute = None;
    while token != TokenKind::Eos && scanner.token_end() <= value_start {
        token = scanner.scan();
        if token == TokenKind::AttributeName {
            attribute = Some(scanner.token_text().to_string());
        }
    }
    attribute
}
