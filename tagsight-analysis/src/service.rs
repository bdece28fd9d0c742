//! Thin facade wiring the syntax layer to the features for embedders.
//! Holds no document state: callers own their documents and parsed trees and
//! rebuild the tree whenever the text changes.

use lsp_textdocument::FullTextDocument;
use lsp_types::{ClientCapabilities, Hover, Position};

use tagsight_parser::html::{parse, HtmlDocument, Scanner, ScannerState};

use crate::data::{HtmlDataManager, HtmlDataProvider};
use crate::hover::{HoverSettings, HtmlHover};

/// Configuration an embedder hands to [`HtmlLanguageService::new`].
#[derive(Default)]
pub struct LanguageServiceOptions {
    /// The LSP capabilities of the client the results are rendered for.
    pub client_capabilities: Option<ClientCapabilities>,
    /// Metadata sources, queried in order; earlier providers win.
    pub custom_data_providers: Vec<Box<dyn HtmlDataProvider>>,
}

pub struct HtmlLanguageService {
    data_manager: HtmlDataManager,
    hover: HtmlHover,
}

impl HtmlLanguageService {
    pub fn new(mut options: LanguageServiceOptions) -> Self {
        let hover = HtmlHover::new(&options);
        let providers = std::mem::take(&mut options.custom_data_providers);
        Self {
            data_manager: HtmlDataManager::new(providers),
            hover,
        }
    }

    pub fn data_manager(&self) -> &HtmlDataManager {
        &self.data_manager
    }

    pub fn data_manager_mut(&mut self) -> &mut HtmlDataManager {
        &mut self.data_manager
    }

    /// Build the document model for `text`. Rebuild after every text change.
    pub fn parse_html_document(&self, text: &str) -> HtmlDocument {
        parse(text)
    }

    /// A scanner positioned at `initial_offset` in content state, for callers
    /// that need raw tokens.
    pub fn create_scanner<'a>(text: &'a str, initial_offset: usize) -> Scanner<'a> {
        Scanner::new(text, initial_offset, ScannerState::WithinContent, false)
    }

    pub fn do_hover(
        &self,
        document: &FullTextDocument,
        position: Position,
        html_document: &HtmlDocument,
        settings: Option<&HoverSettings>,
    ) -> Option<Hover> {
        self.hover
            .do_hover(document, position, html_document, &self.data_manager, settings)
    }
}
