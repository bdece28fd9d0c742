//! End-to-end exercise of the service facade: JSON custom data in, parsed
//! document, hover out — including provider precedence and multi-line
//! position mapping.

use lsp_textdocument::FullTextDocument;
use lsp_types::{HoverContents, MarkupKind, Position};
use tagsight_analysis::{
    HtmlDataProvider, HtmlLanguageService, LanguageServiceOptions, StaticDataProvider,
};

const BASE_DATA: &str = r#"{
    "version": 1.1,
    "tags": [
        { "name": "section", "description": "Base: a standalone section" },
        { "name": "p", "description": "Base: a paragraph" }
    ]
}"#;

const OVERRIDE_DATA: &str = r#"{
    "version": 1.1,
    "tags": [
        { "name": "section", "description": "Override: project-specific section" }
    ]
}"#;

fn service_with(providers: Vec<&str>) -> HtmlLanguageService {
    let custom_data_providers: Vec<Box<dyn HtmlDataProvider>> = providers
        .into_iter()
        .enumerate()
        .map(|(index, json)| {
            Box::new(
                StaticDataProvider::from_json(format!("p{index}"), json)
                    .expect("valid custom data"),
            ) as Box<dyn HtmlDataProvider>
        })
        .collect();
    HtmlLanguageService::new(LanguageServiceOptions {
        custom_data_providers,
        ..Default::default()
    })
}

fn markdown_value(hover: &lsp_types::Hover) -> &str {
    match &hover.contents {
        HoverContents::Markup(content) => {
            assert_eq!(content.kind, MarkupKind::Markdown);
            &content.value
        }
        other => panic!("expected markup contents, got {other:?}"),
    }
}

#[test]
fn hover_across_lines() {
    let text = "<section>\n  <p>hi</p>\n</section>\n";
    let service = service_with(vec![BASE_DATA]);
    let document = FullTextDocument::new("html".to_string(), 1, text.to_string());
    let html_document = service.parse_html_document(text);

    // Start tag of <p> on the second line.
    let hover = service
        .do_hover(&document, Position::new(1, 3), &html_document, None)
        .expect("hover on <p>");
    assert_eq!(markdown_value(&hover), "Base: a paragraph");
    let range = hover.range.expect("range");
    assert_eq!((range.start.line, range.start.character), (1, 3));
    assert_eq!((range.end.line, range.end.character), (1, 4));

    // End tag of <section> on the third line.
    let hover = service
        .do_hover(&document, Position::new(2, 4), &html_document, None)
        .expect("hover on </section>");
    assert_eq!(markdown_value(&hover), "Base: a standalone section");
    assert_eq!(hover.range.expect("range").start.line, 2);
}

#[test]
fn earlier_provider_takes_precedence() {
    let text = "<section></section>";
    let service = service_with(vec![OVERRIDE_DATA, BASE_DATA]);
    let document = FullTextDocument::new("html".to_string(), 1, text.to_string());
    let html_document = service.parse_html_document(text);

    let hover = service
        .do_hover(&document, Position::new(0, 2), &html_document, None)
        .expect("hover on <section>");
    assert_eq!(markdown_value(&hover), "Override: project-specific section");
}

#[test]
fn no_providers_means_no_hover() {
    let text = "<section></section>";
    let service = service_with(vec![]);
    let document = FullTextDocument::new("html".to_string(), 1, text.to_string());
    let html_document = service.parse_html_document(text);
    assert!(service
        .do_hover(&document, Position::new(0, 2), &html_document, None)
        .is_none());
}

#[test]
fn scanner_entry_point_resumes_mid_document() {
    let text = "<p>a</p><p>b</p>";
    let mut scanner = HtmlLanguageService::create_scanner(text, 8);
    assert_eq!(
        scanner.scan(),
        tagsight_parser::html::TokenKind::StartTagOpen
    );
    assert_eq!(scanner.token_offset(), 8);
}
