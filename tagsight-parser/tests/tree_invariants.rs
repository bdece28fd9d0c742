//! Property-based tests for the scanner and parser.
//!
//! These lock down the guarantees the rest of the system builds on:
//! - scanning terminates on arbitrary input and tiles the text exactly;
//! - the parsed tree always satisfies its range invariants, malformed
//!   markup included;
//! - `find_node_at` agrees with a linear reference scan of the tree.

use proptest::prelude::*;
use tagsight_parser::html::{parse, HtmlDocument, NodeId, Scanner, ScannerState, TokenKind};

const FRAGMENTS: &[&str] = &[
    "<div>",
    "</div>",
    "<span id=\"x\">",
    "</span>",
    "<DIV>",
    "</SPAN>",
    "<br>",
    "<br/>",
    "<img src=foo>",
    "<a href='y'>",
    "text ",
    "<",
    ">",
    "<!-- c -->",
    "<!--",
    "<!DOCTYPE html>",
    "<script>a<b</script>",
    "<script>",
    "<style>p{}</style>",
];

/// Markup soup: fragments that combine into well-formed, malformed, and
/// pathological documents.
fn html_soup() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            prop::sample::select(FRAGMENTS).prop_map(str::to_string),
            "[a-z<>/\"'= ]{0,8}",
        ],
        0..12,
    )
    .prop_map(|parts| parts.concat())
}

/// Scan the whole input, asserting progress on every token.
fn scan_all(text: &str) -> Vec<(TokenKind, usize, usize)> {
    let mut scanner = Scanner::new(text, 0, ScannerState::WithinContent, false);
    let mut tokens = Vec::new();
    loop {
        let kind = scanner.scan();
        if kind == TokenKind::Eos {
            return tokens;
        }
        assert!(
            scanner.token_length() >= 1,
            "zero-length {kind:?} at {} in {text:?}",
            scanner.token_offset()
        );
        tokens.push((kind, scanner.token_offset(), scanner.token_end()));
        assert!(tokens.len() <= text.len(), "scanner looping on {text:?}");
    }
}

fn check_subtree(doc: &HtmlDocument, id: NodeId, text: &str) {
    let node = doc.node(id);
    assert!(node.start <= node.end, "inverted range in {text:?}");
    if let Some(start_tag_end) = node.start_tag_end {
        assert!(node.start <= start_tag_end && start_tag_end <= node.end);
        if let Some(end_tag_start) = node.end_tag_start {
            assert!(start_tag_end <= end_tag_start && end_tag_start <= node.end);
        }
    }
    if let Some(tag) = &node.tag {
        let source = &text[node.start..node.end];
        assert!(source.starts_with('<'));
        assert!(
            source[1..].to_ascii_lowercase().starts_with(&tag.to_ascii_lowercase()),
            "node source {source:?} does not open with tag {tag:?}"
        );
    }
    let mut previous_end = node.start;
    for &child in &node.children {
        let child_node = doc.node(child);
        assert_eq!(child_node.parent, Some(id));
        assert!(
            child_node.start >= previous_end,
            "overlapping siblings in {text:?}"
        );
        assert!(
            child_node.start >= node.start && child_node.end <= node.end,
            "child escapes parent in {text:?}"
        );
        previous_end = child_node.end;
        check_subtree(doc, child, text);
    }
}

/// Reference for `find_node_at`: the deepest node (root excluded) whose
/// `(start, end]` range contains the offset, found by exhaustive walk.
fn reference_find_node_at(doc: &HtmlDocument, offset: usize) -> NodeId {
    fn walk(doc: &HtmlDocument, id: NodeId, offset: usize, best: &mut NodeId) {
        for &child in &doc.node(id).children {
            let node = doc.node(child);
            if offset > node.start && offset <= node.end {
                *best = child;
            }
            walk(doc, child, offset, best);
        }
    }
    let mut best = doc.root();
    walk(doc, doc.root(), offset, &mut best);
    best
}

/// Reference for `find_node_before`: recursive descent with a linear scan of
/// each child list. Picks the last child starting before the offset, descends
/// while the offset is inside it or while its last child runs to its own end
/// (the force-closed chain), and otherwise returns the child itself.
fn reference_find_node_before(doc: &HtmlDocument, id: NodeId, offset: usize) -> NodeId {
    let mut candidate = None;
    for &child in &doc.node(id).children {
        if doc.node(child).start < offset {
            candidate = Some(child);
        }
    }
    let Some(child) = candidate else {
        return id;
    };
    let child_node = doc.node(child);
    if offset < child_node.end {
        return reference_find_node_before(doc, child, offset);
    }
    if let Some(&last) = child_node.children.last() {
        if doc.node(last).end == child_node.end {
            return reference_find_node_before(doc, child, offset);
        }
    }
    child
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn scanning_terminates_and_tiles_the_text(text in html_soup()) {
        let tokens = scan_all(&text);
        let mut expected_start = 0;
        for (kind, start, end) in tokens {
            prop_assert_eq!(start, expected_start, "gap before {:?} in {:?}", kind, text);
            prop_assert!(end > start);
            expected_start = end;
        }
        prop_assert_eq!(expected_start, text.len(), "tail not scanned in {:?}", text);
    }

    #[test]
    fn eos_is_stable_on_arbitrary_input(text in html_soup()) {
        let mut scanner = Scanner::new(&text, 0, ScannerState::WithinContent, false);
        while scanner.scan() != TokenKind::Eos {}
        prop_assert_eq!(scanner.scan(), TokenKind::Eos);
        prop_assert_eq!(scanner.scan(), TokenKind::Eos);
    }

    #[test]
    fn parsed_tree_satisfies_range_invariants(text in html_soup()) {
        let doc = parse(&text);
        check_subtree(&doc, doc.root(), &text);
    }

    #[test]
    fn find_node_at_agrees_with_reference_scan(text in html_soup()) {
        let doc = parse(&text);
        for offset in 0..=text.len() {
            prop_assert_eq!(
                doc.find_node_at(offset),
                reference_find_node_at(&doc, offset),
                "divergence at offset {} in {:?}",
                offset,
                text
            );
        }
    }

    #[test]
    fn find_node_before_agrees_with_reference_scan(text in html_soup()) {
        let doc = parse(&text);
        for offset in 0..=text.len() {
            prop_assert_eq!(
                doc.find_node_before(offset),
                reference_find_node_before(&doc, doc.root(), offset),
                "divergence at offset {} in {:?}",
                offset,
                text
            );
        }
    }
}
