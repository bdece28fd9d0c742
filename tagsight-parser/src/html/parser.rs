//! Tree-building HTML parser and the offset-addressed document model.
//!
//! The parser drives the scanner once over the whole text and folds the token
//! stream into an arena of nodes, tracking open elements on an explicit stack
//! of arena indices (the `parent` chain of the current node), so parse depth
//! is bounded by document nesting rather than the call stack.
//!
//! Recovery policies for malformed markup:
//! - an end tag matching an element further down the open stack implicitly
//!   terminates every element above it at the end tag's start offset;
//! - an end tag matching nothing on the stack is ignored;
//! - a start tag cut short by a stray `<` ends there with `start_tag_end`
//!   left unset, and the element at the `<` becomes its sibling;
//! - elements still open at end of input are force-closed at the text length
//!   with `end_tag_start` left unset.

use std::collections::HashMap;

use log::trace;

use crate::html::scanner::{Scanner, ScannerState, TokenKind};
use crate::html::tags::is_void_element;

/// Index of a node in its document's arena. The root is always index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// One element of the parsed tree, or the synthetic root (`tag == None`).
///
/// Range invariants hold even for malformed input: children are contained in
/// `[start, end)` of their parent, siblings are ordered and non-overlapping,
/// and `start <= start_tag_end <= end_tag_start <= end` wherever defined.
#[derive(Debug, Clone)]
pub struct Node {
    pub tag: Option<String>,
    pub start: usize,
    pub end: usize,
    /// Offset just past the `>` of the start tag; `None` if unterminated.
    pub start_tag_end: Option<usize>,
    /// Offset of the `<` of the end tag; `None` if the element has none.
    pub end_tag_start: Option<usize>,
    /// False when the element was terminated by recovery rather than by an
    /// explicit end tag, self-close, or void-element rule.
    pub closed: bool,
    /// Attribute name to value; `None` marks a valueless (boolean) attribute.
    /// Values are stored with their surrounding quotes stripped.
    pub attributes: HashMap<String, Option<String>>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    fn new(start: usize, end: usize, parent: Option<NodeId>) -> Self {
        Self {
            tag: None,
            start,
            end,
            start_tag_end: None,
            end_tag_start: None,
            closed: false,
            attributes: HashMap::new(),
            parent,
            children: Vec::new(),
        }
    }

    /// Case-insensitive tag comparison; two missing tags also match.
    pub fn is_same_tag(&self, tag: Option<&str>) -> bool {
        match (self.tag.as_deref(), tag) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (None, None) => true,
            _ => false,
        }
    }

    /// The attribute's value, if the attribute is present and has one.
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(|v| v.as_deref())
    }
}

/// Immutable-after-build element tree with offset-based lookup.
///
/// Rebuild on any text change; there is no incremental update path.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    nodes: Vec<Node>,
}

impl HtmlDocument {
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// The document's top-level elements.
    pub fn roots(&self) -> &[NodeId] {
        &self.nodes[NodeId::ROOT.0].children
    }

    /// The innermost node whose `(start, end]` range contains `offset`,
    /// or the root when no element does. An offset equal to a node's own end
    /// still selects that node, so the boundary between two siblings belongs
    /// to the earlier one.
    pub fn find_node_at(&self, offset: usize) -> NodeId {
        let mut current = NodeId::ROOT;
        loop {
            let Some(child) = self.last_child_starting_before(current, offset) else {
                return current;
            };
            let node = &self.nodes[child.0];
            if offset > node.start && offset <= node.end {
                current = child;
                continue;
            }
            return current;
        }
    }

    /// The last node that starts before `offset`, for insert-after queries.
    /// Descends into a candidate only while the offset is inside it, or while
    /// the candidate's last child runs all the way to its own end (the
    /// force-closed case, where the deepest node is the interesting one).
    pub fn find_node_before(&self, offset: usize) -> NodeId {
        let mut current = NodeId::ROOT;
        loop {
            let Some(child) = self.last_child_starting_before(current, offset) else {
                return current;
            };
            let node = &self.nodes[child.0];
            if offset > node.start {
                if offset < node.end {
                    current = child;
                    continue;
                }
                if let Some(&last) = node.children.last() {
                    if self.nodes[last.0].end == node.end {
                        current = child;
                        continue;
                    }
                }
                return child;
            }
            return current;
        }
    }

    fn last_child_starting_before(&self, id: NodeId, offset: usize) -> Option<NodeId> {
        let children = &self.nodes[id.0].children;
        let idx = children.partition_point(|&c| self.nodes[c.0].start < offset);
        idx.checked_sub(1).map(|i| children[i])
    }
}

/// Strip a single leading and trailing quote character from an attribute
/// value token's text.
pub fn strip_quotes(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() <= 1 {
        return value.trim_matches(|c| c == '"' || c == '\'').to_string();
    }
    let start = usize::from(matches!(bytes[0], b'"' | b'\''));
    let end = bytes.len() - usize::from(matches!(bytes[bytes.len() - 1], b'"' | b'\''));
    value[start..end.max(start)].to_string()
}

/// Parse `text` into an [`HtmlDocument`]. Never fails; malformed markup is
/// absorbed by the recovery policies described on the module.
pub fn parse(text: &str) -> HtmlDocument {
    let mut nodes = vec![Node::new(0, text.len(), None)];
    let mut curr = NodeId::ROOT;
    let mut end_tag_start: Option<usize> = None;
    let mut end_tag_name: Option<String> = None;
    let mut pending_attribute: Option<String> = None;

    let mut scanner = Scanner::new(text, 0, ScannerState::WithinContent, true);
    let mut token = scanner.scan();
    while token != TokenKind::Eos {
        match token {
            TokenKind::StartTagOpen => {
                let child = NodeId(nodes.len());
                nodes.push(Node::new(scanner.token_offset(), text.len(), Some(curr)));
                nodes[curr.0].children.push(child);
                curr = child;
            }
            TokenKind::StartTag => {
                nodes[curr.0].tag = Some(scanner.token_text().to_string());
            }
            TokenKind::StartTagClose => {
                if let Some(parent) = nodes[curr.0].parent {
                    // May be overwritten later by the end tag position.
                    nodes[curr.0].end = scanner.token_end();
                    if scanner.token_length() > 0 {
                        nodes[curr.0].start_tag_end = Some(scanner.token_end());
                        let is_void = nodes[curr.0]
                            .tag
                            .as_deref()
                            .is_some_and(is_void_element);
                        if is_void {
                            nodes[curr.0].closed = true;
                            curr = parent;
                        }
                    } else {
                        // Zero-length pseudo close: the start tag was cut
                        // short by a stray `<`. The element ends here,
                        // unterminated, and what follows is a sibling.
                        curr = parent;
                    }
                }
            }
            TokenKind::StartTagSelfClose => {
                if let Some(parent) = nodes[curr.0].parent {
                    nodes[curr.0].closed = true;
                    nodes[curr.0].start_tag_end = Some(scanner.token_end());
                    nodes[curr.0].end = scanner.token_end();
                    curr = parent;
                }
            }
            TokenKind::EndTagOpen => {
                end_tag_start = Some(scanner.token_offset());
                end_tag_name = None;
            }
            TokenKind::EndTag => {
                end_tag_name = Some(scanner.token_text().to_ascii_lowercase());
            }
            TokenKind::EndTagClose => {
                // Walk the open stack for a match; everything above the match
                // is implicitly terminated at the end tag's start.
                let mut node = curr;
                while !nodes[node.0].is_same_tag(end_tag_name.as_deref()) {
                    match nodes[node.0].parent {
                        Some(parent) => node = parent,
                        None => break,
                    }
                }
                if let Some(match_parent) = nodes[node.0].parent {
                    let close_at = end_tag_start.unwrap_or(scanner.token_offset());
                    while curr != node {
                        trace!(
                            "implicitly closing <{}> at offset {close_at}",
                            nodes[curr.0].tag.as_deref().unwrap_or("")
                        );
                        nodes[curr.0].end = close_at;
                        nodes[curr.0].closed = false;
                        let Some(parent) = nodes[curr.0].parent else {
                            break;
                        };
                        curr = parent;
                    }
                    nodes[curr.0].closed = true;
                    nodes[curr.0].end_tag_start = end_tag_start;
                    nodes[curr.0].end = scanner.token_end();
                    curr = match_parent;
                } else {
                    trace!(
                        "ignoring end tag </{}> with no open element",
                        end_tag_name.as_deref().unwrap_or("")
                    );
                }
            }
            TokenKind::AttributeName => {
                let name = scanner.token_text().to_string();
                nodes[curr.0].attributes.insert(name.clone(), None);
                pending_attribute = Some(name);
            }
            TokenKind::AttributeValue => {
                if let Some(attribute) = pending_attribute.take() {
                    let value = strip_quotes(scanner.token_text());
                    nodes[curr.0].attributes.insert(attribute, Some(value));
                }
            }
            _ => {}
        }
        token = scanner.scan();
    }

    while let Some(parent) = nodes[curr.0].parent {
        trace!(
            "force-closing <{}> at end of input",
            nodes[curr.0].tag.as_deref().unwrap_or("")
        );
        nodes[curr.0].end = text.len();
        nodes[curr.0].closed = false;
        curr = parent;
    }

    HtmlDocument { nodes }
}
