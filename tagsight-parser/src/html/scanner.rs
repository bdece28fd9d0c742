//! Hand-written HTML scanner.
//!
//! The scanner is an explicit finite-state machine over raw markup text. Each
//! call to [`Scanner::scan`] produces exactly one token and leaves the machine
//! in a well-defined [`ScannerState`], which is exposed so callers can resume
//! scanning from any offset (for example a node boundary recorded by the
//! parser) without re-tokenizing the whole prefix.
//!
//! There are no fatal errors: anything the state machine cannot recognize is
//! emitted as an [`TokenKind::Unknown`] token carrying a message, and every
//! scan consumes at least one character, so scanning always terminates.

use memchr::{memchr, memchr2};

/// The type tag of a scanned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    StartCommentTag,
    Comment,
    EndCommentTag,
    StartTagOpen,
    StartTagClose,
    StartTagSelfClose,
    StartTag,
    EndTagOpen,
    EndTagClose,
    EndTag,
    DelimiterAssign,
    AttributeName,
    AttributeValue,
    StartDoctypeTag,
    Doctype,
    EndDoctypeTag,
    Content,
    Whitespace,
    Unknown,
    Script,
    Styles,
    Eos,
}

/// The state the scanner is in before the next `scan` call. Fully determines
/// how the upcoming character range is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScannerState {
    #[default]
    WithinContent,
    AfterOpeningStartTag,
    AfterOpeningEndTag,
    WithinDoctype,
    WithinTag,
    WithinEndTag,
    WithinComment,
    WithinScriptContent,
    WithinStyleContent,
    AfterAttributeName,
    BeforeAttributeValue,
}

fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0c)
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b':'
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b':' | b'-' | b'.')
}

fn is_attribute_name_char(b: u8) -> bool {
    !is_ws(b) && !matches!(b, b'"' | b'\'' | b'<' | b'>' | b'/' | b'=')
}

fn is_unquoted_value_char(b: u8) -> bool {
    !is_ws(b) && !matches!(b, b'"' | b'\'' | b'`' | b'=' | b'<' | b'>')
}

/// Byte-addressed cursor over the source text. All stop bytes are ASCII, so
/// byte-wise advancing never lands inside a multi-byte character; the only
/// single-step advance over arbitrary text goes through `advance_char`.
struct CharStream<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> CharStream<'a> {
    fn new(source: &'a str, position: usize) -> Self {
        Self { source, position }
    }

    fn eos(&self) -> bool {
        self.position >= self.source.len()
    }

    fn pos(&self) -> usize {
        self.position
    }

    fn advance(&mut self, n: usize) {
        self.position += n;
    }

    fn go_back(&mut self, n: usize) {
        self.position -= n;
    }

    fn advance_char(&mut self) {
        if let Some(c) = self.source[self.position..].chars().next() {
            self.position += c.len_utf8();
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.source.as_bytes().get(self.position).copied()
    }

    fn peek_prev_byte(&self) -> Option<u8> {
        self.position
            .checked_sub(1)
            .and_then(|i| self.source.as_bytes().get(i).copied())
    }

    fn advance_if_byte(&mut self, b: u8) -> bool {
        if self.peek_byte() == Some(b) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn advance_if_bytes(&mut self, prefix: &[u8]) -> bool {
        if self.source.as_bytes()[self.position..].starts_with(prefix) {
            self.position += prefix.len();
            true
        } else {
            false
        }
    }

    fn advance_if_bytes_nocase(&mut self, prefix: &[u8]) -> bool {
        let rest = &self.source.as_bytes()[self.position..];
        if rest.len() >= prefix.len() && rest[..prefix.len()].eq_ignore_ascii_case(prefix) {
            self.position += prefix.len();
            true
        } else {
            false
        }
    }

    /// Advance to the next occurrence of `b` (not consuming it). Returns false
    /// after running to the end of the text instead.
    fn advance_until_byte(&mut self, b: u8) -> bool {
        match memchr(b, &self.source.as_bytes()[self.position..]) {
            Some(i) => {
                self.position += i;
                true
            }
            None => {
                self.position = self.source.len();
                false
            }
        }
    }

    /// Advance to the next occurrence of `a` or `b`, returning which one was
    /// found without consuming it.
    fn advance_until_byte2(&mut self, a: u8, b: u8) -> Option<u8> {
        match memchr2(a, b, &self.source.as_bytes()[self.position..]) {
            Some(i) => {
                self.position += i;
                Some(self.source.as_bytes()[self.position])
            }
            None => {
                self.position = self.source.len();
                None
            }
        }
    }

    /// Advance to the next case-insensitive occurrence of `needle` (not
    /// consuming it). The first byte of `needle` must be caseless.
    fn advance_until_bytes_nocase(&mut self, needle: &[u8]) -> bool {
        let bytes = self.source.as_bytes();
        let mut from = self.position;
        while let Some(i) = memchr(needle[0], &bytes[from..]) {
            let start = from + i;
            if bytes.len() - start >= needle.len()
                && bytes[start..start + needle.len()].eq_ignore_ascii_case(needle)
            {
                self.position = start;
                return true;
            }
            from = start + 1;
        }
        self.position = bytes.len();
        false
    }

    fn advance_while(&mut self, pred: impl Fn(u8) -> bool) -> usize {
        let bytes = self.source.as_bytes();
        let start = self.position;
        while self.position < bytes.len() && pred(bytes[self.position]) {
            self.position += 1;
        }
        self.position - start
    }

    fn skip_whitespace(&mut self) -> bool {
        self.advance_while(is_ws) > 0
    }
}

/// Stateful HTML lexer. One token per [`Scanner::scan`] call; no token history
/// is kept beyond the most recent one.
pub struct Scanner<'a> {
    stream: CharStream<'a>,
    state: ScannerState,
    emit_pseudo_close_tags: bool,
    token_kind: TokenKind,
    token_offset: usize,
    token_error: Option<&'static str>,
    has_space_after_tag: bool,
    last_tag: Option<String>,
}

impl<'a> Scanner<'a> {
    /// Create a scanner over `input`, starting at `initial_offset` in
    /// `initial_state`. With `emit_pseudo_close_tags` set, an end tag followed
    /// by `<` instead of `>` produces a zero-length `EndTagClose` carrying an
    /// error, which lets the parser close the element at the stray `<`.
    pub fn new(
        input: &'a str,
        initial_offset: usize,
        initial_state: ScannerState,
        emit_pseudo_close_tags: bool,
    ) -> Self {
        Self {
            stream: CharStream::new(input, initial_offset),
            state: initial_state,
            emit_pseudo_close_tags,
            token_kind: TokenKind::Unknown,
            token_offset: initial_offset,
            token_error: None,
            has_space_after_tag: false,
            last_tag: None,
        }
    }

    /// Scan the next token. Keeps returning [`TokenKind::Eos`] once the end of
    /// the text is reached.
    pub fn scan(&mut self) -> TokenKind {
        let offset = self.stream.pos();
        let state_before = self.state;
        let kind = self.internal_scan();
        if kind != TokenKind::Eos
            && offset == self.stream.pos()
            && !(self.emit_pseudo_close_tags
                && matches!(kind, TokenKind::StartTagClose | TokenKind::EndTagClose))
        {
            log::warn!(
                "scanner did not advance at offset {offset} (state {state_before:?} -> {:?})",
                self.state
            );
            self.stream.advance_char();
            return self.finish_with_error(offset, TokenKind::Unknown, Some("Scanner stuck."));
        }
        kind
    }

    pub fn token_kind(&self) -> TokenKind {
        self.token_kind
    }

    pub fn token_offset(&self) -> usize {
        self.token_offset
    }

    pub fn token_length(&self) -> usize {
        self.stream.pos() - self.token_offset
    }

    pub fn token_end(&self) -> usize {
        self.stream.pos()
    }

    pub fn token_text(&self) -> &'a str {
        &self.stream.source[self.token_offset..self.stream.pos()]
    }

    pub fn token_error(&self) -> Option<&'static str> {
        self.token_error
    }

    pub fn state(&self) -> ScannerState {
        self.state
    }

    fn finish(&mut self, offset: usize, kind: TokenKind) -> TokenKind {
        self.finish_with_error(offset, kind, None)
    }

    fn finish_with_error(
        &mut self,
        offset: usize,
        kind: TokenKind,
        error: Option<&'static str>,
    ) -> TokenKind {
        self.token_kind = kind;
        self.token_offset = offset;
        self.token_error = error;
        kind
    }

    /// Consume an element name per `[_:a-zA-Z0-9][_:a-zA-Z0-9-.]*`, returning
    /// the consumed slice, or `None` without advancing.
    fn next_element_name(&mut self) -> Option<&'a str> {
        let start = self.stream.pos();
        match self.stream.peek_byte() {
            Some(b) if b.is_ascii_alphanumeric() || b == b'_' || b == b':' => {
                self.stream.advance(1);
                self.stream.advance_while(is_name_char);
                Some(&self.stream.source[start..self.stream.pos()])
            }
            _ => None,
        }
    }

    fn next_attribute_name(&mut self) -> Option<&'a str> {
        let start = self.stream.pos();
        if self.stream.advance_while(is_attribute_name_char) > 0 {
            Some(&self.stream.source[start..self.stream.pos()])
        } else {
            None
        }
    }

    /// Consume a doctype body up to (not including) its terminating `>`,
    /// tracking nested `<`/`>` pairs so an internal subset is not closed
    /// prematurely.
    fn consume_doctype_body(&mut self) {
        let mut depth = 0usize;
        while let Some(found) = self.stream.advance_until_byte2(b'<', b'>') {
            if found == b'<' {
                depth += 1;
            } else if depth == 0 {
                return;
            } else {
                depth -= 1;
            }
            self.stream.advance(1);
        }
    }

    fn internal_scan(&mut self) -> TokenKind {
        let offset = self.stream.pos();
        if self.stream.eos() {
            return self.finish(offset, TokenKind::Eos);
        }

        match self.state {
            ScannerState::WithinComment => {
                if self.stream.advance_if_bytes(b"-->") {
                    self.state = ScannerState::WithinContent;
                    return self.finish(offset, TokenKind::EndCommentTag);
                }
                self.stream.advance_until_bytes_nocase(b"-->");
                self.finish(offset, TokenKind::Comment)
            }
            ScannerState::WithinDoctype => {
                if self.stream.advance_if_byte(b'>') {
                    self.state = ScannerState::WithinContent;
                    return self.finish(offset, TokenKind::EndDoctypeTag);
                }
                self.consume_doctype_body();
                self.finish(offset, TokenKind::Doctype)
            }
            ScannerState::WithinContent => {
                if self.stream.advance_if_byte(b'<') {
                    if self.stream.peek_byte() == Some(b'!') {
                        if self.stream.advance_if_bytes(b"!--") {
                            self.state = ScannerState::WithinComment;
                            return self.finish(offset, TokenKind::StartCommentTag);
                        }
                        if self.stream.advance_if_bytes_nocase(b"!doctype") {
                            self.state = ScannerState::WithinDoctype;
                            return self.finish(offset, TokenKind::StartDoctypeTag);
                        }
                    }
                    if self.stream.advance_if_byte(b'/') {
                        self.state = ScannerState::AfterOpeningEndTag;
                        return self.finish(offset, TokenKind::EndTagOpen);
                    }
                    if matches!(self.stream.peek_byte(), Some(b) if is_name_start(b)) {
                        self.state = ScannerState::AfterOpeningStartTag;
                        return self.finish(offset, TokenKind::StartTagOpen);
                    }
                    // A `<` that opens nothing stays a one-character anomaly;
                    // the scanner remains in content state.
                    return self.finish_with_error(
                        offset,
                        TokenKind::Unknown,
                        Some("Start tag name expected."),
                    );
                }
                self.stream.advance_until_byte(b'<');
                self.finish(offset, TokenKind::Content)
            }
            ScannerState::AfterOpeningStartTag => {
                if let Some(name) = self.next_element_name() {
                    self.last_tag = Some(name.to_ascii_lowercase());
                    self.has_space_after_tag = false;
                    self.state = ScannerState::WithinTag;
                    return self.finish(offset, TokenKind::StartTag);
                }
                if self.stream.skip_whitespace() {
                    return self.finish_with_error(
                        offset,
                        TokenKind::Whitespace,
                        Some("Tag name must directly follow the open bracket."),
                    );
                }
                self.state = ScannerState::WithinTag;
                self.stream.advance_until_byte(b'>');
                if offset < self.stream.pos() {
                    return self.finish_with_error(
                        offset,
                        TokenKind::Unknown,
                        Some("Start tag name expected."),
                    );
                }
                self.internal_scan()
            }
            ScannerState::AfterOpeningEndTag => {
                if self.next_element_name().is_some() {
                    self.state = ScannerState::WithinEndTag;
                    return self.finish(offset, TokenKind::EndTag);
                }
                if self.stream.skip_whitespace() {
                    return self.finish_with_error(
                        offset,
                        TokenKind::Whitespace,
                        Some("Closing bracket expected."),
                    );
                }
                self.state = ScannerState::WithinEndTag;
                self.stream.advance_until_byte(b'>');
                if offset < self.stream.pos() {
                    return self.finish_with_error(
                        offset,
                        TokenKind::Unknown,
                        Some("End tag name expected."),
                    );
                }
                self.internal_scan()
            }
            ScannerState::WithinEndTag => {
                if self.stream.skip_whitespace() {
                    return self.finish(offset, TokenKind::Whitespace);
                }
                if self.stream.advance_if_byte(b'>') {
                    self.state = ScannerState::WithinContent;
                    return self.finish(offset, TokenKind::EndTagClose);
                }
                if self.emit_pseudo_close_tags && self.stream.peek_byte() == Some(b'<') {
                    self.state = ScannerState::WithinContent;
                    return self.finish_with_error(
                        offset,
                        TokenKind::EndTagClose,
                        Some("Closing bracket missing."),
                    );
                }
                self.stream.advance_char();
                self.finish_with_error(offset, TokenKind::Unknown, Some("Closing bracket expected."))
            }
            ScannerState::WithinTag => {
                if self.stream.skip_whitespace() {
                    self.has_space_after_tag = true;
                    return self.finish(offset, TokenKind::Whitespace);
                }
                if self.has_space_after_tag && self.next_attribute_name().is_some() {
                    self.state = ScannerState::AfterAttributeName;
                    self.has_space_after_tag = false;
                    return self.finish(offset, TokenKind::AttributeName);
                }
                if self.stream.advance_if_bytes(b"/>") {
                    self.state = ScannerState::WithinContent;
                    return self.finish(offset, TokenKind::StartTagSelfClose);
                }
                if self.stream.advance_if_byte(b'>') {
                    self.state = match self.last_tag.as_deref() {
                        Some("script") => ScannerState::WithinScriptContent,
                        Some("style") => ScannerState::WithinStyleContent,
                        _ => ScannerState::WithinContent,
                    };
                    return self.finish(offset, TokenKind::StartTagClose);
                }
                if self.emit_pseudo_close_tags && self.stream.peek_byte() == Some(b'<') {
                    self.state = ScannerState::WithinContent;
                    return self.finish_with_error(
                        offset,
                        TokenKind::StartTagClose,
                        Some("Closing bracket missing."),
                    );
                }
                self.stream.advance_char();
                self.finish_with_error(
                    offset,
                    TokenKind::Unknown,
                    Some("Unexpected character in tag."),
                )
            }
            ScannerState::AfterAttributeName => {
                if self.stream.skip_whitespace() {
                    self.has_space_after_tag = true;
                    return self.finish(offset, TokenKind::Whitespace);
                }
                if self.stream.advance_if_byte(b'=') {
                    self.state = ScannerState::BeforeAttributeValue;
                    return self.finish(offset, TokenKind::DelimiterAssign);
                }
                self.state = ScannerState::WithinTag;
                self.internal_scan()
            }
            ScannerState::BeforeAttributeValue => {
                if self.stream.skip_whitespace() {
                    return self.finish(offset, TokenKind::Whitespace);
                }
                if self.stream.advance_while(is_unquoted_value_char) > 0 {
                    // An unquoted value like `a=http://x/` swallows the `/` of a
                    // trailing `/>`; give it back to the self-close token.
                    if self.stream.peek_byte() == Some(b'>')
                        && self.stream.peek_prev_byte() == Some(b'/')
                    {
                        self.stream.go_back(1);
                    }
                    if self.stream.pos() > offset {
                        self.state = ScannerState::WithinTag;
                        self.has_space_after_tag = false;
                        return self.finish(offset, TokenKind::AttributeValue);
                    }
                }
                if let Some(quote @ (b'\'' | b'"')) = self.stream.peek_byte() {
                    self.stream.advance(1);
                    if self.stream.advance_until_byte(quote) {
                        self.stream.advance(1);
                    }
                    self.state = ScannerState::WithinTag;
                    self.has_space_after_tag = false;
                    return self.finish(offset, TokenKind::AttributeValue);
                }
                self.state = ScannerState::WithinTag;
                self.has_space_after_tag = false;
                self.internal_scan()
            }
            ScannerState::WithinScriptContent => {
                self.stream.advance_until_bytes_nocase(b"</script");
                self.state = ScannerState::WithinContent;
                if self.stream.pos() > offset {
                    return self.finish(offset, TokenKind::Script);
                }
                self.internal_scan()
            }
            ScannerState::WithinStyleContent => {
                self.stream.advance_until_bytes_nocase(b"</style");
                self.state = ScannerState::WithinContent;
                if self.stream.pos() > offset {
                    return self.finish(offset, TokenKind::Styles);
                }
                self.internal_scan()
            }
        }
    }
}
