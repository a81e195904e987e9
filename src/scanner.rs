//! Resumable byte-to-token JSON scanner
//!
//! [`JsonScanner`] turns a byte buffer into a sequence of JSON tokens. It is
//! the token source the [typed readers](crate::reader) consume; readers never
//! look at bytes themselves.
//!
//! The scanner delivers tokens whole or not at all: when the buffer ends in
//! the middle of a token (or before the byte which proves a token complete,
//! such as the separator after a number), [`advance`](JsonScanner::advance)
//! reports that more data is needed instead of delivering a partial token.
//! The unconsumed bytes are then not counted as consumed, so the caller can
//! drop the consumed prefix, append more data and continue with the carried
//! over [`ScannerState`]:
//!
//! ```
//! use curson::scanner::{JsonScanner, TokenKind};
//!
//! // First chunk ends inside the string token
//! let mut scanner = JsonScanner::new(b"[\"te", false);
//! assert_eq!(Ok(true), scanner.advance());
//! assert_eq!(TokenKind::BeginArray, scanner.kind());
//! scanner.consume();
//! // String token is not complete yet
//! assert_eq!(Ok(false), scanner.advance());
//!
//! let consumed = scanner.bytes_consumed();
//! let state = scanner.into_state();
//! assert_eq!(1, consumed);
//!
//! // Continue with the unconsumed bytes plus the next chunk
//! let mut scanner = JsonScanner::resume(b"\"text\"]", true, state);
//! assert_eq!(Ok(true), scanner.advance());
//! assert_eq!(TokenKind::String, scanner.kind());
//! assert_eq!("text", scanner.str_value());
//! ```
//!
//! The scanner is forward-only: it never peeks more than the current token
//! ahead and has no way to rewind. Structural validity (matching brackets,
//! commas between elements, colons after member names) is checked here, so
//! consumers only ever see tokens which are legal at their position.

use std::borrow::Cow;

use thiserror::Error;

use crate::json_number::{scan_number, NumberScan};

/// Maximum nesting depth of arrays and objects
///
/// Deeper documents cause a [`SyntaxErrorKind::MaxNestingDepthExceeded`] error.
/// The limit guards against pathological documents such as `[[[[...`.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Kind of the current token of a [`JsonScanner`]
#[derive(PartialEq, Eq, Clone, Copy, strum::Display, Debug)]
pub enum TokenKind {
    /// No token; the scanner has not been advanced yet, or the previous token
    /// was consumed
    #[strum(serialize = "no token")]
    None,
    /// Start of a JSON array: `[`
    #[strum(serialize = "start of array")]
    BeginArray,
    /// End of a JSON array: `]`
    #[strum(serialize = "end of array")]
    EndArray,
    /// Start of a JSON object: `{`
    #[strum(serialize = "start of object")]
    BeginObject,
    /// End of a JSON object: `}`
    #[strum(serialize = "end of object")]
    EndObject,
    /// Name of a JSON object member
    #[strum(serialize = "member name")]
    MemberName,
    /// JSON string value
    #[strum(serialize = "string")]
    String,
    /// JSON number value
    #[strum(serialize = "number")]
    Number,
    /// JSON boolean value: `true` or `false`
    #[strum(serialize = "boolean")]
    Boolean,
    /// JSON `null`
    #[strum(serialize = "null")]
    Null,
}

/// JSON syntax error
#[derive(Error, PartialEq, Eq, Clone, Debug)]
#[error("JSON syntax error {kind} at byte {offset}")]
pub struct SyntaxError {
    /// Kind of the error
    pub kind: SyntaxErrorKind,
    /// Absolute byte offset in the document at which the error was detected
    pub offset: u64,
}

/// Describes why a syntax error occurred
#[non_exhaustive]
#[derive(PartialEq, Eq, Clone, Copy, strum::Display, Debug)]
pub enum SyntaxErrorKind {
    /// A literal value is incomplete or invalid, for example `tru` instead of `true`
    InvalidLiteral,
    /// There is unexpected trailing data after a literal, for example `truey` instead of `true`
    TrailingDataAfterLiteral,
    /// A closing bracket (`]` or `}`) was encountered where it was not expected
    UnexpectedClosingBracket,
    /// A comma (`,`) was encountered where it was not expected
    UnexpectedComma,
    /// A comma (`,`) is missing between array items or object members
    MissingComma,
    /// A colon (`:`) was encountered where it was not expected
    UnexpectedColon,
    /// A colon (`:`) is missing between member name and member value
    MissingColon,
    /// A JSON number is malformed, for example `01` (leading 0 is not allowed)
    MalformedNumber,
    /// There is unexpected trailing data after a number, for example `123a`
    TrailingDataAfterNumber,
    /// A member name or the end of an object (`}`) was expected but something else was encountered
    ExpectingMemberNameOrObjectEnd,
    /// The JSON data is malformed for a reason other than any of the other kinds
    ///
    /// This is usually the case when a byte is encountered which cannot start any JSON value.
    MalformedJson,

    /// A control character was encountered in the raw JSON data of a member name or string value
    ///
    /// The JSON specification requires that characters in the range from `0x00` to `0x1F`
    /// (inclusive) are escaped when part of a member name or string value.
    NotEscapedControlCharacter,
    /// An unknown escape sequence (`\...`) was encountered
    UnknownEscapeSequence,
    /// A malformed escape sequence was encountered, for example `\u00` instead of `\u0000`
    MalformedEscapeSequence,
    /// An unpaired UTF-16 surrogate was encountered in a member name or a string value
    ///
    /// Since Rust strings consist of UTF-8 data, UTF-16 surrogates written as escape
    /// sequences (`\uXXXX`) must always form a valid surrogate pair.
    UnpairedSurrogatePairEscapeSequence,
    /// Malformed UTF-8 data was encountered in a member name or a string value
    InvalidUtf8,

    /// The nesting depth of arrays and objects exceeds [`MAX_NESTING_DEPTH`]
    MaxNestingDepthExceeded,
    /// The JSON document is incomplete, for example a closing `]` is missing
    ///
    /// This error can only occur for a scanner created with `is_final = true`;
    /// otherwise running out of data is reported as "need more data" instead.
    IncompleteDocument,
    /// Unexpected trailing data was detected at the end of the JSON document
    TrailingData,
}

/// Whether an open structural level is an array or an object
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum Scope {
    Array,
    Object,
}

/// What the next non-whitespace byte is allowed to begin
///
/// This is the punctuation state of the scanner. It is updated whenever a
/// structural byte (`,`, `:`) is consumed or a token is consumed, so it always
/// describes the position directly behind the consumed bytes and can be
/// carried across buffer boundaries as part of [`ScannerState`].
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum Expect {
    /// A value is required (document start, or after `,` in an array, or after `:`)
    Value,
    /// Directly after `[`: a value or `]`
    FirstItem,
    /// Directly after `{`: a member name or `}`
    FirstName,
    /// After `,` in an object: a member name is required
    MemberName,
    /// After a member name: `:`
    MemberColon,
    /// After a value inside an array or object: `,` or the closing bracket
    PostValue,
    /// After the top-level value: no further token exists
    End,
}

/// Resumable cursor state of a [`JsonScanner`]
///
/// Obtained from [`JsonScanner::into_state`] when the current buffer is
/// exhausted, and passed to [`JsonScanner::resume`] together with a buffer
/// which continues at the first unconsumed byte.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct ScannerState {
    stream_offset: u64,
    expect: Expect,
    stack: Vec<Scope>,
}

impl ScannerState {
    /// Creates the state for the start of a document
    pub fn new() -> Self {
        ScannerState {
            stream_offset: 0,
            expect: Expect::Value,
            stack: Vec::new(),
        }
    }
}

impl Default for ScannerState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
enum TokenValue<'a> {
    None,
    Str(Cow<'a, str>),
    Number(&'a str),
    Bool(bool),
}

#[derive(Clone, Debug)]
struct Token<'a> {
    kind: TokenKind,
    /// Buffer index of the first byte of the token
    start: usize,
    /// Length of the token in bytes
    len: usize,
    value: TokenValue<'a>,
}

/// JSON scanner over a byte buffer, resumable at token granularity
///
/// See the [module documentation](self) for the usage protocol. Created with
/// [`new`](Self::new) for the start of a document or [`resume`](Self::resume)
/// to continue an earlier scanner whose buffer was exhausted.
///
/// `is_final` declares whether the buffer contains the complete remainder of
/// the document. A final scanner never asks for more data; running out of
/// bytes mid-document is a [`SyntaxErrorKind::IncompleteDocument`] error then.
#[derive(Debug)]
pub struct JsonScanner<'a> {
    buf: &'a [u8],
    is_final: bool,
    /// Buffer index behind the consumed bytes; only moves forward
    pos: usize,
    /// Absolute offset of `buf[0]` within the overall document
    stream_offset: u64,
    expect: Expect,
    stack: Vec<Scope>,
    token: Option<Token<'a>>,
}

impl<'a> JsonScanner<'a> {
    /// Creates a scanner for the start of a JSON document
    pub fn new(buf: &'a [u8], is_final: bool) -> Self {
        Self::resume(buf, is_final, ScannerState::new())
    }

    /// Creates a scanner continuing from a saved [`ScannerState`]
    ///
    /// `buf` must start at the first unconsumed byte of the previous scanner,
    /// that is, the previous buffer with [`bytes_consumed`](Self::bytes_consumed)
    /// bytes removed from the front, usually extended with newly arrived data.
    pub fn resume(buf: &'a [u8], is_final: bool, state: ScannerState) -> Self {
        JsonScanner {
            buf,
            is_final,
            pos: 0,
            stream_offset: state.stream_offset,
            expect: state.expect,
            stack: state.stack,
            token: None,
        }
    }

    /// Kind of the current token, or [`TokenKind::None`] if there is none
    pub fn kind(&self) -> TokenKind {
        self.token.as_ref().map_or(TokenKind::None, |t| t.kind)
    }

    /// Absolute byte offset of the current token, or of the next unconsumed byte
    pub fn position(&self) -> u64 {
        let local = self.token.as_ref().map_or(self.pos, |t| t.start);
        self.stream_offset + local as u64
    }

    /// Number of bytes of the buffer which have been consumed
    ///
    /// Bytes of the current unconsumed token do not count as consumed. When a
    /// read pauses, the caller should remove this many bytes from the front of
    /// its buffer before appending more data and resuming.
    pub fn bytes_consumed(&self) -> usize {
        self.token.as_ref().map_or(self.pos, |t| t.start)
    }

    /// Saves the cursor state for a later [`resume`](Self::resume)
    ///
    /// An unconsumed current token is dropped; its bytes do not count as
    /// consumed and it is delivered again after resuming.
    pub fn into_state(self) -> ScannerState {
        let consumed = self.bytes_consumed();
        ScannerState {
            stream_offset: self.stream_offset + consumed as u64,
            expect: self.expect,
            stack: self.stack,
        }
    }

    /// String content of the current [`String`](TokenKind::String) or
    /// [`MemberName`](TokenKind::MemberName) token, with escape sequences resolved
    ///
    /// # Panics
    /// Panics if the current token is of a different kind; this indicates incorrect
    /// usage by the caller.
    pub fn str_value(&self) -> &str {
        match &self.token {
            Some(Token {
                value: TokenValue::Str(s),
                ..
            }) => s,
            _ => panic!(
                "Incorrect scanner usage: current token ({}) has no string value",
                self.kind()
            ),
        }
    }

    /// Raw lexeme of the current [`Number`](TokenKind::Number) token, for example `-12.5e3`
    ///
    /// # Panics
    /// Panics if the current token is of a different kind; this indicates incorrect
    /// usage by the caller.
    pub fn number_str(&self) -> &str {
        match &self.token {
            Some(Token {
                value: TokenValue::Number(s),
                ..
            }) => s,
            _ => panic!(
                "Incorrect scanner usage: current token ({}) has no number value",
                self.kind()
            ),
        }
    }

    /// Value of the current [`Boolean`](TokenKind::Boolean) token
    ///
    /// # Panics
    /// Panics if the current token is of a different kind; this indicates incorrect
    /// usage by the caller.
    pub fn bool_value(&self) -> bool {
        match &self.token {
            Some(Token {
                value: TokenValue::Bool(b),
                ..
            }) => *b,
            _ => panic!(
                "Incorrect scanner usage: current token ({}) has no boolean value",
                self.kind()
            ),
        }
    }

    /// Consumes the current token and attempts to make the next token current
    ///
    /// Returns `Ok(true)` if a token was made current, or `Ok(false)` if the
    /// buffer does not contain the complete next token yet and the scanner is
    /// not final. All progress up to the missing token (consumed tokens,
    /// whitespace and structural bytes) is kept.
    ///
    /// # Panics
    /// Panics when called after the top-level value was fully consumed; there
    /// are no further tokens in a JSON document then.
    pub fn advance(&mut self) -> Result<bool, SyntaxError> {
        if self.token.is_some() {
            self.consume();
        }
        if self.expect == Expect::End {
            panic!("Incorrect scanner usage: the top-level value has already been consumed");
        }
        self.lex_next()
    }

    /// Consumes the current token
    ///
    /// Its bytes count as consumed from now on, and the punctuation state and
    /// the array/object scope stack are updated according to the token.
    ///
    /// # Panics
    /// Panics if there is no current token; this indicates incorrect usage by
    /// the caller.
    pub fn consume(&mut self) {
        let Some(token) = self.token.take() else {
            panic!("Incorrect scanner usage: there is no token to consume");
        };
        self.pos = token.start + token.len;
        match token.kind {
            TokenKind::BeginArray => {
                self.stack.push(Scope::Array);
                self.expect = Expect::FirstItem;
            }
            TokenKind::BeginObject => {
                self.stack.push(Scope::Object);
                self.expect = Expect::FirstName;
            }
            TokenKind::EndArray | TokenKind::EndObject => {
                self.stack.pop();
                self.expect = self.after_value();
            }
            TokenKind::MemberName => self.expect = Expect::MemberColon,
            TokenKind::String | TokenKind::Number | TokenKind::Boolean | TokenKind::Null => {
                self.expect = self.after_value();
            }
            // `set_token` never stores a None token
            TokenKind::None => unreachable!("consumed token has kind None"),
        }
    }

    /// Verifies that only whitespace follows the consumed top-level value
    ///
    /// Used by complete-buffer reads to reject documents with trailing data,
    /// reported as [`SyntaxErrorKind::TrailingData`].
    pub fn finish(&mut self) -> Result<(), SyntaxError> {
        self.skip_whitespace();
        if self.pos < self.buf.len() {
            return Err(self.syntax_error_at(SyntaxErrorKind::TrailingData, self.pos));
        }
        Ok(())
    }

    fn after_value(&self) -> Expect {
        if self.stack.is_empty() {
            Expect::End
        } else {
            Expect::PostValue
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.buf.get(self.pos) {
            self.pos += 1;
        }
    }

    fn syntax_error_at(&self, kind: SyntaxErrorKind, local: usize) -> SyntaxError {
        SyntaxError {
            kind,
            offset: self.stream_offset + local as u64,
        }
    }

    fn set_token(&mut self, kind: TokenKind, len: usize, value: TokenValue<'a>) -> Result<bool, SyntaxError> {
        self.token = Some(Token {
            kind,
            start: self.pos,
            len,
            value,
        });
        Ok(true)
    }

    fn end_of_input(&self) -> Result<bool, SyntaxError> {
        if self.is_final {
            Err(self.syntax_error_at(SyntaxErrorKind::IncompleteDocument, self.pos))
        } else {
            Ok(false)
        }
    }

    fn lex_next(&mut self) -> Result<bool, SyntaxError> {
        loop {
            self.skip_whitespace();
            let Some(&byte) = self.buf.get(self.pos) else {
                return self.end_of_input();
            };

            match self.expect {
                Expect::Value => return self.lex_value(byte),
                Expect::FirstItem => {
                    if byte == b']' {
                        return self.set_token(TokenKind::EndArray, 1, TokenValue::None);
                    }
                    return self.lex_value(byte);
                }
                Expect::PostValue => match (self.stack.last().copied(), byte) {
                    (Some(Scope::Array), b']') => {
                        return self.set_token(TokenKind::EndArray, 1, TokenValue::None);
                    }
                    (Some(Scope::Object), b'}') => {
                        return self.set_token(TokenKind::EndObject, 1, TokenValue::None);
                    }
                    (Some(scope), b',') => {
                        self.pos += 1;
                        self.expect = match scope {
                            Scope::Array => Expect::Value,
                            Scope::Object => Expect::MemberName,
                        };
                    }
                    _ => {
                        return Err(self.syntax_error_at(SyntaxErrorKind::MissingComma, self.pos));
                    }
                },
                Expect::FirstName => match byte {
                    b'}' => return self.set_token(TokenKind::EndObject, 1, TokenValue::None),
                    b'"' => return self.lex_string(TokenKind::MemberName),
                    _ => {
                        return Err(self.syntax_error_at(
                            SyntaxErrorKind::ExpectingMemberNameOrObjectEnd,
                            self.pos,
                        ));
                    }
                },
                Expect::MemberName => match byte {
                    b'"' => return self.lex_string(TokenKind::MemberName),
                    // A trailing comma such as `{"a": 1,}` is not allowed
                    b'}' => {
                        return Err(self
                            .syntax_error_at(SyntaxErrorKind::UnexpectedClosingBracket, self.pos));
                    }
                    _ => {
                        return Err(self.syntax_error_at(
                            SyntaxErrorKind::ExpectingMemberNameOrObjectEnd,
                            self.pos,
                        ));
                    }
                },
                Expect::MemberColon => {
                    if byte != b':' {
                        return Err(self.syntax_error_at(SyntaxErrorKind::MissingColon, self.pos));
                    }
                    self.pos += 1;
                    self.expect = Expect::Value;
                }
                // `advance` panics before lexing in the End state
                Expect::End => unreachable!("lexing past the top-level value"),
            }
        }
    }

    fn lex_value(&mut self, byte: u8) -> Result<bool, SyntaxError> {
        match byte {
            b'"' => self.lex_string(TokenKind::String),
            b'[' | b'{' => {
                if self.stack.len() >= MAX_NESTING_DEPTH {
                    return Err(
                        self.syntax_error_at(SyntaxErrorKind::MaxNestingDepthExceeded, self.pos)
                    );
                }
                let kind = if byte == b'[' {
                    TokenKind::BeginArray
                } else {
                    TokenKind::BeginObject
                };
                self.set_token(kind, 1, TokenValue::None)
            }
            b't' => self.lex_literal(b"true", TokenValue::Bool(true)),
            b'f' => self.lex_literal(b"false", TokenValue::Bool(false)),
            b'n' => self.lex_literal(b"null", TokenValue::None),
            b'-' | b'0'..=b'9' => self.lex_number(),
            b']' | b'}' => {
                Err(self.syntax_error_at(SyntaxErrorKind::UnexpectedClosingBracket, self.pos))
            }
            b',' => Err(self.syntax_error_at(SyntaxErrorKind::UnexpectedComma, self.pos)),
            b':' => Err(self.syntax_error_at(SyntaxErrorKind::UnexpectedColon, self.pos)),
            _ => Err(self.syntax_error_at(SyntaxErrorKind::MalformedJson, self.pos)),
        }
    }

    /// Whether a byte may directly follow a number or a `true` / `false` / `null` literal
    fn is_separator(byte: u8) -> bool {
        matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | b',' | b']' | b'}')
    }

    fn lex_literal(&mut self, literal: &'static [u8], value: TokenValue<'a>) -> Result<bool, SyntaxError> {
        let remaining = &self.buf[self.pos..];
        if remaining.len() < literal.len() {
            return if literal.starts_with(remaining) && !self.is_final {
                // Could still become the literal with more data
                Ok(false)
            } else {
                Err(self.syntax_error_at(SyntaxErrorKind::InvalidLiteral, self.pos))
            };
        }
        if !remaining.starts_with(literal) {
            return Err(self.syntax_error_at(SyntaxErrorKind::InvalidLiteral, self.pos));
        }
        match remaining.get(literal.len()) {
            // Cannot rule out trailing data such as `truey` until the next byte is known
            None if !self.is_final => Ok(false),
            None => {
                let kind = self.literal_kind(literal);
                self.set_token(kind, literal.len(), value)
            }
            Some(&next) if Self::is_separator(next) => {
                let kind = self.literal_kind(literal);
                self.set_token(kind, literal.len(), value)
            }
            Some(_) => Err(self.syntax_error_at(
                SyntaxErrorKind::TrailingDataAfterLiteral,
                self.pos + literal.len(),
            )),
        }
    }

    fn literal_kind(&self, literal: &[u8]) -> TokenKind {
        if literal == b"null" {
            TokenKind::Null
        } else {
            TokenKind::Boolean
        }
    }

    fn lex_number(&mut self) -> Result<bool, SyntaxError> {
        // Copy out the buffer reference so the lexeme borrows `'a` data, not `self`
        let buf = self.buf;
        let remaining = &buf[self.pos..];
        let len = match scan_number(remaining) {
            NumberScan::Complete { len } => {
                // The ending byte must be a valid separator; `scan_number` only
                // guarantees it cannot belong to a number (e.g. `123a`)
                if !Self::is_separator(remaining[len]) {
                    return Err(self
                        .syntax_error_at(SyntaxErrorKind::TrailingDataAfterNumber, self.pos + len));
                }
                len
            }
            NumberScan::ValidPrefix => {
                if !self.is_final {
                    // More data could extend the number
                    return Ok(false);
                }
                remaining.len()
            }
            NumberScan::IncompletePrefix => {
                return if self.is_final {
                    Err(self
                        .syntax_error_at(SyntaxErrorKind::MalformedNumber, self.pos + remaining.len()))
                } else {
                    Ok(false)
                };
            }
            NumberScan::Invalid { at } => {
                return Err(self.syntax_error_at(SyntaxErrorKind::MalformedNumber, self.pos + at));
            }
        };
        // Number lexemes consist of ASCII bytes only
        let lexeme = std::str::from_utf8(&remaining[..len]).expect("number lexeme is ASCII");
        self.set_token(TokenKind::Number, len, TokenValue::Number(lexeme))
    }

    fn lex_string(&mut self, kind: TokenKind) -> Result<bool, SyntaxError> {
        // self.buf[self.pos] is the opening quote
        let content_start = self.pos + 1;
        let mut index = content_start;
        let mut has_escape = false;
        let content_end = loop {
            match self.buf.get(index) {
                None => return self.end_of_input(),
                Some(b'"') => break index,
                Some(b'\\') => {
                    has_escape = true;
                    if index + 1 >= self.buf.len() {
                        return self.end_of_input();
                    }
                    index += 2;
                }
                Some(&b) if b < 0x20 => {
                    return Err(
                        self.syntax_error_at(SyntaxErrorKind::NotEscapedControlCharacter, index)
                    );
                }
                Some(_) => index += 1,
            }
        };

        let buf = self.buf;
        let raw = &buf[content_start..content_end];
        let value = if has_escape {
            Cow::Owned(decode_escaped(
                raw,
                self.stream_offset + content_start as u64,
            )?)
        } else {
            match std::str::from_utf8(raw) {
                Ok(s) => Cow::Borrowed(s),
                Err(e) => {
                    return Err(self.syntax_error_at(
                        SyntaxErrorKind::InvalidUtf8,
                        content_start + e.valid_up_to(),
                    ));
                }
            }
        };
        // +2 for the enclosing quotes
        self.set_token(kind, content_end - content_start + 2, TokenValue::Str(value))
    }
}

/// Resolves the escape sequences of a string token's raw content
///
/// `base` is the absolute offset of `raw[0]`, used for error positions. The
/// scanner has already verified that every `\` is followed by at least one
/// byte and that the content contains no unescaped control character.
fn decode_escaped(raw: &[u8], base: u64) -> Result<String, SyntaxError> {
    fn error(kind: SyntaxErrorKind, base: u64, index: usize) -> SyntaxError {
        SyntaxError {
            kind,
            offset: base + index as u64,
        }
    }

    /// Reads the `XXXX` of a `\uXXXX` escape whose `\` is at `index`
    fn hex_code(raw: &[u8], base: u64, index: usize) -> Result<u16, SyntaxError> {
        let hex = raw
            .get(index + 2..index + 6)
            .and_then(|h| std::str::from_utf8(h).ok())
            .ok_or_else(|| error(SyntaxErrorKind::MalformedEscapeSequence, base, index))?;
        u16::from_str_radix(hex, 16)
            .map_err(|_| error(SyntaxErrorKind::MalformedEscapeSequence, base, index))
    }

    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] != b'\\' {
            let run_start = i;
            while i < raw.len() && raw[i] != b'\\' {
                i += 1;
            }
            let run = std::str::from_utf8(&raw[run_start..i]).map_err(|e| {
                error(SyntaxErrorKind::InvalidUtf8, base, run_start + e.valid_up_to())
            })?;
            out.push_str(run);
            continue;
        }

        let escaped = raw
            .get(i + 1)
            .ok_or_else(|| error(SyntaxErrorKind::MalformedEscapeSequence, base, i))?;
        match escaped {
            b'"' => {
                out.push('"');
                i += 2;
            }
            b'\\' => {
                out.push('\\');
                i += 2;
            }
            b'/' => {
                out.push('/');
                i += 2;
            }
            b'b' => {
                out.push('\u{0008}');
                i += 2;
            }
            b'f' => {
                out.push('\u{000C}');
                i += 2;
            }
            b'n' => {
                out.push('\n');
                i += 2;
            }
            b'r' => {
                out.push('\r');
                i += 2;
            }
            b't' => {
                out.push('\t');
                i += 2;
            }
            b'u' => {
                let code = hex_code(raw, base, i)?;
                let code_point = match code {
                    // High surrogate; must be followed by an escaped low surrogate
                    0xD800..=0xDBFF => {
                        if raw.get(i + 6) != Some(&b'\\') || raw.get(i + 7) != Some(&b'u') {
                            return Err(error(
                                SyntaxErrorKind::UnpairedSurrogatePairEscapeSequence,
                                base,
                                i,
                            ));
                        }
                        let low = hex_code(raw, base, i + 6)?;
                        if !(0xDC00..=0xDFFF).contains(&low) {
                            return Err(error(
                                SyntaxErrorKind::UnpairedSurrogatePairEscapeSequence,
                                base,
                                i,
                            ));
                        }
                        i += 12;
                        0x10000 + ((u32::from(code) - 0xD800) << 10) + (u32::from(low) - 0xDC00)
                    }
                    0xDC00..=0xDFFF => {
                        return Err(error(
                            SyntaxErrorKind::UnpairedSurrogatePairEscapeSequence,
                            base,
                            i,
                        ));
                    }
                    _ => {
                        i += 6;
                        u32::from(code)
                    }
                };
                match char::from_u32(code_point) {
                    Some(c) => out.push(c),
                    None => {
                        return Err(error(SyntaxErrorKind::MalformedEscapeSequence, base, i));
                    }
                }
            }
            _ => return Err(error(SyntaxErrorKind::UnknownEscapeSequence, base, i)),
        }
    }
    Ok(out)
}
