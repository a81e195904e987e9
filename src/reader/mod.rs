//! Typed JSON readers and their combinators
//!
//! A [`JsonReader<T>`] is an immutable description of how to decode a `T` from
//! a stream of JSON tokens. Readers are built from the scalar constructors
//! ([`string`], [`i64`], [`f64`], [`boolean`], [`null`], ...) and composed
//! with [`array`], [`object`] / [`prop`], [`tagged`] and the adapter methods
//! on the trait ([`map`](JsonReader::map), [`validate`](JsonReader::validate),
//! [`or_null`](JsonReader::or_null), [`or_default`](JsonReader::or_default)).
//!
//! # Reading
//!
//! For a complete document use [`read`](JsonReader::read) or
//! [`read_str`](JsonReader::read_str); for data arriving from an
//! [`std::io::Read`] source use [`read_from`](JsonReader::read_from).
//!
//! The building block underneath is [`try_read`](JsonReader::try_read), which
//! attempts one synchronous, non-blocking decode step and returns a
//! [`ReadResult`]: the decoded value, an error, or
//! [`Incomplete`](ReadResult::Incomplete) when the scanner ran out of data
//! mid-value. Incomplete is not an error; it means "call again once more bytes
//! are available". All state needed to continue is held by the caller: the
//! [`ScannerState`](crate::scanner::ScannerState) and a [`ReadSession`]
//! carrying one structural state machine per open array/object level. See the
//! [crate documentation](crate) for a worked chunk loop.
//!
//! # Sharing
//!
//! Readers own no per-decode state, so a single reader value (usually built
//! once at startup) can serve any number of decodes, concurrently as well.
//! Each decode needs its own `ReadSession` and scanner state though; sharing
//! those between decodes is incorrect usage and panics.

use std::io::Read;

use thiserror::Error;

use crate::scanner::{JsonScanner, ScannerState, SyntaxError, TokenKind};

mod array;
mod combinator;
mod object;
mod scalar;
mod session;
mod state_machine;

pub use array::*;
pub use combinator::*;
pub use object::*;
pub use scalar::*;
pub use session::ReadSession;
pub use state_machine::*;

/// Outcome of a single read attempt
///
/// Exactly one of three things: the decoded value, a pause because the input
/// ran out mid-value, or a permanent error for this decode.
#[must_use]
#[derive(PartialEq, Clone, Debug)]
pub enum ReadResult<T> {
    /// The value was fully decoded; the scanner is positioned directly behind it
    Value(T),
    /// The input ended before the value was complete
    ///
    /// Not an error: the same read can be repeated once more data is available,
    /// with the same session and the carried over scanner state, and continues
    /// where it stopped. Repeating it without new input returns `Incomplete`
    /// again.
    Incomplete,
    /// The decode failed
    ///
    /// Errors are permanent for the attempted decode: the involved state
    /// machines refuse to continue and repeat the same error on every further
    /// call.
    Error(ReadError),
}

impl<T> ReadResult<T> {
    /// Applies a function to the value of a `Value` result, passing the other
    /// variants through unchanged
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ReadResult<U> {
        match self {
            ReadResult::Value(v) => ReadResult::Value(f(v)),
            ReadResult::Incomplete => ReadResult::Incomplete,
            ReadResult::Error(e) => ReadResult::Error(e),
        }
    }
}

/// Propagates `Incomplete` and `Error` from a [`ReadResult`] expression,
/// evaluating to the value otherwise
///
/// The reader equivalent of `?`: combinators use it to pass the non-value
/// outcomes of an inner reader through unchanged.
macro_rules! ready {
    ($e:expr) => {
        match $e {
            $crate::reader::ReadResult::Value(value) => value,
            $crate::reader::ReadResult::Incomplete => {
                return $crate::reader::ReadResult::Incomplete
            }
            $crate::reader::ReadResult::Error(e) => return $crate::reader::ReadResult::Error(e),
        }
    };
}
pub(crate) use ready;

/// Error which occurred while decoding a value
#[non_exhaustive]
#[derive(Error, PartialEq, Clone, Debug)]
pub enum ReadError {
    /// The JSON data itself is malformed
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    /// The kind of the next token does not match what the reader expects at
    /// this position, for example a string where an array should start
    #[error("expected {expected} but got {actual} at byte {offset}")]
    UnexpectedToken {
        /// The kind of token the reader expected
        expected: TokenKind,
        /// The kind of token which was actually present
        actual: TokenKind,
        /// Absolute byte offset of the unexpected token
        offset: u64,
    },
    /// The token is valid JSON but its value cannot be converted to the target
    /// type, for example a number which overflows the target integer type
    #[error("malformed value at byte {offset}: {message}")]
    MalformedValue {
        /// Description of the conversion failure
        message: String,
        /// Absolute byte offset of the offending value
        offset: u64,
    },
    /// A structural constraint of the reader was violated, for example an
    /// array with fewer items than the configured minimum or a missing
    /// required object member
    #[error("schema violation at byte {offset}: {message}")]
    SchemaViolation {
        /// Description of the violated constraint
        message: String,
        /// Absolute byte offset at which the violation was detected
        offset: u64,
    },
}

/// Error which occurred while reading a document from an [`std::io::Read`] source
///
/// See [`JsonReader::read_from`].
#[derive(Error, Debug)]
pub enum StreamReadError {
    /// Decoding the document failed
    #[error("read error: {0}")]
    Read(#[from] ReadError),
    /// The underlying source failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Makes a token current if there is none yet
///
/// Readers are invoked either with the scanner positioned on the first token
/// of their value, or with no current token; this helper unifies the two by
/// advancing once in the latter case. Evaluates to the current token kind.
pub(crate) fn ensure_token(scanner: &mut JsonScanner<'_>) -> ReadResult<TokenKind> {
    if scanner.kind() == TokenKind::None {
        match scanner.advance() {
            Ok(true) => {}
            Ok(false) => return ReadResult::Incomplete,
            Err(e) => return ReadResult::Error(e.into()),
        }
    }
    ReadResult::Value(scanner.kind())
}

/// A typed JSON reader: an immutable, reusable description of how to decode a `T`
///
/// Implementations are stateless; everything a paused decode needs to continue
/// lives in the caller-held [`ReadSession`] and scanner state. See the
/// [module documentation](self) for the overall contract.
///
/// # Examples
/// ```
/// use curson::reader::*;
///
/// let reader = array(string());
/// let value = reader.read_str(r#"["a", "b"]"#)?;
/// assert_eq!(vec!["a".to_owned(), "b".to_owned()], value);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait JsonReader<T> {
    /// Attempts to decode one `T` from the scanner's current position
    ///
    /// On [`Value`](ReadResult::Value) the scanner has consumed exactly the
    /// tokens of the decoded value. On [`Incomplete`](ReadResult::Incomplete)
    /// all progress is saved in `session` and the scanner state; repeating the
    /// call with a scanner continuing at the unconsumed position resumes the
    /// decode. On [`Error`](ReadResult::Error) the decode is permanently
    /// failed; repeating the call returns the same error.
    ///
    /// The session must be fresh for a new decode and must only ever be used
    /// with the same reader; resuming with a different reader is incorrect
    /// usage and may panic.
    fn try_read(&self, scanner: &mut JsonScanner<'_>, session: &mut ReadSession) -> ReadResult<T>;

    /// Decodes a value from a complete JSON document
    ///
    /// The payload must contain the whole document: running out of data is a
    /// [`SyntaxErrorKind::IncompleteDocument`](crate::scanner::SyntaxErrorKind::IncompleteDocument)
    /// error here, never `Incomplete`. Only whitespace may follow the value.
    ///
    /// # Examples
    /// ```
    /// use curson::reader::*;
    ///
    /// assert_eq!(vec![1, 2, 3], array(i64()).read(b"[1, 2, 3]")?);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn read(&self, json: &[u8]) -> Result<T, ReadError>
    where
        Self: Sized,
    {
        let mut session = ReadSession::new();
        let mut scanner = JsonScanner::new(json, true);
        match self.try_read(&mut scanner, &mut session) {
            ReadResult::Value(value) => {
                scanner.finish()?;
                Ok(value)
            }
            // A scanner over final input never asks for more data
            ReadResult::Incomplete => {
                unreachable!("read of complete buffer reported Incomplete")
            }
            ReadResult::Error(e) => Err(e),
        }
    }

    /// Decodes a value from a complete JSON document given as string
    fn read_str(&self, json: &str) -> Result<T, ReadError>
    where
        Self: Sized,
    {
        self.read(json.as_bytes())
    }

    /// Decodes a value from an [`std::io::Read`] source, reading it in chunks
    ///
    /// Drives the incremental read cycle internally: bytes are pulled from the
    /// source as needed and already-consumed bytes are dropped, so documents
    /// larger than memory can be decoded as long as the accumulated values fit.
    /// A source which ends before the document is complete causes an
    /// [`IncompleteDocument`](crate::scanner::SyntaxErrorKind::IncompleteDocument)
    /// error.
    ///
    /// # Examples
    /// ```
    /// use curson::reader::*;
    ///
    /// let pipe: &[u8] = b"[1, 2, 3]";
    /// assert_eq!(vec![1, 2, 3], array(i64()).read_from(pipe)?);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn read_from<S: Read>(&self, mut source: S) -> Result<T, StreamReadError>
    where
        Self: Sized,
    {
        let mut session = ReadSession::new();
        let mut state = ScannerState::new();
        let mut buf = Vec::new();
        let mut chunk = [0_u8; 1024];
        let mut is_final = false;
        loop {
            if !is_final {
                match source.read(&mut chunk) {
                    Ok(0) => is_final = true,
                    Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }
            let mut scanner = JsonScanner::resume(&buf, is_final, state);
            match self.try_read(&mut scanner, &mut session) {
                ReadResult::Value(value) => return Ok(value),
                ReadResult::Incomplete => {
                    let consumed = scanner.bytes_consumed();
                    state = scanner.into_state();
                    buf.drain(..consumed);
                }
                ReadResult::Error(e) => return Err(e.into()),
            }
        }
    }

    /// Transforms the decoded value through a pure function
    ///
    /// `Incomplete` and errors pass through unchanged; the function only runs
    /// on a fully decoded value.
    ///
    /// # Examples
    /// ```
    /// use curson::reader::*;
    ///
    /// let reader = string().map(|s| s.len());
    /// assert_eq!(3, reader.read_str("\"abc\"")?);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn map<U, F>(self, f: F) -> Map<Self, F, T>
    where
        Self: Sized,
        F: Fn(T) -> U,
    {
        Map::new(self, f)
    }

    /// Rejects decoded values for which the predicate returns `false`
    ///
    /// Rejection is reported as [`ReadError::SchemaViolation`] with the given
    /// message.
    ///
    /// # Examples
    /// ```
    /// use curson::reader::*;
    ///
    /// let reader = i64().validate("expected a non-negative number", |&n| n >= 0);
    /// assert!(matches!(
    ///     reader.read_str("-5"),
    ///     Err(ReadError::SchemaViolation { .. })
    /// ));
    /// ```
    fn validate<F>(self, message: &'static str, predicate: F) -> Validate<Self, F>
    where
        Self: Sized,
        F: Fn(&T) -> bool,
    {
        Validate::new(self, message, predicate)
    }

    /// Additionally accepts JSON `null`, decoded as `None`
    ///
    /// # Examples
    /// ```
    /// use curson::reader::*;
    ///
    /// let reader = array(i64().or_null());
    /// assert_eq!(vec![Some(1), None], reader.read_str("[1, null]")?);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn or_null(self) -> OrNull<Self>
    where
        Self: Sized,
    {
        OrNull::new(self)
    }

    /// Additionally accepts JSON `null`, decoded as the given default value
    ///
    /// # Examples
    /// ```
    /// use curson::reader::*;
    ///
    /// let reader = array(i64().or_default(-1));
    /// assert_eq!(vec![1, -1], reader.read_str("[1, null]")?);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn or_default(self, default: T) -> OrDefault<Self, T>
    where
        Self: Sized,
        T: Clone,
    {
        OrDefault::new(self, default)
    }
}

impl<T, R: JsonReader<T> + ?Sized> JsonReader<T> for &R {
    fn try_read(&self, scanner: &mut JsonScanner<'_>, session: &mut ReadSession) -> ReadResult<T> {
        (**self).try_read(scanner, session)
    }
}

impl<T, R: JsonReader<T> + ?Sized> JsonReader<T> for Box<R> {
    fn try_read(&self, scanner: &mut JsonScanner<'_>, session: &mut ReadSession) -> ReadResult<T> {
        (**self).try_read(scanner, session)
    }
}
