//! Reader-to-reader adapters
//!
//! All adapters preserve the resumability contract of the wrapped reader:
//! `Incomplete` and errors pass through untouched, and no adapter ever needs
//! to rewind the scanner.

use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use crate::reader::{ensure_token, ready, JsonReader, ReadError, ReadResult, ReadSession};
use crate::scanner::{JsonScanner, TokenKind};

/// Adapter created by [`JsonReader::map`]
#[derive(Clone, Debug)]
pub struct Map<R, F, T> {
    reader: R,
    transform: F,
    _input: PhantomData<fn(T)>,
}

impl<R, F, T> Map<R, F, T> {
    pub(crate) fn new(reader: R, transform: F) -> Self {
        Map {
            reader,
            transform,
            _input: PhantomData,
        }
    }
}

impl<T, U, R, F> JsonReader<U> for Map<R, F, T>
where
    R: JsonReader<T>,
    F: Fn(T) -> U,
{
    fn try_read(&self, scanner: &mut JsonScanner<'_>, session: &mut ReadSession) -> ReadResult<U> {
        let value = ready!(self.reader.try_read(scanner, session));
        ReadResult::Value((self.transform)(value))
    }
}

/// Adapter created by [`JsonReader::validate`]
#[derive(Clone, Debug)]
pub struct Validate<R, F> {
    reader: R,
    message: &'static str,
    predicate: F,
}

impl<R, F> Validate<R, F> {
    pub(crate) fn new(reader: R, message: &'static str, predicate: F) -> Self {
        Validate {
            reader,
            message,
            predicate,
        }
    }
}

impl<T, R, F> JsonReader<T> for Validate<R, F>
where
    R: JsonReader<T>,
    F: Fn(&T) -> bool,
{
    fn try_read(&self, scanner: &mut JsonScanner<'_>, session: &mut ReadSession) -> ReadResult<T> {
        let value = ready!(self.reader.try_read(scanner, session));
        if (self.predicate)(&value) {
            ReadResult::Value(value)
        } else {
            ReadResult::Error(ReadError::SchemaViolation {
                message: self.message.to_owned(),
                offset: scanner.position(),
            })
        }
    }
}

/// Adapter created by [`JsonReader::or_null`]
#[derive(Clone, Debug)]
pub struct OrNull<R> {
    reader: R,
}

impl<R> OrNull<R> {
    pub(crate) fn new(reader: R) -> Self {
        OrNull { reader }
    }
}

impl<T, R> JsonReader<Option<T>> for OrNull<R>
where
    R: JsonReader<T>,
{
    fn try_read(
        &self,
        scanner: &mut JsonScanner<'_>,
        session: &mut ReadSession,
    ) -> ReadResult<Option<T>> {
        if ready!(ensure_token(scanner)) == TokenKind::Null {
            scanner.consume();
            return ReadResult::Value(None);
        }
        self.reader.try_read(scanner, session).map(Some)
    }
}

/// Adapter created by [`JsonReader::or_default`]
#[derive(Clone, Debug)]
pub struct OrDefault<R, T> {
    reader: R,
    default: T,
}

impl<R, T> OrDefault<R, T> {
    pub(crate) fn new(reader: R, default: T) -> Self {
        OrDefault { reader, default }
    }
}

impl<T, R> JsonReader<T> for OrDefault<R, T>
where
    R: JsonReader<T>,
    T: Clone,
{
    fn try_read(&self, scanner: &mut JsonScanner<'_>, session: &mut ReadSession) -> ReadResult<T> {
        if ready!(ensure_token(scanner)) == TokenKind::Null {
            scanner.consume();
            return ReadResult::Value(self.default.clone());
        }
        self.reader.try_read(scanner, session)
    }
}

/// Handle for a self-referential reader, created by [`recursive()`]
///
/// Cloning the handle is cheap; all clones delegate to the same underlying
/// reader.
pub struct Recursive<T> {
    reader: Arc<OnceLock<Box<dyn JsonReader<T> + Send + Sync>>>,
}

impl<T> Clone for Recursive<T> {
    fn clone(&self) -> Self {
        Recursive {
            reader: Arc::clone(&self.reader),
        }
    }
}

impl<T> std::fmt::Debug for Recursive<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recursive").finish_non_exhaustive()
    }
}

/// Ties the knot for a reader which refers to itself
///
/// The closure receives a [`Recursive`] handle standing in for the reader
/// being defined and returns the definition; clones of the handle can be
/// embedded anywhere inside it. Needed for recursive schemas, for example a
/// tree or a geometry collection containing further geometries.
///
/// # Examples
/// The nesting depth of arbitrarily nested arrays:
/// ```
/// use curson::reader::*;
///
/// let depth = recursive(|nested| {
///     array(nested).map(|inner: Vec<u32>| 1 + inner.into_iter().max().unwrap_or(0))
/// });
/// assert_eq!(3, depth.read_str("[[], [[]]]")?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn recursive<T, F, R>(define: F) -> Recursive<T>
where
    F: FnOnce(Recursive<T>) -> R,
    R: JsonReader<T> + Send + Sync + 'static,
{
    let handle = Recursive {
        reader: Arc::new(OnceLock::new()),
    };
    let reader = define(handle.clone());
    if handle.reader.set(Box::new(reader)).is_err() {
        panic!("Incorrect reader usage: recursive reader was already defined");
    }
    handle
}

impl<T> JsonReader<T> for Recursive<T> {
    fn try_read(&self, scanner: &mut JsonScanner<'_>, session: &mut ReadSession) -> ReadResult<T> {
        let Some(reader) = self.reader.get() else {
            panic!("Incorrect reader usage: recursive reader used before its definition completed");
        };
        reader.try_read(scanner, session)
    }
}
