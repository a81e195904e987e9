//! Reader for JSON arrays with homogeneous items

use crate::reader::{
    ArrayReadStateMachine, ArrayStep, JsonReader, ReadError, ReadResult, ReadSession,
};
use crate::scanner::JsonScanner;

/// Reader for a JSON array, produced by [`array()`]
#[derive(Clone, Debug)]
pub struct ArrayReader<R> {
    item_reader: R,
    min_length: Option<u32>,
    max_length: Option<u32>,
}

/// Creates a reader which decodes a JSON array as [`Vec`], decoding every item
/// with `item_reader`
///
/// # Examples
/// ```
/// use curson::reader::*;
///
/// let reader = array(array(f64()));
/// assert_eq!(vec![vec![1.0, 2.0], vec![]], reader.read_str("[[1.0, 2.0], []]")?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn array<R>(item_reader: R) -> ArrayReader<R> {
    ArrayReader {
        item_reader,
        min_length: None,
        max_length: None,
    }
}

impl<R> ArrayReader<R> {
    /// Requires the array to have at least `length` items
    ///
    /// Shorter arrays are rejected with
    /// [`SchemaViolation`](ReadError::SchemaViolation) when their end is
    /// reached.
    ///
    /// # Examples
    /// A line needs at least two points:
    /// ```
    /// use curson::reader::*;
    ///
    /// let line = array(array(f64()).min_length(2).max_length(3)).min_length(2);
    /// assert!(line.read_str("[[1.0, 2.0]]").is_err());
    /// assert!(line.read_str("[[1.0, 2.0], [3.0, 4.0]]").is_ok());
    /// ```
    pub fn min_length(mut self, length: u32) -> Self {
        self.min_length = Some(length);
        self
    }

    /// Requires the array to have at most `length` items
    ///
    /// Longer arrays are rejected with
    /// [`SchemaViolation`](ReadError::SchemaViolation) as soon as an excess
    /// item is encountered.
    pub fn max_length(mut self, length: u32) -> Self {
        self.max_length = Some(length);
        self
    }
}

/// Session frame of one array level: the machine plus the items accepted so far
struct ArrayFrame<T> {
    machine: ArrayReadStateMachine,
    items: Vec<T>,
}

impl<T, R> JsonReader<Vec<T>> for ArrayReader<R>
where
    T: Send + 'static,
    R: JsonReader<T>,
{
    fn try_read(
        &self,
        scanner: &mut JsonScanner<'_>,
        session: &mut ReadSession,
    ) -> ReadResult<Vec<T>> {
        let mut frame: ArrayFrame<T> = session.descend(|| ArrayFrame {
            machine: ArrayReadStateMachine::new(),
            items: Vec::new(),
        });
        loop {
            match frame.machine.read(scanner) {
                ReadResult::Value(ArrayStep::Item) => {
                    if let Some(max) = self.max_length {
                        if frame.machine.item_count() >= max {
                            let error = ReadError::SchemaViolation {
                                message: format!("expected at most {max} array items"),
                                offset: scanner.position(),
                            };
                            frame.machine.on_error(error.clone());
                            session.suspend(frame);
                            return ReadResult::Error(error);
                        }
                    }
                    match self.item_reader.try_read(scanner, session) {
                        ReadResult::Value(item) => {
                            frame.items.push(item);
                            frame.machine.on_item_read();
                        }
                        ReadResult::Incomplete => {
                            session.suspend(frame);
                            return ReadResult::Incomplete;
                        }
                        ReadResult::Error(error) => {
                            frame.machine.on_error(error.clone());
                            session.suspend(frame);
                            return ReadResult::Error(error);
                        }
                    }
                }
                ReadResult::Value(ArrayStep::Done) => {
                    if let Some(min) = self.min_length {
                        let count = frame.machine.item_count();
                        if count < min {
                            let error = ReadError::SchemaViolation {
                                message: format!(
                                    "expected at least {min} array items but got {count}"
                                ),
                                offset: scanner.position(),
                            };
                            frame.machine.on_error(error.clone());
                            session.suspend(frame);
                            return ReadResult::Error(error);
                        }
                    }
                    session.complete();
                    return ReadResult::Value(frame.items);
                }
                ReadResult::Incomplete => {
                    session.suspend(frame);
                    return ReadResult::Incomplete;
                }
                // The machine is already poisoned for its own failures
                ReadResult::Error(error) => {
                    session.suspend(frame);
                    return ReadResult::Error(error);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{i64, string};
    use crate::scanner::{ScannerState, TokenKind};

    #[test]
    fn reads_arrays() {
        assert_eq!(vec![1, 2, 3], array(i64()).read_str("[1, 2, 3]").unwrap());
        assert_eq!(Vec::<i64>::new(), array(i64()).read_str("[]").unwrap());
        assert_eq!(
            vec!["a".to_owned(), "b".to_owned()],
            array(string()).read_str(r#"["a", "b"]"#).unwrap()
        );
    }

    #[test]
    fn item_error_carries_position() {
        assert_eq!(
            Err(ReadError::UnexpectedToken {
                expected: TokenKind::Number,
                actual: TokenKind::String,
                offset: 3,
            }),
            array(i64()).read_str(r#"[1,"x",3]"#)
        );
    }

    #[test]
    fn length_bounds() {
        let pair_or_triple = array(i64()).min_length(2).max_length(3);
        assert_eq!(vec![1, 2], pair_or_triple.read_str("[1, 2]").unwrap());
        assert_eq!(vec![1, 2, 3], pair_or_triple.read_str("[1, 2, 3]").unwrap());
        assert!(matches!(
            pair_or_triple.read_str("[1]"),
            Err(ReadError::SchemaViolation { .. })
        ));
        assert!(matches!(
            pair_or_triple.read_str("[1, 2, 3, 4]"),
            Err(ReadError::SchemaViolation { .. })
        ));
    }

    /// An error poisons the frame: resuming the same session repeats the error
    /// instead of continuing
    #[test]
    fn error_is_permanent_across_calls() {
        let reader = array(i64());
        let mut session = ReadSession::new();

        let mut scanner = JsonScanner::new(b"[1, true]", true);
        let first = reader.try_read(&mut scanner, &mut session);
        assert!(matches!(first, ReadResult::Error(ReadError::UnexpectedToken { .. })));

        // Even a fresh scanner over valid data cannot revive the session
        let mut scanner = JsonScanner::resume(b"[1, 2]", true, ScannerState::new());
        let second = reader.try_read(&mut scanner, &mut session);
        assert_eq!(first, second);
    }

    /// Items accepted before a pause are not decoded again after resuming
    #[test]
    fn resume_does_not_recount_items() {
        let reader = array(i64());
        let mut session = ReadSession::new();

        let mut scanner = JsonScanner::new(b"[10, 20", false);
        assert_eq!(ReadResult::Incomplete, reader.try_read(&mut scanner, &mut session));
        let consumed = scanner.bytes_consumed();
        let state = scanner.into_state();
        // `[10, ` is consumed, the possibly-unfinished `20` is not
        assert_eq!(5, consumed);

        let mut scanner = JsonScanner::resume(b"20, 30]", true, state);
        assert_eq!(
            ReadResult::Value(vec![10, 20, 30]),
            reader.try_read(&mut scanner, &mut session)
        );
    }
}
