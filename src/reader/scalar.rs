//! Leaf readers for JSON scalar values
//!
//! Scalars are never split across an incomplete boundary: the scanner only
//! delivers whole tokens, so these readers are plain stateless functions over
//! the current token and never need a session frame.

use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use duplicate::duplicate;

use crate::reader::{ensure_token, ready, JsonReader, ReadError, ReadResult, ReadSession};
use crate::scanner::{JsonScanner, TokenKind};

/// Reader for JSON strings, produced by [`string()`]
#[derive(Clone, Copy, Debug)]
pub struct StringReader;

/// Creates a reader which decodes a JSON string as [`String`]
///
/// Any other token kind is an [`UnexpectedToken`](ReadError::UnexpectedToken)
/// error.
pub fn string() -> StringReader {
    StringReader
}

impl JsonReader<String> for StringReader {
    fn try_read(
        &self,
        scanner: &mut JsonScanner<'_>,
        _session: &mut ReadSession,
    ) -> ReadResult<String> {
        match ready!(ensure_token(scanner)) {
            TokenKind::String => {
                let value = scanner.str_value().to_owned();
                scanner.consume();
                ReadResult::Value(value)
            }
            actual => ReadResult::Error(ReadError::UnexpectedToken {
                expected: TokenKind::String,
                actual,
                offset: scanner.position(),
            }),
        }
    }
}

/// Reader for integral JSON numbers, produced by [`i8()`] ... [`u64()`]
///
/// Strict: the number must be representable exactly in the target type, so a
/// fractional value, an exponent or an out-of-range value is a
/// [`MalformedValue`](ReadError::MalformedValue) error rather than being
/// truncated.
#[derive(Clone, Copy, Debug)]
pub struct IntegerReader<N> {
    _number_type: PhantomData<N>,
}

impl<N> JsonReader<N> for IntegerReader<N>
where
    N: FromStr,
    N::Err: Display,
{
    fn try_read(
        &self,
        scanner: &mut JsonScanner<'_>,
        _session: &mut ReadSession,
    ) -> ReadResult<N> {
        match ready!(ensure_token(scanner)) {
            TokenKind::Number => {
                let lexeme = scanner.number_str();
                match lexeme.parse::<N>() {
                    Ok(value) => {
                        scanner.consume();
                        ReadResult::Value(value)
                    }
                    Err(e) => ReadResult::Error(ReadError::MalformedValue {
                        message: format!(
                            "number '{lexeme}' cannot be read as {}: {e}",
                            std::any::type_name::<N>()
                        ),
                        offset: scanner.position(),
                    }),
                }
            }
            actual => ReadResult::Error(ReadError::UnexpectedToken {
                expected: TokenKind::Number,
                actual,
                offset: scanner.position(),
            }),
        }
    }
}

duplicate! {
    [
        reader_fn number_type;
        [i8]      [i8];
        [i16]     [i16];
        [i32]     [i32];
        [i64]     [i64];
        [u8]      [u8];
        [u16]     [u16];
        [u32]     [u32];
        [u64]     [u64];
    ]
    /// Creates a reader which decodes a JSON number as the integral type of
    /// the same name, see [`IntegerReader`]
    pub fn reader_fn() -> IntegerReader<number_type> {
        IntegerReader {
            _number_type: PhantomData,
        }
    }
}

/// Reader for floating-point JSON numbers, produced by [`f32()`] and [`f64()`]
///
/// A number whose magnitude overflows the target type to a non-finite value
/// is a [`MalformedValue`](ReadError::MalformedValue) error.
#[derive(Clone, Copy, Debug)]
pub struct FloatReader<N> {
    _number_type: PhantomData<N>,
}

duplicate! {
    [
        reader_fn float_type;
        [f32]     [f32];
        [f64]     [f64];
    ]
    /// Creates a reader which decodes a JSON number as the floating-point
    /// type of the same name, see [`FloatReader`]
    pub fn reader_fn() -> FloatReader<float_type> {
        FloatReader {
            _number_type: PhantomData,
        }
    }

    impl JsonReader<float_type> for FloatReader<float_type> {
        fn try_read(
            &self,
            scanner: &mut JsonScanner<'_>,
            _session: &mut ReadSession,
        ) -> ReadResult<float_type> {
            match ready!(ensure_token(scanner)) {
                TokenKind::Number => {
                    let lexeme = scanner.number_str();
                    // JSON has no literal infinity or NaN, so any non-finite
                    // parse result means the literal overflowed the type
                    match lexeme.parse::<float_type>() {
                        Ok(value) if value.is_finite() => {
                            scanner.consume();
                            ReadResult::Value(value)
                        }
                        _ => ReadResult::Error(ReadError::MalformedValue {
                            message: format!(
                                "number '{lexeme}' cannot be represented as a finite {}",
                                stringify!(float_type)
                            ),
                            offset: scanner.position(),
                        }),
                    }
                }
                actual => ReadResult::Error(ReadError::UnexpectedToken {
                    expected: TokenKind::Number,
                    actual,
                    offset: scanner.position(),
                }),
            }
        }
    }
}

/// Reader for JSON booleans, produced by [`boolean()`]
#[derive(Clone, Copy, Debug)]
pub struct BooleanReader;

/// Creates a reader which decodes a JSON boolean as [`bool`]
pub fn boolean() -> BooleanReader {
    BooleanReader
}

impl JsonReader<bool> for BooleanReader {
    fn try_read(
        &self,
        scanner: &mut JsonScanner<'_>,
        _session: &mut ReadSession,
    ) -> ReadResult<bool> {
        match ready!(ensure_token(scanner)) {
            TokenKind::Boolean => {
                let value = scanner.bool_value();
                scanner.consume();
                ReadResult::Value(value)
            }
            actual => ReadResult::Error(ReadError::UnexpectedToken {
                expected: TokenKind::Boolean,
                actual,
                offset: scanner.position(),
            }),
        }
    }
}

/// Reader for JSON `null`, produced by [`null()`]
#[derive(Clone, Copy, Debug)]
pub struct NullReader;

/// Creates a reader which accepts exactly JSON `null`, decoded as `()`
///
/// For "this value or null" use [`or_null`](JsonReader::or_null) or
/// [`or_default`](JsonReader::or_default) instead.
pub fn null() -> NullReader {
    NullReader
}

impl JsonReader<()> for NullReader {
    fn try_read(
        &self,
        scanner: &mut JsonScanner<'_>,
        _session: &mut ReadSession,
    ) -> ReadResult<()> {
        match ready!(ensure_token(scanner)) {
            TokenKind::Null => {
                scanner.consume();
                ReadResult::Value(())
            }
            actual => ReadResult::Error(ReadError::UnexpectedToken {
                expected: TokenKind::Null,
                actual,
                offset: scanner.position(),
            }),
        }
    }
}

/// Reader which produces a fixed value, produced by [`constant()`]
#[derive(Clone, Debug)]
pub struct ConstantReader<T> {
    value: T,
}

/// Creates a reader which succeeds immediately with a clone of `value`,
/// consuming no tokens
///
/// A composition device for injecting an already-known value, for example a
/// discriminant that was decoded elsewhere, into an object composition. Since
/// it does not consume anything it cannot be used where a JSON value must be
/// present, such as an array item.
pub fn constant<T: Clone>(value: T) -> ConstantReader<T> {
    ConstantReader { value }
}

impl<T: Clone> JsonReader<T> for ConstantReader<T> {
    fn try_read(
        &self,
        _scanner: &mut JsonScanner<'_>,
        _session: &mut ReadSession,
    ) -> ReadResult<T> {
        ReadResult::Value(self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_reader() {
        assert_eq!("a\nb".to_owned(), string().read_str(r#""a\nb""#).unwrap());
        assert_eq!(
            Err(ReadError::UnexpectedToken {
                expected: TokenKind::String,
                actual: TokenKind::Number,
                offset: 0,
            }),
            string().read_str("1")
        );
    }

    #[test]
    fn integer_readers() {
        assert_eq!(127_i8, i8().read_str("127").unwrap());
        assert_eq!(-5_i64, i64().read_str("-5").unwrap());
        assert_eq!(u64::MAX, u64().read_str("18446744073709551615").unwrap());

        duplicate! {
            [json; [b"128"]; [b"1.5"]; [b"1e2"]; [b"-1"]]
            assert!(matches!(
                u8().read(json),
                Err(ReadError::MalformedValue { .. })
            ));
        }
    }

    #[test]
    fn float_readers() {
        assert_eq!(100.0, f64().read_str("100.0").unwrap());
        assert_eq!(-1.25e3, f64().read_str("-1.25e3").unwrap());
        assert_eq!(0.5_f32, f32().read_str("0.5").unwrap());

        // Overflows f64 to infinity
        assert!(matches!(
            f64().read_str("1e999"),
            Err(ReadError::MalformedValue { .. })
        ));
        // Overflows f32 but not f64
        assert!(f64().read_str("1e50").is_ok());
        assert!(matches!(
            f32().read_str("1e50"),
            Err(ReadError::MalformedValue { .. })
        ));
    }

    #[test]
    fn boolean_and_null_readers() {
        assert_eq!(true, boolean().read_str("true").unwrap());
        assert_eq!(false, boolean().read_str("false").unwrap());
        assert_eq!((), null().read_str("null").unwrap());
        assert_eq!(
            Err(ReadError::UnexpectedToken {
                expected: TokenKind::Boolean,
                actual: TokenKind::Null,
                offset: 0,
            }),
            boolean().read_str("null")
        );
    }

    /// A failed conversion does not consume the token, so repeating the read
    /// gives the same error
    #[test]
    fn malformed_value_is_stable() {
        let reader = i8();
        let mut session = ReadSession::new();
        let mut scanner = JsonScanner::new(b"300", true);
        let first = reader.try_read(&mut scanner, &mut session);
        let second = reader.try_read(&mut scanner, &mut session);
        assert!(matches!(first, ReadResult::Error(ReadError::MalformedValue { .. })));
        assert_eq!(first, second);
    }
}
