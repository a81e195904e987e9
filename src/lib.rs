#![warn(missing_docs)]
#![forbid(unsafe_code)]
// Allow needless `return` because that makes it sometimes more obvious that
// an expression is the result of the function
#![allow(clippy::needless_return)]
// Allow `assert_eq!(true, ...)` because in some cases it is used to check a bool
// value and not a 'flag' / 'state', and `assert_eq!` makes that more explicit
#![allow(clippy::bool_assert_comparison)]
// Enable 'unused' warnings for doc tests (are disabled by default)
#![doc(test(no_crate_inject))]
#![doc(test(attr(warn(unused))))]
// Fail on warnings in doc tests
#![doc(test(attr(deny(warnings))))]
// When `docsrs` configuration flag is set enable banner for features in documentation
// See https://stackoverflow.com/q/61417452
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Curson is an [RFC 8259](https://www.rfc-editor.org/rfc/rfc8259.html) compliant,
//! resumable JSON reader built from composable typed readers.
//!
//! Its main purpose is decoding typed values from JSON data which arrives in pieces,
//! for example from a socket or a chunked file read, without buffering the complete
//! document and without blocking: when the available bytes end in the middle of a
//! value, a read reports [`Incomplete`](reader::ReadResult::Incomplete) instead of
//! failing, and a later call with more bytes continues exactly where it left off.
//! It is however *not* an object mapper which converts structs to JSON and vice
//! versa; a dedicated library such as [Serde](https://github.com/serde-rs/json)
//! should be used when complete documents are available and streaming is not needed.
//!
//! Readers are immutable values describing how to decode one type. They are composed
//! from scalar readers and combinators, constructed once and reused for arbitrarily
//! many decode operations, including concurrently. All per-decode state lives in
//! caller-held values: a [`ReadSession`](reader::ReadSession) holding one resumable
//! state machine per open structural level, and a
//! [`ScannerState`](scanner::ScannerState) carrying the token cursor.
//!
//! # Terminology
//!
//! This crate uses the same terminology as the JSON specification:
//!
//! - *object*: `{ ... }`
//!   - *member*: Entry in an object. For example the JSON object `{"a": 1}` has the member
//!     `"a": 1` where `"a"` is the member *name* and `1` is the member *value*.
//! - *array*: `[ ... ]`
//! - *literal*:
//!   - *boolean*: `true` or `false`
//!   - `null`
//! - *number*: number value, for example `123.4e+10`
//! - *string*: string value, for example `"text in \"quotes\""`
//!
//! # Usage examples
//!
//! ## Reading a complete buffer
//!
//! ```
//! use curson::reader::*;
//!
//! let reader = array(i64());
//! let value = reader.read(b"[1, 2, 3]")?;
//! assert_eq!(vec![1, 2, 3], value);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Reading incrementally
//!
//! The streaming facade [`read_from`](reader::JsonReader::read_from) drives the
//! chunk cycle internally for any [`std::io::Read`] source. The underlying
//! protocol is also available directly; it is what every combinator is built on:
//!
//! ```
//! use curson::reader::*;
//! use curson::scanner::{JsonScanner, ScannerState};
//!
//! let reader = array(i64());
//!
//! let mut session = ReadSession::new();
//! let mut state = ScannerState::new();
//! let mut buf: Vec<u8> = Vec::new();
//! let mut decoded = None;
//!
//! let chunks: &[&[u8]] = &[b"[1, 2", b", 3]"];
//! for (index, chunk) in chunks.iter().enumerate() {
//!     buf.extend_from_slice(chunk);
//!     let is_final = index == chunks.len() - 1;
//!     let mut scanner = JsonScanner::resume(&buf, is_final, state);
//!     match reader.try_read(&mut scanner, &mut session) {
//!         ReadResult::Value(value) => {
//!             decoded = Some(value);
//!             break;
//!         }
//!         // Keep the unconsumed suffix and the carried-over scanner state
//!         ReadResult::Incomplete => {
//!             let consumed = scanner.bytes_consumed();
//!             state = scanner.into_state();
//!             buf.drain(..consumed);
//!         }
//!         ReadResult::Error(e) => return Err(e.into()),
//!     }
//! }
//! assert_eq!(Some(vec![1, 2, 3]), decoded);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Decoding structured types
//!
//! ```
//! use curson::reader::*;
//!
//! #[derive(PartialEq, Debug)]
//! struct Point {
//!     x: f64,
//!     y: f64,
//! }
//!
//! let reader = object(
//!     (prop("x", f64()), prop("y", f64())),
//!     |x, y| Point { x, y },
//! );
//! let point = reader.read_str(r#"{"x": 100.0, "y": 0.5}"#)?;
//! assert_eq!(Point { x: 100.0, y: 0.5 }, point);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod reader;
pub mod scanner;

mod json_number;
