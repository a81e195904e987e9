//! Readers for JSON objects and discriminated unions
//!
//! An object reader is composed from [`Property`] values (one per recognized
//! member, each with its own nested reader) and a build function which
//! receives the decoded member values in declaration order:
//!
//! ```
//! use curson::reader::*;
//!
//! #[derive(PartialEq, Debug)]
//! struct User {
//!     name: String,
//!     admin: bool,
//! }
//!
//! let reader = object(
//!     (prop("name", string()), prop("admin", boolean()).with_default(false)),
//!     |name, admin| User { name, admin },
//! );
//! assert_eq!(
//!     User { name: "u".to_owned(), admin: false },
//!     reader.read_str(r#"{"name": "u"}"#)?,
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Members may appear in any order in the document. A property without a
//! default is required; reaching the end of the object without it is a
//! [`SchemaViolation`](ReadError::SchemaViolation). Unrecognized members are
//! skipped by default, see [`UnknownMemberPolicy`].
//!
//! For unions discriminated by a tag member (such as GeoJSON's `"type"`) use
//! [`tagged`]. The tag must be the first member: the token source is
//! forward-only, so the choice between variant readers is driven by the
//! already-decoded discriminant instead of speculative backtracking.

use std::any::Any;

use crate::reader::{
    ready, JsonReader, ObjectReadStateMachine, ObjectStep, ReadError, ReadResult, ReadSession,
    ValueSkip,
};
use crate::scanner::{JsonScanner, TokenKind};

/// How member names in the document are matched against configured names
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub enum MemberNameMatch {
    /// Names must match exactly
    #[default]
    CaseSensitive,
    /// Names match regardless of ASCII letter case, for example `Type` and
    /// `TYPE` both match the configured name `type`
    AsciiCaseInsensitive,
}

impl MemberNameMatch {
    fn matches(self, configured: &str, actual: &str) -> bool {
        match self {
            MemberNameMatch::CaseSensitive => configured == actual,
            MemberNameMatch::AsciiCaseInsensitive => configured.eq_ignore_ascii_case(actual),
        }
    }
}

/// What an object reader does with members it does not recognize
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub enum UnknownMemberPolicy {
    /// Skip the member's value, resumable like any other read
    #[default]
    Skip,
    /// Reject the document with a [`SchemaViolation`](ReadError::SchemaViolation)
    Reject,
}

/// One recognized object member: its name, the reader for its value and
/// optionally a default, created by [`prop()`]
pub struct Property<T> {
    name: &'static str,
    reader: Box<dyn JsonReader<T> + Send + Sync>,
    default: Option<Box<dyn Fn() -> T + Send + Sync>>,
}

/// Creates a [`Property`] decoding the member `name` with `reader`
///
/// The member is required unless a default is attached with
/// [`with_default`](Property::with_default).
pub fn prop<T>(
    name: &'static str,
    reader: impl JsonReader<T> + Send + Sync + 'static,
) -> Property<T> {
    Property {
        name,
        reader: Box::new(reader),
        default: None,
    }
}

impl<T> Property<T> {
    /// Makes the member optional; when it is absent the object decodes as if
    /// the member had this value
    ///
    /// Note that this covers an *absent* member only; an explicit JSON `null`
    /// is still handed to the member's reader (combine with
    /// [`or_default`](JsonReader::or_default) to treat both alike).
    pub fn with_default(mut self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.default = Some(Box::new(move || value.clone()));
        self
    }
}

impl<T> std::fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("required", &self.default.is_none())
            .finish_non_exhaustive()
    }
}

type Slot = Option<Box<dyn Any + Send>>;

/// Uniform, index-based access to a heterogeneous tuple of [`Property`]s
///
/// Decoded member values travel through type-erased slots; the arity-specific
/// [`ObjectShape`] implementation puts them back into their concrete types.
pub(crate) trait PropertySet {
    fn len(&self) -> usize;
    fn name(&self, index: usize) -> &'static str;
    fn read_value(
        &self,
        index: usize,
        scanner: &mut JsonScanner<'_>,
        session: &mut ReadSession,
    ) -> ReadResult<Box<dyn Any + Send>>;
    fn default_value(&self, index: usize) -> Option<Box<dyn Any + Send>>;
}

/// Session frame of one object level
///
/// An implementation detail of object readers, public only because it appears
/// in the [`ObjectShape`] seam.
#[doc(hidden)]
#[derive(Default)]
pub struct ObjectFrame {
    machine: ObjectReadStateMachine,
    slots: Vec<Slot>,
    progress: MemberProgress,
}

#[derive(Debug, Default)]
enum MemberProgress {
    /// No member value is outstanding
    #[default]
    Idle,
    /// The pending member value belongs to the property with this index
    Property(usize),
    /// The pending member is unrecognized and being skipped
    Skip(ValueSkip),
}

impl ObjectFrame {
    fn ensure_slots(&mut self, count: usize) {
        if self.slots.len() != count {
            self.slots.resize_with(count, || None);
        }
    }
}

impl std::fmt::Debug for ObjectFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectFrame")
            .field("machine", &self.machine)
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

/// Decodes the member list of an object whose opening `{` was consumed by
/// shared machinery, and builds the final value
///
/// The seam between the generic member-driving logic and the arity-specific
/// property tuples: implemented by the [`Shape`] behind [`object()`] for
/// tuples of up to 8 properties, and consumed both by [`ObjectReader`] (whole
/// object) and [`TaggedReader`] (members following the discriminant).
pub trait ObjectShape<T>: Send + Sync {
    #[doc(hidden)]
    fn slot_count(&self) -> usize;

    #[doc(hidden)]
    fn drive(
        &self,
        frame: &mut ObjectFrame,
        scanner: &mut JsonScanner<'_>,
        session: &mut ReadSession,
        name_match: MemberNameMatch,
        unknown_members: UnknownMemberPolicy,
    ) -> ReadResult<T>;
}

/// A property tuple plus the function building the result value; the
/// [`ObjectShape`] implementor behind [`object()`]
pub struct Shape<P, F> {
    properties: P,
    build: F,
}

/// Drives the object machine until all members were decoded or skipped,
/// filling `frame.slots` (including defaults for absent optional members)
///
/// Does not touch the frame's place in the session; the caller owns the
/// descend / suspend / complete discipline.
fn drive_members<P: PropertySet>(
    properties: &P,
    frame: &mut ObjectFrame,
    scanner: &mut JsonScanner<'_>,
    session: &mut ReadSession,
    name_match: MemberNameMatch,
    unknown_members: UnknownMemberPolicy,
) -> ReadResult<()> {
    loop {
        match frame.machine.read(scanner) {
            ReadResult::Value(ObjectStep::Name) => {
                let matched = {
                    let name = scanner.str_value();
                    (0..properties.len()).find(|&i| name_match.matches(properties.name(i), name))
                };
                match matched {
                    // A duplicate member simply overwrites the slot later: the
                    // last occurrence wins
                    Some(index) => frame.progress = MemberProgress::Property(index),
                    None => match unknown_members {
                        UnknownMemberPolicy::Skip => {
                            frame.progress = MemberProgress::Skip(ValueSkip::new());
                        }
                        UnknownMemberPolicy::Reject => {
                            let error = ReadError::SchemaViolation {
                                message: format!("unknown member \"{}\"", scanner.str_value()),
                                offset: scanner.position(),
                            };
                            frame.machine.on_error(error.clone());
                            return ReadResult::Error(error);
                        }
                    },
                }
                scanner.consume();
                frame.machine.on_name_read();
            }
            ReadResult::Value(ObjectStep::Value) => {
                let result = match &mut frame.progress {
                    MemberProgress::Property(index) => {
                        let index = *index;
                        properties
                            .read_value(index, scanner, session)
                            .map(|value| frame.slots[index] = Some(value))
                    }
                    MemberProgress::Skip(skip) => skip.read(scanner),
                    MemberProgress::Idle => {
                        unreachable!("member value pending without a preceding member name")
                    }
                };
                match result {
                    ReadResult::Value(()) => {
                        frame.progress = MemberProgress::Idle;
                        frame.machine.on_value_read();
                    }
                    ReadResult::Incomplete => return ReadResult::Incomplete,
                    ReadResult::Error(error) => {
                        frame.machine.on_error(error.clone());
                        return ReadResult::Error(error);
                    }
                }
            }
            ReadResult::Value(ObjectStep::Done) => {
                for index in 0..properties.len() {
                    if frame.slots[index].is_none() {
                        match properties.default_value(index) {
                            Some(value) => frame.slots[index] = Some(value),
                            None => {
                                let error = ReadError::SchemaViolation {
                                    message: format!(
                                        "missing required member \"{}\"",
                                        properties.name(index)
                                    ),
                                    offset: scanner.position(),
                                };
                                frame.machine.on_error(error.clone());
                                return ReadResult::Error(error);
                            }
                        }
                    }
                }
                return ReadResult::Value(());
            }
            ReadResult::Incomplete => return ReadResult::Incomplete,
            // The machine is already poisoned for its own failures
            ReadResult::Error(error) => return ReadResult::Error(error),
        }
    }
}

/// Moves the decoded member value out of its slot, back in its concrete type
fn take_slot<T: 'static>(slots: &mut [Slot], index: usize) -> T {
    match slots[index].take().map(|boxed| boxed.downcast::<T>()) {
        Some(Ok(value)) => *value,
        _ => unreachable!("member slot {index} does not hold a decoded value"),
    }
}

macro_rules! impl_object_shape {
    ($(($index:tt, $value:ident, $t:ident)),+) => {
        impl<$($t),+> PropertySet for ($(Property<$t>,)+)
        where
            $($t: Send + 'static,)+
        {
            fn len(&self) -> usize {
                [$($index),+].len()
            }

            fn name(&self, index: usize) -> &'static str {
                match index {
                    $($index => self.$index.name,)+
                    _ => unreachable!("property index out of range"),
                }
            }

            fn read_value(
                &self,
                index: usize,
                scanner: &mut JsonScanner<'_>,
                session: &mut ReadSession,
            ) -> ReadResult<Box<dyn Any + Send>> {
                match index {
                    $($index => self
                        .$index
                        .reader
                        .try_read(scanner, session)
                        .map(|value| Box::new(value) as Box<dyn Any + Send>),)+
                    _ => unreachable!("property index out of range"),
                }
            }

            fn default_value(&self, index: usize) -> Option<Box<dyn Any + Send>> {
                match index {
                    $($index => self
                        .$index
                        .default
                        .as_ref()
                        .map(|default| Box::new(default()) as Box<dyn Any + Send>),)+
                    _ => unreachable!("property index out of range"),
                }
            }
        }

        impl<V, F, $($t),+> ObjectShape<V> for Shape<($(Property<$t>,)+), F>
        where
            F: Fn($($t),+) -> V + Send + Sync,
            $($t: Send + 'static,)+
        {
            fn slot_count(&self) -> usize {
                self.properties.len()
            }

            fn drive(
                &self,
                frame: &mut ObjectFrame,
                scanner: &mut JsonScanner<'_>,
                session: &mut ReadSession,
                name_match: MemberNameMatch,
                unknown_members: UnknownMemberPolicy,
            ) -> ReadResult<V> {
                ready!(drive_members(
                    &self.properties,
                    frame,
                    scanner,
                    session,
                    name_match,
                    unknown_members,
                ));
                $(let $value = take_slot::<$t>(&mut frame.slots, $index);)+
                ReadResult::Value((self.build)($($value),+))
            }
        }
    };
}

impl_object_shape!((0, v0, T0));
impl_object_shape!((0, v0, T0), (1, v1, T1));
impl_object_shape!((0, v0, T0), (1, v1, T1), (2, v2, T2));
impl_object_shape!((0, v0, T0), (1, v1, T1), (2, v2, T2), (3, v3, T3));
impl_object_shape!((0, v0, T0), (1, v1, T1), (2, v2, T2), (3, v3, T3), (4, v4, T4));
impl_object_shape!(
    (0, v0, T0),
    (1, v1, T1),
    (2, v2, T2),
    (3, v3, T3),
    (4, v4, T4),
    (5, v5, T5)
);
impl_object_shape!(
    (0, v0, T0),
    (1, v1, T1),
    (2, v2, T2),
    (3, v3, T3),
    (4, v4, T4),
    (5, v5, T5),
    (6, v6, T6)
);
impl_object_shape!(
    (0, v0, T0),
    (1, v1, T1),
    (2, v2, T2),
    (3, v3, T3),
    (4, v4, T4),
    (5, v5, T5),
    (6, v6, T6),
    (7, v7, T7)
);

/// Reader for a JSON object, produced by [`object()`]
pub struct ObjectReader<S> {
    shape: S,
    name_match: MemberNameMatch,
    unknown_members: UnknownMemberPolicy,
}

/// Creates a reader which decodes a JSON object via a tuple of recognized
/// [`prop`]s and a function combining their values
///
/// `properties` is a tuple of 1 to 8 [`Property`] values (note the trailing
/// comma for a single property: `(prop(...),)`); `build` takes the decoded
/// member values in the same order. See the [module documentation](self) for
/// an example and the member-handling rules.
pub fn object<P, F>(properties: P, build: F) -> ObjectReader<Shape<P, F>> {
    ObjectReader {
        shape: Shape { properties, build },
        name_match: MemberNameMatch::default(),
        unknown_members: UnknownMemberPolicy::default(),
    }
}

impl<S> ObjectReader<S> {
    /// Sets how member names are matched, default
    /// [`MemberNameMatch::CaseSensitive`]
    pub fn name_match(mut self, name_match: MemberNameMatch) -> Self {
        self.name_match = name_match;
        self
    }

    /// Sets the handling of unrecognized members, default
    /// [`UnknownMemberPolicy::Skip`]
    pub fn unknown_members(mut self, policy: UnknownMemberPolicy) -> Self {
        self.unknown_members = policy;
        self
    }
}

impl<T, S: ObjectShape<T>> JsonReader<T> for ObjectReader<S> {
    fn try_read(&self, scanner: &mut JsonScanner<'_>, session: &mut ReadSession) -> ReadResult<T> {
        let mut frame: ObjectFrame = session.descend(ObjectFrame::default);
        frame.ensure_slots(self.shape.slot_count());
        match self.shape.drive(
            &mut frame,
            scanner,
            session,
            self.name_match,
            self.unknown_members,
        ) {
            ReadResult::Value(value) => {
                session.complete();
                ReadResult::Value(value)
            }
            ReadResult::Incomplete => {
                session.suspend(frame);
                ReadResult::Incomplete
            }
            ReadResult::Error(error) => {
                session.suspend(frame);
                ReadResult::Error(error)
            }
        }
    }
}

/// Reader for a discriminated union of object variants, produced by [`tagged()`]
pub struct TaggedReader<T> {
    tag_name: &'static str,
    variants: Vec<(&'static str, Box<dyn ObjectShape<T>>)>,
    name_match: MemberNameMatch,
    unknown_members: UnknownMemberPolicy,
}

/// Creates a reader for objects whose shape depends on the value of the
/// discriminant member `tag_name`
///
/// The discriminant must be the object's first member and its value must be a
/// string naming one of the registered [`variant`](TaggedReader::variant)s;
/// the token source is forward-only, so a later discriminant cannot be found
/// without buffering the members before it. Discriminant values are compared
/// exactly; [`name_match`](TaggedReader::name_match) only affects member
/// names.
///
/// # Examples
/// ```
/// use curson::reader::*;
///
/// #[derive(PartialEq, Debug)]
/// enum Shape {
///     Circle(f64),
///     Square(f64),
/// }
///
/// let reader = tagged("type")
///     .variant("circle", object((prop("radius", f64()),), Shape::Circle))
///     .variant("square", object((prop("side", f64()),), Shape::Square));
/// assert_eq!(
///     Shape::Circle(2.0),
///     reader.read_str(r#"{"type": "circle", "radius": 2.0}"#)?,
/// );
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn tagged<T>(tag_name: &'static str) -> TaggedReader<T> {
    TaggedReader {
        tag_name,
        variants: Vec::new(),
        name_match: MemberNameMatch::default(),
        unknown_members: UnknownMemberPolicy::default(),
    }
}

impl<T> TaggedReader<T> {
    /// Registers the reader used when the discriminant has the value
    /// `discriminant`
    ///
    /// The variant reader contributes only its properties and build function;
    /// name matching and unknown-member handling are governed uniformly by
    /// this reader's own settings.
    pub fn variant<S>(mut self, discriminant: &'static str, variant_reader: ObjectReader<S>) -> Self
    where
        S: ObjectShape<T> + 'static,
    {
        self.variants.push((discriminant, Box::new(variant_reader.shape)));
        self
    }

    /// Sets how member names (not discriminant values) are matched, default
    /// [`MemberNameMatch::CaseSensitive`]
    pub fn name_match(mut self, name_match: MemberNameMatch) -> Self {
        self.name_match = name_match;
        self
    }

    /// Sets the handling of unrecognized members, default
    /// [`UnknownMemberPolicy::Skip`]
    pub fn unknown_members(mut self, policy: UnknownMemberPolicy) -> Self {
        self.unknown_members = policy;
        self
    }

    /// Reads members until the discriminant value selected a variant,
    /// returning its index
    fn read_discriminant(
        &self,
        frame: &mut ObjectFrame,
        scanner: &mut JsonScanner<'_>,
    ) -> ReadResult<usize> {
        loop {
            match frame.machine.read(scanner) {
                ReadResult::Value(ObjectStep::Name) => {
                    if !self.name_match.matches(self.tag_name, scanner.str_value()) {
                        let error = ReadError::SchemaViolation {
                            message: format!(
                                "expected discriminant member \"{}\" first but got \"{}\"",
                                self.tag_name,
                                scanner.str_value()
                            ),
                            offset: scanner.position(),
                        };
                        frame.machine.on_error(error.clone());
                        return ReadResult::Error(error);
                    }
                    scanner.consume();
                    frame.machine.on_name_read();
                }
                ReadResult::Value(ObjectStep::Value) => {
                    if scanner.kind() != TokenKind::String {
                        let error = ReadError::UnexpectedToken {
                            expected: TokenKind::String,
                            actual: scanner.kind(),
                            offset: scanner.position(),
                        };
                        frame.machine.on_error(error.clone());
                        return ReadResult::Error(error);
                    }
                    let index = {
                        let value = scanner.str_value();
                        self.variants.iter().position(|(d, _)| *d == value)
                    };
                    return match index {
                        Some(index) => {
                            scanner.consume();
                            frame.machine.on_value_read();
                            ReadResult::Value(index)
                        }
                        None => {
                            let error = ReadError::MalformedValue {
                                message: format!(
                                    "unknown discriminant \"{}\" for member \"{}\"",
                                    scanner.str_value(),
                                    self.tag_name
                                ),
                                offset: scanner.position(),
                            };
                            frame.machine.on_error(error.clone());
                            ReadResult::Error(error)
                        }
                    };
                }
                ReadResult::Value(ObjectStep::Done) => {
                    let error = ReadError::SchemaViolation {
                        message: format!("missing discriminant member \"{}\"", self.tag_name),
                        offset: scanner.position(),
                    };
                    frame.machine.on_error(error.clone());
                    return ReadResult::Error(error);
                }
                ReadResult::Incomplete => return ReadResult::Incomplete,
                ReadResult::Error(error) => return ReadResult::Error(error),
            }
        }
    }
}

/// Session frame of one tagged-union level: the object frame plus the variant
/// selected by the discriminant, once known
struct TaggedFrame {
    frame: ObjectFrame,
    variant: Option<usize>,
}

impl<T> JsonReader<T> for TaggedReader<T> {
    fn try_read(&self, scanner: &mut JsonScanner<'_>, session: &mut ReadSession) -> ReadResult<T> {
        let mut tagged: TaggedFrame = session.descend(|| TaggedFrame {
            frame: ObjectFrame::default(),
            variant: None,
        });
        let variant = match tagged.variant {
            Some(index) => index,
            None => match self.read_discriminant(&mut tagged.frame, scanner) {
                ReadResult::Value(index) => {
                    tagged.variant = Some(index);
                    index
                }
                ReadResult::Incomplete => {
                    session.suspend(tagged);
                    return ReadResult::Incomplete;
                }
                ReadResult::Error(error) => {
                    session.suspend(tagged);
                    return ReadResult::Error(error);
                }
            },
        };
        let shape = &self.variants[variant].1;
        tagged.frame.ensure_slots(shape.slot_count());
        match shape.drive(
            &mut tagged.frame,
            scanner,
            session,
            self.name_match,
            self.unknown_members,
        ) {
            ReadResult::Value(value) => {
                session.complete();
                ReadResult::Value(value)
            }
            ReadResult::Incomplete => {
                session.suspend(tagged);
                ReadResult::Incomplete
            }
            ReadResult::Error(error) => {
                session.suspend(tagged);
                ReadResult::Error(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{array, boolean, i64, string};
    use crate::scanner::ScannerState;

    /// Feeds the document one byte at a time, pausing on every `Incomplete`
    fn read_chunked<T>(reader: &impl JsonReader<T>, json: &[u8]) -> ReadResult<T> {
        let mut session = ReadSession::new();
        let mut state = ScannerState::new();
        let mut buf: Vec<u8> = Vec::new();
        for (index, &byte) in json.iter().enumerate() {
            buf.push(byte);
            let is_final = index == json.len() - 1;
            let mut scanner = JsonScanner::resume(&buf, is_final, state);
            match reader.try_read(&mut scanner, &mut session) {
                ReadResult::Incomplete => {
                    let consumed = scanner.bytes_consumed();
                    state = scanner.into_state();
                    buf.drain(..consumed);
                }
                result => return result,
            }
        }
        unreachable!("document never completed")
    }

    #[test]
    fn reads_object() {
        let reader = object(
            (
                prop("name", string()),
                prop("age", i64()),
                prop("admin", boolean()).with_default(false),
            ),
            |name, age, admin| (name, age, admin),
        );
        // Members in declaration order, default applied
        assert_eq!(
            ("u".to_owned(), 7, false),
            reader.read_str(r#"{"name": "u", "age": 7}"#).unwrap()
        );
        // Members reordered, default overridden
        assert_eq!(
            ("v".to_owned(), 8, true),
            reader
                .read_str(r#"{"admin": true, "age": 8, "name": "v"}"#)
                .unwrap()
        );
    }

    #[test]
    fn missing_required_member() {
        let reader = object((prop("a", i64()), prop("b", i64())), |a, b| (a, b));
        assert_eq!(
            Err(ReadError::SchemaViolation {
                message: "missing required member \"b\"".to_owned(),
                offset: 8,
            }),
            reader.read_str(r#"{"a": 1}"#)
        );
    }

    #[test]
    fn not_an_object() {
        let reader = object((prop("a", i64()),), |a| a);
        assert_eq!(
            Err(ReadError::UnexpectedToken {
                expected: TokenKind::BeginObject,
                actual: TokenKind::BeginArray,
                offset: 0,
            }),
            reader.read_str("[1]")
        );
    }

    #[test]
    fn unknown_members_are_skipped_by_default() {
        let reader = object((prop("a", i64()),), |a| a);
        assert_eq!(
            1,
            reader
                .read_str(r#"{"junk": [{"deep": null}, "x"], "a": 1, "more": 2}"#)
                .unwrap()
        );
    }

    #[test]
    fn unknown_members_can_be_rejected() {
        let reader =
            object((prop("a", i64()),), |a| a).unknown_members(UnknownMemberPolicy::Reject);
        assert_eq!(
            Err(ReadError::SchemaViolation {
                message: "unknown member \"junk\"".to_owned(),
                offset: 9,
            }),
            reader.read_str(r#"{"a": 1, "junk": 2}"#)
        );
    }

    #[test]
    fn case_insensitive_name_match() {
        let reader = object((prop("name", string()),), |name| name)
            .name_match(MemberNameMatch::AsciiCaseInsensitive);
        assert_eq!("x".to_owned(), reader.read_str(r#"{"NAME": "x"}"#).unwrap());
        assert_eq!("y".to_owned(), reader.read_str(r#"{"Name": "y"}"#).unwrap());
    }

    #[test]
    fn duplicate_member_last_wins() {
        let reader = object((prop("a", i64()),), |a| a);
        assert_eq!(2, reader.read_str(r#"{"a": 1, "a": 2}"#).unwrap());
    }

    #[test]
    fn member_value_error_carries_position() {
        let reader = object((prop("a", i64()),), |a| a);
        assert_eq!(
            Err(ReadError::UnexpectedToken {
                expected: TokenKind::Number,
                actual: TokenKind::Boolean,
                offset: 6,
            }),
            reader.read_str(r#"{"a": true}"#)
        );
    }

    #[test]
    fn byte_at_a_time_chunking() {
        let reader = object(
            (prop("name", string()), prop("tags", array(i64()))),
            |name, tags| (name, tags),
        );
        assert_eq!(
            ReadResult::Value(("x".to_owned(), vec![1, 2])),
            read_chunked(&reader, br#"{"tags": [1, 2], "name": "x"}"#)
        );
    }

    #[derive(PartialEq, Debug)]
    enum Event {
        Click { x: i64, y: i64 },
        Key(String),
    }

    fn event_reader() -> TaggedReader<Event> {
        tagged("type")
            .variant(
                "click",
                object((prop("x", i64()), prop("y", i64())), |x, y| Event::Click {
                    x,
                    y,
                }),
            )
            .variant("key", object((prop("code", string()),), Event::Key))
    }

    #[test]
    fn reads_tagged_variants() {
        let reader = event_reader();
        assert_eq!(
            Event::Click { x: 1, y: 2 },
            reader
                .read_str(r#"{"type": "click", "x": 1, "y": 2}"#)
                .unwrap()
        );
        assert_eq!(
            Event::Key("Esc".to_owned()),
            reader.read_str(r#"{"type": "key", "code": "Esc"}"#).unwrap()
        );
    }

    #[test]
    fn discriminant_must_come_first() {
        assert_eq!(
            Err(ReadError::SchemaViolation {
                message: "expected discriminant member \"type\" first but got \"x\"".to_owned(),
                offset: 1,
            }),
            event_reader().read_str(r#"{"x": 1, "type": "click", "y": 2}"#)
        );
    }

    #[test]
    fn unknown_discriminant() {
        assert!(matches!(
            event_reader().read_str(r#"{"type": "hover", "x": 1}"#),
            Err(ReadError::MalformedValue { .. })
        ));
    }

    #[test]
    fn missing_discriminant() {
        assert_eq!(
            Err(ReadError::SchemaViolation {
                message: "missing discriminant member \"type\"".to_owned(),
                offset: 2,
            }),
            event_reader().read_str("{}")
        );
    }

    #[test]
    fn discriminant_must_be_string() {
        assert_eq!(
            Err(ReadError::UnexpectedToken {
                expected: TokenKind::String,
                actual: TokenKind::Number,
                offset: 9,
            }),
            event_reader().read_str(r#"{"type": 5}"#)
        );
    }

    /// The discriminant comparison is exact even when member names are
    /// matched case-insensitively
    #[test]
    fn discriminant_value_is_case_sensitive() {
        let reader = event_reader().name_match(MemberNameMatch::AsciiCaseInsensitive);
        assert_eq!(
            Event::Key("a".to_owned()),
            reader.read_str(r#"{"TYPE": "key", "CODE": "a"}"#).unwrap()
        );
        assert!(matches!(
            reader.read_str(r#"{"type": "KEY", "code": "a"}"#),
            Err(ReadError::MalformedValue { .. })
        ));
    }

    #[test]
    fn tagged_chunked_resume() {
        assert_eq!(
            ReadResult::Value(Event::Click { x: 10, y: 20 }),
            read_chunked(&event_reader(), br#"{"type": "click", "y": 20, "x": 10}"#)
        );
    }

    /// A poisoned session keeps failing, even over fresh valid input
    #[test]
    fn tagged_error_is_permanent() {
        let reader = event_reader();
        let mut session = ReadSession::new();
        let mut scanner = JsonScanner::new(br#"{"type": "hover"}"#, true);
        let first = reader.try_read(&mut scanner, &mut session);
        assert!(matches!(
            first,
            ReadResult::Error(ReadError::MalformedValue { .. })
        ));

        let mut scanner =
            JsonScanner::resume(br#"{"type": "key", "code": "a"}"#, true, ScannerState::new());
        assert_eq!(first, reader.try_read(&mut scanner, &mut session));
    }
}
