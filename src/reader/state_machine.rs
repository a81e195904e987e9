//! Resumable state machines for structural JSON values
//!
//! These machines carry the progress of one open array or object level. They
//! are driven by the structural readers but deliberately split the work in
//! two: [`read`](ArrayReadStateMachine::read) only says what comes next (an
//! item, the end, or "need more data"), and the acknowledgment transition
//! ([`on_item_read`](ArrayReadStateMachine::on_item_read) respectively
//! [`on_value_read`](ObjectReadStateMachine::on_value_read)) is called
//! separately once the nested value decoded completely. That way an item whose
//! own decode pauses mid-way is simply retried from its saved state, and the
//! machine's count advances only for confirmed items: no item is ever counted
//! twice or skipped, regardless of how often the decode pauses.
//!
//! Calling an acknowledgment transition in the wrong state is caller misuse
//! and panics; it never enters the error channel. Data errors on the other
//! hand poison the machine: it stores the error and repeats it on every
//! further [`read`], so a failed decode cannot be silently resumed.

use crate::reader::{ready, ReadError, ReadResult};
use crate::scanner::{JsonScanner, TokenKind};

/// Phase of an [`ArrayReadStateMachine`]
#[derive(PartialEq, Eq, Clone, Copy, strum::Display, Debug)]
pub enum ArrayReadState {
    /// The start of the array has not been consumed yet
    Initial,
    /// Positioned between items; the next token is an item or the array end
    ItemOrEnd,
    /// An item decode is outstanding; [`ArrayReadStateMachine::on_item_read`]
    /// has not been called yet
    PendingItemRead,
    /// The array end was consumed; the item count is final
    Done,
    /// A previous read failed; the machine repeats the stored error
    Error,
}

/// What an [`ArrayReadStateMachine::read`] found next
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ArrayStep {
    /// The scanner is positioned on the first token of the next item; decode
    /// it with the item reader, then acknowledge with
    /// [`ArrayReadStateMachine::on_item_read`]
    Item,
    /// The array is complete
    Done,
}

/// Resumable state machine for reading one JSON array
///
/// See the [module documentation](self) for the driving protocol.
#[derive(Debug)]
pub struct ArrayReadStateMachine {
    state: ArrayReadState,
    item_count: u32,
    stored_error: Option<ReadError>,
}

impl ArrayReadStateMachine {
    /// Creates a machine positioned before the start of the array
    pub fn new() -> Self {
        ArrayReadStateMachine {
            state: ArrayReadState::Initial,
            item_count: 0,
            stored_error: None,
        }
    }

    /// Current phase of the machine
    pub fn state(&self) -> ArrayReadState {
        self.state
    }

    /// Number of items acknowledged so far
    pub fn item_count(&self) -> u32 {
        self.item_count
    }

    /// Determines what comes next in the array
    ///
    /// While an item decode is outstanding this keeps reporting
    /// [`ArrayStep::Item`] without consuming anything; that is the re-entry
    /// point after the item's own decode paused.
    ///
    /// # Panics
    /// Panics when called after the machine reached [`ArrayReadState::Done`].
    pub fn read(&mut self, scanner: &mut JsonScanner<'_>) -> ReadResult<ArrayStep> {
        match self.state {
            ArrayReadState::Initial => {
                let kind = match crate::reader::ensure_token(scanner) {
                    ReadResult::Value(kind) => kind,
                    ReadResult::Incomplete => return ReadResult::Incomplete,
                    ReadResult::Error(e) => return self.fail(e),
                };
                if kind != TokenKind::BeginArray {
                    return self.fail(ReadError::UnexpectedToken {
                        expected: TokenKind::BeginArray,
                        actual: kind,
                        offset: scanner.position(),
                    });
                }
                scanner.consume();
                self.state = ArrayReadState::ItemOrEnd;
                self.item_or_end(scanner)
            }
            ArrayReadState::ItemOrEnd => self.item_or_end(scanner),
            ArrayReadState::PendingItemRead => ReadResult::Value(ArrayStep::Item),
            ArrayReadState::Done => {
                panic!("Incorrect state machine usage: array was already read to completion")
            }
            ArrayReadState::Error => ReadResult::Error(self.stored_error()),
        }
    }

    /// Acknowledges that exactly one item was decoded completely
    ///
    /// # Panics
    /// Panics if no item read is pending; this is a programming error of the
    /// driving code, not a data error.
    pub fn on_item_read(&mut self) {
        if self.state != ArrayReadState::PendingItemRead {
            panic!(
                "Incorrect state machine usage: no array item read is pending (state: {})",
                self.state
            );
        }
        self.state = ArrayReadState::ItemOrEnd;
        self.item_count += 1;
    }

    /// Poisons the machine after a nested decode failed, so that any further
    /// [`read`](Self::read) repeats the error instead of resuming
    pub fn on_error(&mut self, error: ReadError) {
        self.state = ArrayReadState::Error;
        self.stored_error = Some(error);
    }

    fn item_or_end(&mut self, scanner: &mut JsonScanner<'_>) -> ReadResult<ArrayStep> {
        match scanner.advance() {
            Ok(true) => {}
            Ok(false) => return ReadResult::Incomplete,
            Err(e) => return self.fail(e.into()),
        }
        if scanner.kind() == TokenKind::EndArray {
            scanner.consume();
            self.state = ArrayReadState::Done;
            return ReadResult::Value(ArrayStep::Done);
        }
        // The token is the first token of the next item; it stays current for
        // the item reader
        self.state = ArrayReadState::PendingItemRead;
        ReadResult::Value(ArrayStep::Item)
    }

    fn fail(&mut self, error: ReadError) -> ReadResult<ArrayStep> {
        self.on_error(error.clone());
        ReadResult::Error(error)
    }

    fn stored_error(&self) -> ReadError {
        match &self.stored_error {
            Some(e) => e.clone(),
            None => unreachable!("machine in Error state has no stored error"),
        }
    }
}

impl Default for ArrayReadStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Phase of an [`ObjectReadStateMachine`]
#[derive(PartialEq, Eq, Clone, Copy, strum::Display, Debug)]
pub enum ObjectReadState {
    /// The start of the object has not been consumed yet
    Initial,
    /// Positioned between members; the next token is a member name or the
    /// object end
    NameOrEnd,
    /// A member name is current and has not been acknowledged yet
    PendingNameRead,
    /// The member name was consumed; the member value comes next
    Value,
    /// A member value decode is outstanding;
    /// [`ObjectReadStateMachine::on_value_read`] has not been called yet
    PendingValueRead,
    /// The object end was consumed; the member count is final
    Done,
    /// A previous read failed; the machine repeats the stored error
    Error,
}

/// What an [`ObjectReadStateMachine::read`] found next
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ObjectStep {
    /// The scanner's current token is the name of the next member; inspect it
    /// with [`JsonScanner::str_value`], consume it and acknowledge with
    /// [`ObjectReadStateMachine::on_name_read`]
    Name,
    /// The scanner is positioned on the first token of the member value;
    /// decode or skip it, then acknowledge with
    /// [`ObjectReadStateMachine::on_value_read`]
    Value,
    /// The object is complete
    Done,
}

/// Resumable state machine for reading one JSON object
///
/// Same shape as [`ArrayReadStateMachine`] with an extra name sub-phase: each
/// member is delivered as a [`Name`](ObjectStep::Name) step followed by a
/// [`Value`](ObjectStep::Value) step, each with its own acknowledgment, so a
/// pause between name and value resumes exactly where it stopped. Which names
/// are recognized, which are required and what happens to unknown members is
/// the business of the object reader layer; the machine only tracks phase and
/// count.
#[derive(Debug)]
pub struct ObjectReadStateMachine {
    state: ObjectReadState,
    member_count: u32,
    stored_error: Option<ReadError>,
}

impl ObjectReadStateMachine {
    /// Creates a machine positioned before the start of the object
    pub fn new() -> Self {
        ObjectReadStateMachine {
            state: ObjectReadState::Initial,
            member_count: 0,
            stored_error: None,
        }
    }

    /// Current phase of the machine
    pub fn state(&self) -> ObjectReadState {
        self.state
    }

    /// Number of members whose values were acknowledged so far
    pub fn member_count(&self) -> u32 {
        self.member_count
    }

    /// Determines what comes next in the object
    ///
    /// # Panics
    /// Panics when called after the machine reached [`ObjectReadState::Done`].
    pub fn read(&mut self, scanner: &mut JsonScanner<'_>) -> ReadResult<ObjectStep> {
        match self.state {
            ObjectReadState::Initial => {
                let kind = match crate::reader::ensure_token(scanner) {
                    ReadResult::Value(kind) => kind,
                    ReadResult::Incomplete => return ReadResult::Incomplete,
                    ReadResult::Error(e) => return self.fail(e),
                };
                if kind != TokenKind::BeginObject {
                    return self.fail(ReadError::UnexpectedToken {
                        expected: TokenKind::BeginObject,
                        actual: kind,
                        offset: scanner.position(),
                    });
                }
                scanner.consume();
                self.state = ObjectReadState::NameOrEnd;
                self.name_or_end(scanner)
            }
            ObjectReadState::NameOrEnd => self.name_or_end(scanner),
            ObjectReadState::PendingNameRead => ReadResult::Value(ObjectStep::Name),
            ObjectReadState::Value => {
                match scanner.advance() {
                    Ok(true) => {}
                    Ok(false) => return ReadResult::Incomplete,
                    Err(e) => return self.fail(e.into()),
                }
                // First token of the member value; stays current for the
                // value reader
                self.state = ObjectReadState::PendingValueRead;
                ReadResult::Value(ObjectStep::Value)
            }
            ObjectReadState::PendingValueRead => ReadResult::Value(ObjectStep::Value),
            ObjectReadState::Done => {
                panic!("Incorrect state machine usage: object was already read to completion")
            }
            ObjectReadState::Error => ReadResult::Error(self.stored_error()),
        }
    }

    /// Acknowledges that the pending member name was inspected and consumed
    ///
    /// # Panics
    /// Panics if no name read is pending; this is a programming error of the
    /// driving code, not a data error.
    pub fn on_name_read(&mut self) {
        if self.state != ObjectReadState::PendingNameRead {
            panic!(
                "Incorrect state machine usage: no member name read is pending (state: {})",
                self.state
            );
        }
        self.state = ObjectReadState::Value;
    }

    /// Acknowledges that the pending member value was decoded (or skipped)
    /// completely
    ///
    /// # Panics
    /// Panics if no value read is pending; this is a programming error of the
    /// driving code, not a data error.
    pub fn on_value_read(&mut self) {
        if self.state != ObjectReadState::PendingValueRead {
            panic!(
                "Incorrect state machine usage: no member value read is pending (state: {})",
                self.state
            );
        }
        self.state = ObjectReadState::NameOrEnd;
        self.member_count += 1;
    }

    /// Poisons the machine after a nested decode failed, so that any further
    /// [`read`](Self::read) repeats the error instead of resuming
    pub fn on_error(&mut self, error: ReadError) {
        self.state = ObjectReadState::Error;
        self.stored_error = Some(error);
    }

    fn name_or_end(&mut self, scanner: &mut JsonScanner<'_>) -> ReadResult<ObjectStep> {
        match scanner.advance() {
            Ok(true) => {}
            Ok(false) => return ReadResult::Incomplete,
            Err(e) => return self.fail(e.into()),
        }
        match scanner.kind() {
            TokenKind::EndObject => {
                scanner.consume();
                self.state = ObjectReadState::Done;
                ReadResult::Value(ObjectStep::Done)
            }
            TokenKind::MemberName => {
                // Name token stays current so the caller can inspect it
                self.state = ObjectReadState::PendingNameRead;
                ReadResult::Value(ObjectStep::Name)
            }
            // The scanner only ever delivers a member name or the object end
            // at this position
            kind => unreachable!("unexpected token {kind} between object members"),
        }
    }

    fn fail(&mut self, error: ReadError) -> ReadResult<ObjectStep> {
        self.on_error(error.clone());
        ReadResult::Error(error)
    }

    fn stored_error(&self) -> ReadError {
        match &self.stored_error {
            Some(e) => e.clone(),
            None => unreachable!("machine in Error state has no stored error"),
        }
    }
}

impl Default for ObjectReadStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Resumable skipper for one complete JSON value of any type
///
/// Used by object readers to skip the values of unrecognized members. Counts
/// open structural levels instead of keeping per-level state; the scanner
/// already guarantees that brackets are balanced and well-nested.
#[derive(Debug)]
pub struct ValueSkip {
    open_levels: u32,
}

impl ValueSkip {
    /// Creates a skipper positioned before the value to skip
    pub fn new() -> Self {
        ValueSkip { open_levels: 0 }
    }

    /// Skips tokens until the value the scanner is positioned on has been
    /// consumed completely
    pub fn read(&mut self, scanner: &mut JsonScanner<'_>) -> ReadResult<()> {
        loop {
            let kind = ready!(crate::reader::ensure_token(scanner));
            match kind {
                TokenKind::BeginArray | TokenKind::BeginObject => {
                    scanner.consume();
                    self.open_levels += 1;
                }
                TokenKind::EndArray | TokenKind::EndObject => {
                    scanner.consume();
                    self.open_levels -= 1;
                }
                TokenKind::MemberName
                | TokenKind::String
                | TokenKind::Number
                | TokenKind::Boolean
                | TokenKind::Null => scanner.consume(),
                TokenKind::None => unreachable!("ensure_token returned None"),
            }
            if self.open_levels == 0 {
                return ReadResult::Value(());
            }
        }
    }
}

impl Default for ValueSkip {
    fn default() -> Self {
        Self::new()
    }
}
