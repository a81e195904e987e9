//! Caller-held per-decode state

use std::any::Any;

/// Per-decode state of one logical read, held by the caller across pauses
///
/// Structural readers (arrays, objects, tagged unions) need mutable state
/// while their value is being decoded: the phase of their state machine and
/// the items or members accumulated so far. That state lives here, in a stack
/// of frames indexed by nesting depth, one frame per array/object level which
/// is currently open. A paused decode is resumed simply by calling
/// [`try_read`](super::JsonReader::try_read) again with the same session.
///
/// Create one session per decode with [`new`](Self::new) and drop it when the
/// decode finished. Reusing a session for a second decode after a successful
/// one happens to work (all frames are gone then), but after an error the
/// retained poisoned frames make every further read fail with the same error,
/// deliberately.
///
/// A session is tied to the reader it was first used with: frames are typed,
/// and resuming with a reader which expects differently-shaped state panics.
#[derive(Debug, Default)]
pub struct ReadSession {
    /// One slot per structural nesting level; `None` only transiently while
    /// the frame is checked out by the reader driving that level
    frames: Vec<Option<Box<dyn Any + Send>>>,
    /// Current descent depth of the running `try_read` traversal
    depth: usize,
}

impl ReadSession {
    /// Creates the state for a fresh decode
    pub fn new() -> Self {
        ReadSession {
            frames: Vec::new(),
            depth: 0,
        }
    }

    /// Checks out the frame for the next nesting level, creating it with
    /// `init` if this level is entered for the first time
    ///
    /// Must be balanced with exactly one [`suspend`](Self::suspend) or
    /// [`complete`](Self::complete) before the enclosing `try_read` returns.
    ///
    /// # Panics
    /// Panics if the stored frame has a different type than `F`, which means
    /// the session is being resumed by a different reader than the one which
    /// suspended it.
    pub(crate) fn descend<F: Any + Send>(&mut self, init: impl FnOnce() -> F) -> F {
        if self.depth == self.frames.len() {
            self.frames.push(None);
        }
        let slot = self.frames[self.depth].take();
        self.depth += 1;
        match slot {
            None => init(),
            Some(frame) => match frame.downcast::<F>() {
                Ok(frame) => *frame,
                Err(_) => panic!(
                    "Incorrect reader usage: session was suspended by a different reader"
                ),
            },
        }
    }

    /// Returns a checked-out frame so the paused decode can continue later
    pub(crate) fn suspend<F: Any + Send>(&mut self, frame: F) {
        self.depth -= 1;
        self.frames[self.depth] = Some(Box::new(frame));
    }

    /// Discards the current level's slot after its value decoded successfully
    pub(crate) fn complete(&mut self) {
        self.depth -= 1;
        self.frames.truncate(self.depth);
    }
}
