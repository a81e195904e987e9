//! Internal module for scanning / validating JSON number lexemes

/// Classification of a byte slice as a JSON number lexeme.
///
/// The scanner calls [`scan_number`] with the remaining input starting at the
/// first byte of a suspected number token and combines the outcome with its
/// final-block flag: a "prefix" outcome means more data could still extend the
/// number, so the token must not be committed yet.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub(crate) enum NumberScan {
    /// The first `len` bytes form a valid number, followed by a byte which
    /// cannot be part of a number
    Complete { len: usize },
    /// The input ended and the consumed bytes form a valid number which more
    /// data could nonetheless extend (e.g. `12` could continue as `12.5`)
    ValidPrefix,
    /// The input ended but the consumed bytes do not form a complete number
    /// yet (e.g. `12e` or `-`)
    IncompletePrefix,
    /// The bytes are not a valid JSON number; `at` is the index of the
    /// offending byte
    Invalid { at: usize },
}

pub(crate) fn scan_number(bytes: &[u8]) -> NumberScan {
    #[derive(PartialEq, Clone, Copy)]
    enum State {
        Start,
        Minus,
        IntZero,
        IntNonZero,
        DecimalPoint,
        DecimalDigit,
        ExpE,
        ExpSign,
        ExpDigit,
    }

    fn is_terminal(state: State) -> bool {
        matches!(
            state,
            State::IntZero | State::IntNonZero | State::DecimalDigit | State::ExpDigit
        )
    }

    let mut state = State::Start;
    for (index, &byte) in bytes.iter().enumerate() {
        state = match byte {
            b'-' => match state {
                State::Start => State::Minus,
                State::ExpE => State::ExpSign,
                _ => return NumberScan::Invalid { at: index },
            },
            b'0' => match state {
                State::Start | State::Minus => State::IntZero,
                State::IntNonZero => State::IntNonZero,
                State::DecimalPoint | State::DecimalDigit => State::DecimalDigit,
                State::ExpE | State::ExpSign | State::ExpDigit => State::ExpDigit,
                // Covers leading zeros such as `01`
                _ => return NumberScan::Invalid { at: index },
            },
            b'1'..=b'9' => match state {
                State::Start | State::Minus | State::IntNonZero => State::IntNonZero,
                State::DecimalPoint | State::DecimalDigit => State::DecimalDigit,
                State::ExpE | State::ExpSign | State::ExpDigit => State::ExpDigit,
                _ => return NumberScan::Invalid { at: index },
            },
            b'.' => match state {
                State::IntZero | State::IntNonZero => State::DecimalPoint,
                _ => return NumberScan::Invalid { at: index },
            },
            b'e' | b'E' => match state {
                State::IntZero | State::IntNonZero | State::DecimalDigit => State::ExpE,
                _ => return NumberScan::Invalid { at: index },
            },
            b'+' => match state {
                State::ExpE => State::ExpSign,
                _ => return NumberScan::Invalid { at: index },
            },
            _ => {
                // Byte cannot be part of a number; the lexeme ends here
                return if is_terminal(state) {
                    NumberScan::Complete { len: index }
                } else {
                    NumberScan::Invalid { at: index }
                };
            }
        };
    }

    if is_terminal(state) {
        NumberScan::ValidPrefix
    } else {
        NumberScan::IncompletePrefix
    }
}
