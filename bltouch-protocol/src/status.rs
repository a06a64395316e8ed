//! Status codes
//!
//! Numeric values follow grblHAL so a host sender can decode `error:N`
//! lines with its usual table.

/// Result of validating or executing a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    Ok,
    /// Word letter missing or not a letter
    ExpectedCommandLetter,
    /// Numeric value malformed or missing
    BadNumberFormat,
    /// Line could not be interpreted
    InvalidStatement,
    /// Value must not be negative
    NegativeValue,
    /// Command not supported by anyone in the chain
    GcodeUnsupportedCommand,
    /// Two commands from the same modal group in one block
    GcodeModalGroupViolation,
    /// Required value word missing
    GcodeValueWordMissing,
    /// Block carries words nobody consumed
    GcodeUnusedWords,
    /// Value outside its allowed range
    GcodeValueOutOfRange,
    /// Not handled here; ask the next handler in the chain
    Unhandled,
}

impl Status {
    /// Numeric code as reported in `error:N`
    ///
    /// [`Status::Unhandled`] never leaves the dispatcher and has no code.
    pub const fn code(self) -> Option<u8> {
        match self {
            Status::Ok => Some(0),
            Status::ExpectedCommandLetter => Some(1),
            Status::BadNumberFormat => Some(2),
            Status::InvalidStatement => Some(3),
            Status::NegativeValue => Some(4),
            Status::GcodeUnsupportedCommand => Some(20),
            Status::GcodeModalGroupViolation => Some(21),
            Status::GcodeValueWordMissing => Some(28),
            Status::GcodeUnusedWords => Some(36),
            Status::GcodeValueOutOfRange => Some(39),
            Status::Unhandled => None,
        }
    }

    /// Check for success
    pub const fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.code() {
            Some(0) => f.write_str("ok"),
            Some(code) => write!(f, "error:{}", code),
            None => f.write_str("error:unhandled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;
    use heapless::String;

    fn render(status: Status) -> String<24> {
        let mut s = String::new();
        write!(s, "{}", status).unwrap();
        s
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(render(Status::Ok).as_str(), "ok");
        assert_eq!(render(Status::BadNumberFormat).as_str(), "error:2");
        assert_eq!(render(Status::GcodeUnsupportedCommand).as_str(), "error:20");
        assert_eq!(render(Status::GcodeValueOutOfRange).as_str(), "error:39");
    }

    #[test]
    fn test_unhandled_has_no_code() {
        assert_eq!(Status::Unhandled.code(), None);
        assert!(!Status::Unhandled.is_ok());
    }
}
