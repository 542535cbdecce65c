//! DICT status codes and their human-readable taxonomy
//!
//! Every reply from a DICT server starts with a three digit status code. The
//! first digit gives the reply category and the second digit the subject
//! area. Codes from 900 upwards never appear on the wire; they are
//! synthesized locally for I/O, resolution and argument failures.

use std::borrow::Cow;
use std::fmt;

/// Three digit status code from a DICT status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const DATABASES_PRESENT: StatusCode = StatusCode(110);
    pub const STRATEGIES_AVAILABLE: StatusCode = StatusCode(111);
    pub const DATABASE_INFO: StatusCode = StatusCode(112);
    pub const HELP_TEXT: StatusCode = StatusCode(113);
    pub const SERVER_INFO: StatusCode = StatusCode(114);
    pub const CHALLENGE: StatusCode = StatusCode(130);
    pub const DEFINITIONS_RETRIEVED: StatusCode = StatusCode(150);
    pub const DEFINITION_HEADER: StatusCode = StatusCode(151);
    pub const MATCHES_FOUND: StatusCode = StatusCode(152);
    pub const TIMING: StatusCode = StatusCode(210);
    pub const CONNECTION_OK: StatusCode = StatusCode(220);
    pub const CLOSING: StatusCode = StatusCode(221);
    pub const AUTH_OK: StatusCode = StatusCode(230);
    pub const OK: StatusCode = StatusCode(250);
    pub const SEND_RESPONSE: StatusCode = StatusCode(330);
    pub const SERVER_UNAVAILABLE: StatusCode = StatusCode(420);
    pub const SHUTTING_DOWN: StatusCode = StatusCode(421);
    pub const SYNTAX_ERROR: StatusCode = StatusCode(500);
    pub const ILLEGAL_PARAMETERS: StatusCode = StatusCode(501);
    pub const NOT_IMPLEMENTED: StatusCode = StatusCode(502);
    pub const PARAMETER_NOT_IMPLEMENTED: StatusCode = StatusCode(503);
    pub const ACCESS_DENIED: StatusCode = StatusCode(530);
    pub const ACCESS_DENIED_SHOW_INFO: StatusCode = StatusCode(531);
    pub const ACCESS_DENIED_MECHANISM: StatusCode = StatusCode(532);
    pub const INVALID_DATABASE: StatusCode = StatusCode(550);
    pub const INVALID_STRATEGY: StatusCode = StatusCode(551);
    pub const NO_MATCH: StatusCode = StatusCode(552);
    pub const NO_DATABASES: StatusCode = StatusCode(554);
    pub const NO_STRATEGIES: StatusCode = StatusCode(555);

    pub const LOCAL_GENERIC: StatusCode = StatusCode(900);
    pub const LOCAL_IO: StatusCode = StatusCode(901);
    pub const LOCAL_HOST_RESOLUTION: StatusCode = StatusCode(902);
    pub const LOCAL_PERMISSION: StatusCode = StatusCode(903);
    pub const LOCAL_TIMEOUT: StatusCode = StatusCode(904);

    /// First code of the locally synthesized band
    pub const SYNTHESIZED_FLOOR: u16 = 900;

    /// Parse the three digit prefix of a status line
    ///
    /// Returns `None` when the line is shorter than three characters, when
    /// any of the first three characters is not an ASCII digit, or when the
    /// fourth character (if any) is not a space.
    pub fn from_prefix(line: &str) -> Option<Self> {
        let bytes = line.as_bytes();
        if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
            return None;
        }
        if bytes.len() > 3 && bytes[3] != b' ' {
            return None;
        }
        line[..3].parse().ok().map(StatusCode)
    }

    /// Numeric value
    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// Reply category from the first digit
    pub fn category(self) -> Option<ReplyCategory> {
        if self.is_synthesized() {
            return Some(ReplyCategory::Local);
        }
        match self.0 / 100 {
            1 => Some(ReplyCategory::PositivePreliminary),
            2 => Some(ReplyCategory::PositiveCompletion),
            3 => Some(ReplyCategory::PositiveIntermediate),
            4 => Some(ReplyCategory::TransientNegative),
            5 => Some(ReplyCategory::PermanentNegative),
            _ => None,
        }
    }

    /// Subject area from the second digit
    pub fn subject(self) -> Option<ReplySubject> {
        match (self.0 / 10) % 10 {
            0 => Some(ReplySubject::Syntax),
            1 => Some(ReplySubject::Information),
            2 => Some(ReplySubject::Connections),
            3 => Some(ReplySubject::Authentication),
            4 => Some(ReplySubject::Unspecified),
            5 => Some(ReplySubject::System),
            8 => Some(ReplySubject::Extension),
            _ => None,
        }
    }

    /// Whether the code is in the locally synthesized band
    pub fn is_synthesized(self) -> bool {
        self.0 >= Self::SYNTHESIZED_FLOOR
    }

    pub fn is_preliminary(self) -> bool {
        self.category() == Some(ReplyCategory::PositivePreliminary)
    }

    pub fn is_completion(self) -> bool {
        self.category() == Some(ReplyCategory::PositiveCompletion)
    }

    /// 4yz and 5yz replies
    pub fn is_negative(self) -> bool {
        matches!(
            self.category(),
            Some(ReplyCategory::TransientNegative | ReplyCategory::PermanentNegative)
        )
    }

    /// Whether a text block follows this status line directly
    ///
    /// 150 is preliminary but is followed by 151 headers rather than text.
    pub fn starts_text(self) -> bool {
        matches!(self.0, 110 | 111 | 112 | 113 | 114 | 151 | 152)
    }

    /// Human-readable explanation of the code
    ///
    /// Tabulated codes return their protocol meaning. Other wire codes are
    /// described from their digits. Synthesized codes only get a category
    /// label here; the error that carries them holds the specific message.
    pub fn describe(self) -> Cow<'static, str> {
        if let Some(text) = self.tabulated() {
            return Cow::Borrowed(text);
        }
        if self.is_synthesized() {
            return Cow::Borrowed(self.local_label());
        }
        let category = match self.category() {
            Some(category) => category.label(),
            None => "Unrecognized reply",
        };
        match self.subject() {
            Some(subject) => Cow::Owned(format!("{category}, {}", subject.label())),
            None => Cow::Borrowed(category),
        }
    }

    fn tabulated(self) -> Option<&'static str> {
        let text = match self.0 {
            110 => "n databases present",
            111 => "n strategies available",
            112 => "database information follows",
            113 => "help text follows",
            114 => "server information follows",
            130 => "challenge follows",
            150 => "n definitions retrieved",
            151 => "word database name header",
            152 => "n matches found",
            210 => "optional timing",
            220 => "connection OK",
            221 => "closing connection",
            230 => "authentication successful",
            250 => "OK",
            330 => "send response",
            420 => "server temporarily unavailable",
            421 => "server shutting down",
            500 => "syntax error, command unrecognized",
            501 => "syntax error, illegal parameters",
            502 => "command not implemented",
            503 => "command parameter not implemented",
            530 => "access denied",
            531 => "access denied, see SHOW INFO",
            532 => "access denied, unknown mechanism",
            550 => "invalid database",
            551 => "invalid strategy",
            552 => "no match",
            554 => "no databases present",
            555 => "no strategies available",
            _ => return None,
        };
        Some(text)
    }

    fn local_label(self) -> &'static str {
        match self.0 {
            901 => "I/O failure",
            902 => "Host resolution failure",
            903 => "Permission failure",
            904 => "Timeout",
            _ => "Local failure",
        }
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// Reply category encoded by the first digit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyCategory {
    PositivePreliminary,
    PositiveCompletion,
    PositiveIntermediate,
    TransientNegative,
    PermanentNegative,
    /// Synthesized locally, never sent by a server
    Local,
}

impl ReplyCategory {
    pub fn label(self) -> &'static str {
        match self {
            ReplyCategory::PositivePreliminary => "Positive Preliminary reply",
            ReplyCategory::PositiveCompletion => "Positive Completion reply",
            ReplyCategory::PositiveIntermediate => "Positive Intermediate reply",
            ReplyCategory::TransientNegative => "Transient Negative Completion reply",
            ReplyCategory::PermanentNegative => "Permanent Negative Completion reply",
            ReplyCategory::Local => "Local failure",
        }
    }
}

/// Subject area encoded by the second digit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySubject {
    Syntax,
    Information,
    Connections,
    Authentication,
    Unspecified,
    System,
    Extension,
}

impl ReplySubject {
    pub fn label(self) -> &'static str {
        match self {
            ReplySubject::Syntax => "Syntax",
            ReplySubject::Information => "Information",
            ReplySubject::Connections => "Connections",
            ReplySubject::Authentication => "Authentication",
            ReplySubject::Unspecified => "Unspecified as yet",
            ReplySubject::System => "DICT System",
            ReplySubject::Extension => "Nonstandard (private implementation) extensions",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tabulated_codes() {
        assert_eq!(StatusCode(110).describe(), "n databases present");
        assert_eq!(StatusCode(151).describe(), "word database name header");
        assert_eq!(StatusCode(220).describe(), "connection OK");
        assert_eq!(StatusCode(531).describe(), "access denied, see SHOW INFO");
        assert_eq!(StatusCode::NO_MATCH.describe(), "no match");
        assert_eq!(StatusCode::NO_STRATEGIES.describe(), "no strategies available");
    }

    #[test]
    fn test_generated_descriptions() {
        assert_eq!(
            StatusCode(251).describe(),
            "Positive Completion reply, DICT System"
        );
        assert_eq!(
            StatusCode(401).describe(),
            "Transient Negative Completion reply, Syntax"
        );
        assert_eq!(
            StatusCode(141).describe(),
            "Positive Preliminary reply, Unspecified as yet"
        );
        assert_eq!(
            StatusCode(382).describe(),
            "Positive Intermediate reply, Nonstandard (private implementation) extensions"
        );
        assert_eq!(
            StatusCode(599).describe(),
            "Permanent Negative Completion reply"
        );
    }

    #[test]
    fn test_undefined_second_digit_is_category_only() {
        assert_eq!(StatusCode(260).describe(), "Positive Completion reply");
        assert_eq!(
            StatusCode(575).describe(),
            "Permanent Negative Completion reply"
        );
        assert_eq!(StatusCode(169).describe(), "Positive Preliminary reply");
        assert_eq!(
            StatusCode(470).describe(),
            "Transient Negative Completion reply"
        );
    }

    #[test]
    fn test_undefined_first_digit() {
        assert_eq!(StatusCode(0).describe(), "Unrecognized reply, Syntax");
        assert_eq!(StatusCode(699).describe(), "Unrecognized reply");
        assert_eq!(StatusCode(850).describe(), "Unrecognized reply, DICT System");
    }

    #[test]
    fn test_synthesized_labels() {
        assert_eq!(StatusCode(900).describe(), "Local failure");
        assert_eq!(StatusCode(901).describe(), "I/O failure");
        assert_eq!(StatusCode(902).describe(), "Host resolution failure");
        assert_eq!(StatusCode(903).describe(), "Permission failure");
        assert_eq!(StatusCode(904).describe(), "Timeout");
        assert_eq!(StatusCode(999).describe(), "Local failure");
        assert!(StatusCode(904).is_synthesized());
        assert!(!StatusCode(899).is_synthesized());
    }

    #[test]
    fn test_from_prefix() {
        assert_eq!(
            StatusCode::from_prefix("220 dict.org ready"),
            Some(StatusCode(220))
        );
        assert_eq!(StatusCode::from_prefix("250"), Some(StatusCode(250)));
        assert_eq!(StatusCode::from_prefix("25"), None);
        assert_eq!(StatusCode::from_prefix(""), None);
        assert_eq!(StatusCode::from_prefix("abc def"), None);
        assert_eq!(StatusCode::from_prefix("2500 too long"), None);
        assert_eq!(StatusCode::from_prefix("٢٥٠ arabic digits"), None);
    }

    #[test]
    fn test_classification() {
        assert!(StatusCode::DEFINITIONS_RETRIEVED.is_preliminary());
        assert!(!StatusCode::DEFINITIONS_RETRIEVED.starts_text());
        assert!(StatusCode::DATABASES_PRESENT.starts_text());
        assert!(StatusCode::MATCHES_FOUND.starts_text());
        assert!(StatusCode::OK.is_completion());
        assert!(StatusCode::NO_MATCH.is_negative());
        assert!(StatusCode::SERVER_UNAVAILABLE.is_negative());
        assert!(!StatusCode::CLOSING.is_negative());
        assert_eq!(StatusCode(904).category(), Some(ReplyCategory::Local));
    }

    #[test]
    fn test_display_pads_to_three_digits() {
        assert_eq!(StatusCode(7).to_string(), "007");
        assert_eq!(StatusCode(552).to_string(), "552");
    }

    proptest! {
        #[test]
        fn describe_is_total(code in 0u16..1000) {
            let text = StatusCode(code).describe();
            prop_assert!(!text.is_empty());
        }

        #[test]
        fn describe_composes_untabulated_codes(first in 1u16..=5, second in 0u16..10, third in 0u16..10) {
            let code = StatusCode(first * 100 + second * 10 + third);
            prop_assume!(code.tabulated().is_none());
            let category = code.category().map(ReplyCategory::label).unwrap_or_default();
            let expected = match code.subject() {
                Some(subject) => format!("{category}, {}", subject.label()),
                None => category.to_string(),
            };
            prop_assert_eq!(code.describe().into_owned(), expected);
        }
    }
}
