//! Argument line parser.
//!
//! Splits a raw argument line into the leading run of flag tokens and the
//! free-text remainder:
//!
//! ```text
//! -?n  -!  WHM,SCH   /echo  -x hello
//! └──────┘ └────────────────────────┘
//!  flags    remainder (verbatim, later "-x" is text)
//! ```
//!
//! A flag token is the marker `-` followed by one or more flag characters.
//! Flags must come first: the first token that is not a flag token starts the
//! remainder. There is no quoting and the parser never fails.

use crate::flags::{DRY_RUN, FlagMap, VERBOSE};

/// Marker that introduces a flag token.
pub const FLAG_MARKER: char = '-';

/// Result of parsing an argument line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedInvocation {
    /// Flags from the leading flag tokens
    pub flags: FlagMap,

    /// Everything from the first non-flag token onward, untouched
    pub remainder: String,
}

impl ParsedInvocation {
    pub fn into_parts(self) -> (FlagMap, String) {
        (self.flags, self.remainder)
    }
}

/// Characters accepted inside a flag token.
pub fn is_flag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == VERBOSE || c == DRY_RUN
}

/// Body of a flag token (`"-ab"` -> `"ab"`), or `None` if `token` is not one.
fn flag_body(token: &str) -> Option<&str> {
    let body = token.strip_prefix(FLAG_MARKER)?;
    (!body.is_empty() && body.chars().all(is_flag_char)).then_some(body)
}

/// Parse `raw` into flags and remainder.
///
/// Input without a leading flag token is returned verbatim as the remainder.
/// Once a flag token has been consumed, the whitespace separating the flag run
/// from the remainder is dropped.
pub fn extract_flags(raw: &str) -> ParsedInvocation {
    let mut flags = FlagMap::default();
    let mut consumed = false;
    let mut rest = raw;

    loop {
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            rest = trimmed;
            break;
        }

        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        match flag_body(&trimmed[..end]) {
            Some(body) => {
                for flag in body.chars() {
                    flags.insert(flag);
                }
                consumed = true;
                rest = &trimmed[end..];
            }
            None => {
                rest = trimmed;
                break;
            }
        }
    }

    let remainder = if consumed { rest } else { raw };
    ParsedInvocation {
        flags,
        remainder: remainder.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
