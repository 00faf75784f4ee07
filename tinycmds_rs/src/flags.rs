//! FlagMap - the set of single-character switches found at the head of an
//! argument line.
//!
//! Built by [`crate::parser::extract_flags`] and read-only afterwards.

use std::collections::BTreeSet;
use std::fmt;

/// Verbose output (`-?`).
pub const VERBOSE: char = '?';
/// Dry run: report what would happen without doing it (`-!`).
pub const DRY_RUN: char = '!';
/// Show help instead of executing (`-h`).
pub const HELP: char = 'h';

/// Set of flags present on an invocation.
///
/// Querying a flag that was not given is simply `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagMap {
    set: BTreeSet<char>,
}

impl FlagMap {
    pub(crate) fn insert(&mut self, flag: char) {
        self.set.insert(flag);
    }

    /// Whether `flag` was present.
    pub fn has(&self, flag: char) -> bool {
        self.set.contains(&flag)
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Present flags in ascending character order.
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.set.iter().copied()
    }

    pub fn verbose(&self) -> bool {
        self.has(VERBOSE)
    }

    pub fn dry_run(&self) -> bool {
        self.has(DRY_RUN)
    }

    pub fn help(&self) -> bool {
        self.has(HELP)
    }
}

impl fmt::Display for FlagMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.set.is_empty() {
            return f.write_str("(none)");
        }
        f.write_str("-")?;
        for flag in &self.set {
            write!(f, "{}", flag)?;
        }
        Ok(())
    }
}
