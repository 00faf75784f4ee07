//! Command contract and metadata.
//!
//! - `spec`: CommandSpec, the literal metadata a command declares
//! - `info`: CommandInfo, the validated form kept by the registry
//!
//! A command is any type implementing [`Command`]. Metadata comes from an
//! explicit [`CommandSpec`]; host services a command needs are handed to its
//! constructor, while the registry and the re-entry point arrive through the
//! `&Dispatcher` passed to [`Command::execute`].

mod info;
mod spec;

pub use info::{CommandInfo, normalize};
pub use spec::CommandSpec;

use crate::dispatch::Dispatcher;
use crate::error::CommandResult;
use crate::flags::FlagMap;

/// One call of a command, as seen by `Command::execute`.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Name the command was invoked as
    pub command: &'a str,
    /// Argument line after the leading flags
    pub arguments: &'a str,
    pub flags: &'a FlagMap,
    pub verbose: bool,
    pub dry_run: bool,
    /// Metadata of the command being run
    pub info: &'a CommandInfo,
}

/// What a successful execution asks of the dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Show generic help for the command afterwards
    pub show_help: bool,
}

impl Outcome {
    pub fn done() -> Self {
        Self::default()
    }

    pub fn with_help() -> Self {
        Self { show_help: true }
    }
}

/// A named, aliased unit of behaviour.
pub trait Command {
    /// Declared metadata. Read once, at registration.
    fn spec(&self) -> CommandSpec;

    /// Adjust the declared help text before it is stored.
    fn modify_help(&self, original: String) -> String {
        original
    }

    /// Called once after registration. An error aborts startup.
    fn initialise(&mut self) -> CommandResult<()> {
        Ok(())
    }

    /// Run the command.
    fn execute(
        &self,
        invocation: &Invocation<'_>,
        dispatcher: &Dispatcher,
    ) -> CommandResult<Outcome>;

    /// Release held resources. Called at most once, also for commands whose
    /// initialisation failed.
    fn dispose(&mut self) {}
}
