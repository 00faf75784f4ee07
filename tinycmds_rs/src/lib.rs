//! # tinycmds
//!
//! **In-process slash-command dispatcher** for plugins that expose chat-style
//! commands (`/echo -? hello`).
//!
//! A command is declared once, together with its aliases and help text,
//! registered in a [`CommandRegistry`] and invoked through a [`Dispatcher`].
//! The dispatcher takes care of the parts every command would otherwise repeat:
//!
//! - **Flag extraction** - leading `-abc` tokens become a [`FlagMap`], the rest
//!   of the line is handed to the command untouched
//! - **Universal flags** - `-?` verbose, `-!` dry-run, `-h` help
//! - **Alias resolution** - case-insensitive, with "did you mean" suggestions
//! - **Contained failures** - errors and panics inside a command are reported
//!   through the host's error hook instead of escaping to the host
//! - **Re-entrant dispatch** - commands can run other commands, with a bounded
//!   nesting depth
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use tinycmds::host::{Notifier, Segment, plain_text};
//! use tinycmds::{CommandRegistry, Dispatcher, EchoCommand};
//!
//! struct Stdout;
//!
//! impl Notifier for Stdout {
//!     fn show_message(&self, segments: &[Segment]) {
//!         println!("{}", plain_text(segments));
//!     }
//!     fn show_error(&self, segments: &[Segment]) {
//!         eprintln!("{}", plain_text(segments));
//!     }
//! }
//!
//! let mut registry = CommandRegistry::new();
//! registry.register(EchoCommand::new(Rc::new(Stdout))).unwrap();
//!
//! let dispatcher = Dispatcher::new(registry);
//! dispatcher.dispatch_line("/e -? hello world").unwrap();
//! ```

// ============================================================================
// Core Modules
// ============================================================================

/// Command contract and the metadata derived from it.
pub mod command;

/// Invocation routing: flags, help, execution and failure reporting.
pub mod dispatch;

/// Error types for registration, dispatch and command failures.
pub mod error;

/// Flag sets extracted from an argument line.
pub mod flags;

/// Leading-flag parser.
pub mod parser;

/// Registration, lookup and teardown of commands.
pub mod registry;

// ============================================================================
// Host Integration
// ============================================================================

/// Interfaces a host implements to show output, errors and help.
pub mod host;

/// `.tinycmds/config.toml` loading.
pub mod config;

// ============================================================================
// Built-in Commands
// ============================================================================

/// Echo, conditional and help-display commands.
pub mod commands;

#[cfg(test)]
mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, CommandInfo, CommandSpec, Invocation, Outcome};
pub use commands::{
    ConditionalCommand, DisplayCommandHelp, EchoCommand, MembershipPredicate, Predicate,
    SurfaceHelp, Verdict,
};
pub use config::TinyConfig;
pub use dispatch::Dispatcher;
pub use error::{CommandError, CommandResult, ConfigError, DispatchError, Failure, FailureRecord};
pub use flags::FlagMap;
pub use parser::{ParsedInvocation, extract_flags};
pub use registry::{CommandRegistry, HostBinding};
