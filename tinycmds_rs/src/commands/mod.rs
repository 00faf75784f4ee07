//! Command implementations.
//!
//! Each command is defined in its own module file.

pub mod conditional;
pub mod echo;
pub mod help;

pub use conditional::{ConditionalCommand, MembershipPredicate, Predicate, Verdict, fires};
pub use echo::EchoCommand;
pub use help::{DisplayCommandHelp, SurfaceHelp};
