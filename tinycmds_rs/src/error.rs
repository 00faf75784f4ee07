//! Error taxonomy.
//!
//! - [`ConfigError`] - registration-time problems; abort startup.
//! - [`CommandError`] - raised by a command while executing; always contained
//!   by the dispatcher and reported to the user.
//! - [`DispatchError`] - dispatch preconditions (disposed registry, unknown
//!   name, depth limit); returned to the caller of `dispatch`.
//!
//! A [`Failure`] is an explicit causal chain of [`FailureRecord`]s, stored most
//! specific first, so the dispatcher can show every level to the user.

use std::any::Any;
use std::fmt;
use std::panic::Location;

use thiserror::Error;

pub type CommandResult<T> = Result<T, CommandError>;

/// Problems detected while building the registry.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{internal} does not declare a command name")]
    MissingName { internal: String },

    #[error("{command} declares an empty alias")]
    EmptyAlias { command: String },

    #[error("'/{name}' requested by {incoming} is already registered by {existing}")]
    DuplicateName {
        name: String,
        existing: String,
        incoming: String,
    },

    #[error("{0} handler is already set")]
    HandlerAlreadySet(&'static str),

    #[error("cannot register {internal}: the registry has been disposed")]
    RegistryDisposed { internal: String },

    #[error("failed to initialise {command}")]
    Initialise {
        command: String,
        #[source]
        source: CommandError,
    },
}

/// Failure raised by `Command::execute`.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A designed precondition check failed. Only the message reaches the user.
    #[error("{0}")]
    Assertion(String),

    /// Anything else. The whole chain reaches the user.
    #[error(transparent)]
    Failure(#[from] Failure),
}

impl From<anyhow::Error> for CommandError {
    #[track_caller]
    fn from(err: anyhow::Error) -> Self {
        CommandError::Failure(Failure::from(err))
    }
}

impl From<DispatchError> for CommandError {
    #[track_caller]
    fn from(err: DispatchError) -> Self {
        CommandError::Failure(Failure::from_error(&err))
    }
}

/// Fail with [`CommandError::Assertion`] unless `condition` holds.
pub fn ensure(condition: bool, message: impl Into<String>) -> CommandResult<()> {
    if condition {
        Ok(())
    } else {
        Err(CommandError::Assertion(message.into()))
    }
}

/// Dispatch preconditions that stop a command from running at all.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("command registry has already been disposed; '{command}' was not run")]
    Disposed { command: String },

    #[error("unknown command '{command}'{}", did_you_mean(.suggestion))]
    UnknownCommand {
        command: String,
        suggestion: Option<String>,
    },

    #[error("dispatch depth limit of {limit} exceeded while running '{command}'")]
    RecursionLimit { command: String, limit: usize },
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{}'?)", name),
        None => String::new(),
    }
}

/// One level of a failure chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub kind: String,
    pub message: String,
    pub location: Option<&'static Location<'static>>,
}

impl FailureRecord {
    /// `"at src/foo.rs:12:5"`, or `"at unknown location"`.
    pub fn location_label(&self) -> String {
        match self.location {
            Some(loc) => format!("at {}:{}:{}", loc.file(), loc.line(), loc.column()),
            None => "at unknown location".to_string(),
        }
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Causal chain of failure records, most specific first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    records: Vec<FailureRecord>,
}

impl Failure {
    #[track_caller]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            records: vec![FailureRecord {
                kind: kind.into(),
                message: message.into(),
                location: Some(Location::caller()),
            }],
        }
    }

    /// Wrap this failure in a less specific outer level.
    #[track_caller]
    pub fn context(mut self, kind: impl Into<String>, message: impl Into<String>) -> Self {
        self.records.push(FailureRecord {
            kind: kind.into(),
            message: message.into(),
            location: Some(Location::caller()),
        });
        self
    }

    /// Flatten a standard error and its `source()` chain.
    ///
    /// The outermost level is named after `E`; inner levels are `caused by`.
    #[track_caller]
    pub fn from_error<E: std::error::Error + 'static>(err: &E) -> Self {
        let mut records = vec![FailureRecord {
            kind: short_type_name::<E>().to_string(),
            message: err.to_string(),
            location: Some(Location::caller()),
        }];
        let mut source = err.source();
        while let Some(inner) = source {
            records.push(FailureRecord {
                kind: "caused by".to_string(),
                message: inner.to_string(),
                location: None,
            });
            source = inner.source();
        }
        records.reverse();
        Self { records }
    }

    /// Build from a caught panic payload.
    pub fn panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "command panicked".to_string());
        Self {
            records: vec![FailureRecord {
                kind: "panic".to_string(),
                message,
                location: None,
            }],
        }
    }

    /// Records, most specific first.
    pub fn records(&self) -> &[FailureRecord] {
        &self.records
    }

    pub fn root_cause(&self) -> &FailureRecord {
        &self.records[0]
    }

    fn outermost(&self) -> &FailureRecord {
        &self.records[self.records.len() - 1]
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.outermost(), f)
    }
}

impl std::error::Error for Failure {}

impl From<anyhow::Error> for Failure {
    #[track_caller]
    fn from(err: anyhow::Error) -> Self {
        let location = Location::caller();
        let mut records: Vec<FailureRecord> = err
            .chain()
            .enumerate()
            .map(|(depth, cause)| FailureRecord {
                kind: if depth == 0 { "Error" } else { "caused by" }.to_string(),
                message: cause.to_string(),
                location: (depth == 0).then_some(location),
            })
            .collect();
        records.reverse();
        Self { records }
    }
}

/// `core::num::error::ParseIntError` -> `ParseIntError`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
