//! Command registry - registration, name/alias resolution and teardown.
//!
//! The registry owns every registered command. Each invocation name (primary
//! and aliases) is normalized into a single key space; a key can belong to one
//! command only, so a clash is reported when the second command registers.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde::Serialize;
use strsim::levenshtein;
use tracing::{debug, info, warn};

use crate::command::{Command, CommandInfo, normalize};
use crate::config::RegistryConfig;
use crate::error::{ConfigError, short_type_name};
use crate::host::{ErrorHandler, HelpHandler};

/// Maximum edit distance for "did you mean" suggestions.
const SUGGESTION_DISTANCE: usize = 2;

/// A command together with its registered metadata.
pub struct Registered {
    info: CommandInfo,
    command: Box<dyn Command>,
}

impl Registered {
    pub fn info(&self) -> &CommandInfo {
        &self.info
    }

    pub(crate) fn command(&self) -> &dyn Command {
        self.command.as_ref()
    }
}

impl std::fmt::Debug for Registered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registered")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// One name the host should bind to the dispatcher callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostBinding {
    /// Invocation string, with slash
    pub name: String,
    /// Primary name of the command it runs
    pub target: String,
    pub summary: String,
    /// Whether the host lists this name in its own help
    pub show_in_help: bool,
}

/// Owns registered commands and the help/error hooks.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<Registered>,
    index: HashMap<String, usize>,
    alias_prefix: Option<String>,
    help_handler: Option<Rc<dyn HelpHandler>>,
    error_handler: Option<Rc<dyn ErrorHandler>>,
    disposed: bool,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        let mut registry = Self::default();
        registry.alias_prefix = config.alias_prefix.clone();
        registry
    }

    /// Register `command`, run its initialisation and return its metadata.
    pub fn register<C>(&mut self, mut command: C) -> Result<&CommandInfo, ConfigError>
    where
        C: Command + 'static,
    {
        let internal = short_type_name::<C>();
        if self.disposed {
            return Err(ConfigError::RegistryDisposed {
                internal: internal.to_string(),
            });
        }

        let mut spec = command.spec();
        spec.help = command.modify_help(std::mem::take(&mut spec.help));
        let info = CommandInfo::from_spec(spec, internal, self.alias_prefix.as_deref())?;

        let mut own_keys = HashSet::new();
        for key in info.invocation_names_comparable() {
            let existing = match self.index.get(&key) {
                Some(&idx) => Some(self.entries[idx].info.internal_name.clone()),
                None if own_keys.contains(&key) => Some(internal.to_string()),
                None => None,
            };
            if let Some(existing) = existing {
                return Err(ConfigError::DuplicateName {
                    name: key,
                    existing,
                    incoming: internal.to_string(),
                });
            }
            own_keys.insert(key);
        }

        info!("Initialising {}", internal);
        if let Err(source) = command.initialise() {
            warn!("{} failed to initialise: {}", internal, source);
            command.dispose();
            return Err(ConfigError::Initialise {
                command: info.command,
                source,
            });
        }

        let idx = self.entries.len();
        for key in own_keys {
            self.index.insert(key, idx);
        }
        debug!(
            "Registered {} as {} (aliases: {:?})",
            internal, info.command, info.aliases
        );
        self.entries.push(Registered {
            info,
            command: Box::new(command),
        });
        Ok(&self.entries[idx].info)
    }

    /// Find the command invoked by `name` (any case, slash optional).
    pub fn resolve(&self, name: &str) -> Option<&Registered> {
        let key = normalize(name);
        let found = self.index.get(&key).map(|&idx| &self.entries[idx]);
        debug!(
            "Resolved [{}] -> {}",
            name,
            found.map_or("<none>", |r| r.info.command.as_str())
        );
        found
    }

    /// All commands in registration order.
    pub fn all(&self) -> impl Iterator<Item = &CommandInfo> + '_ {
        self.entries.iter().map(|r| &r.info)
    }

    /// Commands that should appear in help listings.
    pub fn listing(&self) -> Vec<&CommandInfo> {
        self.all().filter(|info| info.show_in_listing).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Closest registered invocation name to `name`, if any is close enough.
    pub fn suggest(&self, name: &str) -> Option<String> {
        let wanted = normalize(name);
        let mut best: Option<(&str, usize)> = None;

        for key in self.index.keys() {
            let distance = levenshtein(&wanted, key);
            if distance > SUGGESTION_DISTANCE {
                continue;
            }
            // Ties go to the alphabetically first name
            let better = match best {
                Some((current, best_dist)) => {
                    distance < best_dist || (distance == best_dist && key.as_str() < current)
                }
                None => true,
            };
            if better {
                best = Some((key.as_str(), distance));
            }
        }

        best.map(|(key, _)| format!("/{}", key))
    }

    /// Every invocation name, for handing to the host's registration API.
    pub fn host_bindings(&self) -> Vec<HostBinding> {
        let mut bindings = Vec::new();
        for info in self.all() {
            bindings.push(HostBinding {
                name: info.command.clone(),
                target: info.command.clone(),
                summary: info.summary.clone(),
                show_in_help: info.show_in_host_help,
            });
            for alias in &info.aliases {
                bindings.push(HostBinding {
                    name: alias.clone(),
                    target: info.command.clone(),
                    summary: info.summary.clone(),
                    show_in_help: false,
                });
            }
        }
        bindings
    }

    pub fn set_help_handler(&mut self, handler: Rc<dyn HelpHandler>) -> Result<(), ConfigError> {
        if self.help_handler.is_some() {
            return Err(ConfigError::HandlerAlreadySet("help"));
        }
        self.help_handler = Some(handler);
        Ok(())
    }

    pub fn set_error_handler(&mut self, handler: Rc<dyn ErrorHandler>) -> Result<(), ConfigError> {
        if self.error_handler.is_some() {
            return Err(ConfigError::HandlerAlreadySet("error"));
        }
        self.error_handler = Some(handler);
        Ok(())
    }

    pub fn help_handler(&self) -> Option<&dyn HelpHandler> {
        self.help_handler.as_deref()
    }

    pub fn error_handler(&self) -> Option<&dyn ErrorHandler> {
        self.error_handler.as_deref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Dispose every command once, in registration order. Repeat calls do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        for entry in &mut self.entries {
            debug!("Disposing {}", entry.info.internal_name);
            entry.command.dispose();
        }
        info!("Disposed {} commands", self.entries.len());
    }
}

impl Drop for CommandRegistry {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.entries)
            .field("alias_prefix", &self.alias_prefix)
            .field("has_help_handler", &self.help_handler.is_some())
            .field("has_error_handler", &self.error_handler.is_some())
            .field("disposed", &self.disposed)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
