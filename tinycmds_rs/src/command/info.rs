//! CommandInfo - validated, normalized metadata derived from a CommandSpec
//! when the command is registered.

use serde::Serialize;

use super::spec::CommandSpec;
use crate::error::ConfigError;

/// Registry key for an invocation name: leading slashes stripped, lowercased.
pub fn normalize(name: &str) -> String {
    name.trim().trim_start_matches('/').to_lowercase()
}

fn bare(name: &str) -> &str {
    name.trim().trim_start_matches('/')
}

/// Metadata of a registered command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandInfo {
    /// Primary name with a leading slash
    pub command: String,

    /// Aliases with a leading slash, in listing order
    pub aliases: Vec<String>,

    pub summary: String,

    /// Help text after `Command::modify_help`
    pub help: String,

    /// `"/name arguments"`
    pub usage: String,

    pub show_in_listing: bool,

    /// Whether the host should show the primary name in its own help
    pub show_in_host_help: bool,

    /// Implementing type, for logs
    pub internal_name: String,
}

impl CommandInfo {
    /// Validate `spec` and derive the registered form.
    ///
    /// With an `alias_prefix`, every invocation name also gets a prefixed
    /// variant (`/tinyhelp` -> `/ptinyhelp`), listed after declared aliases.
    pub fn from_spec(
        spec: CommandSpec,
        internal_name: &str,
        alias_prefix: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let name = bare(&spec.name);
        if name.is_empty() {
            return Err(ConfigError::MissingName {
                internal: internal_name.to_string(),
            });
        }
        let command = format!("/{}", name);

        let mut declared = Vec::with_capacity(spec.aliases.len());
        for alias in &spec.aliases {
            let alias = bare(alias);
            if alias.is_empty() {
                return Err(ConfigError::EmptyAlias {
                    command: command.clone(),
                });
            }
            declared.push(alias.to_string());
        }

        let mut aliases: Vec<String> = declared.iter().map(|a| format!("/{}", a)).collect();
        if let Some(prefix) = alias_prefix.map(str::trim).filter(|p| !p.is_empty()) {
            aliases.push(format!("/{}{}", prefix, name));
            aliases.extend(declared.iter().map(|a| format!("/{}{}", prefix, a)));
        }

        let usage = format!("{} {}", command, spec.arguments.trim())
            .trim()
            .to_string();
        let show_in_listing = !spec.hide_in_listing;
        let show_in_host_help = show_in_listing && (!spec.hide_in_help || spec.summary.is_empty());

        Ok(Self {
            command,
            aliases,
            summary: spec.summary,
            help: spec.help,
            usage,
            show_in_listing,
            show_in_host_help,
            internal_name: internal_name.to_string(),
        })
    }

    /// Normalized primary name (the command's identity).
    pub fn comparable(&self) -> String {
        normalize(&self.command)
    }

    pub fn aliases_comparable(&self) -> impl Iterator<Item = String> + '_ {
        self.aliases.iter().map(|a| normalize(a))
    }

    /// Primary name followed by aliases.
    pub fn invocation_names(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::once(self.command.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn invocation_names_comparable(&self) -> impl Iterator<Item = String> + '_ {
        self.invocation_names().map(normalize)
    }

    /// Non-blank help lines.
    pub fn help_lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.help
            .split(['\r', '\n'])
            .filter(|line| !line.trim().is_empty())
    }

    /// Whether `name` (any case, with or without slash) invokes this command.
    pub fn matches(&self, name: &str) -> bool {
        let wanted = normalize(name);
        self.invocation_names_comparable().any(|n| n == wanted)
    }
}
