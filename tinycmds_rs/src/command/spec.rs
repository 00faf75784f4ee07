//! CommandSpec - the literal metadata a command declares about itself.

/// Static description of a command, returned by `Command::spec`.
///
/// Names may be given with or without the leading slash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    /// Primary invocation name (`"/tinyhelp"` or `"tinyhelp"`)
    pub name: String,

    /// Alternative names, in the order they should be listed
    pub aliases: Vec<String>,

    /// One-line description for listings
    pub summary: String,

    /// Extended help, one paragraph per line
    pub help: String,

    /// Argument description appended to the usage line (`"command...?"`)
    pub arguments: String,

    /// Leave the command out of help listings
    pub hide_in_listing: bool,

    /// Ask the host not to show the command in its own help output
    pub hide_in_help: bool,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Help text built from separate lines, joined with `\n`.
    pub fn help_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.help = lines
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        self
    }

    pub fn arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = arguments.into();
        self
    }

    pub fn hidden_from_listing(mut self) -> Self {
        self.hide_in_listing = true;
        self
    }

    pub fn hidden_from_help(mut self) -> Self {
        self.hide_in_help = true;
        self
    }
}
