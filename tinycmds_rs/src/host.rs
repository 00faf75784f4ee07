//! Host collaborator traits.
//!
//! The dispatcher never renders anything itself. Output flows through these
//! traits, implemented by whatever embeds the library (a chat client, a
//! terminal, a test recorder).

use crate::command::CommandInfo;
use crate::flags::FlagMap;

/// Opaque styling markers. The library emits them, hosts interpret them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    /// Back to the host's default style
    Reset,
    /// De-emphasised detail (error locations)
    Quiet,
    /// Emphasis inside an error line
    HighlightFailed,
    /// A condition held
    ConditionPassed,
    /// A condition did not hold
    ConditionFailed,
    /// Command names and other literals
    Command,
}

/// Piece of a styled message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Style(Style),
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text(text.into())
    }
}

impl From<&str> for Segment {
    fn from(text: &str) -> Self {
        Segment::Text(text.to_string())
    }
}

impl From<String> for Segment {
    fn from(text: String) -> Self {
        Segment::Text(text)
    }
}

impl From<Style> for Segment {
    fn from(style: Style) -> Self {
        Segment::Style(style)
    }
}

/// Concatenate the text of `segments`, dropping style markers.
pub fn plain_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .filter_map(|s| match s {
            Segment::Text(t) => Some(t.as_str()),
            Segment::Style(_) => None,
        })
        .collect()
}

/// Where dispatch failures are reported.
pub trait ErrorHandler {
    fn report_error(&self, message: &str, segments: &[Segment]);
}

impl<F> ErrorHandler for F
where
    F: Fn(&str, &[Segment]),
{
    fn report_error(&self, message: &str, segments: &[Segment]) {
        self(message, segments)
    }
}

/// Everything the help hook gets to know about the invocation.
#[derive(Debug, Clone, Copy)]
pub struct HelpRequest<'a> {
    /// Resolved command, if the context name resolved to one
    pub command: Option<&'a CommandInfo>,
    /// Name the user typed
    pub context: &'a str,
    pub flags: &'a FlagMap,
    pub verbose: bool,
    pub dry_run: bool,
}

/// Generic "show help for this command" hook used by the dispatcher.
pub trait HelpHandler {
    fn show_help(&self, request: &HelpRequest<'_>);
}

impl<F> HelpHandler for F
where
    F: Fn(&HelpRequest<'_>),
{
    fn show_help(&self, request: &HelpRequest<'_>) {
        self(request)
    }
}

/// What a help surface should bring up.
#[derive(Debug, Clone)]
pub enum HelpTarget<'a> {
    /// General help, listing the given commands
    Overview(Vec<&'a CommandInfo>),
    /// Extended help for one command
    Command(&'a CommandInfo),
}

/// Host-side help presentation (windows, pages, inline text).
pub trait HelpSurface {
    /// Show `target`. Returns false if the host has nothing to show for it.
    fn open(&self, target: HelpTarget<'_>) -> bool;

    /// Dismiss everything previously opened.
    fn close_all(&self);
}

/// General message channel for command output.
pub trait Notifier {
    fn show_message(&self, segments: &[Segment]);

    fn show_error(&self, segments: &[Segment]);
}
