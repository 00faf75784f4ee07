//! Conditional commands - run something only when a host-side condition holds.
//!
//! Argument line: `[-n] <subject> [action...]`
//!
//! - `subject` is handed to the [`Predicate`] (e.g. `WHM,SCH`)
//! - `-n` inverts the result
//! - `action` starting with `/` is dispatched as a nested command line; any
//!   other text is shown as a literal message. Without an action, a
//!   passed/failed notification is shown instead.

use std::rc::Rc;

use tracing::debug;

use crate::command::{Command, CommandSpec, Invocation, Outcome};
use crate::dispatch::Dispatcher;
use crate::error::{CommandResult, ensure};
use crate::host::{Notifier, Segment, Style};

/// Flag that inverts the condition.
pub const INVERT: char = 'n';

/// Result of testing a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub matched: bool,
    /// Lead-in for notifications (`"You are currently a"`)
    pub description: String,
    /// The value that was tested (`"WHM"`)
    pub value: String,
}

/// Host-side condition. Implementations read whatever state they need.
pub trait Predicate {
    fn test(&self, subject: &str) -> CommandResult<Verdict>;
}

/// Whether a conditional fires for a predicate result and the invert flag.
pub fn fires(matched: bool, invert: bool) -> bool {
    matched ^ invert
}

/// Matches a comma-separated subject (`"WHM,SCH,AST"`) against a current
/// value supplied by the host, ignoring case.
pub struct MembershipPredicate<F> {
    description: String,
    current: F,
}

impl<F> MembershipPredicate<F>
where
    F: Fn() -> Option<String>,
{
    pub fn new(description: impl Into<String>, current: F) -> Self {
        Self {
            description: description.into(),
            current,
        }
    }
}

impl<F> Predicate for MembershipPredicate<F>
where
    F: Fn() -> Option<String>,
{
    fn test(&self, subject: &str) -> CommandResult<Verdict> {
        let current = (self.current)().map(|v| v.trim().to_uppercase());
        let current = current.unwrap_or_default();
        ensure(!current.is_empty(), "Current value is not available")?;

        let matched = subject
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .any(|wanted| wanted == current);

        Ok(Verdict {
            matched,
            description: self.description.clone(),
            value: current,
        })
    }
}

/// Outcome of one conditional run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub fired: bool,
    pub show_help: bool,
}

pub struct ConditionalCommand<P> {
    spec: CommandSpec,
    predicate: P,
    notifier: Rc<dyn Notifier>,
}

impl<P: Predicate> ConditionalCommand<P> {
    pub fn new(spec: CommandSpec, predicate: P, notifier: Rc<dyn Notifier>) -> Self {
        Self {
            spec,
            predicate,
            notifier,
        }
    }

    /// Test the condition and act on it. Returns whether it fired.
    pub fn try_execute(
        &self,
        invocation: &Invocation<'_>,
        dispatcher: &Dispatcher,
    ) -> CommandResult<Evaluation> {
        let args = invocation.arguments.trim_start();
        let (subject, action) = match args.find(char::is_whitespace) {
            Some(end) => (&args[..end], args[end..].trim()),
            None => (args, ""),
        };

        if subject.is_empty() {
            return Ok(Evaluation {
                fired: false,
                show_help: true,
            });
        }

        let verdict = self.predicate.test(subject)?;
        let invert = invocation.flags.has(INVERT);
        let fired = fires(verdict.matched, invert);
        debug!(
            "{}: matched={} invert={} fired={}",
            invocation.info.command, verdict.matched, invert, fired
        );

        if fired {
            if action.is_empty() {
                self.notify(Style::ConditionPassed, &verdict);
            } else {
                self.run_action(action, invocation, dispatcher)?;
            }
        } else if action.is_empty() {
            self.notify(Style::ConditionFailed, &verdict);
        }

        Ok(Evaluation {
            fired,
            show_help: false,
        })
    }

    fn notify(&self, style: Style, verdict: &Verdict) {
        self.notifier.show_message(&[
            Segment::Style(style),
            Segment::text(format!("{} ", verdict.description)),
            Segment::Style(Style::Command),
            Segment::text(verdict.value.as_str()),
            Segment::Style(Style::Reset),
        ]);
    }

    fn run_action(
        &self,
        action: &str,
        invocation: &Invocation<'_>,
        dispatcher: &Dispatcher,
    ) -> CommandResult<()> {
        let is_command = action.starts_with('/');
        if invocation.verbose || invocation.dry_run {
            let lead = match (is_command, invocation.dry_run) {
                (true, true) => "Would run: ",
                (true, false) => "Running: ",
                (false, true) => "Would show: ",
                (false, false) => "Showing: ",
            };
            self.notifier.show_message(&[
                Segment::Style(Style::Quiet),
                lead.into(),
                Segment::Style(Style::Command),
                action.into(),
                Segment::Style(Style::Reset),
            ]);
        }
        if invocation.dry_run {
            return Ok(());
        }

        if is_command {
            dispatcher.dispatch_line(action)?;
        } else {
            self.notifier.show_message(&[action.into()]);
        }
        Ok(())
    }
}

impl<P: Predicate> Command for ConditionalCommand<P> {
    fn spec(&self) -> CommandSpec {
        self.spec.clone()
    }

    fn modify_help(&self, original: String) -> String {
        let mut help = original;
        if !help.is_empty() {
            help.push('\n');
        }
        help.push_str("After the test: a /command is dispatched, other text is shown.");
        help
    }

    fn execute(
        &self,
        invocation: &Invocation<'_>,
        dispatcher: &Dispatcher,
    ) -> CommandResult<Outcome> {
        let evaluation = self.try_execute(invocation, dispatcher)?;
        debug!("{} fired: {}", invocation.info.command, evaluation.fired);
        Ok(Outcome {
            show_help: evaluation.show_help,
        })
    }
}
