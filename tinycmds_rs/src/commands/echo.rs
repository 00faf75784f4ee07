//! Echo command - sends its argument text back through the notifier.

use std::rc::Rc;

use crate::command::{Command, CommandSpec, Invocation, Outcome};
use crate::dispatch::Dispatcher;
use crate::error::CommandResult;
use crate::host::{Notifier, Segment, Style};

pub struct EchoCommand {
    notifier: Rc<dyn Notifier>,
}

impl EchoCommand {
    pub fn new(notifier: Rc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

impl Command for EchoCommand {
    fn spec(&self) -> CommandSpec {
        CommandSpec::new("/echo")
            .aliases(["/e"])
            .summary("Echo text back to you")
            .arguments("text...")
            .help_lines([
                "Shows the given text as a message, exactly as typed.",
                "Pass -? to also see which flags were parsed, or -! to only preview the text.",
            ])
    }

    fn execute(
        &self,
        invocation: &Invocation<'_>,
        _: &Dispatcher,
    ) -> CommandResult<Outcome> {
        let text = invocation.arguments;
        if text.trim().is_empty() {
            return Ok(Outcome::with_help());
        }

        if invocation.verbose {
            self.notifier.show_message(&[
                Segment::Style(Style::Quiet),
                Segment::text(format!("{} flags: {}", invocation.info.command, invocation.flags)),
                Segment::Style(Style::Reset),
            ]);
        }

        if invocation.dry_run {
            self.notifier.show_message(&[
                Segment::Style(Style::Quiet),
                "Would echo: ".into(),
                Segment::Style(Style::Reset),
                text.into(),
            ]);
            return Ok(Outcome::done());
        }

        self.notifier.show_message(&[text.into()]);
        Ok(Outcome::done())
    }
}
