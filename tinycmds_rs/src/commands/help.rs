//! Help display command and the help hook that routes to the same surface.

use std::rc::Rc;

use tracing::debug;

use crate::command::{Command, CommandSpec, Invocation, Outcome, normalize};
use crate::dispatch::Dispatcher;
use crate::error::CommandResult;
use crate::host::{HelpHandler, HelpRequest, HelpSurface, HelpTarget, Notifier, Segment, Style};

/// Flag that closes every open help page first.
pub const CLOSE_ALL: char = 'o';

pub struct DisplayCommandHelp {
    surface: Rc<dyn HelpSurface>,
    notifier: Rc<dyn Notifier>,
}

impl DisplayCommandHelp {
    pub fn new(surface: Rc<dyn HelpSurface>, notifier: Rc<dyn Notifier>) -> Self {
        Self { surface, notifier }
    }

    fn page_missing(&self, command: &str) {
        self.notifier.show_error(&[
            "An internal error occurred - the help page for ".into(),
            Segment::Style(Style::HighlightFailed),
            command.into(),
            Segment::Style(Style::Reset),
            " could not be found.".into(),
        ]);
    }
}

impl Command for DisplayCommandHelp {
    fn spec(&self) -> CommandSpec {
        CommandSpec::new("/tinyhelp")
            .aliases(["/thelp", "/tinycmd", "/tcmd"])
            .summary("Displays usage/help for the plugin's commands")
            .arguments("command...?")
            .help_lines([
                "Opens the help page for each named command, or the command list if none given.",
                "Pass -o to close all open help pages first.",
            ])
    }

    fn execute(
        &self,
        invocation: &Invocation<'_>,
        dispatcher: &Dispatcher,
    ) -> CommandResult<Outcome> {
        let close_all = invocation.flags.has(CLOSE_ALL);
        if close_all {
            debug!("Closing all help pages");
            self.surface.close_all();
        }

        let registry = dispatcher.registry();
        let mut names = invocation.arguments.split_whitespace().peekable();

        if names.peek().is_none() {
            if !close_all && !self.surface.open(HelpTarget::Overview(registry.listing())) {
                self.page_missing(&invocation.info.command);
            }
            return Ok(Outcome::done());
        }

        for name in names {
            match registry.resolve(name) {
                Some(entry) => {
                    let info = entry.info();
                    if !self.surface.open(HelpTarget::Command(info)) {
                        self.page_missing(&info.command);
                    }
                }
                None => {
                    let mut segments = vec![
                        Segment::text("Couldn't find command "),
                        Segment::Style(Style::HighlightFailed),
                        Segment::text(format!("/{}", normalize(name))),
                        Segment::Style(Style::Reset),
                    ];
                    if let Some(suggestion) = registry.suggest(name) {
                        segments.push(Segment::text(" - did you mean "));
                        segments.push(Segment::Style(Style::Command));
                        segments.push(Segment::text(suggestion));
                        segments.push(Segment::Style(Style::Reset));
                        segments.push(Segment::text("?"));
                    }
                    self.notifier.show_error(&segments);
                }
            }
        }

        Ok(Outcome::done())
    }
}

/// Help hook that opens the command's page on a [`HelpSurface`].
pub struct SurfaceHelp(pub Rc<dyn HelpSurface>);

impl HelpHandler for SurfaceHelp {
    fn show_help(&self, request: &HelpRequest<'_>) {
        match request.command {
            Some(info) => {
                if !self.0.open(HelpTarget::Command(info)) {
                    debug!("No help page for {}", info.command);
                }
            }
            None => debug!("Help requested for unresolved name {}", request.context),
        }
    }
}
