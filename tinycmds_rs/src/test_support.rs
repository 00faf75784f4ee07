//! Recording host and stub command shared by the unit tests.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::command::{Command, CommandSpec, Invocation, Outcome};
use crate::dispatch::Dispatcher;
use crate::error::{CommandError, CommandResult, Failure};
use crate::host::{
    ErrorHandler, HelpHandler, HelpRequest, HelpSurface, HelpTarget, Notifier, Segment, plain_text,
};
use crate::registry::CommandRegistry;

/// Everything a host was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Message(String),
    Error(String),
    Help {
        command: Option<String>,
        context: String,
    },
    Open(String),
    CloseAll,
}

#[derive(Default)]
pub struct RecordingHost {
    events: RefCell<Vec<Event>>,
    missing: RefCell<HashSet<String>>,
}

impl RecordingHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Make `open` fail for this command, as if the host had no page for it.
    pub fn without_page(&self, command: &str) {
        self.missing.borrow_mut().insert(command.to_string());
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Error(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Message(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl Notifier for RecordingHost {
    fn show_message(&self, segments: &[Segment]) {
        self.push(Event::Message(plain_text(segments)));
    }

    fn show_error(&self, segments: &[Segment]) {
        self.push(Event::Error(plain_text(segments)));
    }
}

impl ErrorHandler for RecordingHost {
    fn report_error(&self, message: &str, segments: &[Segment]) {
        self.push(Event::Error(format!("{}{}", message, plain_text(segments))));
    }
}

impl HelpHandler for RecordingHost {
    fn show_help(&self, request: &HelpRequest<'_>) {
        self.push(Event::Help {
            command: request.command.map(|c| c.command.clone()),
            context: request.context.to_string(),
        });
    }
}

impl HelpSurface for RecordingHost {
    fn open(&self, target: HelpTarget<'_>) -> bool {
        match target {
            HelpTarget::Overview(commands) => {
                let names: Vec<_> = commands.iter().map(|c| c.command.as_str()).collect();
                self.push(Event::Open(format!("<overview: {}>", names.join(" "))));
                true
            }
            HelpTarget::Command(info) => {
                if self.missing.borrow().contains(&info.command) {
                    return false;
                }
                self.push(Event::Open(info.command.clone()));
                true
            }
        }
    }

    fn close_all(&self) {
        self.push(Event::CloseAll);
    }
}

/// Registry with `host` installed as both help and error handler.
pub fn registry_with(host: &Rc<RecordingHost>) -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry
        .set_help_handler(host.clone())
        .expect("fresh registry");
    registry
        .set_error_handler(host.clone())
        .expect("fresh registry");
    registry
}

/// What a stub saw of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub command: String,
    pub arguments: String,
    pub flags: String,
    pub verbose: bool,
    pub dry_run: bool,
}

#[derive(Default)]
struct CallState {
    seen: Vec<Seen>,
    disposed: Vec<String>,
    initialised: usize,
}

/// Shared log a test keeps after handing the stub to a registry.
#[derive(Default, Clone)]
pub struct CallLog {
    inner: Rc<RefCell<CallState>>,
}

impl CallLog {
    pub fn seen(&self) -> Vec<Seen> {
        self.inner.borrow().seen.clone()
    }

    pub fn disposed(&self) -> Vec<String> {
        self.inner.borrow().disposed.clone()
    }

    pub fn initialised(&self) -> usize {
        self.inner.borrow().initialised
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Behaviour {
    Succeed,
    ShowHelp,
    Assert(&'static str),
    Fail,
    Panic,
    FailInit,
    Redispatch(&'static str),
}

/// Command that records its calls and then does what it is told.
pub struct StubCommand {
    spec: CommandSpec,
    log: CallLog,
    behaviour: Behaviour,
    help_suffix: Option<String>,
}

impl StubCommand {
    pub fn new(spec: CommandSpec) -> Self {
        Self {
            spec,
            log: CallLog::default(),
            behaviour: Behaviour::Succeed,
            help_suffix: None,
        }
    }

    pub fn with_log(mut self, log: &CallLog) -> Self {
        self.log = log.clone();
        self
    }

    pub fn with_behaviour(mut self, behaviour: Behaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    pub fn with_help_suffix(mut self, suffix: &str) -> Self {
        self.help_suffix = Some(suffix.to_string());
        self
    }
}

impl Command for StubCommand {
    fn spec(&self) -> CommandSpec {
        self.spec.clone()
    }

    fn modify_help(&self, original: String) -> String {
        match &self.help_suffix {
            Some(suffix) => format!("{}\n{}", original, suffix),
            None => original,
        }
    }

    fn initialise(&mut self) -> CommandResult<()> {
        self.log.inner.borrow_mut().initialised += 1;
        match self.behaviour {
            Behaviour::FailInit => Err(CommandError::Assertion("init failed".into())),
            _ => Ok(()),
        }
    }

    fn execute(
        &self,
        invocation: &Invocation<'_>,
        dispatcher: &Dispatcher,
    ) -> CommandResult<Outcome> {
        self.log.inner.borrow_mut().seen.push(Seen {
            command: invocation.command.to_string(),
            arguments: invocation.arguments.to_string(),
            flags: invocation.flags.to_string(),
            verbose: invocation.verbose,
            dry_run: invocation.dry_run,
        });

        match self.behaviour {
            Behaviour::Succeed | Behaviour::FailInit => Ok(Outcome::done()),
            Behaviour::ShowHelp => Ok(Outcome::with_help()),
            Behaviour::Assert(message) => Err(CommandError::Assertion(message.into())),
            Behaviour::Fail => Err(Failure::new("Inner", "disk full")
                .context("Outer", "save failed")
                .into()),
            Behaviour::Panic => panic!("stub exploded"),
            Behaviour::Redispatch(line) => {
                dispatcher.dispatch_line(line)?;
                Ok(Outcome::done())
            }
        }
    }

    fn dispose(&mut self) {
        self.log.inner.borrow_mut().disposed.push(self.spec.name.clone());
    }
}
