//! Dispatcher - the boundary between the host and command code.
//!
//! ```text
//! dispatch(name, line)
//!   ├─ registry disposed?        -> DispatchError::Disposed
//!   ├─ nesting too deep?         -> DispatchError::RecursionLimit
//!   ├─ resolve name              -> DispatchError::UnknownCommand
//!   ├─ extract_flags(line)
//!   ├─ -h                        -> help hook, stop
//!   └─ Command::execute
//!        ├─ Ok(Outcome)          -> help hook if show_help
//!        ├─ Err(Assertion)       -> message to error hook
//!        ├─ Err(Failure)         -> every record to error hook
//!        └─ panic                -> caught, reported as Failure
//! ```
//!
//! Nothing a command or the help hook raises escapes `dispatch`. Precondition errors are
//! returned to the caller and, for top-level calls, also reported through the
//! error hook. Nested calls (a command dispatching another) leave reporting to
//! the calling command's own boundary.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, info, warn};

use crate::command::Invocation;
use crate::config::DispatchConfig;
use crate::error::{CommandError, DispatchError, Failure};
use crate::host::{HelpRequest, Segment, Style};
use crate::parser::extract_flags;
use crate::registry::CommandRegistry;

/// Routes invocations to registered commands.
#[derive(Debug)]
pub struct Dispatcher {
    registry: CommandRegistry,
    max_depth: usize,
    depth: Cell<usize>,
}

/// Increments the nesting counter for the lifetime of one dispatch.
struct DepthGuard<'a>(&'a Cell<usize>);

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self(depth)
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry) -> Self {
        Self::with_config(registry, &DispatchConfig::default())
    }

    /// A `max_depth` of 0 is treated as 1 so top-level calls always run.
    pub fn with_config(registry: CommandRegistry, config: &DispatchConfig) -> Self {
        if config.max_depth == 0 {
            warn!("dispatch.max_depth = 0 would reject every command; using 1");
        }
        Self {
            registry,
            max_depth: config.max_depth.max(1),
            depth: Cell::new(0),
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Current nesting level; 0 outside of any dispatch.
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Dispose the registry and every command in it.
    pub fn dispose(&mut self) {
        self.registry.dispose();
    }

    /// Run `command` with the raw argument line `arg_line`.
    pub fn dispatch(&self, command: &str, arg_line: &str) -> Result<(), DispatchError> {
        if self.registry.is_disposed() {
            let err = DispatchError::Disposed {
                command: command.to_string(),
            };
            error!("{}", err);
            self.report_precondition(&err);
            return Err(err);
        }

        if self.depth.get() >= self.max_depth {
            let err = DispatchError::RecursionLimit {
                command: command.to_string(),
                limit: self.max_depth,
            };
            warn!("{}", err);
            self.report_precondition(&err);
            return Err(err);
        }

        let Some(entry) = self.registry.resolve(command) else {
            let err = DispatchError::UnknownCommand {
                command: command.to_string(),
                suggestion: self.registry.suggest(command),
            };
            warn!("{}", err);
            self.report_precondition(&err);
            return Err(err);
        };

        let _guard = DepthGuard::enter(&self.depth);
        info!("Command invocation: [{}] [{}]", command, arg_line);

        let (flags, arguments) = extract_flags(arg_line).into_parts();
        debug!("Parsed flags: {}", flags);
        debug!("Remaining argument line: [{}]", arguments);

        let invocation = Invocation {
            command,
            arguments: &arguments,
            flags: &flags,
            verbose: flags.verbose(),
            dry_run: flags.dry_run(),
            info: entry.info(),
        };

        if flags.help() {
            self.show_help(&invocation);
            return Ok(());
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            entry.command().execute(&invocation, self)
        }));

        match result {
            Ok(Ok(outcome)) => {
                if outcome.show_help {
                    self.show_help(&invocation);
                }
            }
            Ok(Err(CommandError::Assertion(message))) => {
                error!("Command assert failed: {}: {}", entry.info().command, message);
                self.report(&format!("Internal assertion check failed:\n{}", message), &[]);
            }
            Ok(Err(CommandError::Failure(failure))) => {
                self.report_failure(entry.info().command.as_str(), &failure);
            }
            Err(payload) => {
                let failure = Failure::panic(payload.as_ref());
                self.report_failure(entry.info().command.as_str(), &failure);
            }
        }
        Ok(())
    }

    /// Dispatch a full command line (`"/echo -? hi"`): the first token names
    /// the command, the rest is its argument line. Blank lines are ignored.
    pub fn dispatch_line(&self, line: &str) -> Result<(), DispatchError> {
        let line = line.trim();
        if line.is_empty() {
            debug!("Ignoring blank command line");
            return Ok(());
        }
        let (name, rest) = match line.find(char::is_whitespace) {
            Some(end) => (&line[..end], line[end..].trim_start()),
            None => (line, ""),
        };
        self.dispatch(name, rest)
    }

    fn show_help(&self, invocation: &Invocation<'_>) {
        let Some(handler) = self.registry.help_handler() else {
            debug!("No help handler for {}", invocation.info.command);
            return;
        };
        let request = HelpRequest {
            command: Some(invocation.info),
            context: invocation.command,
            flags: invocation.flags,
            verbose: invocation.verbose,
            dry_run: invocation.dry_run,
        };
        let result = panic::catch_unwind(AssertUnwindSafe(|| handler.show_help(&request)));
        if let Err(payload) = result {
            let failure = Failure::panic(payload.as_ref());
            self.report_failure(invocation.info.command.as_str(), &failure);
        }
    }

    fn report(&self, message: &str, segments: &[Segment]) {
        match self.registry.error_handler() {
            Some(handler) => handler.report_error(message, segments),
            None => debug!("No error handler; dropped: {}", message),
        }
    }

    fn report_precondition(&self, err: &DispatchError) {
        if self.depth.get() == 0 {
            self.report(&err.to_string(), &[]);
        }
    }

    fn report_failure(&self, command: &str, failure: &Failure) {
        error!("Command invocation failed: {}: {:?}", command, failure);
        for record in failure.records() {
            self.report(
                &format!("{}: {}\n", record.kind, record.message),
                &[
                    Segment::Style(Style::Quiet),
                    Segment::Text(record.location_label()),
                    Segment::Style(Style::Reset),
                ],
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandSpec;
    use std::rc::Rc;

    use crate::host::HelpHandler;
    use crate::test_support::{Behaviour, Event, StubCommand, CallLog, RecordingHost, registry_with};

    /// Help hook that always panics.
    struct ExplodingHelp;

    impl HelpHandler for ExplodingHelp {
        fn show_help(&self, _: &HelpRequest<'_>) {
            panic!("help exploded");
        }
    }

    fn with_exploding_help(host: &Rc<RecordingHost>, behaviour: Behaviour) -> Dispatcher {
        let mut registry = CommandRegistry::new();
        registry.set_help_handler(Rc::new(ExplodingHelp)).unwrap();
        registry.set_error_handler(host.clone()).unwrap();
        registry
            .register(StubCommand::new(CommandSpec::new("/echo")).with_behaviour(behaviour))
            .unwrap();
        Dispatcher::new(registry)
    }

    fn echo_stub(log: &CallLog) -> StubCommand {
        StubCommand::new(CommandSpec::new("/echo").aliases(["/e"])).with_log(log)
    }

    #[test]
    fn verbose_echo_end_to_end() {
        let host = RecordingHost::new();
        let log = CallLog::default();
        let mut registry = registry_with(&host);
        registry.register(echo_stub(&log)).unwrap();
        let dispatcher = Dispatcher::new(registry);

        dispatcher.dispatch("/echo", "-? hello world").unwrap();

        let seen = log.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].command, "/echo");
        assert_eq!(seen[0].flags, "-?");
        assert_eq!(seen[0].arguments, "hello world");
        assert!(seen[0].verbose);
        assert!(!seen[0].dry_run);
        assert!(host.errors().is_empty());
        assert_eq!(dispatcher.depth(), 0);
    }

    #[test]
    fn help_flag_skips_execute() {
        let host = RecordingHost::new();
        let log = CallLog::default();
        let mut registry = registry_with(&host);
        registry.register(echo_stub(&log)).unwrap();
        let dispatcher = Dispatcher::new(registry);

        dispatcher.dispatch("/E", "-h").unwrap();

        assert!(log.seen().is_empty());
        assert_eq!(
            host.events(),
            vec![Event::Help {
                command: Some("/echo".into()),
                context: "/E".into(),
            }]
        );
    }

    #[test]
    fn show_help_outcome_runs_help_after_execute() {
        let host = RecordingHost::new();
        let log = CallLog::default();
        let mut registry = registry_with(&host);
        registry
            .register(echo_stub(&log).with_behaviour(Behaviour::ShowHelp))
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        dispatcher.dispatch("echo", "").unwrap();

        assert_eq!(log.seen().len(), 1);
        assert!(matches!(host.events().as_slice(), [Event::Help { .. }]));
    }

    #[test]
    fn missing_help_handler_is_tolerated() {
        let log = CallLog::default();
        let mut registry = CommandRegistry::new();
        registry
            .register(echo_stub(&log).with_behaviour(Behaviour::ShowHelp))
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        assert!(dispatcher.dispatch("/echo", "-h").is_ok());
        assert!(dispatcher.dispatch("/echo", "x").is_ok());
        assert_eq!(log.seen().len(), 1);
    }

    #[test]
    fn assertion_reports_message_only() {
        let host = RecordingHost::new();
        let log = CallLog::default();
        let mut registry = registry_with(&host);
        registry
            .register(echo_stub(&log).with_behaviour(Behaviour::Assert("need a target")))
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        assert!(dispatcher.dispatch("/echo", "").is_ok());
        assert_eq!(
            host.errors(),
            vec!["Internal assertion check failed:\nneed a target".to_string()]
        );
    }

    #[test]
    fn failure_chain_reported_most_specific_first() {
        let host = RecordingHost::new();
        let log = CallLog::default();
        let mut registry = registry_with(&host);
        registry
            .register(echo_stub(&log).with_behaviour(Behaviour::Fail))
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        assert!(dispatcher.dispatch("/echo", "").is_ok());
        let errors = host.errors();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("Inner: disk full\nat "));
        assert!(errors[0].contains("test_support.rs"));
        assert!(errors[1].starts_with("Outer: save failed\nat "));
    }

    #[test]
    fn panic_is_contained() {
        let host = RecordingHost::new();
        let log = CallLog::default();
        let mut registry = registry_with(&host);
        registry
            .register(echo_stub(&log).with_behaviour(Behaviour::Panic))
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        assert!(dispatcher.dispatch("/echo", "").is_ok());
        assert_eq!(
            host.errors(),
            vec!["panic: stub exploded\nat unknown location".to_string()]
        );
        assert_eq!(dispatcher.depth(), 0);
    }

    #[test]
    fn panicking_help_flag_hook_is_contained() {
        let host = RecordingHost::new();
        let dispatcher = with_exploding_help(&host, Behaviour::Succeed);

        let escaped = panic::catch_unwind(AssertUnwindSafe(|| dispatcher.dispatch("/echo", "-h")));

        assert!(matches!(escaped, Ok(Ok(()))));
        assert_eq!(
            host.errors(),
            vec!["panic: help exploded\nat unknown location".to_string()]
        );
        assert_eq!(dispatcher.depth(), 0);
    }

    #[test]
    fn panicking_help_after_execute_is_contained() {
        let host = RecordingHost::new();
        let dispatcher = with_exploding_help(&host, Behaviour::ShowHelp);

        let escaped = panic::catch_unwind(AssertUnwindSafe(|| dispatcher.dispatch("/echo", "")));

        assert!(matches!(escaped, Ok(Ok(()))));
        assert_eq!(
            host.errors(),
            vec!["panic: help exploded\nat unknown location".to_string()]
        );
    }

    #[test]
    fn zero_depth_limit_still_runs_top_level() {
        let host = RecordingHost::new();
        let log = CallLog::default();
        let mut registry = registry_with(&host);
        registry.register(echo_stub(&log)).unwrap();
        registry
            .register(
                StubCommand::new(CommandSpec::new("/outer"))
                    .with_log(&log)
                    .with_behaviour(Behaviour::Redispatch("/echo nested")),
            )
            .unwrap();
        let dispatcher = Dispatcher::with_config(registry, &DispatchConfig { max_depth: 0 });

        dispatcher.dispatch("/echo", "top").unwrap();
        assert_eq!(log.seen().len(), 1);
        assert!(host.errors().is_empty());

        dispatcher.dispatch("/outer", "").unwrap();
        assert_eq!(log.seen().len(), 2);
        let errors = host.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("depth limit of 1"));
    }

    #[test]
    fn disposed_dispatch_is_rejected_and_reported() {
        let host = RecordingHost::new();
        let log = CallLog::default();
        let mut registry = registry_with(&host);
        registry.register(echo_stub(&log)).unwrap();
        let mut dispatcher = Dispatcher::new(registry);

        dispatcher.dispose();
        let err = dispatcher.dispatch("/echo", "hi").unwrap_err();

        assert!(matches!(err, DispatchError::Disposed { .. }));
        assert!(log.seen().is_empty());
        assert_eq!(host.errors().len(), 1);
        assert_eq!(log.disposed(), vec!["/echo"]);
    }

    #[test]
    fn unknown_command_suggests() {
        let host = RecordingHost::new();
        let log = CallLog::default();
        let mut registry = registry_with(&host);
        registry.register(echo_stub(&log)).unwrap();
        let dispatcher = Dispatcher::new(registry);

        let err = dispatcher.dispatch("/ecoh", "").unwrap_err();
        assert_eq!(
            err,
            DispatchError::UnknownCommand {
                command: "/ecoh".into(),
                suggestion: Some("/echo".into()),
            }
        );
        assert_eq!(host.errors(), vec![err.to_string()]);
    }

    #[test]
    fn nested_dispatch_reaches_target() {
        let host = RecordingHost::new();
        let outer = CallLog::default();
        let inner = CallLog::default();
        let mut registry = registry_with(&host);
        registry
            .register(
                StubCommand::new(CommandSpec::new("/outer"))
                    .with_log(&outer)
                    .with_behaviour(Behaviour::Redispatch("/inner   -! some text")),
            )
            .unwrap();
        registry
            .register(StubCommand::new(CommandSpec::new("/inner")).with_log(&inner))
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        dispatcher.dispatch("/outer", "").unwrap();

        let seen = inner.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].arguments, "some text");
        assert!(seen[0].dry_run);
        assert!(host.errors().is_empty());
    }

    #[test]
    fn nested_unknown_is_reported_once_by_caller() {
        let host = RecordingHost::new();
        let log = CallLog::default();
        let mut registry = registry_with(&host);
        registry
            .register(
                StubCommand::new(CommandSpec::new("/outer"))
                    .with_log(&log)
                    .with_behaviour(Behaviour::Redispatch("/nowhere")),
            )
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        assert!(dispatcher.dispatch("/outer", "").is_ok());
        let errors = host.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("DispatchError: unknown command '/nowhere'"));
    }

    #[test]
    fn self_referential_chain_hits_depth_limit() {
        let host = RecordingHost::new();
        let log = CallLog::default();
        let mut registry = registry_with(&host);
        registry
            .register(
                StubCommand::new(CommandSpec::new("/loop"))
                    .with_log(&log)
                    .with_behaviour(Behaviour::Redispatch("/loop")),
            )
            .unwrap();
        let dispatcher = Dispatcher::with_config(registry, &DispatchConfig { max_depth: 4 });

        assert!(dispatcher.dispatch("/loop", "").is_ok());
        assert_eq!(log.seen().len(), 4);
        let errors = host.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("depth limit of 4"));
        assert_eq!(dispatcher.depth(), 0);
    }

    #[test]
    fn dispatch_line_splits_name() {
        let host = RecordingHost::new();
        let log = CallLog::default();
        let mut registry = registry_with(&host);
        registry.register(echo_stub(&log)).unwrap();
        let dispatcher = Dispatcher::new(registry);

        dispatcher.dispatch_line("  /e   -? hi there ").unwrap();
        dispatcher.dispatch_line("   ").unwrap();

        let seen = log.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].command, "/e");
        assert_eq!(seen[0].arguments, "hi there");
    }
}
