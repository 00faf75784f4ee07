//! # tinycmds
//!
//! Terminal host for the tinycmds dispatcher. Reads command lines from stdin
//! (or a single `-c` line) and prints messages, errors and help pages to the
//! terminal.
//!
//! ```bash
//! tinycmds -c "/echo -? hello"
//! printf '/ifjob WHM /echo healing time\n' | tinycmds --config demo.toml
//! tinycmds --list --json
//! ```

use std::any::Any;
use std::io::{self, BufRead, IsTerminal};
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::{ColoredString, Colorize};
use tracing::{debug, info};

use tinycmds::host::{ErrorHandler, HelpSurface, HelpTarget, Notifier, Segment, Style};
use tinycmds::{
    CommandRegistry, CommandSpec, ConditionalCommand, Dispatcher, DisplayCommandHelp, EchoCommand,
    MembershipPredicate, SurfaceHelp, TinyConfig,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "tinycmds")]
#[command(about = "Run slash commands through the tinycmds dispatcher")]
#[command(version)]
struct Args {
    /// Config file (default: .tinycmds/config.toml in the current directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Print every registered command name and exit
    #[arg(long)]
    list: bool,

    /// Print the command names as JSON (implies --list)
    #[arg(long)]
    json: bool,

    /// Dispatch a single command line and exit
    #[arg(short = 'c', long = "command", value_name = "LINE")]
    command: Option<String>,
}

// ============================================================================
// Terminal host
// ============================================================================

struct TerminalHost {
    prefix: String,
}

impl TerminalHost {
    fn new(prefix: &str) -> Rc<Self> {
        Rc::new(Self {
            prefix: prefix.to_string(),
        })
    }

    fn paint(text: &str, style: Style) -> ColoredString {
        match style {
            Style::Reset => text.normal(),
            Style::Quiet => text.dimmed(),
            Style::HighlightFailed => text.red().bold(),
            Style::ConditionPassed => text.green(),
            Style::ConditionFailed => text.yellow(),
            Style::Command => text.cyan(),
        }
    }

    fn render(segments: &[Segment]) -> String {
        let mut style = Style::Reset;
        let mut out = String::new();
        for segment in segments {
            match segment {
                Segment::Style(next) => style = *next,
                Segment::Text(text) => out.push_str(&Self::paint(text, style).to_string()),
            }
        }
        out
    }
}

impl Notifier for TerminalHost {
    fn show_message(&self, segments: &[Segment]) {
        println!("[{}] {}", self.prefix.bold(), Self::render(segments));
    }

    fn show_error(&self, segments: &[Segment]) {
        eprintln!("[{}] {}", self.prefix.red().bold(), Self::render(segments));
    }
}

impl ErrorHandler for TerminalHost {
    fn report_error(&self, message: &str, segments: &[Segment]) {
        eprintln!(
            "[{}] {}{}",
            self.prefix.red().bold(),
            message.red(),
            Self::render(segments)
        );
    }
}

impl HelpSurface for TerminalHost {
    fn open(&self, target: HelpTarget<'_>) -> bool {
        match target {
            HelpTarget::Overview(commands) => {
                println!("{}", "Available commands:".bold());
                for info in commands {
                    println!("  {:<24} {}", info.usage.cyan(), info.summary);
                }
            }
            HelpTarget::Command(info) => {
                println!("{} - {}", info.command.cyan().bold(), info.summary);
                println!("Usage: {}", info.usage);
                if !info.aliases.is_empty() {
                    println!("Aliases: {}", info.aliases.join(", "));
                }
                for line in info.help_lines() {
                    println!("  {}", line);
                }
            }
        }
        true
    }

    fn close_all(&self) {
        debug!("Terminal help pages cannot be closed; nothing to do");
    }
}

// ============================================================================
// Setup
// ============================================================================

fn build_dispatcher(config: &TinyConfig, host: &Rc<TerminalHost>) -> Result<Dispatcher> {
    let mut registry = CommandRegistry::from_config(&config.registry);
    registry.set_error_handler(host.clone())?;
    registry.set_help_handler(Rc::new(SurfaceHelp(host.clone())))?;

    registry
        .register(EchoCommand::new(host.clone()))
        .context("registering /echo")?;
    registry
        .register(DisplayCommandHelp::new(host.clone(), host.clone()))
        .context("registering /tinyhelp")?;

    let job = config.fact("job").map(str::to_string);
    registry
        .register(ConditionalCommand::new(
            CommandSpec::new("/ifjob")
                .aliases(["/ifclass", "/whenjob", "/whenclass"])
                .summary("Run a command only when you are on one of the given jobs")
                .arguments("[-n] JOB[,JOB...] [command...]")
                .help_lines([
                    "Tests the current job (facts.job) against a comma-separated list.",
                    "A /command after the list runs on a match, other text is shown.",
                    "Pass -n to act when the job is NOT in the list.",
                ]),
            MembershipPredicate::new("You are currently a", move || job.clone()),
            host.clone(),
        ))
        .context("registering /ifjob")?;

    info!("Registered {} commands", registry.len());
    Ok(Dispatcher::with_config(registry, &config.dispatch))
}

fn print_bindings(dispatcher: &Dispatcher, json: bool) -> Result<()> {
    let bindings = dispatcher.registry().host_bindings();
    if json {
        println!("{}", serde_json::to_string_pretty(&bindings)?);
        return Ok(());
    }
    for binding in &bindings {
        if binding.name == binding.target {
            println!("{:<14} {}", binding.name.cyan(), binding.summary);
        } else {
            println!("{:<14} {} {}", binding.name, "->".dimmed(), binding.target);
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.parse().unwrap_or_default()),
        )
        .init();

    if !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let config = match &args.config {
        Some(path) => TinyConfig::load_from_path(path),
        None => TinyConfig::load(&std::env::current_dir().context("resolving current directory")?),
    };
    debug!("Loaded config: {:?}", config);

    let host = TerminalHost::new(&config.chat.prefix);
    let mut dispatcher = build_dispatcher(&config, &host)?;

    if args.list || args.json {
        print_bindings(&dispatcher, args.json)?;
        return Ok(ExitCode::SUCCESS);
    }

    let code = match &args.command {
        Some(line) => match dispatcher.dispatch_line(line) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                debug!("Dispatch rejected: {}", e);
                ExitCode::FAILURE
            }
        },
        None => {
            for line in io::stdin().lock().lines() {
                let line = line.context("reading command line from stdin")?;
                if let Err(e) = dispatcher.dispatch_line(&line) {
                    debug!("Dispatch rejected: {}", e);
                }
            }
            ExitCode::SUCCESS
        }
    };

    dispatcher.dispose();
    Ok(code)
}

fn install_broken_pipe_handler() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let is_broken = <dyn Any>::downcast_ref::<&str>(payload)
            .is_some_and(|s| s.contains("Broken pipe"))
            || <dyn Any>::downcast_ref::<String>(payload)
                .is_some_and(|s| s.contains("Broken pipe"));

        if is_broken {
            // Quietly exit when downstream closes the pipe (e.g. piping to `head`).
            std::process::exit(0);
        }

        default_hook(info);
    }));
}

fn main() -> ExitCode {
    install_broken_pipe_handler();

    match run(Args::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("[tinycmds] Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
