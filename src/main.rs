//! need - hierarchy-of-needs priorities for Taskwarrior
//!
//! Runs as the Taskwarrior `on-add` / `on-modify` hooks and as the `need`
//! companion command.

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm};
use need::{
    local_today, review, store, ConfigStore, HostAdapter, NeedError, PyramidReport, RcFile,
    RuleSet, SettingsUpdate, Span, TaskCli, TaskSource, Tier, TwDuration, CONTEXT_NAME,
};
use std::fs::OpenOptions;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "need")]
#[command(version)]
#[command(about = "Hierarchy-of-needs priority tiers and context filters for Taskwarrior", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to need.rc (defaults to ~/.task/hooks/priority/need.rc)
    #[arg(long, global = true, env = "NEED_RC")]
    rc: Option<PathBuf>,

    /// Taskwarrior binary to query
    #[arg(long, global = true, env = "NEED_TASK_BIN", default_value = "task")]
    task_bin: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the priority pyramid and the current context filter (default)
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set the visible window: a tier count (2) or a fixed tier range (2-4)
    Span {
        /// Tier count or range
        value: String,
    },

    /// Set how far ahead due/scheduled tasks are always shown (e.g. 2d, 1w)
    Lookahead {
        /// Duration in days (d) or weeks (w)
        value: String,
    },

    /// Set how long overdue tasks stay visible (e.g. 1w)
    Lookback {
        /// Duration in days (d) or weeks (w)
        value: String,
    },

    /// Recalculate and write the context filter now
    Update,

    /// Review pending tasks whose tier disagrees with the rules
    Review {
        /// Apply every suggestion without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Write a default need.rc
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the Taskwarrior configuration for the priority UDA
    Rc,

    /// Validate rules and settings
    Check,

    /// Taskwarrior hook entry point (reads task JSON on stdin)
    Hook {
        #[arg(value_enum)]
        event: HookEvent,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HookEvent {
    OnAdd,
    OnModify,
}

fn main() {
    let cli = Cli::parse();
    let is_hook = matches!(cli.command, Some(Commands::Hook { .. }));
    let rc = RcFile::new(cli.rc.clone().unwrap_or_else(RcFile::default_path));

    // Taskwarrior reads hook stdout, so hooks log to a file.
    let log_file = is_hook.then(|| rc.dir().join("logs").join("need.log"));
    init_tracing(cli.verbose, is_hook, log_file.as_deref());

    if let Err(e) = run(cli, rc) {
        let code = e.downcast_ref::<NeedError>().map_or(1, NeedError::exit_code);
        tracing::error!(error = %e, "need failed");
        if is_hook {
            // Taskwarrior shows hook stdout as the failure message.
            println!("need: {e:#}");
        } else {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
        }
        std::process::exit(code);
    }
}

fn init_tracing(verbose: bool, is_hook: bool, log_file: Option<&Path>) {
    let default = match (verbose, is_hook) {
        (true, _) => "need=debug,info",
        (false, true) => "need=info,warn",
        (false, false) => "need=warn",
    };
    let filter = EnvFilter::try_from_env("NEED_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let file = log_file.and_then(|path| {
        std::fs::create_dir_all(path.parent()?).ok()?;
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    match file {
        Some(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        None => builder.with_writer(std::io::stderr).init(),
    }
}

fn run(cli: Cli, mut rc: RcFile) -> anyhow::Result<()> {
    let Cli {
        task_bin, command, ..
    } = cli;

    match command.unwrap_or(Commands::Status { json: false }) {
        Commands::Status { json } => {
            let tasks = TaskCli::locate(&task_bin)?;
            let pending = tasks.pending_tasks()?;
            let active = tasks.active_context().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Cannot read active context");
                None
            });
            let report = PyramidReport::new(
                &pending,
                rc.read_settings()?,
                rc.read_filter()?,
                active,
                local_today(),
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render());
            }
        }

        Commands::Span { value } => {
            let span: Span = value
                .parse()
                .map_err(|e| NeedError::invalid("span", format!("{e}")))?;
            rc.write_settings(&SettingsUpdate {
                span: Some(span.to_string()),
                ..Default::default()
            })?;
            println!("{} Priority span set to {}", "OK".green().bold(), span);
            refresh(&rc, &task_bin)?;
        }

        Commands::Lookahead { value } => {
            let lookahead: TwDuration = value
                .parse()
                .map_err(|e| NeedError::invalid("lookahead", format!("{e}")))?;
            rc.write_settings(&SettingsUpdate {
                lookahead: Some(lookahead.to_string()),
                ..Default::default()
            })?;
            println!("{} Lookahead set to {}", "OK".green().bold(), lookahead);
            refresh(&rc, &task_bin)?;
        }

        Commands::Lookback { value } => {
            let lookback: TwDuration = value
                .parse()
                .map_err(|e| NeedError::invalid("lookback", format!("{e}")))?;
            rc.write_settings(&SettingsUpdate {
                lookback: Some(lookback.to_string()),
                ..Default::default()
            })?;
            println!("{} Lookback set to {}", "OK".green().bold(), lookback);
            refresh(&rc, &task_bin)?;
        }

        Commands::Update => {
            let mut adapter = HostAdapter::new(rc, TaskCli::locate(&task_bin)?);
            let filter = adapter.recompute()?;
            print_filter(&filter.to_string());
        }

        Commands::Review { yes } => {
            let rules = RuleSet::load(&rc.read_rules()?)?;
            let default_tier = rc.read_settings()?.default_tier()?;
            let tasks = TaskCli::locate(&task_bin)?;
            let pending = tasks.pending_tasks()?;

            let suggestions = review(&pending, &rules, default_tier);
            if suggestions.is_empty() {
                println!("{} All pending tasks match their rules", "OK".green().bold());
                return Ok(());
            }

            let theme = ColorfulTheme::default();
            let mut changed = 0;
            for suggestion in &suggestions {
                let Some(uuid) = suggestion.task.uuid else {
                    continue;
                };
                let current = suggestion
                    .current
                    .map_or_else(|| "-".to_string(), |t| t.to_string());
                let reason = suggestion
                    .clause
                    .map_or_else(|| "default".to_string(), |c| c.to_string());
                println!(
                    "{}  {} -> {} ({})",
                    suggestion.task.description.bold(),
                    current,
                    suggestion.suggested.to_string().cyan(),
                    reason
                );

                let apply = yes
                    || Confirm::with_theme(&theme)
                        .with_prompt(format!("Set priority {}?", suggestion.suggested))
                        .default(true)
                        .interact()?;
                if apply {
                    tasks.set_tier(uuid, suggestion.suggested)?;
                    changed += 1;
                }
            }

            println!("{} Updated {} task(s)", "OK".green().bold(), changed);
            if changed > 0 {
                // `task modify` ran with hooks off, so recompute here.
                let filter = HostAdapter::new(rc, tasks).recompute()?;
                print_filter(&filter.to_string());
            }
        }

        Commands::Init { force } => {
            if rc.init(force)? {
                println!("{} Wrote {}", "OK".green().bold(), rc.path().display());
                println!("   Add to ~/.taskrc: include {}", rc.path().display());
            } else {
                println!(
                    "{} {} already exists (use --force to overwrite)",
                    "Info:".blue(),
                    rc.path().display()
                );
            }
        }

        Commands::Rc => {
            print!("{}", store::taskrc_snippet());
            println!();
            println!("# {} is rewritten by the hooks", store::FILTER_KEY);
            println!("include {}", rc.path().display());
            println!("# activate with: task context {CONTEXT_NAME}");
        }

        Commands::Check => {
            let mut valid = true;

            match rc.read_rules().and_then(|text| RuleSet::load(&text)) {
                Ok(rules) => {
                    println!("{} {} rule line(s)", "OK".green(), rules.len());
                    for tier in Tier::all() {
                        for rule in rules.rules_for(tier) {
                            let clauses: Vec<String> =
                                rule.clauses.iter().map(ToString::to_string).collect();
                            println!("   {}  {}", tier, clauses.join(", "));
                        }
                    }
                }
                Err(e) => {
                    eprintln!("{} {}", "Error:".red(), e);
                    valid = false;
                }
            }

            let settings = rc.read_settings()?;
            match settings.filter_settings() {
                Ok(s) => println!(
                    "{} span={}, lookahead={}, lookback={}",
                    "OK".green(),
                    s.span,
                    s.lookahead,
                    s.lookback
                ),
                Err(e) => {
                    eprintln!("{} {}", "Error:".red(), e);
                    valid = false;
                }
            }
            match settings.default_tier() {
                Ok(tier) => println!("{} default tier {}", "OK".green(), tier),
                Err(e) => {
                    eprintln!("{} {}", "Error:".red(), e);
                    valid = false;
                }
            }

            if !valid {
                std::process::exit(7);
            }
        }

        Commands::Hook { event } => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;

            let mut adapter = HostAdapter::new(rc, TaskCli::locate(&task_bin)?);
            let outcome = match event {
                HookEvent::OnAdd => adapter.on_add(&input)?,
                HookEvent::OnModify => adapter.on_modify(&input)?,
            };
            print!("{}", outcome.to_stdout()?);
        }
    }

    Ok(())
}

/// Recompute after a settings change. A missing or failing task binary only
/// delays the update until the next hook run.
fn refresh(rc: &RcFile, task_bin: &Path) -> anyhow::Result<()> {
    let result = TaskCli::locate(task_bin)
        .and_then(|tasks| HostAdapter::new(rc.clone(), tasks).recompute());

    match result {
        Ok(filter) => print_filter(&filter.to_string()),
        Err(e) if e.is_config() => return Err(e.into()),
        Err(e) => println!(
            "{} {} - filter will update on next task change",
            "Warning:".yellow(),
            e
        ),
    }
    Ok(())
}

fn print_filter(filter: &str) {
    if filter.is_empty() {
        println!("{} No pending tasks, context filter cleared", "OK".green().bold());
    } else {
        println!("{} Context updated", "OK".green().bold());
        println!("   {filter}");
    }
}
