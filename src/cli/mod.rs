use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::engine::{Engine, EngineOptions};
use crate::ui::UiConfig;
use crate::validate;

mod interactive;

#[derive(Debug, Parser)]
#[command(
    name = "faultdesk",
    version,
    about = "Record, query and export hardware and software fault reports for electronic equipment"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub json: bool,
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
    #[arg(long, global = true)]
    pub verbose: bool,
    #[arg(long, global = true)]
    pub quiet: bool,
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Directory that relative data, export and log paths resolve against.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record a new report
    Add(AddArgs),
    /// Query reports
    Find(FindArgs),
    /// List equipment ids in first-seen order
    Ids,
    /// Show the earliest and latest report dates
    Range,
    /// Write hardware or software reports to a text file
    Export(ExportArgs),
    /// Interactive menu (the default when no command is given)
    Menu,
    /// Show the effective configuration
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[command(subcommand)]
    pub kind: AddCommand,
}

#[derive(Debug, Subcommand)]
pub enum AddCommand {
    Hardware(HardwareArgs),
    Software(SoftwareArgs),
}

#[derive(Debug, Args)]
pub struct HeaderArgs {
    #[arg(long)]
    pub id: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// HIGH, MEDIUM or LOW (any case)
    #[arg(long)]
    pub severity: String,
    /// YYYY/MM/DD
    #[arg(long)]
    pub date: String,
}

#[derive(Debug, Args)]
pub struct HardwareArgs {
    #[command(flatten)]
    pub header: HeaderArgs,
    #[arg(long)]
    pub component: String,
    #[arg(long, allow_hyphen_values = true)]
    pub serial: String,
    /// The component has to be replaced
    #[arg(long)]
    pub replace: bool,
}

#[derive(Debug, Args)]
pub struct SoftwareArgs {
    #[command(flatten)]
    pub header: HeaderArgs,
    #[arg(long)]
    pub os: String,
    #[arg(long)]
    pub name: String,
    /// A.B.C
    #[arg(long = "app-version")]
    pub app_version: String,
}

#[derive(Debug, Args)]
pub struct FindArgs {
    #[command(subcommand)]
    pub by: FindCommand,
}

#[derive(Debug, Subcommand)]
pub enum FindCommand {
    Id { id: String },
    Severity { level: String },
    Since { date: String },
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// hardware or software
    pub kind: String,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Print the merged configuration (TOML, or JSON with --json)
    #[arg(long)]
    pub show: bool,
}

#[derive(Serialize)]
struct JsonOut<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Serialize)]
struct DateRangeOut {
    earliest: Option<String>,
    latest: Option<String>,
}

#[derive(Serialize)]
struct ExportOut {
    kind: crate::core::ReportKind,
    path: String,
    matched: usize,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let stdout_is_tty = io::stdout().is_terminal();

    let home_dir = std::env::var_os("HOME").map(PathBuf::from);
    let env_config_path = std::env::var_os("FAULTDESK_CONFIG").map(PathBuf::from);
    let cfg = crate::config::load(
        cli.config.as_deref().or(env_config_path.as_deref()),
        home_dir.as_deref(),
    )
    .map_err(crate::exit::invalid_args_err)?;

    let ui_cfg = UiConfig {
        color: stdout_is_tty && cfg.ui.color && !cli.no_color,
        max_table_rows: cfg.ui.max_table_rows,
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    if let Some(Commands::Config(args)) = &cli.command {
        if args.show {
            if cli.json {
                write_json(&cfg)?;
            } else {
                let s = toml::to_string_pretty(&cfg).context("failed to render config")?;
                print!("{s}");
            }
        } else if !ui_cfg.quiet {
            eprintln!("config: use `faultdesk config --show` to print the effective configuration");
        }
        return Ok(());
    }

    let root = match cli.root.clone() {
        Some(root) => root,
        None => std::env::current_dir().context("failed to resolve the current directory")?,
    };
    let opts = EngineOptions {
        store: cfg.storage.store_options(&root),
        log_dir: cfg.storage.log_dir(&root),
    };
    let (mut engine, warning) = Engine::open(opts);
    if let Some(warning) = warning {
        crate::ui::eprintln_warning(&warning);
    }
    crate::ui::eprintln_verbose(
        &ui_cfg,
        &format!(
            "loaded {} reports from {} (exports: {}, logs: {})",
            engine.store().len(),
            engine.store().database().path().display(),
            engine.store().export_dir().display(),
            engine.log_dir().display()
        ),
    );

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Add(args) => {
            let report = match args.kind {
                AddCommand::Hardware(a) => validate::hardware_report(
                    header_from_args(&a.header)?,
                    &a.component,
                    &a.serial,
                    a.replace,
                )?,
                AddCommand::Software(a) => validate::software_report(
                    header_from_args(&a.header)?,
                    &a.os,
                    &a.name,
                    &a.app_version,
                )?,
            };
            engine
                .add_report(report.clone())
                .context("the report was not saved")?;
            if cli.json {
                write_json(&report)?;
            } else if !ui_cfg.quiet {
                println!("recorded: {}", report.render_summary());
            }
        }
        Commands::Find(args) => {
            let store = engine.store();
            let found = match args.by {
                FindCommand::Id { id } => store.find_by_equipment_id(&id),
                FindCommand::Severity { level } => {
                    store.find_by_severity(validate::parse_severity(&level)?)
                }
                FindCommand::Since { date } => store.find_since(validate::parse_date(&date)?),
            };
            if cli.json {
                write_json(&found)?;
            } else {
                crate::ui::print_reports(&mut io::stdout().lock(), &found, &ui_cfg);
            }
        }
        Commands::Ids => {
            if cli.json {
                write_json(&engine.store().distinct_equipment_ids())?;
            } else {
                crate::ui::print_id_overview(&mut io::stdout().lock(), engine.store(), &ui_cfg);
            }
        }
        Commands::Range => {
            let store = engine.store();
            if cli.json {
                write_json(&DateRangeOut {
                    earliest: store.earliest_date().map(|d| d.to_string()),
                    latest: store.latest_date().map(|d| d.to_string()),
                })?;
            } else {
                crate::ui::print_date_range(&mut io::stdout().lock(), store.date_range());
            }
        }
        Commands::Export(args) => {
            let kind = validate::parse_kind(&args.kind).ok_or_else(|| {
                crate::exit::invalid_args(format!(
                    "unknown report kind: {} (use hardware or software)",
                    args.kind
                ))
            })?;
            let run = engine
                .export(kind)
                .with_context(|| format!("failed to export {} reports", kind.slug()))?;
            crate::ui::eprintln_verbose(
                &ui_cfg,
                &format!("log: {}", run.log_path.display()),
            );
            let outcome = run.outcome;
            if cli.json {
                write_json(&ExportOut {
                    kind,
                    path: outcome.path.display().to_string(),
                    matched: outcome.matched,
                })?;
            } else if !ui_cfg.quiet {
                println!(
                    "{} report written to {} ({} entries)",
                    kind.label(),
                    outcome.path.display(),
                    outcome.matched
                );
            } else {
                println!("{}", outcome.path.display());
            }
        }
        Commands::Menu => {
            if cli.json {
                return Err(crate::exit::invalid_args(
                    "the interactive menu cannot be combined with --json",
                ));
            }
            interactive::run_menu(
                &mut engine,
                io::stdin().lock(),
                io::stdout().lock(),
                &ui_cfg,
            )?;
        }
        Commands::Config(_) => {}
    }

    Ok(())
}

fn header_from_args(args: &HeaderArgs) -> Result<crate::core::ReportHeader> {
    Ok(validate::header(
        &args.id,
        &args.description,
        &args.severity,
        &args.date,
    )?)
}

fn write_json<T: Serialize>(data: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &JsonOut { ok: true, data })
        .context("failed to write JSON")?;
    writeln!(stdout)?;
    Ok(())
}
