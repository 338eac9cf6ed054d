pub mod cli;
pub mod config;
pub mod error;
pub mod io_utils;
pub mod mapping;
pub mod parser;
pub mod preview;
pub mod report;
pub mod session;
pub mod sink;
pub mod source;
pub mod table;
pub mod template;
pub mod validate;

use std::{env, io::Write, sync::OnceLock};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, InputArgs, ReportFormat},
    config::ImportConfig,
    report::ValidationReport,
    session::ImportSession,
    sink::{JsonLinesSink, MemorySink, PersistenceSink},
    source::{FileHandle, FsReader},
};

pub use crate::{
    error::{ImportError, ParseError},
    parser::{RawTable, Row, parse, parse_with},
    validate::{ImportKind, ValidationError, validate},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("lurnip_import", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Preview(args) => handle_preview(&args),
        Commands::Validate(args) => handle_validate(&args),
        Commands::Import(args) => handle_import(&args),
        Commands::Template(args) => handle_template(&args),
    }
}

fn load_config(args: &InputArgs) -> Result<ImportConfig> {
    let mut config = match &args.config {
        Some(path) => ImportConfig::load(path)
            .with_context(|| format!("Loading configuration from {path:?}"))?,
        None => ImportConfig::default(),
    };
    if let Some(delimiter) = args.delimiter {
        config.delimiter = Some(delimiter as char);
    }
    if let Some(encoding) = &args.input_encoding {
        config.encoding = Some(encoding.clone());
    }
    if let Some(quoting) = args.quoting {
        config.quoting = quoting;
    }
    if let Some(policy) = args.duplicate_columns {
        config.duplicate_columns = policy;
    }
    config.ensure_valid()?;
    debug!("Effective configuration: {config:?}");
    Ok(config)
}

/// Selects and analyses `args.input`, leaving the session in `PREVIEW`.
fn analyse<S: PersistenceSink>(
    args: &InputArgs,
    config: &ImportConfig,
    sink: S,
) -> Result<ImportSession<FsReader, S>> {
    let settings = config.session_settings(&args.input);
    info!(
        "Analysing '{}' as {} (delimiter '{}')",
        args.input.display(),
        args.kind,
        io_utils::printable_delimiter(settings.parse.delimiter)
    );
    let reader = FsReader::new(config.encoding()?);
    let mut session = ImportSession::with_settings(args.kind, reader, sink, settings);
    let handle = FileHandle::open(&args.input)
        .with_context(|| format!("Opening input file {:?}", args.input))?;
    session.select_file(handle)?;
    session
        .start_analysis()
        .with_context(|| format!("Cannot import {:?}", args.input))?;
    Ok(session)
}

fn handle_preview(args: &cli::PreviewArgs) -> Result<()> {
    let mut config = load_config(&args.source)?;
    if let Some(rows) = args.rows {
        config.preview_rows = rows;
    }
    let session = analyse(&args.source, &config, MemorySink::new())?;
    let window = session
        .preview()
        .ok_or_else(|| anyhow!("No preview available for {:?}", args.source.input))?;
    print!("{}", preview::render_preview(&window));
    info!(
        "Displayed {} of {} row(s) from {:?}",
        window.rows.len(),
        window.total_rows,
        args.source.input
    );
    Ok(())
}

fn handle_validate(args: &cli::ValidateArgs) -> Result<()> {
    let config = load_config(&args.source)?;
    let session = analyse(&args.source, &config, MemorySink::new())?;
    let table = session
        .table()
        .ok_or_else(|| anyhow!("No rows held for {:?}", args.source.input))?;
    let report = ValidationReport::new(session.kind(), table, session.errors());
    match args.format {
        ReportFormat::Text => print!("{}", report.render_text()),
        ReportFormat::Json => println!("{}", report.to_json()?),
    }
    if !report.can_confirm {
        bail!(
            "{} validation error(s) found in {:?}",
            report.errors.len(),
            args.source.input
        );
    }
    Ok(())
}

fn handle_import(args: &cli::ImportArgs) -> Result<()> {
    let config = load_config(&args.source)?;
    let receipt = match (&args.output, args.dry_run) {
        (Some(path), false) => confirm(args, &config, JsonLinesSink::new(path))?,
        (None, true) => confirm(args, &config, MemorySink::new())?,
        _ => bail!("Specify either --output <FILE> or --dry-run"),
    };
    println!(
        "{} {} record(s) imported (batch {})",
        receipt.count, args.source.kind, receipt.batch_id
    );
    Ok(())
}

fn confirm<S: PersistenceSink>(
    args: &cli::ImportArgs,
    config: &ImportConfig,
    sink: S,
) -> Result<sink::CommitReceipt> {
    let mut session = analyse(&args.source, config, sink)?;
    if !session.can_confirm() {
        if let Some(table) = session.table() {
            let report = ValidationReport::new(session.kind(), table, session.errors());
            eprint!("{}", report.render_text());
        }
    }
    let receipt = session
        .confirm()
        .with_context(|| format!("Import of {:?} was not confirmed", args.source.input))?;
    Ok(receipt)
}

fn handle_template(args: &cli::TemplateArgs) -> Result<()> {
    let contents = template::render(args.kind, args.delimiter)?;
    let mut output = io_utils::open_output(args.output.as_deref())?;
    output
        .write_all(contents.as_bytes())
        .context("Writing template")?;
    output.flush()?;
    if let Some(path) = &args.output {
        info!("Wrote {} template to {:?}", args.kind, path);
    }
    Ok(())
}
