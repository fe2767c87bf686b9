// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::{IsTerminal, Read, Write};
use std::path::PathBuf;

use md_tools::app_config::{self, Config, DEFAULT_CONFIG_FILE, FAKE_TRANSLATE_ENV};
use md_tools::pipeline::{parse_payloads, RunReport, STAGE_SEPARATOR};
use md_tools::stages::{CombineArgs, FormatNewlinesArgs, SplitArgs, StageArgs, TranslateMdArgs};
use md_tools::Controller;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a Markdown file into balanced parts by paragraph
    Split(SplitArgs),

    /// Concatenate Markdown files with a single newline between them
    Combine(CombineArgs),

    /// Expand single newlines between paragraphs into blank lines
    FormatNewlines(FormatNewlinesArgs),

    /// Translate a Markdown file paragraph by paragraph
    TranslateMd(TranslateMdArgs),

    /// Translate a piece of text and print the result
    Translate(TranslateTextArgs),

    /// Run stages chained with '=' separators
    Pipeline(PipelineArgs),

    /// Run pipelines described by a JSON payload
    Run(RunArgs),

    /// List the stages available to pipelines
    Stages,

    /// Generate shell completions for md-tool
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateTextArgs {
    /// Text to translate
    #[arg(value_name = "TEXT")]
    text: String,

    /// Source language code
    #[arg(short, long, default_value = "auto")]
    source: String,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target: String,

    /// Request timeout in seconds (overrides config)
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Parser, Debug)]
struct PipelineArgs {
    /// Document fed to the first stage
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Write the final document here after the last stage
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Accepted for compatibility; the pipeline never renders its result
    #[arg(long)]
    no_output: bool,

    /// Stage tokens: <stage> [args...] [= <stage> [args...]]...
    #[arg(value_name = "STAGES", required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    tokens: Vec<String>,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// JSON payload file, or '-' to read from stdin
    #[arg(value_name = "PAYLOAD")]
    payload: String,

    /// Stop at the first failing pipeline
    #[arg(long)]
    stop_on_error: bool,
}

/// md-tool - Markdown pipeline toolkit
///
/// Splits, combines, reformats and translates Markdown documents, either one
/// step at a time or chained into pipelines.
#[derive(Parser, Debug)]
#[command(name = "md-tool")]
#[command(version)]
#[command(about = "Markdown pipeline toolkit")]
#[command(long_about = "md-tool splits, combines, reformats and translates Markdown documents.

EXAMPLES:
    md-tool split doc.md 3 -o parts/doc.md                # Writes parts/doc_part_1.md ...
    md-tool combine a.md b.md -o all.md                   # Concatenate files
    md-tool combine -l files.txt                          # Concatenate a file list to stdout
    md-tool format-newlines notes.md -o notes.md          # Reformat in place
    md-tool translate-md doc.md -t fr -o doc.fr.md        # Bilingual translation
    md-tool translate-md doc.md -t fr --delay-min 1 --delay-max 3 --retry-count 2 --debug-output doc.json
    md-tool split 3 doc.md -o parts/doc.md                # Count before input is accepted too
    md-tool translate -t es \"Hello world\"                 # Translate a snippet
    md-tool pipeline -i doc.md = format-newlines = translate-md -t de -o out.md
    md-tool run pipelines.json --stop-on-error            # Batch of JSON payloads
    md-tool stages                                        # List pipeline stages
    md-tool completions bash > md-tool.bash               # Generate bash completions

CONFIGURATION:
    Configuration is read from md-tool.json by default. You can specify a
    different file with --config. Missing files fall back to defaults.
    Set MD_TOOL_FAKE_TRANSLATE=stub|reverse|identity to translate offline.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Set logging level
    #[arg(long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Use the offline fake translator with this mode
    #[arg(long, global = true, env = FAKE_TRANSLATE_ENV, value_name = "MODE")]
    fake_translate: Option<String>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // The logger itself accepts everything; the global max level filters
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "\x1B[1;31m"),
            Level::Warn => ("🚧 ", "\x1B[1;33m"),
            Level::Info => (" ", "\x1B[1;32m"),
            Level::Debug => ("🔍 ", "\x1B[1;36m"),
            Level::Trace => ("📋 ", "\x1B[1;35m"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> Result<()> {
    // Info until the config has been read
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: CommandLineOptions) -> Result<()> {
    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "md-tool", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    let controller = Controller::with_config(config).interactive(std::io::stderr().is_terminal());

    match cli.command {
        Commands::Split(args) => run_standalone(&controller, StageArgs::Split(args)),
        Commands::Combine(args) => run_standalone(&controller, StageArgs::Combine(args)),
        Commands::FormatNewlines(args) => run_standalone(&controller, StageArgs::FormatNewlines(args)),
        Commands::TranslateMd(args) => run_standalone(&controller, StageArgs::TranslateMd(args)),
        Commands::Translate(args) => {
            let translated = controller.translate_text(&args.text, &args.source, &args.target, args.timeout)?;
            println!("{}", translated);
            Ok(())
        }
        Commands::Pipeline(args) => run_pipeline(&controller, args),
        Commands::Run(args) => run_payload_file(&controller, args),
        Commands::Stages => {
            println!("{}", controller.registry().listing());
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    }
}

fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let explicit = cli.config.is_some();
    let path = cli.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut config = Config::load_or_default(&path, explicit)?;
    config.apply_fake_override(cli.fake_translate.as_deref());

    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    } else {
        log::set_max_level(config.log_level.to_level_filter());
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn run_standalone(controller: &Controller, args: StageArgs) -> Result<()> {
    // Stages that may run without -o print their document instead
    let prints_result = matches!(args, StageArgs::Combine(_) | StageArgs::TranslateMd(_))
        && md_tools::stages::StageOperation::output(&args).is_none();

    let report = controller.run_standalone(args)?;

    if prints_result {
        print_document(&report)?;
    }
    Ok(())
}

fn run_pipeline(controller: &Controller, args: PipelineArgs) -> Result<()> {
    let mut tokens = Vec::with_capacity(args.tokens.len() + 3);
    if let Some(input) = &args.input {
        tokens.push("-i".to_string());
        tokens.push(input.to_string_lossy().to_string());
        tokens.push(STAGE_SEPARATOR.to_string());
    }

    // `pipeline -i doc.md = split ...` leaves the separator in the stage tokens
    let stage_tokens = match (args.input.is_some(), args.tokens.first()) {
        (true, Some(first)) if first == STAGE_SEPARATOR => &args.tokens[1..],
        _ => &args.tokens[..],
    };
    tokens.extend(stage_tokens.iter().cloned());

    let report = controller.run_tokens(&tokens, args.output, args.no_output)?;
    info!("Success: {} file(s) written", report.written.len());
    Ok(())
}

fn run_payload_file(controller: &Controller, args: RunArgs) -> Result<()> {
    let json = if args.payload == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read payload from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(&args.payload)
            .with_context(|| format!("Failed to read payload file: {}", args.payload))?
    };

    let payloads = parse_payloads(&json)?;
    let outcomes = controller.run_payloads(&payloads, args.stop_on_error);

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    if failed > 0 {
        return Err(anyhow!("{} of {} pipeline(s) failed", failed, payloads.len()));
    }
    Ok(())
}

fn print_document(report: &RunReport) -> Result<()> {
    if let Some(text) = report.text() {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes()).context("Failed to write to stdout")?;
        stdout.flush().context("Failed to flush stdout")?;
    }
    Ok(())
}
