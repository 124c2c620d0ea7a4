// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::PathBuf;

use poorly_translated::app_config::{self, Config};
use poorly_translated::app_controller::Controller;

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
    /// Poorly translate a localization file (default command)
    Translate(TranslateArgs),

    /// Generate shell completions for poorly-translated
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// JSON file of nested key paths to texts
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Target culture (e.g., 'fr-FR', 'de', 'pt-BR')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Directory of the translation archive
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Random languages each text passes through
    #[arg(long)]
    hops: Option<usize>,

    /// Maximum concurrent workers
    #[arg(long)]
    workers: Option<usize>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// poorly-translated - machine translation, on purpose badly
///
/// Sends every text through several random languages before the target
/// language, keeping `{placeholders}` intact.
#[derive(Parser, Debug)]
#[command(name = "poorly-translated")]
#[command(version)]
#[command(about = "Poorly translate localization files through random languages")]
#[command(long_about = "poorly-translated routes every text of a localization file through random
intermediate languages before translating it into the target language.

EXAMPLES:
    poorly-translated en.json                      # Translate into the configured culture
    poorly-translated -t de-DE en.json             # Translate into German
    poorly-translated --hops 10 en.json            # Ten random detours per text
    poorly-translated -o out/ en.json              # Write the archive to out/de-DE.json
    poorly-translated completions bash > pt.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

RESUMING:
    Translated keys are saved to {OUTPUT_DIR}/{CULTURE}.json while running and on
    Ctrl-C. Running again skips every key found there.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// JSON file of nested key paths to texts
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Target culture (e.g., 'fr-FR', 'de', 'pt-BR')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Directory of the translation archive
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Random languages each text passes through
    #[arg(long)]
    hops: Option<usize>,

    /// Maximum concurrent workers
    #[arg(long)]
    workers: Option<usize>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
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
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Tag and ANSI color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "\x1B[1;31m"),
            Level::Warn => ("WARN ", "\x1B[1;33m"),
            Level::Info => ("INFO ", "\x1B[1;32m"),
            Level::Debug => ("DEBUG", "\x1B[1;36m"),
            Level::Trace => ("TRACE", "\x1B[1;35m"),
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
            let (tag, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Accept everything; the effective level is set once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "poorly-translated", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            // Default behavior - use top-level args
            let input = cli
                .input
                .ok_or_else(|| anyhow!("INPUT is required when no subcommand is specified"))?;

            let args = TranslateArgs {
                input,
                target_language: cli.target_language,
                output_dir: cli.output_dir,
                config_path: cli.config_path,
                hops: cli.hops,
                workers: cli.workers,
                log_level: cli.log_level,
            };
            run_translate(args).await
        }
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cli_level) = &options.log_level {
        let level: app_config::LogLevel = cli_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)
        .with_context(|| format!("Failed to load config file: {}", options.config_path))?;

    // Override config with CLI options if provided
    if let Some(target_language) = &options.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(hops) = options.hops {
        config.translation.hops = hops;
    }
    if let Some(workers) = options.workers {
        config.pool.max_workers = workers;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    } else {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let controller = Controller::with_config(config)?;
    let summary = controller.run(&options.input, options.output_dir.clone()).await?;

    if summary.interrupted {
        warn!(
            "Stopped after {}/{} keys; run again to resume",
            summary.translated_keys, summary.total_keys
        );
    }
    if let Some(output) = &summary.output {
        info!("Success: {:?}", output);
    }

    Ok(())
}
