use chunkscribe::transcription::{
    PromptApiConfig, PromptBackend, SegmentsApiConfig, SegmentsBackend, TranscriptionBackend,
};
use chunkscribe::progress::LogSink;
use chunkscribe::{EngineConfig, Orchestrator, OutputMode};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Plain timestamped transcript (.txt).
    Plain,
    /// SRT subtitles (.srt) plus a derived transcript (.txt).
    Srt,
    /// Speaker-attributed interview transcript (.txt).
    Interview,
}

impl From<ModeArg> for OutputMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Plain => OutputMode::Plain,
            ModeArg::Srt => OutputMode::Subtitles,
            ModeArg::Interview => OutputMode::Interview,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    /// Prompt plus inline audio; freeform text back.
    Prompt,
    /// Multipart upload; structured segments back.
    Segments,
}

#[derive(Parser)]
#[command(name = "chunkscribe", version, about = "Transcribe long audio via a remote speech-to-text service")]
struct Cli {
    /// Audio files to transcribe. Outputs land next to each input.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = ModeArg::Plain)]
    mode: ModeArg,

    #[arg(long, value_enum, default_value_t = BackendArg::Segments)]
    backend: BackendArg,

    /// Full transcription endpoint URL.
    #[arg(long)]
    endpoint: String,

    /// Model identifier passed to the backend.
    #[arg(long)]
    model: String,

    /// API key; defaults to $CHUNKSCRIBE_API_KEY.
    #[arg(long)]
    api_key: Option<String>,

    /// JSON file overriding the engine defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also append the log to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn init_logger(verbose: bool, log_file: Option<&PathBuf>) -> Result<(), fern::InitError> {
    let format = |out: fern::FormatCallback<'_>,
                  message: &std::fmt::Arguments<'_>,
                  record: &log::Record| {
        out.finish(format_args!(
            "[{}][{}][{:?}] {}",
            chrono::Local::now().format("%H:%M:%S"),
            record.target(),
            record.level(),
            message
        ))
    };

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let mut dispatch = fern::Dispatch::new()
        .format(format)
        .level(level)
        .chain(std::io::stdout());
    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }
    dispatch.apply()?;
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig, String> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read {}: {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| format!("invalid config {}: {}", path.display(), e))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_logger(cli.verbose, cli.log_file.as_ref()) {
        eprintln!("could not initialize logging: {}", e);
    }

    let config = match load_config(cli.config.as_ref()) {
        Ok(c) => c,
        Err(msg) => {
            log::error!("{}", msg);
            std::process::exit(2);
        }
    };

    let api_key = cli
        .api_key
        .clone()
        .or_else(|| std::env::var("CHUNKSCRIBE_API_KEY").ok());
    let backend: Arc<dyn TranscriptionBackend> = match cli.backend {
        BackendArg::Prompt => Arc::new(PromptBackend::new(
            PromptApiConfig::new(cli.endpoint.clone(), cli.model.clone(), api_key),
            config.retry.clone(),
        )),
        BackendArg::Segments => Arc::new(SegmentsBackend::new(
            SegmentsApiConfig::new(cli.endpoint.clone(), cli.model.clone(), api_key),
            config.retry.clone(),
        )),
    };

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("cancellation requested");
            ctrl_c_cancel.cancel();
        }
    });

    let orchestrator = Orchestrator::new(config, backend, Arc::new(LogSink));
    let outcomes = orchestrator
        .run_batch(&cli.inputs, cli.mode.into(), &cancel)
        .await;

    let mut failures = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(out) => log::info!(
                "{}: ok ({})",
                outcome.input.display(),
                out.transcript_path.display()
            ),
            Err(e) if e.is_cancelled() => {
                log::info!("{}: cancelled", outcome.input.display())
            }
            Err(e) => {
                failures += 1;
                log::error!("{}: {}", outcome.input.display(), e);
            }
        }
    }
    if failures > 0 {
        std::process::exit(1);
    }
}
