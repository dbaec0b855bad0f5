//! xlsxfin command-line interface
//!
//! - `xlsxfin serve` : HTTPサービスを起動
//! - `xlsxfin process <input>` : ワークブックをオフラインで処理し、成果物を書き出す

use std::fs::File;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use xlsxfin::{
    router, AppState, ArtifactKind, ProcessorBuilder, ServerConfig, SheetSelector,
    DEFAULT_CAPACITY, DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_TIMEOUT_SECS, DEFAULT_TTL_SECS,
};

#[derive(Parser, Debug)]
#[command(name = "xlsxfin", version)]
#[command(about = "Detects estimates and financial statements in Excel workbooks")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP upload/download service
    Serve(ServeArgs),
    /// Process a workbook and write PDF and Excel reports
    Process(ProcessArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Host address to bind to
    #[arg(long, env = "XLSXFIN_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Processing timeout per upload in seconds
    #[arg(long, env = "XLSXFIN_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Maximum upload size in bytes
    #[arg(long, env = "XLSXFIN_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_SIZE)]
    max_upload_bytes: u64,

    /// How long processed reports stay downloadable, in seconds
    #[arg(long, env = "XLSXFIN_STORE_TTL_SECS", default_value_t = DEFAULT_TTL_SECS)]
    store_ttl_secs: u64,

    /// Maximum number of reports kept in memory
    #[arg(long, env = "XLSXFIN_STORE_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    store_capacity: usize,

    /// Allowed CORS origin (any origin when omitted)
    #[arg(long, env = "XLSXFIN_CORS_ORIGIN")]
    cors_origin: Option<String>,
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Input workbook (.xlsx or .xls)
    input: PathBuf,

    /// Directory for the generated reports
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Only process the named sheet (repeatable)
    #[arg(long = "sheet-name")]
    sheet_names: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_directive = if cli.verbose {
        "xlsxfin=debug,tower_http=debug"
    } else {
        "xlsxfin=info,tower_http=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Process(args) => process(args),
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = ServerConfig {
        timeout_secs: args.timeout_secs,
        max_upload_bytes: args.max_upload_bytes,
        store_ttl_secs: args.store_ttl_secs,
        store_capacity: args.store_capacity,
        cors_origin: args.cors_origin,
    };
    let app = router(AppState::new(config).context("invalid server configuration")?);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Processing timeout: {}s", args.timeout_secs);
    info!("Max upload size: {} bytes", args.max_upload_bytes);

    axum::serve(listener, app).await?;

    Ok(())
}

fn process(args: ProcessArgs) -> anyhow::Result<()> {
    let selector = match args.sheet_names.len() {
        0 => SheetSelector::All,
        1 => SheetSelector::Name(args.sheet_names[0].clone()),
        _ => SheetSelector::Names(args.sheet_names.clone()),
    };
    let processor = ProcessorBuilder::new()
        .with_sheet_selector(selector)
        .build()?;

    let input = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let report = processor.process(input)?;

    let source_name = args
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = args
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());

    std::fs::create_dir_all(&args.out_dir)?;
    for kind in [ArtifactKind::Pdf, ArtifactKind::Excel] {
        let path = artifact_path(&args.out_dir, &stem, kind);
        std::fs::write(&path, kind.render(&report, &source_name)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn artifact_path(out_dir: &Path, stem: &str, kind: ArtifactKind) -> PathBuf {
    out_dir.join(kind.file_name(stem))
}
