use clap::{Args, Parser};
use gist_core::SummaryRequest;
use gist_inference::{create_model, Config, Summarizer};
use gist_web::{create_app, AppState};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

const DEFAULT_LOG_FILTER: &str = "gist=info,gist_web=info,gist_inference=info,tower_http=info";

#[derive(Parser, Debug)]
#[command(author, version, about = "Text summarization with a pretrained T5 model", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    model: ModelArgs,
    #[command(flatten)]
    serve: ServeArgs,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Clone)]
struct ModelArgs {
    #[arg(long, global = true, env = "GIST_MODEL", default_value = gist_inference::DEFAULT_MODEL, help = "Model to use for inference. Available models: t5 (default), dummy")]
    model: String,
    /// Hugging Face Hub repository of the base model
    #[arg(long, global = true, env = "BASE_MODEL", default_value = gist_inference::DEFAULT_BASE_MODEL)]
    base_model: String,
    /// Fine-tuned weights (.pth or .safetensors), used when present
    #[arg(long, global = true, env = "MODEL_PATH", default_value = gist_inference::DEFAULT_WEIGHTS_PATH)]
    model_path: PathBuf,
    /// Where to download MODEL_PATH from if it is missing
    #[arg(long, global = true, env = "MODEL_URL")]
    model_url: Option<Url>,
    /// Run on the CPU even if a GPU is available
    #[arg(long, global = true)]
    cpu: bool,
}

impl ModelArgs {
    fn inference_config(&self) -> Config {
        Config {
            model_name: self.model.clone(),
            base_model: self.base_model.clone(),
            weights_path: self.model_path.clone(),
            weights_url: self.model_url.clone(),
            force_cpu: self.cpu,
            ..Config::default()
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API (default)
    Serve,
    /// Summarize a file, or stdin, and print the JSON response
    Summarize(SummarizeArgs),
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    #[arg(long, global = true, env = "HOST", default_value = "0.0.0.0")]
    host: String,
    #[arg(long, global = true, env = "PORT", default_value_t = 8001)]
    port: u16,
    /// Allowed CORS origins, comma separated, or * for any
    #[arg(long, global = true, env = "FRONTEND_ORIGIN", default_value = "*")]
    frontend_origin: String,
}

#[derive(Args, Debug)]
struct SummarizeArgs {
    /// Read the text from this file instead of stdin
    #[arg(long)]
    file: Option<PathBuf>,
    #[arg(long)]
    max_length: Option<usize>,
    #[arg(long)]
    min_length: Option<usize>,
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn serve(config: Config, args: ServeArgs) -> anyhow::Result<()> {
    info!("🧠 Loading {} model...", config.model_name);
    let model = create_model(Some(config)).await?;
    info!("🧠 Inference model initialized (using {})", model.name());

    let app = create_app(AppState::new(Summarizer::new(model)), &args.frontend_origin)?;
    info!("🌐 CORS origins: {}", args.frontend_origin);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Summarization server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("👋 Server stopped");
    Ok(())
}

async fn summarize(config: Config, args: SummarizeArgs) -> anyhow::Result<()> {
    let text = match &args.file {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            text
        }
    };

    let summarizer = Summarizer::new(create_model(Some(config)).await?);
    let request = SummaryRequest {
        text,
        max_length: args.max_length,
        min_length: args.min_length,
    };
    let response = summarizer.summarize(&request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = cli.model.inference_config();

    match cli.command {
        Some(Commands::Summarize(args)) => summarize(config, args).await,
        Some(Commands::Serve) | None => serve(config, cli.serve).await,
    }
}
