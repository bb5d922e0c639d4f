//! imagegen CLI
//!
//! Runs the generation gateway, or acts as a session client against one.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use imagegen_core::{Config, PROMPT_SUGGESTIONS};
use imagegen_gateway::{create_router, AppState, OpenAiCompatibleProvider};
use imagegen_session::{FileStore, HistoryItem, HttpGenerationClient, Orchestrator};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// imagegen - AI image generation from text prompts
#[derive(Parser, Debug)]
#[command(name = "imagegen")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: imagegen.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the generation gateway
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate an image and add it to the local history
    Generate {
        /// Description of the image
        #[arg(value_name = "PROMPT")]
        prompt: String,

        /// Base URL of the gateway
        #[arg(long, value_name = "URL")]
        gateway_url: Option<String>,

        /// Directory holding the session history
        #[arg(long, value_name = "DIR")]
        history_dir: Option<String>,
    },

    /// List past generations, most recent first
    History {
        /// Directory holding the session history
        #[arg(long, value_name = "DIR")]
        history_dir: Option<String>,
    },

    /// Show a past generation by id
    Select {
        /// Id of the history item
        #[arg(value_name = "ID")]
        id: String,

        /// Directory holding the session history
        #[arg(long, value_name = "DIR")]
        history_dir: Option<String>,
    },

    /// Save a past generation's image to a file
    Download {
        /// Id of the history item
        #[arg(value_name = "ID")]
        id: String,

        /// Destination file (default: ai-image-<timestamp>.<ext>)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Directory holding the session history
        #[arg(long, value_name = "DIR")]
        history_dir: Option<String>,
    },

    /// Print example prompts
    Ideas,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            serve(&config).await
        }
        Command::Generate {
            prompt,
            gateway_url,
            history_dir,
        } => {
            if let Some(url) = gateway_url {
                config.client.gateway_url = url;
            }
            apply_history_dir(&mut config, history_dir);
            config.validate()?;
            generate(&config, &prompt).await
        }
        Command::History { history_dir } => {
            apply_history_dir(&mut config, history_dir);
            config.validate()?;
            print_history(&config);
            Ok(())
        }
        Command::Select { id, history_dir } => {
            apply_history_dir(&mut config, history_dir);
            config.validate()?;
            select(&config, &id)
        }
        Command::Download {
            id,
            output,
            history_dir,
        } => {
            apply_history_dir(&mut config, history_dir);
            config.validate()?;
            download(&config, &id, output).await
        }
        Command::Ideas => {
            for idea in PROMPT_SUGGESTIONS {
                println!("{idea}");
            }
            Ok(())
        }
    }
}

/// Loads configuration from the explicit path or the current directory.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

fn apply_history_dir(config: &mut Config, history_dir: Option<String>) {
    if let Some(dir) = history_dir {
        config.client.history_dir = dir;
    }
}

/// Runs the gateway until Ctrl+C.
async fn serve(config: &Config) -> anyhow::Result<()> {
    let provider = OpenAiCompatibleProvider::from_config(&config.provider)
        .map_err(|e| anyhow::anyhow!("Failed to create image provider: {e}"))?;
    tracing::info!(endpoint = %provider.endpoint(), "Using image provider");

    let router = create_router(AppState::new(Arc::new(provider)));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    println!("Gateway listening on http://{addr}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl+C, shutting down");
            }
        })
        .await?;

    Ok(())
}

fn session(config: &Config) -> Orchestrator {
    let client = HttpGenerationClient::from_config(&config.client);
    let store = FileStore::new(&config.client.history_dir);
    Orchestrator::new(Arc::new(client), Arc::new(store)).with_timeout(config.client.timeout())
}

/// Submits one prompt and prints the resulting image reference.
async fn generate(config: &Config, prompt: &str) -> anyhow::Result<()> {
    let session = session(config);

    match session.submit(prompt).await {
        Ok(item) => {
            println!("{}", item.image_ref);
            tracing::debug!(id = %item.id, "Saved to history");
            Ok(())
        }
        Err(e) if e.is_user_visible() => Err(anyhow::anyhow!("{e}")),
        Err(e) => Err(anyhow::anyhow!("Session error: {e}")),
    }
}

fn print_history(config: &Config) {
    let session = session(config);
    let history = session.history();

    if history.is_empty() {
        println!("No images generated yet");
        return;
    }

    for item in history {
        println!(
            "{}  {}  {}",
            item.id,
            item.created_at.format("%Y-%m-%d %H:%M:%S"),
            item.prompt
        );
        println!("    {}", item.image_ref);
    }
}

fn select(config: &Config, id: &str) -> anyhow::Result<()> {
    let session = session(config);

    let Some(item) = session.select_by_id(id) else {
        anyhow::bail!(
            "No history item with id '{id}'\n\nSuggestion: Run `imagegen history` to list ids"
        );
    };

    println!("Prompt: {}", item.prompt);
    println!("Image:  {}", item.image_ref);
    Ok(())
}

/// Fetches the image of a history item and writes it to disk.
async fn download(config: &Config, id: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    let session = session(config);

    let Some(item) = session.select_by_id(id) else {
        anyhow::bail!(
            "No history item with id '{id}'\n\nSuggestion: Run `imagegen history` to list ids"
        );
    };

    let path = output.unwrap_or_else(|| default_download_path(&item));
    let bytes = fetch_image(&item.image_ref, &path).await?;

    println!("Saved {} ({bytes} bytes)", path.display());
    Ok(())
}

/// Downloads `image_ref` into `path`, returning the number of bytes written.
async fn fetch_image(image_ref: &str, path: &Path) -> anyhow::Result<usize> {
    tracing::debug!(image_ref, path = %path.display(), "Downloading image");

    let response = reqwest::get(image_ref)
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| anyhow::anyhow!("Failed to download image: {e}"))?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to download image: {e}"))?;

    tokio::fs::write(path, &bytes).await.map_err(|e| {
        anyhow::anyhow!("Failed to write image: {e}\n\nPath: {}", path.display())
    })?;

    Ok(bytes.len())
}

/// `ai-image-<unix millis>.<ext>`, keeping the extension of the image
/// reference when it names a known image format.
fn default_download_path(item: &HistoryItem) -> PathBuf {
    let path = item
        .image_ref
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| matches!(ext.as_str(), "png" | "webp" | "jpg" | "jpeg"))
        .unwrap_or_else(|| "png".to_string());

    PathBuf::from(format!(
        "ai-image-{}.{extension}",
        item.created_at.timestamp_millis()
    ))
}
