//! Burrow — MCP server for the Porkbun registrar API.
//!
//! Two subcommands:
//! - `burrow serve`: Streamable HTTP MCP server exposing the governed tool catalog
//! - `burrow stdio`: STDIO transport for Claude Desktop and other STDIO-based MCP clients

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use axum::http::Request;
use axum::response::IntoResponse;
use axum::Router;
use burrow::{
    load_credentials, run_hot_reload, ApiGateway, BurrowConfig, BurrowMcpServer, CredentialPersist,
    CredentialStore, ToolDispatcher,
};
use clap::{Parser, Subcommand};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use rmcp::ServiceExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt as TowerServiceExt;
use tracing_subscriber::EnvFilter;

/// Burrow — MCP server for the Porkbun registrar API.
#[derive(Parser)]
#[command(
    name = "burrow",
    version,
    about = "Burrow — MCP server for the Porkbun registrar API"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a Streamable HTTP MCP server exposing the registrar tools
    Serve {
        /// Path to burrow.toml config file [default: ./burrow.toml or ~/.config/burrow/burrow.toml]
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// HTTP port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Bridge the registrar tools over STDIO (for Claude Desktop, etc.)
    Stdio {
        /// Path to burrow.toml config file [default: ./burrow.toml or ~/.config/burrow/burrow.toml]
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with env filter (RUST_LOG controls verbosity)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cancel = CancellationToken::new();

    // Ctrl-C handler — cancels the root token for graceful shutdown
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutting down Burrow...");
        cancel_for_signal.cancel();
    });

    match cli.command {
        Commands::Serve { config, port, host } => {
            let config_path = resolve_config(config)?;
            run_serve(config_path, host, port, cancel).await?;
        }
        Commands::Stdio { config } => {
            let config_path = resolve_config(config)?;
            run_stdio(config_path, cancel).await?;
        }
    }

    Ok(())
}

/// Build the governed MCP server from a config file.
///
/// Loads and validates burrow.toml, resolves the credential passphrase from
/// the environment, and — when an encrypted credential file exists — decrypts
/// it into the store. A credential file that cannot be decrypted is fatal:
/// the process refuses to serve until corrected.
async fn build_server(config_path: &Path) -> Result<BurrowMcpServer> {
    let content = tokio::fs::read_to_string(config_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read config file {:?}: {}", config_path, e))?;
    let config = BurrowConfig::from_toml(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file {:?}: {}", config_path, e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config {:?}: {}", config_path, e))?;

    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    let persist = CredentialPersist {
        path: config.credentials.resolved_file(config_dir),
        passphrase: config.credentials.resolved_passphrase(),
    };

    let store = Arc::new(CredentialStore::new());
    if persist.path.exists() {
        let passphrase = persist.passphrase.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "Encrypted credential file {:?} exists but the passphrase env var is unset",
                persist.path
            )
        })?;
        let pair = load_credentials(&persist.path)
            .and_then(|record| record.decrypt(passphrase))
            .map_err(|e| anyhow::anyhow!("Failed to load credentials: {}", e))?;
        store.set(pair).await;
        tracing::info!(path = %persist.path.display(), "credentials loaded from encrypted file");
    } else {
        tracing::info!("no credential file found — call set_credentials to configure");
    }

    let gateway = ApiGateway::from_config(&config, store)
        .map_err(|e| anyhow::anyhow!("Failed to build gateway: {}", e))?;
    let dispatcher = ToolDispatcher::new(Arc::new(gateway), persist);
    Ok(BurrowMcpServer::new(dispatcher))
}

/// Start a Streamable HTTP MCP server exposing the registrar tools.
///
/// Builds the server, spawns a hot-reload background task, then serves via
/// StreamableHttpService + axum.
async fn run_serve(
    config_path: PathBuf,
    host: String,
    port: u16,
    cancel: CancellationToken,
) -> Result<()> {
    let server = build_server(&config_path).await?;

    // Spawn hot-reload background task — watches the config file and swaps
    // the gateway stack on change
    tokio::spawn(run_hot_reload(
        config_path.clone(),
        server.dispatcher_handle(),
        cancel.child_token(),
    ));

    let session_manager = Arc::new(LocalSessionManager::default());
    let http_config = StreamableHttpServerConfig {
        cancellation_token: cancel.clone(),
        ..Default::default()
    };
    let server_for_factory = server.clone();
    let mcp_service = StreamableHttpService::new(
        move || Ok(server_for_factory.clone()),
        session_manager,
        http_config,
    );

    let app = Router::new().fallback(move |req: Request<axum::body::Body>| {
        let svc = mcp_service.clone();
        async move { svc.oneshot(req).await.unwrap().into_response() }
    });

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!(host = %host, port = %port, "Burrow HTTP server listening");
    tracing::info!("Connect your MCP client to http://{}:{}/mcp", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| anyhow::anyhow!("Burrow HTTP server error: {}", e))?;

    tracing::info!("Burrow HTTP server stopped");
    Ok(())
}

/// Bridge the registrar tools over STDIO for STDIO-based MCP clients.
async fn run_stdio(config_path: PathBuf, cancel: CancellationToken) -> Result<()> {
    let server = build_server(&config_path).await?;

    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let running = server
        .serve_with_ct(transport, cancel.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize Burrow stdio transport: {:?}", e))?;

    tracing::info!("Burrow stdio transport initialized, waiting for messages");

    tokio::select! {
        result = running.waiting() => {
            match result {
                Ok(reason) => {
                    tracing::info!(?reason, "Burrow stdio transport completed");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Burrow stdio transport error");
                    return Err(anyhow::anyhow!("Burrow stdio transport error: {}", e));
                }
            }
        }
        _ = cancel.cancelled() => {
            tracing::info!("Burrow stdio transport cancelled");
        }
    }

    Ok(())
}

/// Resolve config file path: explicit flag → ./burrow.toml → ~/.config/burrow/burrow.toml.
fn resolve_config(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }

    let local = Path::new("burrow.toml");
    if local.exists() {
        return Ok(local.to_path_buf());
    }

    if let Some(config_dir) = dirs::config_dir() {
        let xdg = config_dir.join("burrow").join("burrow.toml");
        if xdg.exists() {
            return Ok(xdg);
        }
    }

    Err(anyhow::anyhow!(
        "No burrow.toml found. Searched ./burrow.toml and ~/.config/burrow/burrow.toml. \
         Use --config to specify a path."
    ))
}
