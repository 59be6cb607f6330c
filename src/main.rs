use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Url;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use stratos::api::{HttpSearchClient, SearchService};
use stratos::config::ClientConfig;
use stratos::display::{ResultView, render_state_terminal};
use stratos::input::{PLACEHOLDER, QueryInput};
use stratos::orchestrator::{RequestState, SearchOrchestrator};
use stratos::web::{AppState, create_router};

/// Ask the Stratos answer service a question and get an answer with sources.
#[derive(Parser)]
#[command(name = "stratos", version, about)]
struct Cli {
    /// Base URL for API calls (default: http://$STRATOS_API_HOST:$STRATOS_API_PORT/api)
    #[arg(long, global = true)]
    base_url: Option<Url>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single query and print the answer
    Ask {
        query: String,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Read queries from stdin, one per line
    Repl,
    /// Serve the search page and proxy /api to the answer service
    Serve {
        /// Address to listen on
        #[arg(long)]
        addr: Option<SocketAddr>,

        /// Upstream that /api/* is forwarded to
        #[arg(long, env = "STRATOS_PROXY_TARGET")]
        proxy_target: Option<Url>,
    },
    /// Check that the answer service is up
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    match cli.command {
        Command::Ask { query, json } => ask(&config, &query, json).await,
        Command::Repl => repl(&config).await,
        Command::Serve { addr, proxy_target } => {
            if let Some(addr) = addr {
                config.ui_addr = addr;
            }
            if let Some(target) = proxy_target {
                config.proxy_target = target;
            }
            serve(&config).await
        }
        Command::Status => status(&config).await,
    }
}

fn search_service(config: &ClientConfig) -> Result<Arc<dyn SearchService>> {
    Ok(Arc::new(HttpSearchClient::new(config)?))
}

async fn ask(config: &ClientConfig, query: &str, json: bool) -> Result<()> {
    let orchestrator = SearchOrchestrator::new(search_service(config)?);

    let mut submitted = None;
    let mut input = QueryInput::new(|q| submitted = Some(q));
    input.set_text(query);
    input.submit();
    drop(input);

    let Some(query) = submitted else {
        anyhow::bail!("Query cannot be empty");
    };
    orchestrator.submit_query(query.as_str()).await;

    match orchestrator.state() {
        RequestState::Succeeded(result) => {
            let view = ResultView::new(&result);
            if json {
                println!("{}", view.to_json(&query));
            } else {
                print!("{}", view.to_terminal());
            }
            Ok(())
        }
        RequestState::Failed(message) => anyhow::bail!(message),
        RequestState::Idle | RequestState::Loading => {
            anyhow::bail!("Search finished without a result")
        }
    }
}

async fn repl(config: &ClientConfig) -> Result<()> {
    let orchestrator = Arc::new(SearchOrchestrator::new(search_service(config)?));

    let mut states = orchestrator.subscribe();
    let renderer = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            if let Some(output) = render_state_terminal(&state) {
                println!("{output}");
            }
        }
    });

    let (query_tx, mut query_rx) = mpsc::unbounded_channel::<String>();
    let mut input = QueryInput::new(move |q| {
        // receiver lives until the loop below ends
        let _ = query_tx.send(q);
    });

    eprintln!("{PLACEHOLDER} (Ctrl-D to quit)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight = Vec::new();

    while let Some(line) = lines.next_line().await? {
        input.set_busy(orchestrator.is_loading());
        if input.is_busy() {
            eprintln!("{}", input.submit_label());
            continue;
        }

        input.set_text(line);
        input.submit();
        while let Ok(query) = query_rx.try_recv() {
            in_flight.push(orchestrator.spawn_query(query));
        }
    }

    for handle in in_flight {
        handle.await.context("search task panicked")?;
    }
    drop(orchestrator);
    renderer.await.context("renderer task panicked")?;
    Ok(())
}

async fn serve(config: &ClientConfig) -> Result<()> {
    let state = Arc::new(AppState::new(search_service(config)?, config));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.ui_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.ui_addr))?;
    tracing::info!(
        "serving on http://{}, proxying /api to {}",
        config.ui_addr,
        config.proxy_target
    );
    println!("Listening on http://{}", config.ui_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn status(config: &ClientConfig) -> Result<()> {
    let client = HttpSearchClient::new(config)?;
    let health = client.health().await?;
    println!("{}: {}", health.status, health.message);
    if !health.is_online() {
        anyhow::bail!("Service reported status {:?}", health.status);
    }
    Ok(())
}
