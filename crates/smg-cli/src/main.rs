use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use smg_client::{ApiClient, ApiError, BlogQuery, ClientConfig};
use smg_core::ServiceQuery;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "smg")]
#[command(about = "SMG backend client + smoke probes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manually smoke-test a backend endpoint
    Probe {
        #[command(subcommand)]
        target: ProbeTarget,
    },
    /// List services
    Services {
        #[arg(long = "type")]
        service_type: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        quality: Option<String>,
        #[arg(long)]
        popular: Option<bool>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// List published blog posts
    Blog {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ProbeTarget {
    /// Walk the REST liveness + listing endpoints
    Rest,
    /// Connect to the realtime endpoint, join as a test user, await events
    Ws,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = ClientConfig::from_env();

    match cli.command {
        Commands::Probe { target } => match target {
            ProbeTarget::Rest => {
                let client = ApiClient::new(&config)?;
                probe_rest(&client).await
            }
            ProbeTarget::Ws => probe_ws(&config).await,
        },
        Commands::Services {
            service_type,
            category,
            quality,
            popular,
            active,
        } => {
            let client = ApiClient::new(&config)?;
            let query = ServiceQuery {
                service_type,
                category,
                quality,
                popular,
                active,
            };
            let services = client.list_services(&query).await?;
            for service in &services {
                println!(
                    "{}  {}  [{}/{}]",
                    service.id,
                    service.name,
                    service.platform.as_deref().unwrap_or("-"),
                    service.service_type.as_deref().unwrap_or("-"),
                );
            }
            println!("{} services", services.len());
            Ok(())
        }
        Commands::Blog { limit, category } => {
            let client = ApiClient::new(&config)?;
            let posts = client
                .list_published_posts(&BlogQuery { limit, category })
                .await?;
            for post in &posts {
                println!(
                    "{}  {}  ({})",
                    post.id,
                    post.title,
                    post.category.as_deref().unwrap_or("uncategorized"),
                );
            }
            println!("{} posts", posts.len());
            Ok(())
        }
    }
}

fn report<T>(label: &str, started: Instant, result: Result<T, ApiError>) -> bool {
    let elapsed = started.elapsed().as_millis();
    match result {
        Ok(_) => {
            println!("ok   {label} ({elapsed}ms)");
            true
        }
        Err(err) => {
            println!("FAIL {label} ({elapsed}ms): {err}");
            false
        }
    }
}

async fn probe_rest(client: &ApiClient) -> Result<()> {
    let mut ok_count = 0usize;
    let mut fail_count = 0usize;
    let mut tally = |passed: bool| {
        if passed {
            ok_count += 1;
        } else {
            fail_count += 1;
        }
    };

    let started = Instant::now();
    tally(report("GET /health", started, client.health().await));

    let started = Instant::now();
    tally(report(
        "GET /leavereview/health",
        started,
        client.review_health().await,
    ));

    let started = Instant::now();
    tally(report(
        "GET /leavereview/public",
        started,
        client.list_public_reviews().await,
    ));

    let started = Instant::now();
    tally(report(
        "GET /services",
        started,
        client.list_services(&ServiceQuery::default()).await,
    ));

    println!("probe complete: {ok_count} ok, {fail_count} failed");
    if fail_count > 0 {
        anyhow::bail!("{fail_count} REST checks failed");
    }
    Ok(())
}

async fn probe_ws(config: &ClientConfig) -> Result<()> {
    let probe_id = Uuid::new_v4();
    println!("connecting {} (probe id {probe_id})", config.ws_url);

    match tokio::time::timeout(Duration::from_secs(10), connect_async(config.ws_url.as_str())).await
    {
        Ok(Ok((mut socket, response))) => {
            println!("connect: http status {}", response.status());
            let join = serde_json::json!({"event": "join-user", "userId": probe_id}).to_string();
            socket
                .send(Message::Text(join))
                .await
                .context("sending join-user")?;

            match tokio::time::timeout(Duration::from_secs(5), socket.next()).await {
                Ok(Some(Ok(message))) => println!("event: {message}"),
                Ok(Some(Err(err))) => println!("connect_error: {err}"),
                Ok(None) => println!("disconnect: server closed the stream"),
                Err(_) => println!("no event within 5s (connection stays up)"),
            }

            let _ = socket.close(None).await;
            println!("disconnect: clean close");
            Ok(())
        }
        Ok(Err(err)) => {
            println!("connect_error: {err}");
            polling_fallback(config).await
        }
        Err(_) => {
            println!("connect_error: timeout after 10s");
            polling_fallback(config).await
        }
    }
}

/// Second transport in the fallback order: an HTTP long-poll handshake
/// against the same endpoint.
async fn polling_fallback(config: &ClientConfig) -> Result<()> {
    let url = polling_url(&config.ws_url)?;
    println!("falling back to polling transport: {url}");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("building polling client")?;
    let response = http.get(url).send().await.context("polling handshake request")?;
    println!("polling handshake: http status {}", response.status());

    if response.status().is_success() {
        Ok(())
    } else {
        anyhow::bail!("polling transport failed")
    }
}

fn polling_url(ws_url: &str) -> Result<String> {
    let mut url = Url::parse(ws_url).context("parsing websocket url")?;
    let scheme = match url.scheme() {
        "wss" => "https",
        "ws" => "http",
        other => other,
    }
    .to_owned();
    url.set_scheme(&scheme)
        .map_err(|_| anyhow::anyhow!("unsupported websocket scheme in {ws_url}"))?;
    url.set_path("/socket.io/");
    url.set_query(Some("EIO=4&transport=polling"));
    Ok(url.to_string())
}
