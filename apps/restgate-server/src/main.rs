//! Restgate Server - HMAC-authenticated resource gateway.
//!
//! This binary serves the dispatch pipeline from `restgate-http` over HTTP and
//! answers every routed request with the routing decision itself, in JSON or
//! XML depending on the `Accept` header.
//!
//! # Usage
//!
//! ```text
//! API_SECRET=changeme API_USERS=alice:alice@example.com:42 restgate-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `API_SECRET` | *(empty)* | Shared HMAC signing key |
//! | `API_EXPIRATION` | `300` | Timestamp freshness window in seconds |
//! | `API_ALLOW_CORS` | `false` | Answer preflights and add CORS headers |
//! | `API_PERSISTENT_SESSION` | `false` | `persistent` flag for new sessions |
//! | `API_USERS` | *(empty)* | `username:email:id` triples, comma-separated |
//! | `UPLOAD_DIR` | `./uploads` | Directory for `userfile` uploads |
//! | `UPLOAD_CONFLICT` | `unique` | `unique`, `overwrite` or `reject` |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod resources;
mod users;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use restgate_auth::{RequestAuthenticator, SystemClock};
use restgate_core::GatewayConfig;
use restgate_http::{
    BodyNormalizer, DirectoryUploadStore, Dispatcher, EchoRouteHandler, GatewayHttpConfig,
    GatewayHttpService, RouteHandler,
};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Wire the dispatcher from configuration and the `API_USERS` seed.
fn build_dispatcher(config: &GatewayConfig, users: &str) -> Result<Dispatcher> {
    let resolver = users::parse_users(users).context("invalid API_USERS")?;
    if config.api.secret.is_empty() {
        warn!("API_SECRET is empty, signatures are computed with an empty key");
    }
    if resolver.is_empty() {
        warn!("API_USERS is empty, authenticated resources will reject every request");
    }

    let authenticator = RequestAuthenticator::new(
        config.api.secret.as_bytes(),
        config.api.expiration,
        Arc::new(resolver),
        Arc::new(SystemClock),
    );
    let store = DirectoryUploadStore::new(&config.upload_dir, config.upload_conflict);
    let normalizer = BodyNormalizer::with_upload_store(Arc::new(store));

    Ok(
        Dispatcher::new(resources::registry(), authenticator, normalizer)
            .with_persistent_sessions(config.api.persistent_session),
    )
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve<R: RouteHandler>(
    listener: TcpListener,
    service: GatewayHttpService<R>,
) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Request the health endpoint of a running gateway.
///
/// Exits with code 0 if healthy, 1 otherwise.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let config = GatewayConfig::from_env();
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let config = GatewayConfig::from_env();

    init_tracing(&config.log_level)?;

    info!(
        gateway_listen = %config.gateway_listen,
        api = ?config.api,
        upload_dir = %config.upload_dir,
        upload_conflict = ?config.upload_conflict,
        version = VERSION,
        "starting restgate server",
    );

    let users = std::env::var("API_USERS").unwrap_or_default();
    let dispatcher = build_dispatcher(&config, &users)?;
    let http_config = GatewayHttpConfig {
        allow_cors: config.api.allow_cors,
    };
    let service = GatewayHttpService::new(dispatcher, EchoRouteHandler, http_config);

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}

#[cfg(test)]
mod tests {
    use restgate_http::InboundRequest;

    use super::*;

    #[test]
    fn test_should_build_dispatcher_from_config() {
        let config = GatewayConfig::default();
        let dispatcher = build_dispatcher(&config, "alice:alice@example.com:42").unwrap();

        let decision = dispatcher
            .dispatch(&InboundRequest::new("GET", "/articles/intro"))
            .unwrap();
        assert_eq!(decision.controller, "Article");
        assert_eq!(decision.identity, None);
    }

    #[test]
    fn test_should_reject_invalid_user_seed() {
        assert!(build_dispatcher(&GatewayConfig::default(), "alice").is_err());
    }
}
