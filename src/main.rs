use anyhow::{Context, Result};
use clap::Parser;
use station_server_rs::{cli, config, db, openapi, routes, state};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

async fn bind_listener(addr: &str) -> Result<TcpListener> {
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "Failed to bind station-server listener on {addr}: port already in use. Stop the other service using this port or re-run with --port to choose another port.",
            );
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to bind station-server listener on {addr}"))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    if args.print_openapi {
        println!("{}", openapi::openapi_json());
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = config::ServerConfig::from_env()?;
    let pool = db::connect_lazy(&config.database_url)?;

    let enable_cors = config.enable_cors;
    let state = state::AppState { config, db: pool };

    let mut app = routes::router(state);
    if enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = format!("{}:{}", args.host, args.port);
    let listener = bind_listener(&addr).await?;
    tracing::info!(%addr, "station-server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::bind_listener;
    use anyhow::Result;

    #[tokio::test]
    async fn reports_port_in_use_with_actionable_message() -> Result<()> {
        let listener = match std::net::TcpListener::bind("127.0.0.1:0") {
            Ok(listener) => listener,
            Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                // Sandbox environments can block binding attempts.
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let addr = listener.local_addr()?;

        let err = bind_listener(&addr.to_string()).await.unwrap_err();
        if err.to_string().to_lowercase().contains("operation not permitted") {
            return Ok(());
        }
        let message = err.to_string().to_lowercase();

        assert!(message.contains(&addr.to_string()));
        assert!(message.contains("port already in use"));
        assert!(message.contains("--port"));

        drop(listener);
        Ok(())
    }
}
