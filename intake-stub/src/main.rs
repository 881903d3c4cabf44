//! Local intake backend for developing the lead forms
//!
//! `STUB_PORT` (default 4001) and `RUST_LOG` are read from the environment
//! or `.env`.

use std::{env, net::SocketAddr};

use intake_stub::{router, AppState};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Load environment variables first so .env RUST_LOG is available to tracing
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();

    let port = env::var("STUB_PORT")
        .unwrap_or_else(|_| "4001".to_string())
        .parse::<u16>()
        .expect("STUB_PORT must be a valid port number");

    let state = AppState::new().expect("Embedded seed data is invalid");
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to port");

    info!("Intake stub running on {}", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
