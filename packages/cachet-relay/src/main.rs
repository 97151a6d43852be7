//! Relay server entry point.

use clap::Parser;

use cachet_relay::{app, AppState, RelayConfig};

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "cachet-relay", version, about = "Cachet ciphertext relay server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080, env = "RELAY_PORT")]
    port: u16,

    /// Shared secret for bearer-token verification
    #[arg(long, env = "RELAY_AUTH_SECRET")]
    auth_secret: String,

    /// Maximum inbound WebSocket message size in bytes
    #[arg(long, default_value_t = 16 * 1024 * 1024, env = "RELAY_MAX_MESSAGE_BYTES")]
    max_message_bytes: usize,
}

// ── Entry Point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cachet_relay=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let state = AppState::new(RelayConfig {
        port: args.port,
        auth_secret: args.auth_secret,
        max_message_bytes: args.max_message_bytes,
    });

    let addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("Cachet relay server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app(state))
        .await
        .expect("Server error");
}
