mod app;
mod auth;
mod config;
mod error;
mod extract;
mod mail;
mod state;
mod users;
mod validation;


use tracing::info;

/// Human-readable by default; `LOG_FORMAT=json` for log shippers.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "penwise=debug,axum=info,tower_http=info".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let state = state::AppState::init().await?;
    info!(
        issuer = %state.config.jwt.issuer,
        audience = %state.config.jwt.audience,
        ttl_minutes = state.config.jwt.ttl_minutes,
        frontend = %state.config.mail.frontend_url,
        "penwise starting"
    );

    let server = state.config.server.clone();
    app::serve(app::build_app(state), &server).await
}
