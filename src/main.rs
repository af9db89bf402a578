use std::net::SocketAddr;

use authflow::{
    AuthClient, AuthConfig, AuthFlowController, AuthUser, MemorySessionStore, OAuthConfig,
};
use axum::Router;
use axum::extract::Query;
use axum::response::Html;
use axum::routing::get;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let oauth = OAuthConfig::from_env()?;
    let auth = AuthConfig::from_env()?;
    let store = MemorySessionStore::new().with_ttl(auth.session_ttl());
    let flow = AuthFlowController::new(auth, AuthClient::new(oauth), store);

    let app = Router::new()
        .route("/login", get(login_page))
        .merge(flow.routes())
        .merge(flow.protect(Router::new().route("/dashboard", get(dashboard))));

    let addr: SocketAddr = std::env::var("AUTHFLOW_LISTEN")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
        .parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Deserialize)]
struct LoginPage {
    error: Option<String>,
}

async fn login_page(Query(page): Query<LoginPage>) -> Html<String> {
    let notice = match page.error.as_deref() {
        Some(_) => "<p>Sign-in failed. Please try again.</p>",
        None => "",
    };
    Html(format!(
        "<!doctype html><title>Sign in</title>{notice}\
         <form action=\"/auth/login\" method=\"get\">\
         <input name=\"organization_id\" placeholder=\"Organization ID\">\
         <button>Sign in</button></form>"
    ))
}

async fn dashboard(user: AuthUser) -> Html<String> {
    Html(format!(
        "<!doctype html><title>Dashboard</title><p>Welcome, {}!</p>\
         <form action=\"/auth/logout\" method=\"post\"><button>Sign out</button></form>",
        html_escape(&user.identity.email)
    ))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}
