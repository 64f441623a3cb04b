// Phreddit Server - HTTP/JSON surface over the forum core

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use phreddit::{app_state::AppState, config::Config, routes::create_forum_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state (database + service)
    let app_state = AppState::new(config.clone()).await?;

    // Build application router
    let app = Router::new()
        .merge(create_forum_router(app_state.service.clone()))
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = config.server_address().parse()?;
    println!("🚀 Phreddit server starting on http://{}", addr);
    println!("📋 API:");
    println!("  GET    /api/posts                            - List posts (?sort=newest|oldest|active)");
    println!("  POST   /api/posts                            - Create post");
    println!("  GET    /api/posts/{{id}}                       - Get post with comment tree");
    println!("  PATCH  /api/posts/{{id}}/views                 - Increment view count");
    println!("  GET    /api/posts/{{id}}/comments/count        - Total comment count");
    println!("  POST   /api/comments                         - Create comment or reply");
    println!("  GET    /api/communities                      - List communities");
    println!("  POST   /api/communities                      - Create community");
    println!("  GET    /api/communities/{{id}}/posts           - List community posts");
    println!("  GET    /api/linkflairs                       - List link flairs");
    println!("  POST   /api/linkflairs                       - Create link flair");
    println!("  GET    /api/search?q=...                     - Search posts and comments");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
