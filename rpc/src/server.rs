//! Axum-based RPC server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use sigrelay_node::RelayerContext;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::error::RpcError;
use crate::handlers;

pub struct RpcServer {
    pub port: u16,
    ctx: Arc<RelayerContext>,
}

impl RpcServer {
    pub fn new(port: u16, ctx: Arc<RelayerContext>) -> Self {
        Self { port, ctx }
    }

    /// Every route, with CORS open to GET and POST from any origin.
    pub fn router(&self) -> Router {
        router(self.ctx.clone())
    }

    /// Bind on all interfaces and serve until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| RpcError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        info!(%addr, "RPC server listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("RPC server stopped");
        Ok(())
    }
}

pub fn router(ctx: Arc<RelayerContext>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/canDelegate", get(handlers::can_delegate))
        .route("/canVote", get(handlers::can_vote))
        .route("/canPropose", get(handlers::can_propose))
        .route("/delegate", post(handlers::submit_delegation))
        .route("/vote", post(handlers::submit_vote))
        .route("/votes", get(handlers::votes))
        .route("/pending", get(handlers::pending))
        .route("/metrics", get(handlers::metrics))
        .layer(cors)
        .with_state(ctx)
}
