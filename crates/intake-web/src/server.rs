//! Web服务器

use axum::{
    routing::{get, post, put},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::handlers::{
    admit, api_root, attendance_queue, complete, estimate, health, metrics, promote, status,
    triage_queue,
};
use crate::service::IntakeService;

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, service: IntakeService) -> Self {
        Self {
            addr,
            app: create_app(service),
        }
    }

    /// 运行直到 `shutdown` 完成，随后优雅退出
    pub async fn run<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!("Web server failed: {}", e))?;

        info!("Web server stopped");
        Ok(())
    }
}

/// 构建完整路由
pub fn create_app(service: IntakeService) -> Router {
    Router::new()
        .route("/", get(api_root))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .nest("/api/v1", api_routes())
        .with_state(service)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

/// API v1 路由
fn api_routes() -> Router<IntakeService> {
    Router::new()
        .route("/", get(api_root))
        .route("/triage", post(admit))
        .route("/triage/:subject_id/promote", put(promote))
        .route("/attendance/:subject_id/complete", post(complete))
        .route("/estimate", get(estimate))
        .route("/status/:subject_id", get(status))
        .route("/queues/triage", get(triage_queue))
        .route("/queues/attendance", get(attendance_queue))
}
