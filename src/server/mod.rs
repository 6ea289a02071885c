//! REST服务：对外暴露同一条分析流水线

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::Request;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span};
use uuid::Uuid;

use crate::generator::context::GeneratorContext;

pub mod routes;

/// 处理器之间共享的状态；每个请求各自持有独立的黑板
pub struct AppState {
    pub context: GeneratorContext,
}

impl AppState {
    pub fn new(context: GeneratorContext) -> Self {
        Self { context }
    }
}

/// 构建路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::analyze_routes())
        .with_state(Arc::new(state))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                info_span!(
                    "http",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %Uuid::new_v4()
                )
            }),
        )
}

/// 运行HTTP服务
pub async fn run(context: GeneratorContext, bind: &str) -> Result<()> {
    let app = router(AppState::new(context));

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("🌐 Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
