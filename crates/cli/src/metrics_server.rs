//! Prometheus scrape endpoint.

use {
    axum::{
        Router,
        extract::State,
        http::{StatusCode, header},
        response::IntoResponse,
        routing::get,
    },
    ekitten_metrics::MetricsHandle,
    tracing::info,
};

pub fn router(handle: MetricsHandle) -> Router {
    Router::new()
        .route("/metrics", get(prometheus_metrics_handler))
        .with_state(handle)
}

/// Metrics in Prometheus text exposition format. Unauthenticated so scrapers
/// can reach it; bind it to a private address.
async fn prometheus_metrics_handler(State(handle): State<MetricsHandle>) -> impl IntoResponse {
    if !handle.is_installed() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain")],
            "Metrics not enabled".to_string(),
        );
    }
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
}

pub async fn serve(addr: &str, handle: MetricsHandle) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "metrics endpoint listening");
    axum::serve(listener, router(handle)).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        axum::{body::Body, http::Request},
        tower::ServiceExt,
    };

    #[tokio::test]
    async fn without_recorder_reports_unavailable() {
        let response = router(MetricsHandle::default())
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Metrics not enabled");
    }

    #[tokio::test]
    async fn other_paths_are_not_found() {
        let response = router(MetricsHandle::default())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
