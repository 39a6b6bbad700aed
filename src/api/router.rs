//! Analysis API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! CORS is permissive: the browser-extension frontend calls from arbitrary
//! page origins.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::api::error::ApiError;
use crate::api::types::{AnalyzeRequest, AnalyzeResponse, ApiContext};
use crate::pipeline::BiasStatus;

/// Build the analysis router.
pub fn analysis_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/analyze", post(analyze))
        .with_state(ctx)
        .layer(CorsLayer::permissive())
}

/// `GET /` — basic liveness check.
async fn health() -> &'static str {
    "Thread analysis backend is live!"
}

/// `POST /analyze` — flatten the submitted thread and annotate every record.
///
/// Bias degradation is not an error: the response is 200 with
/// `status: "partial"` and sentiment-only records.
async fn analyze(
    State(ctx): State<ApiContext>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let config = request.effective_config(&ctx.config);

    let output = ctx
        .pipeline
        .run_with_deadline(request.thread, config, ctx.deadline)
        .await?;

    let status = match &output.bias {
        BiasStatus::Applied { .. } => "success",
        BiasStatus::Unavailable { .. } => "partial",
    };

    Ok(Json(AnalyzeResponse {
        status,
        bias: output.bias,
        data: output.records,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::bias::classifier::MockClassifier;
    use crate::bias::{BiasError, BiasModelCache};
    use crate::config::AnalysisConfig;
    use crate::pipeline::AnalysisPipeline;

    fn test_config() -> AnalysisConfig {
        AnalysisConfig {
            model_dir: PathBuf::from("/tmp/bias-model"),
            ..AnalysisConfig::default()
        }
    }

    fn ctx_with_mock_model() -> ApiContext {
        let cache = Arc::new(BiasModelCache::with_loader(Box::new(|_, _| {
            Ok(Arc::new(MockClassifier::new(&["gender", "none"])) as _)
        })));
        ApiContext {
            pipeline: Arc::new(AnalysisPipeline::new(cache)),
            config: test_config(),
            deadline: std::time::Duration::from_secs(5),
        }
    }

    fn ctx_without_model() -> ApiContext {
        let cache = Arc::new(BiasModelCache::with_loader(Box::new(|dir, _| {
            Err(BiasError::ArtifactMissing(dir.join("model.onnx")))
        })));
        ApiContext {
            pipeline: Arc::new(AnalysisPipeline::new(cache)),
            config: test_config(),
            deadline: std::time::Duration::from_secs(5),
        }
    }

    fn analyze_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    const SAMPLE_THREAD: &str = r#"{
        "thread": {
            "id": "root",
            "is_root": true,
            "author": "op",
            "body": "I love this!",
            "replies": [
                {"id": "a", "parent_id": "root", "author": "user", "body": "I hate you"}
            ]
        }
    }"#;

    #[tokio::test]
    async fn health_route_responds() {
        let app = analysis_router(ctx_with_mock_model());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn analyze_returns_annotated_records() {
        let app = analysis_router(ctx_with_mock_model());
        let response = app.oneshot(analyze_request(SAMPLE_THREAD)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["status"], "success");
        assert_eq!(body["bias"]["state"], "applied");
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["id"], "root");
        assert_eq!(data[0]["sentiment_label"], "positive");
        assert!(data[0]["gender"].is_number());
        assert_eq!(data[1]["oc_bin_id"], "a");
    }

    #[tokio::test]
    async fn analyze_degrades_to_partial_without_model() {
        let app = analysis_router(ctx_without_model());
        let response = app.oneshot(analyze_request(SAMPLE_THREAD)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["status"], "partial");
        assert_eq!(body["bias"]["state"], "unavailable");
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[1]["sentiment_label"], "negative");
        assert!(data[0].get("gender").is_none());
    }

    #[tokio::test]
    async fn analyze_rejects_textless_root() {
        let app = analysis_router(ctx_with_mock_model());
        let response = app
            .oneshot(analyze_request(r#"{"thread": {"id": "root", "is_root": true}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }
}
