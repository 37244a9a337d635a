//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use super::AppState;
use super::types::{ErrorResponse, HistoryParams, OptimizeBody};
use crate::error::EngineError;
use crate::optimize::engine::OptimizationRequest;
use crate::optimize::types::Objective;
use crate::store::{DEFAULT_HISTORY_LIMIT, HistoryQuery, StoreError, history};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn store_failure(e: &StoreError) -> ApiError {
    error!(error = %e, "run store failure");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to access run store")
}

/// Validation errors are the caller's fault; everything else is ours.
fn engine_failure(e: &EngineError) -> ApiError {
    match e {
        EngineError::Store(inner) => store_failure(inner),
        EngineError::Serialization(_) => {
            error!(error = %e, "failed to encode run");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        _ => api_error(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// Fills a request from the body, falling back to configured defaults.
fn build_request(state: &AppState, body: OptimizeBody) -> Result<OptimizationRequest, EngineError> {
    let engine = &state.defaults.engine;
    let mut request = OptimizationRequest::parse(
        body.objective.as_deref().unwrap_or(&engine.objective),
        body.time_horizon.as_deref().unwrap_or(&engine.time_horizon),
        body.location.unwrap_or_else(|| engine.location.clone()),
    )?;
    request.constraints = body
        .constraints
        .unwrap_or_else(|| (&state.defaults.constraints).into());
    request.seed = body.seed;
    request.start_time = body.start_time;
    Ok(request)
}

/// Runs one optimization.
///
/// `POST /optimizations` → 200 + `OptimizationResult` JSON
/// invalid body or parameters → 400 + `ErrorResponse`
/// run store failure → 500 + `ErrorResponse`
pub async fn create_run(
    State(state): State<Arc<AppState>>,
    body: Result<Json<OptimizeBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return api_error(StatusCode::BAD_REQUEST, rejection.body_text()).into_response();
        }
    };
    let request = match build_request(&state, body) {
        Ok(request) => request,
        Err(e) => return engine_failure(&e).into_response(),
    };
    match state.engine.run(request).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => engine_failure(&e).into_response(),
    }
}

/// Lists recent runs.
///
/// `GET /optimizations` → 200 + `Vec<RunSummary>` JSON (at most 20)
/// `GET /optimizations?limit=N&objective=co2` → filtered
/// unknown objective → 400 + `ErrorResponse`
pub async fn list_runs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> Response {
    let objective = match params.objective.as_deref().map(str::parse::<Objective>) {
        None => None,
        Some(Ok(objective)) => Some(objective),
        Some(Err(e)) => return engine_failure(&e).into_response(),
    };
    let query = HistoryQuery {
        limit: params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
        objective,
    };
    match history::history(state.engine.store().as_ref(), &query).await {
        Ok(runs) => Json(runs).into_response(),
        Err(e) => store_failure(&e).into_response(),
    }
}

/// Aggregates over completed runs.
///
/// `GET /optimizations/stats` → 200 + `RunStats` JSON
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Response {
    match history::stats(state.engine.store().as_ref()).await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => store_failure(&e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::config::Config;
    use crate::data::EmptySource;
    use crate::optimize::Engine;
    use crate::optimize::report::OptimizationRun;
    use crate::store::{MemoryStore, RunStore, StoredRun};

    fn make_test_state() -> Arc<AppState> {
        Arc::new(AppState {
            engine: Engine::new(Arc::new(EmptySource), Arc::new(MemoryStore::new())),
            defaults: Config::default(),
        })
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/optimizations")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json(resp: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    struct BrokenStore;

    #[async_trait]
    impl RunStore for BrokenStore {
        async fn create(&self, _run: &OptimizationRun) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("disk full".to_string()))
        }

        async fn list(&self, _query: &HistoryQuery) -> Result<Vec<StoredRun>, StoreError> {
            Err(StoreError::Unavailable("disk full".to_string()))
        }

        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn create_returns_result() {
        let app = router(make_test_state());
        let resp = app
            .oneshot(post(
                r#"{"objective":"cost","timeHorizon":"24h","location":"X","seed":1,
                    "startTime":"2024-03-04T00:00:00Z"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = json(resp).await;
        assert_eq!(json["baseline"]["schedule"].as_array().map(Vec::len), Some(24));
        assert_eq!(json["optimized"]["schedule"].as_array().map(Vec::len), Some(24));
        assert_eq!(json["dataSources"]["load"], "synthetic");
    }

    #[tokio::test]
    async fn invalid_objective_returns_400() {
        let app = router(make_test_state());
        let resp = app
            .oneshot(post(r#"{"objective":"speed","timeHorizon":"24h","location":"X"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("speed"));
    }

    #[tokio::test]
    async fn malformed_body_returns_400() {
        let app = router(make_test_state());
        let resp = app.oneshot(post("{not json")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(json(resp).await.get("error").is_some());
    }

    #[tokio::test]
    async fn store_failure_returns_500() {
        let state = Arc::new(AppState {
            engine: Engine::new(Arc::new(EmptySource), Arc::new(BrokenStore)),
            defaults: Config::default(),
        });
        let resp = router(state)
            .oneshot(post(r#"{"objective":"co2","timeHorizon":"24h","location":"X"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn history_and_stats_reflect_runs() {
        let state = make_test_state();
        for objective in ["cost", "co2", "cost"] {
            let body = format!(r#"{{"objective":"{objective}","timeHorizon":"24h","seed":3}}"#);
            let resp = router(state.clone()).oneshot(post(&body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let resp = router(state.clone())
            .oneshot(get("/optimizations?objective=cost"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let runs = json(resp).await;
        assert_eq!(runs.as_array().map(Vec::len), Some(2));
        assert_eq!(runs[0]["parameters"]["location"], "default");

        let resp = router(state.clone())
            .oneshot(get("/optimizations/stats"))
            .await
            .unwrap();
        let stats = json(resp).await;
        assert_eq!(stats["totalRuns"], 3);
        assert_eq!(stats["byObjective"]["cost"]["count"], 2);
    }

    #[tokio::test]
    async fn history_rejects_unknown_objective() {
        let resp = router(make_test_state())
            .oneshot(get("/optimizations?objective=speed"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
