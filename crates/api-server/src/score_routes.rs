use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use gauge_chart::GaugeSpec;
use health_core::{deserialize_amount, FinancialRecord};
use health_score::{normalize, ClipRange, Dimension, HealthReport, SubscoreSet};
use line_item_mapper::{LineItem, MappingOutcome, Scale};
use serde::{Deserialize, Serialize};

use crate::{analysis_err, ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct NormalizeRequest {
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub value: Option<f64>,
    pub mean: f64,
    pub std: f64,
    #[serde(default)]
    pub invert: bool,
    #[serde(default)]
    pub clip: Option<ClipRange>,
}

#[derive(Deserialize)]
pub struct MapLineItemsRequest {
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub scale: Scale,
}

#[derive(Serialize)]
pub struct MapLineItemsResponse {
    pub outcome: MappingOutcome,
    pub subscores: SubscoreSet,
}

#[derive(Deserialize)]
pub struct GaugeQuery {
    pub score: f64,
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
}

pub fn score_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health-score", post(score_record))
        .route("/api/health-score/explain", post(explain_record))
        .route("/api/normalize", post(normalize_value))
        .route("/api/line-items/map", post(map_line_items))
        .route("/api/gauge/:dimension", get(render_gauge))
}

async fn score_record(
    State(state): State<AppState>,
    Json(record): Json<FinancialRecord>,
) -> Json<ApiResponse<SubscoreSet>> {
    Json(ApiResponse::success(state.scorer.compute_subscores(&record)))
}

async fn explain_record(
    State(state): State<AppState>,
    Json(record): Json<FinancialRecord>,
) -> Json<ApiResponse<HealthReport>> {
    Json(ApiResponse::success(state.scorer.explain(&record)))
}

async fn normalize_value(
    Json(req): Json<NormalizeRequest>,
) -> Result<Json<ApiResponse<f64>>, AppError> {
    if !(req.std.is_finite() && req.std > 0.0) {
        return Err(AppError::bad_request("std must be a positive finite number"));
    }
    let clip = req.clip.unwrap_or_default();
    if clip.lo > clip.hi {
        return Err(AppError::bad_request("clip.lo must not exceed clip.hi"));
    }

    let score = normalize(req.value, req.mean, req.std, req.invert, clip);
    Ok(Json(ApiResponse::success(score)))
}

async fn map_line_items(
    State(state): State<AppState>,
    Json(req): Json<MapLineItemsRequest>,
) -> Result<Json<ApiResponse<MapLineItemsResponse>>, AppError> {
    let outcome = state
        .mapper
        .map(&req.items, req.scale)
        .map_err(|e| analysis_err("Line item mapping failed", e))?;

    if !outcome.unmapped.is_empty() {
        tracing::info!(
            "{} line items had no canonical field: {:?}",
            outcome.unmapped.len(),
            outcome.unmapped
        );
    }

    let subscores = state.scorer.compute_subscores(&outcome.record);
    Ok(Json(ApiResponse::success(MapLineItemsResponse {
        outcome,
        subscores,
    })))
}

async fn render_gauge(
    Path(dimension): Path<String>,
    Query(query): Query<GaugeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let label = if dimension.trim().eq_ignore_ascii_case("overall") {
        "Overall"
    } else {
        Dimension::parse(&dimension)
            .map(|d| d.as_str())
            .ok_or_else(|| AppError::bad_request(format!("Unknown dimension: {}", dimension)))?
    };

    let spec = GaugeSpec {
        score: query.score,
        title: query.title.unwrap_or_else(|| label.to_string()),
        subtitle: query.subtitle,
        description: query.description,
    };

    Ok((
        [(header::CONTENT_TYPE, "image/svg+xml")],
        gauge_chart::render_svg(&spec),
    ))
}

#[cfg(test)]
mod tests {
    use crate::app;
    use crate::test_support::*;
    use approx::assert_relative_eq;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_score_record() {
        let record = json!({
            "balance_sheet": {
                "current_assets": 200.0,
                "current_liabilities": 100.0,
                "inventory": 20.0
            }
        });
        let (status, _, body) =
            send(app(state()), json_request("POST", "/api/health-score", record)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_relative_eq!(body["data"]["Liquidity"].as_f64().unwrap(), 65.6, epsilon = 1e-9);
        for key in ["Stability", "Profitability", "Efficiency", "Transparency", "Overall"] {
            assert!(body["data"][key].is_number(), "missing {key}");
        }
    }

    #[tokio::test]
    async fn test_formatted_amounts_are_accepted() {
        let record = json!({
            "balance_sheet": {
                "current_assets": "$200",
                "current_liabilities": "100",
                "inventory": "20.0"
            }
        });
        let (status, _, body) =
            send(app(state()), json_request("POST", "/api/health-score", record)).await;
        assert_eq!(status, StatusCode::OK);
        assert_relative_eq!(body["data"]["Liquidity"].as_f64().unwrap(), 65.6, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn test_non_numeric_amount_is_rejected() {
        let record = json!({ "balance_sheet": { "current_assets": "lots" } });
        let response = app(state())
            .oneshot(json_request("POST", "/api/health-score", record))
            .await
            .unwrap();
        // Rejected by the Json extractor before any handler runs: plain text, not the envelope
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&text).is_err());
        assert!(text.contains("unparseable amount"), "{text}");
    }

    #[tokio::test]
    async fn test_explain_record() {
        let (status, _, body) = send(
            app(state()),
            json_request("POST", "/api/health-score/explain", json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["breakdown"].as_array().unwrap().len(), 5);
        assert!(data["grade"].is_string());
        assert!(data["subscores"]["Overall"].is_number());
    }

    #[tokio::test]
    async fn test_normalize() {
        let req = json!({ "value": 2.0, "mean": 1.5, "std": 0.5 });
        let (status, _, body) = send(app(state()), json_request("POST", "/api/normalize", req)).await;
        assert_eq!(status, StatusCode::OK);
        assert_relative_eq!(body["data"].as_f64().unwrap(), 65.0, epsilon = 1e-9);

        let req = json!({ "value": 2.0, "mean": 1.5, "std": 0.5, "invert": true });
        let (_, _, body) = send(app(state()), json_request("POST", "/api/normalize", req)).await;
        assert_relative_eq!(body["data"].as_f64().unwrap(), 35.0, epsilon = 1e-9);

        let req = json!({ "value": null, "mean": 1.5, "std": 0.5 });
        let (_, _, body) = send(app(state()), json_request("POST", "/api/normalize", req)).await;
        assert_eq!(body["data"].as_f64().unwrap(), 50.0);

        let req = json!({ "value": 100.0, "mean": 0.0, "std": 1.0, "clip": { "lo": 10.0, "hi": 90.0 } });
        let (_, _, body) = send(app(state()), json_request("POST", "/api/normalize", req)).await;
        assert_eq!(body["data"].as_f64().unwrap(), 90.0);
    }

    #[tokio::test]
    async fn test_normalize_rejects_bad_parameters() {
        let req = json!({ "value": 1.0, "mean": 1.0, "std": 0.0 });
        let (status, _, body) = send(app(state()), json_request("POST", "/api/normalize", req)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let req = json!({ "value": 1.0, "mean": 1.0, "std": 1.0, "clip": { "lo": 80.0, "hi": 20.0 } });
        let (status, _, _) = send(app(state()), json_request("POST", "/api/normalize", req)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_map_line_items() {
        let req = json!({
            "items": [
                { "label": "Total Current Assets", "value": "2" },
                { "label": "Total current liabilities", "value": 0.1 },
                { "label": "Inventories", "value": "0.02" },
                { "label": "Goodwill", "value": 5 }
            ],
            "scale": "thousands"
        });
        let (status, _, body) =
            send(app(state()), json_request("POST", "/api/line-items/map", req)).await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_relative_eq!(
            data["outcome"]["record"]["balance_sheet"]["current_assets"].as_f64().unwrap(),
            2000.0
        );
        assert_eq!(data["outcome"]["unmapped"], json!(["Goodwill"]));
        assert!(data["subscores"]["Liquidity"].as_f64().unwrap() > 50.0);
    }

    #[tokio::test]
    async fn test_map_line_items_with_garbage_value() {
        let req = json!({ "items": [ { "label": "Revenue", "value": "n/a?!" } ] });
        let (status, _, body) =
            send(app(state()), json_request("POST", "/api/line-items/map", req)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Revenue"));
    }

    #[tokio::test]
    async fn test_gauge_svg() {
        let request = Request::builder()
            .uri("/api/gauge/liquidity?score=72.5&subtitle=Short-term")
            .body(Body::empty())
            .unwrap();
        let response = app(state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/svg+xml");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let svg = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(">Liquidity</text>"));
        assert!(svg.contains(">72.5</text>"));
    }

    #[tokio::test]
    async fn test_gauge_unknown_dimension() {
        let request = Request::builder()
            .uri("/api/gauge/vibes?score=10")
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(app(state()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
