use axum::{Router, extract::State, response::Json, routing::get, routing::post};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::models::Forecast;
use crate::presenter::ChartSpec;
use crate::upload::{self, UploadOutcome};
use crate::web::AppState;

/// Upload callback payload: browser data URL plus the original filename
#[derive(Debug, Default, Deserialize)]
pub struct UploadRequest {
    pub contents: Option<String>,
    pub filename: Option<String>,
    /// Zero-based page of rows to return
    #[serde(default)]
    pub page: usize,
}

/// Rows of the requested page
#[derive(Debug, Serialize, Deserialize)]
pub struct PageInfo {
    pub index: usize,
    pub count: usize,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub outcome: UploadOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageInfo>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/forecast", get(get_forecast))
        .route("/chart", get(get_chart))
        .route("/upload", post(post_upload))
}

async fn get_forecast(State(state): State<AppState>) -> Json<Forecast> {
    Json(state.forecast.as_ref().clone())
}

/// Chart refresh: returns the chart built at startup, nothing is recomputed
async fn get_chart(State(state): State<AppState>) -> Json<ChartSpec> {
    Json(state.view.chart.clone())
}

#[instrument(skip_all, fields(filename = ?request.filename))]
async fn post_upload(Json(request): Json<UploadRequest>) -> Json<UploadResponse> {
    let outcome = upload::handle_upload(request.contents.as_deref(), request.filename.as_deref());

    let page = outcome.table().map(|table| PageInfo {
        index: request.page,
        count: table.page_count(),
        rows: table.page(request.page).to_vec(),
    });

    Json(UploadResponse { outcome, page })
}
