//! Integration tests for the pmcast web surface

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use pmcast::config::{PollutantConfig, ServerConfig};
use pmcast::{
    AppState, ChartKind, FeaturePrep, ForecastPipeline, PmcastConfig, Pollutant, Presenter, web,
};
use serde_json::{Value, json};
use std::io::Write;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "pmcast-test-boundary";

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn write_model(dir: &TempDir, name: &str, body: &Value) -> String {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(body.to_string().as_bytes()).unwrap();
    path.display().to_string()
}

fn config_with(pollutants: Vec<PollutantConfig>) -> PmcastConfig {
    PmcastConfig {
        pollutants,
        ..PmcastConfig::default()
    }
}

fn state_for(config: &PmcastConfig) -> AppState {
    let pipeline = ForecastPipeline::from_config(config).unwrap();
    let forecast = pipeline.run(start()).unwrap();
    let presenter = Presenter::new(&config.dashboard.title, ChartKind::Bar);
    AppState::new(forecast, &presenter)
}

fn app_for(config: &PmcastConfig) -> Router {
    web::app(state_for(config), &config.server)
}

/// PM10 calendar model plus PM2.5 lag model, both present on disk
fn working_app() -> (TempDir, Router) {
    let dir = TempDir::new().unwrap();
    let pm10 = write_model(
        &dir,
        "pm10.json",
        &json!({
            "kind": "linear",
            "target": "pm10",
            "intercept": 1.0,
            "coefficients": {"humidity": 0.5, "temperature": 1.0}
        }),
    );
    let pm25 = write_model(
        &dir,
        "pm2_5.json",
        &json!({
            "kind": "linear",
            "target": "pm2.5",
            "coefficients": {"pm2_5_lag1": 1.0}
        }),
    );

    let config = config_with(vec![
        PollutantConfig {
            pollutant: Pollutant::Pm10,
            model_path: pm10,
            features: FeaturePrep::Calendar,
            lag_seed: Vec::new(),
        },
        PollutantConfig {
            pollutant: Pollutant::Pm25,
            model_path: pm25,
            features: FeaturePrep::LagInteraction { depth: 2 },
            lag_seed: vec![40.0, 42.0, 45.0, 43.0, 41.0, 39.0, 38.0],
        },
    ]);
    let app = app_for(&config);
    (dir, app)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_string(response).await)
}

async fn post_json(app: Router, uri: &str, payload: &Value) -> (StatusCode, Value) {
    let payload = payload.to_string();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_LENGTH, payload.len())
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = body_string(response).await;
    (status, serde_json::from_str(&body).unwrap_or(Value::Null))
}

fn multipart_body(filename: &str, contents: &str) -> String {
    format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n\
         {contents}\r\n\
         --{BOUNDARY}--\r\n"
    )
}

async fn post_multipart(app: Router, body: String) -> (StatusCode, String) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_string(response).await)
}

fn data_url(csv: &str) -> String {
    format!("data:text/csv;base64,{}", STANDARD.encode(csv))
}

#[tokio::test]
async fn test_health() {
    let (_dir, app) = working_app();
    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_dashboard_renders_cards_table_and_chart() {
    let (_dir, app) = working_app();
    let (status, html) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Today&#39;s Temperature") || html.contains("Today's Temperature"));
    assert!(html.contains("25.00 °C"));
    assert!(html.contains("50.00 %"));
    // PM10 on day one: 1 + 0.5 * 50 + 25
    assert!(html.contains("51.00 µg/m³"));
    assert!(html.contains(r#"id="forecast-table""#));
    assert!(html.contains("2024-03-01"));
    assert!(html.contains("2024-03-07"));
    assert!(html.contains(r#"id="chart-spec""#));
    assert!(!html.contains("alert-warning"));
}

#[tokio::test]
async fn test_dashboard_with_missing_model_shows_placeholders() {
    let dir = TempDir::new().unwrap();
    let config = config_with(vec![PollutantConfig {
        pollutant: Pollutant::Pm10,
        model_path: dir.path().join("absent.json").display().to_string(),
        features: FeaturePrep::Calendar,
        lag_seed: Vec::new(),
    }]);

    let state = state_for(&config);
    assert!(state.forecast.is_degraded());
    assert!(state.forecast.series(Pollutant::Pm10).iter().all(|v| *v == 0.0));

    let (status, html) = get(web::app(state, &config.server), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("alert-warning"));
    assert!(html.contains("0.00 µg/m³"));
}

#[tokio::test]
async fn test_api_forecast_has_seven_rows() {
    let (_dir, app) = working_app();
    let (status, body) = get(app, "/api/forecast").await;
    assert_eq!(status, StatusCode::OK);

    let forecast: Value = serde_json::from_str(&body).unwrap();
    let rows = forecast["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[0]["date"], "2024-03-01");
    assert_eq!(rows[6]["date"], "2024-03-07");
    assert_eq!(rows[0]["predictions"]["pm10"], 51.0);
    // lag1 of the seed, backfilled on the first day
    assert_eq!(rows[0]["predictions"]["pm2.5"], 40.0);
    assert_eq!(rows[1]["predictions"]["pm2.5"], 40.0);
    assert_eq!(rows[2]["predictions"]["pm2.5"], 42.0);
}

#[tokio::test]
async fn test_api_chart_matches_numeric_series() {
    let (_dir, app) = working_app();
    let (status, body) = get(app, "/api/chart").await;
    assert_eq!(status, StatusCode::OK);

    let chart: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(chart["kind"], "bar");
    assert_eq!(chart["x"].as_array().unwrap().len(), 7);
    let series = chart["series"].as_array().unwrap();
    assert_eq!(series.len(), 2);
    assert!(series[0]["values"][0].is_number());
}

#[tokio::test]
async fn test_api_upload_csv() {
    let (_dir, app) = working_app();
    let csv = "name,value\na,1\nb,2\n";
    let (status, body) = post_json(
        app,
        "/api/upload",
        &json!({"contents": data_url(csv), "filename": "data.csv"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "table");
    assert_eq!(body["filename"], "data.csv");
    assert_eq!(body["columns"], json!(["name", "value"]));
    assert_eq!(body["page"]["count"], 1);
    assert_eq!(body["page"]["rows"], json!([["a", "1"], ["b", "2"]]));
}

#[tokio::test]
async fn test_api_upload_paginates() {
    let (_dir, app) = working_app();
    let mut csv = String::from("n\n");
    for i in 0..25 {
        csv.push_str(&format!("{i}\n"));
    }
    let (_, body) = post_json(
        app,
        "/api/upload",
        &json!({"contents": data_url(&csv), "filename": "rows.csv", "page": 2}),
    )
    .await;

    assert_eq!(body["page"]["count"], 3);
    assert_eq!(body["page"]["rows"].as_array().unwrap().len(), 5);
    assert_eq!(body["page"]["rows"][0], json!(["20"]));
}

#[tokio::test]
async fn test_api_upload_rejects_non_csv() {
    let (_dir, app) = working_app();
    let (_, body) = post_json(
        app,
        "/api/upload",
        &json!({"contents": data_url("a,b\n1,2\n"), "filename": "data.txt"}),
    )
    .await;

    assert_eq!(body["outcome"], "not_csv");
    assert_eq!(body["message"], "The selected file is not a CSV file");
    assert!(body.get("page").is_none());
}

#[tokio::test]
async fn test_api_upload_without_contents() {
    let (_dir, app) = working_app();
    let (_, body) = post_json(app, "/api/upload", &json!({})).await;
    assert_eq!(body["outcome"], "empty");
    assert_eq!(body["message"], "No CSV file selected yet");
}

#[tokio::test]
async fn test_api_upload_bad_payload_reports_error() {
    let (_dir, app) = working_app();
    let (_, body) = post_json(
        app,
        "/api/upload",
        &json!({"contents": "data:text/csv;base64,@@@", "filename": "data.csv"}),
    )
    .await;
    assert_eq!(body["outcome"], "failed");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("An error occurred: ")
    );
}

#[tokio::test]
async fn test_upload_page_form() {
    let (_dir, app) = working_app();
    let (status, html) = get(app, "/upload").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(r#"name="file""#));
    assert!(html.contains("No CSV file selected yet"));
}

#[tokio::test]
async fn test_multipart_upload_renders_table() {
    let (_dir, app) = working_app();
    let mut csv = String::from("id,pm10\n");
    for i in 1..=12 {
        csv.push_str(&format!("{i},{}\n", 30 + i));
    }

    let (status, html) = post_multipart(app, multipart_body("stations.csv", &csv)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("stations.csv"));
    assert!(html.contains(r#"<tr data-page="0"><td>1</td><td>31</td></tr>"#));
    // Row 11 sits on the second page, rendered hidden until paged to
    assert!(html.contains(r#"<tr data-page="1" hidden><td>11</td><td>41</td></tr>"#));
    assert!(html.contains("Page 1 of 2"));
    assert!(html.contains("Rows: 12 (10 per page)"));
    assert!(html.contains("/assets/dashboard.js"));
}

#[tokio::test]
async fn test_multipart_upload_pads_short_rows() {
    let (_dir, app) = working_app();
    let (_, html) = post_multipart(app, multipart_body("short.csv", "a,b\n1\n2,3\n")).await;
    assert!(html.contains("<td>1</td><td></td>"));
    assert!(html.contains("<td>2</td><td>3</td>"));
}

#[tokio::test]
async fn test_multipart_upload_rejects_extension() {
    let (_dir, app) = working_app();
    let (_, html) = post_multipart(app, multipart_body("stations.xlsx", "id\n1\n")).await;
    assert!(html.contains("The selected file is not a CSV file"));
}

#[tokio::test]
async fn test_upload_body_limit() {
    let dir = TempDir::new().unwrap();
    let mut config = config_with(vec![PollutantConfig {
        pollutant: Pollutant::Pm10,
        model_path: dir.path().join("absent.json").display().to_string(),
        features: FeaturePrep::Calendar,
        lag_seed: Vec::new(),
    }]);
    config.server = ServerConfig {
        max_upload_bytes: 64,
        ..ServerConfig::default()
    };

    let payload = json!({"contents": data_url(&"x,".repeat(200)), "filename": "big.csv"});
    let (status, _) = post_json(app_for(&config), "/api/upload", &payload).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_static_assets_served() {
    let (_dir, app) = working_app();
    let (status, body) = get(app, "/assets/dashboard.js").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("/api/chart"));
}
