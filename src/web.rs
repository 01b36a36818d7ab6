use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::Html,
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, instrument};

use crate::api;
use crate::config::ServerConfig;
use crate::models::Forecast;
use crate::presenter::{DashboardView, Presenter};
use crate::render;
use crate::upload::{self, UploadOutcome};
use crate::PmcastError;

/// Read-only data shared by all handlers; built once before serving
#[derive(Clone)]
pub struct AppState {
    pub forecast: Arc<Forecast>,
    pub view: Arc<DashboardView>,
    page: Arc<str>,
}

impl AppState {
    #[must_use]
    pub fn new(forecast: Forecast, presenter: &Presenter) -> Self {
        let view = presenter.present(&forecast);
        let page = render::render_dashboard(&view);
        Self {
            forecast: Arc::new(forecast),
            view: Arc::new(view),
            page: page.into(),
        }
    }
}

/// Router with all pages, the JSON API and static assets
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(dashboard))
        .route("/upload", get(upload_page).post(upload_form))
        .route("/health", get(health))
        .nest("/api", api::router())
        .nest_service("/assets", ServeDir::new(&config.assets_dir))
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(config.request_timeout_seconds.into()),
                ))
                .layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .with_state(state)
}

async fn dashboard(State(state): State<AppState>) -> Html<String> {
    Html(state.page.to_string())
}

async fn health() -> &'static str {
    "ok"
}

async fn upload_page() -> Html<String> {
    Html(render::render_upload_page(&UploadOutcome::empty()))
}

#[instrument(skip_all)]
async fn upload_form(multipart: Multipart) -> Html<String> {
    let outcome = match read_file_field(multipart).await {
        Ok(Some((filename, bytes))) => upload::parse_bytes(&bytes, &filename),
        Ok(None) => UploadOutcome::empty(),
        Err(e) => {
            tracing::warn!("Failed to read multipart upload: {}", e);
            UploadOutcome::failed(&e)
        }
    };
    Html(render::render_upload_page(&outcome))
}

/// Filename and body of the `file` field; `None` when no file was chosen
async fn read_file_field(
    mut multipart: Multipart,
) -> std::result::Result<Option<(String, Vec<u8>)>, PmcastError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PmcastError::upload(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| PmcastError::upload(e.to_string()))?;

        if filename.is_empty() {
            return Ok(None);
        }
        return Ok(Some((filename, bytes.to_vec())));
    }
    Ok(None)
}

/// Serve until Ctrl-C; over TLS when a certificate is configured
pub async fn run(config: &ServerConfig, state: AppState) -> Result<()> {
    let app = app(state, config);
    let addr = config.bind_address();

    #[cfg(feature = "tls")]
    if let (Some(cert), Some(key)) = (&config.tls_cert_path, &config.tls_key_path) {
        return serve_tls(app, &addr, cert, key).await;
    }

    #[cfg(not(feature = "tls"))]
    if config.tls_cert_path.is_some() {
        tracing::warn!("TLS paths configured but the tls feature is disabled, serving plain HTTP");
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Dashboard running at http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}

#[cfg(feature = "tls")]
async fn serve_tls(app: Router, addr: &str, cert: &str, key: &str) -> Result<()> {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key)
        .await
        .with_context(|| format!("Failed to load TLS certificate {cert} / key {key}"))?;
    let addr: std::net::SocketAddr = addr
        .parse()
        .with_context(|| format!("Invalid bind address {addr}"))?;

    let handle = axum_server::Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
    });

    info!("Dashboard running at https://{}", addr);
    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .context("Server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
