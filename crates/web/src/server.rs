//! Web server implementation

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use pagegen_common::{build_menu, normalize_path, ContentCache, PageData};

use crate::generator::ContentGenerator;
use crate::shell::render_page;

const GENERATION_FAILED_HTML: &str =
    "<h1>Error</h1><p>Failed to generate content for this page.</p>";

#[derive(Template)]
#[template(
    source = "<h1>Server Error</h1><p>Error during content generation: {{ message }}</p>",
    ext = "html"
)]
struct GenerationErrorSnippet {
    message: String,
}

/// Server configuration
#[derive(Clone)]
pub struct WebServerConfig {
    /// Directory holding cached content snippets
    pub cache_dir: PathBuf,

    /// Content source used on cache misses
    pub generator: Arc<dyn ContentGenerator>,
}

/// Web server state
#[derive(Clone)]
pub struct WebServer {
    state: Arc<WebServerState>,
}

struct WebServerState {
    cache: ContentCache,
    generator: Arc<dyn ContentGenerator>,
}

#[derive(Debug, Deserialize)]
struct PageDataQuery {
    path: Option<String>,
}

pub async fn serve(addr: SocketAddr, cfg: WebServerConfig) -> anyhow::Result<()> {
    let server = WebServer::open(cfg).await?;
    server.serve(addr).await
}

impl WebServer {
    /// Open the cache directory and build the server
    pub async fn open(cfg: WebServerConfig) -> anyhow::Result<Self> {
        let cache = ContentCache::open(&cfg.cache_dir).await?;
        Ok(Self::new(cache, cfg.generator))
    }

    pub fn new(cache: ContentCache, generator: Arc<dyn ContentGenerator>) -> Self {
        Self {
            state: Arc::new(WebServerState { cache, generator }),
        }
    }

    /// Content and menu for a page path.
    ///
    /// Serves from cache when possible, otherwise generates and caches.
    /// Failures degrade to an error snippet rather than an error status.
    pub async fn page_data(&self, raw_path: &str) -> PageData {
        self.state.page_data(raw_path).await
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/get_page_data", get(page_data_handler))
            .route("/favicon.ico", get(favicon_handler))
            .route("/", get(root_page_handler))
            .route("/*path", get(page_handler))
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the web server
    pub async fn serve(self, addr: SocketAddr) -> anyhow::Result<()> {
        info!(
            "pagegen web server starting on http://{} (generator: {}, cache: {})",
            addr,
            self.state.generator.name(),
            self.state.cache.root().display()
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

impl WebServerState {
    async fn page_data(&self, raw_path: &str) -> PageData {
        let path = normalize_path(raw_path);
        let main_content_html = self.main_content(&path).await;

        // Menu is rebuilt after content handling so it includes a fresh entry.
        let menu_items = match self.cache.menu(&path).await {
            Ok(items) => items,
            Err(e) => {
                error!("Failed to list content cache: {}", e);
                build_menu(&path, Vec::new())
            }
        };

        PageData {
            main_content_html,
            menu_items,
        }
    }

    async fn main_content(&self, path: &str) -> String {
        match self.cache.get(path).await {
            Ok(Some(content)) => {
                info!(
                    "Served content for '{}' from cache: {}",
                    path,
                    self.cache.entry_path(path).display()
                );
                return content;
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Error reading content cache for '{}': {}. Will try to regenerate.", path, e);
            }
        }

        info!("Content cache miss for '{}'. Calling {} generator.", path, self.generator.name());
        match self.generator.generate(path).await {
            Ok(content) if content.is_empty() => GENERATION_FAILED_HTML.to_string(),
            Ok(content) => {
                match self.cache.put(path, &content).await {
                    Ok(file) => info!("Saved generated content for '{}' to cache: {}", path, file.display()),
                    Err(e) => error!("Error writing content to cache for '{}': {}", path, e),
                }
                content
            }
            Err(e) => {
                error!("Content generation for '{}' failed: {}", path, e);
                GenerationErrorSnippet { message: e.to_string() }
                    .render()
                    .unwrap_or_else(|_| GENERATION_FAILED_HTML.to_string())
            }
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "pagegen-web"
    }))
}

async fn page_data_handler(
    State(state): State<Arc<WebServerState>>,
    Query(query): Query<PageDataQuery>,
) -> impl IntoResponse {
    let path = query.path.unwrap_or_else(|| "/".to_string());
    Json(state.page_data(&path).await)
}

async fn root_page_handler(State(state): State<Arc<WebServerState>>) -> impl IntoResponse {
    render(state, "/").await
}

async fn page_handler(
    State(state): State<Arc<WebServerState>>,
    Path(path): Path<String>,
) -> impl IntoResponse {
    render(state, &path).await
}

async fn favicon_handler() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

async fn render(state: Arc<WebServerState>, raw_path: &str) -> Response {
    let path = normalize_path(raw_path);
    let data = state.page_data(&path).await;
    match render_page(&path, &data) {
        Ok(body) => Html(body).into_response(),
        Err(e) => {
            error!("Failed to render page '{}': {}", path, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}
