use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderMap, Method},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use rolodex_shared::clock::Clock;
use rolodex_shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use rolodex_shared::projector::ContactView;
use rolodex_shared::protocol::{
    LayoutSettings, LayoutSettingsPatch, LayoutSettingsResponse, Page, ResetViewsRequest,
    TrackViewRequest, TrackViewResponse, ViewStatus, WeekViewsResponse,
};
use rolodex_shared::records::Agency;
use rolodex_shared::types::UserId;
use rolodex_store::ProfileStore;

use crate::auth::{authenticate, verify_admin_token};
use crate::catalog::RecordCatalog;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::layout::LayoutService;
use crate::locks::UserLocks;
use crate::quota::QuotaService;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub quota: QuotaService,
    pub layout: LayoutService,
    pub locks: UserLocks,
    pub catalog: Arc<RecordCatalog>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn ProfileStore>,
        clock: Arc<dyn Clock>,
        catalog: RecordCatalog,
    ) -> Self {
        let locks = UserLocks::new();
        let quota = QuotaService::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            locks.clone(),
            config.daily_limit,
        );
        let layout = LayoutService::new(store, clock, locks.clone());
        let rate_limiter = RateLimiter::new(
            config.rate_limit_per_sec,
            config.rate_limit_burst,
            &config.user_header,
        );

        Self {
            quota,
            layout,
            locks,
            catalog: Arc::new(catalog),
            rate_limiter,
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/view-status", get(view_status))
        .route("/track-view", post(track_view))
        .route("/week-views", post(week_views))
        .route("/layout-settings", get(get_layout).post(update_layout))
        .route("/agencies", get(list_agencies))
        .route("/contacts", get(list_contacts))
        .route("/admin/reset-views", post(admin_reset_views))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    daily_limit: u32,
    contacts: usize,
    agencies: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    page: Option<usize>,
    per_page: Option<usize>,
}

impl PageQuery {
    fn resolve(&self) -> (usize, usize) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, per_page)
    }
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        daily_limit: state.config.daily_limit,
        contacts: state.catalog.contacts().len(),
        agencies: state.catalog.agencies().len(),
    })
}

// ─── Quota endpoints ───

async fn view_status(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<ViewStatus>, ServerError> {
    let user = authenticate(&headers, &state.config)?;
    Ok(Json(state.quota.view_status(&user).await?))
}

async fn track_view(
    headers: HeaderMap,
    State(state): State<AppState>,
    body: Result<Json<TrackViewRequest>, JsonRejection>,
) -> Result<Json<TrackViewResponse>, ServerError> {
    let user = authenticate(&headers, &state.config)?;

    let contact_id = body
        .ok()
        .and_then(|Json(req)| req.contact_id)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ServerError::BadRequest("Contact ID required".into()))?;

    let outcome = state.quota.track_view(&user, &contact_id).await?;
    Ok(Json(outcome.into_response(state.quota.limit())))
}

async fn week_views(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<WeekViewsResponse>, ServerError> {
    let user = authenticate(&headers, &state.config)?;
    let week_views = state.quota.week_tick(&user).await?;
    Ok(Json(WeekViewsResponse {
        success: true,
        week_views,
    }))
}

// ─── Preferences ───

async fn get_layout(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<LayoutSettings>, ServerError> {
    let user = authenticate(&headers, &state.config)?;
    Ok(Json(state.layout.get(&user).await?))
}

async fn update_layout(
    headers: HeaderMap,
    State(state): State<AppState>,
    body: Result<Json<LayoutSettingsPatch>, JsonRejection>,
) -> Result<Json<LayoutSettingsResponse>, ServerError> {
    let user = authenticate(&headers, &state.config)?;
    let Json(patch) = body.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let layout_settings = state.layout.update(&user, patch).await?;
    Ok(Json(LayoutSettingsResponse {
        success: true,
        layout_settings,
    }))
}

// ─── Record listings ───

async fn list_agencies(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Agency>>, ServerError> {
    authenticate(&headers, &state.config)?;
    let (page, per_page) = query.resolve();
    Ok(Json(state.catalog.agencies_page(page, per_page)))
}

async fn list_contacts(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<ContactView>>, ServerError> {
    let user = authenticate(&headers, &state.config)?;
    let (page, per_page) = query.resolve();

    let record = state.quota.current(&user).await?;
    Ok(Json(
        state
            .catalog
            .contacts_page(page, per_page, &record.viewed_ids),
    ))
}

// ─── Admin ───

async fn admin_reset_views(
    headers: HeaderMap,
    State(state): State<AppState>,
    body: Result<Json<ResetViewsRequest>, JsonRejection>,
) -> Result<Json<ViewStatus>, ServerError> {
    verify_admin_token(&headers, &state.config)?;

    let user = body
        .ok()
        .and_then(|Json(req)| UserId::parse(&req.user_id))
        .ok_or_else(|| ServerError::BadRequest("User ID required".into()))?;
    let record = state.quota.reset(&user).await?;

    info!(user = %user, "Admin reset daily views");
    Ok(Json(ViewStatus::from_record(
        &record,
        state.quota.limit(),
        state.quota.today(),
    )))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_listener(state, listener).await
}

/// Serve on an already-bound listener.
pub async fn serve_listener(
    state: AppState,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %listener.local_addr()?, "Starting HTTP API server");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
