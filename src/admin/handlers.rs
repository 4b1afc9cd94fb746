use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::admin::AdminState;
use crate::health::{ProviderId, ProviderStats, RegistrySnapshot};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub providers: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        providers: state.registry.known_providers().len(),
    })
}

pub async fn get_providers(State(state): State<AdminState>) -> Json<RegistrySnapshot> {
    Json(state.registry.snapshot())
}

pub async fn get_provider(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Json<ProviderStats>, StatusCode> {
    state
        .registry
        .peek(&ProviderId::new(id))
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn get_order(State(state): State<AdminState>) -> Json<Vec<ProviderId>> {
    Json(state.registry.snapshot().order)
}
