use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::http::server::GatewayState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub tracked_rate_limit_keys: usize,
}

#[derive(Serialize)]
pub struct PolicySummary {
    pub name: String,
    pub window_ms: i64,
    pub max_requests: u32,
}

pub async fn get_status(State(state): State<GatewayState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        tracked_rate_limit_keys: state.limiter.store().len(),
    })
}

pub async fn get_policies(State(state): State<GatewayState>) -> Json<Vec<PolicySummary>> {
    let mut policies: Vec<PolicySummary> = state
        .limiter
        .policies()
        .iter()
        .map(|(name, p)| PolicySummary {
            name: name.clone(),
            window_ms: p.window_ms,
            max_requests: p.max_requests,
        })
        .collect();
    policies.sort_by(|a, b| a.name.cmp(&b.name));
    Json(policies)
}
