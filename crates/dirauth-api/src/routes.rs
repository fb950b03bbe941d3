//! Introspection, health and discovery cache endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use dirauth_core::{AuthRequest, AuthResponse, ErrorCode};
use serde::Serialize;
use tracing::{debug, info};

use crate::server::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub timestamp: String,
}

/// Discovered servers for one domain
#[derive(Debug, Serialize)]
pub struct DiscoveredServers {
    pub domain: String,
    pub servers: Vec<String>,
}

/// Cache invalidation acknowledgement
#[derive(Debug, Serialize)]
pub struct Invalidated {
    pub invalidated: String,
}

/// Verify a username/password pair.
///
/// The HTTP status line mirrors the `status` field of the body. A body that
/// cannot be read as a request is answered as `invalid_request`.
pub async fn introspect(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> (StatusCode, Json<AuthResponse>) {
    let response = match payload {
        Ok(Json(request)) => {
            debug!("Introspect request: {:?}", request);
            state.authenticator.authenticate(&request).await
        }
        Err(rejection) => {
            debug!("Rejected introspect body: {}", rejection);
            AuthResponse::failure(ErrorCode::InvalidRequest, "username and password required")
        }
    };

    let status = StatusCode::from_u16(response.status.as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response))
}

/// Liveness check; never contacts the directory
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheck> {
    Json(HealthCheck {
        status: "healthy".to_string(),
        version: dirauth_core::VERSION.to_string(),
        uptime: format_uptime(state.start_time.elapsed()),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /api/v1/discovery/{domain} - Server list, as the authenticator would use it
pub async fn discover_domain(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Json<DiscoveredServers> {
    debug!("GET /api/v1/discovery/{}", domain);

    let servers = state.authenticator.discovery().resolve(&domain).await;
    Json(DiscoveredServers {
        domain,
        servers: (*servers).clone(),
    })
}

/// DELETE /api/v1/discovery/cache/{domain} - Forget one domain
pub async fn invalidate_domain(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Json<Invalidated> {
    info!("Invalidating discovered servers for {}", domain);

    state.authenticator.discovery().invalidate(&domain).await;
    Json(Invalidated { invalidated: domain })
}

/// DELETE /api/v1/discovery/cache - Forget every domain
pub async fn invalidate_all(State(state): State<AppState>) -> Json<Invalidated> {
    info!("Invalidating all discovered servers");

    state.authenticator.discovery().invalidate_all();
    Json(Invalidated {
        invalidated: "all".to_string(),
    })
}

fn format_uptime(duration: std::time::Duration) -> String {
    let total_secs = duration.as_secs();
    let days = total_secs / 86400;
    let hours = (total_secs % 86400) / 3600;
    let mins = (total_secs % 3600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, mins)
    } else if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(59)), "0m");
        assert_eq!(format_uptime(Duration::from_secs(3 * 3600 + 120)), "3h 2m");
        assert_eq!(format_uptime(Duration::from_secs(2 * 86400 + 3600)), "2d 1h 0m");
    }
}
