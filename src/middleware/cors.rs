// src/middleware/cors.rs
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::ORIGIN, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer, ExposeHeaders};
use tracing::warn;

use crate::config::{ConfigError, CorsConfig};
use crate::middleware::csrf::CSRF_HEADER;

/// Validated cross-origin policy. Credentials are always allowed.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    any_origin: bool,
    origins: Vec<HeaderValue>,
    methods: Vec<Method>,
    headers: Vec<HeaderName>,
}

impl CorsPolicy {
    pub fn from_config(cfg: &CorsConfig) -> Result<Self, ConfigError> {
        let mut any_origin = false;
        let mut origins = Vec::with_capacity(cfg.allowed_origins.len());
        for raw in &cfg.allowed_origins {
            let o = raw.trim().trim_end_matches('/');
            if o == "*" {
                any_origin = true;
                continue;
            }
            let v = HeaderValue::from_str(&o.to_ascii_lowercase())
                .map_err(|_| ConfigError::InvalidOrigin(raw.clone()))?;
            origins.push(v);
        }

        let methods = cfg
            .allowed_methods
            .iter()
            .map(|m| match m.trim() {
                // credentials are always on, so wildcards are not allowed here
                "*" => Err(ConfigError::InvalidMethod(m.clone())),
                t => Method::from_bytes(t.to_ascii_uppercase().as_bytes())
                    .map_err(|_| ConfigError::InvalidMethod(m.clone())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let headers = cfg
            .allowed_headers
            .iter()
            .map(|h| match h.trim() {
                "*" => Err(ConfigError::InvalidHeader(h.clone())),
                t => HeaderName::from_bytes(t.as_bytes())
                    .map_err(|_| ConfigError::InvalidHeader(h.clone())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            any_origin,
            origins,
            methods,
            headers,
        })
    }

    pub fn allows_origin(&self, origin: &HeaderValue) -> bool {
        if self.any_origin {
            return true;
        }
        let Ok(origin) = origin.to_str() else {
            return false;
        };
        let origin = origin.trim_end_matches('/');
        self.origins
            .iter()
            .any(|o| o.as_bytes().eq_ignore_ascii_case(origin.as_bytes()))
    }

    /// `tower-http` layer that answers preflights and decorates responses.
    pub fn layer(&self) -> CorsLayer {
        let origin = if self.any_origin {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::list(self.origins.clone())
        };
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(AllowMethods::list(self.methods.clone()))
            .allow_headers(AllowHeaders::list(self.headers.clone()))
            .allow_credentials(true)
            .expose_headers(ExposeHeaders::list([HeaderName::from_static(CSRF_HEADER)]))
    }
}

/// Reject requests whose `Origin` is present but not on the allow-list.
/// Requests without an `Origin` (same-origin GETs, curl, health checks) pass.
pub async fn reject_unlisted_origins(
    State(policy): State<Arc<CorsPolicy>>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(origin) = req.headers().get(ORIGIN) {
        if !policy.allows_origin(origin) {
            warn!(
                target: "http",
                origin = ?origin,
                path = %req.uri().path(),
                "rejected request from unlisted origin"
            );
            return (StatusCode::FORBIDDEN, "origin not allowed").into_response();
        }
    }
    next.run(req).await
}
