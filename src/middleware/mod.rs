// src/middleware/mod.rs
//! Boundary controls wrapped around the API router.
//!
//! Request order: request log → origin gate → CORS → CSRF → handler.

pub mod cors;
pub mod csrf;
pub mod logging;

use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    Router,
};

use crate::config::{ConfigError, CorsConfig, CsrfConfig};
use self::cors::CorsPolicy;
use self::csrf::CsrfGuard;

#[derive(Clone, Debug)]
pub struct BoundaryPolicy {
    cors: Arc<CorsPolicy>,
    csrf: Arc<CsrfGuard>,
}

impl BoundaryPolicy {
    pub fn new(cors: CorsPolicy, csrf: CsrfGuard) -> Self {
        Self {
            cors: Arc::new(cors),
            csrf: Arc::new(csrf),
        }
    }

    pub fn from_config(cors: &CorsConfig, csrf: &CsrfConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            CorsPolicy::from_config(cors)?,
            CsrfGuard::from_config(csrf)?,
        ))
    }

    /// Wrap `router`. Layers added last run first.
    pub fn apply(&self, router: Router) -> Router {
        router
            .layer(from_fn_with_state(self.csrf.clone(), csrf::protect))
            .layer(self.cors.layer())
            .layer(from_fn_with_state(
                self.cors.clone(),
                cors::reject_unlisted_origins,
            ))
            .layer(from_fn(logging::log_requests))
    }
}
