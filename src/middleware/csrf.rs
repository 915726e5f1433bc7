//! # CSRF guard
//! Signed double-submit tokens for state-changing requests.
//!
//! - Safe methods (GET, HEAD, OPTIONS, TRACE) always pass. The response
//!   carries a token in `X-CSRF-Token` and, when the client had no valid one,
//!   a fresh `_csrf` cookie.
//! - Unsafe methods need an `Origin`/`Referer` that is the request's own host
//!   or a trusted origin (when either header is present), and an
//!   `X-CSRF-Token` header equal to a valid `_csrf` cookie.
//!
//! A token is `hex(nonce) "." hex(HMAC-SHA256(secret, nonce))`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        header::{COOKIE, HOST, ORIGIN, REFERER, SET_COOKIE},
        HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;
use url::Url;

use crate::config::{ConfigError, CsrfConfig};

pub const CSRF_HEADER: &str = "x-csrf-token";
pub const CSRF_COOKIE: &str = "_csrf";
pub const MIN_SECRET_LEN: usize = 32;

const NONCE_LEN: usize = 16;

type HmacSha256 = Hmac<Sha256>;

pub struct CsrfGuard {
    // keyed once, cloned per token
    mac: HmacSha256,
    // lowercase `host[:port]`
    trusted: Vec<String>,
}

impl std::fmt::Debug for CsrfGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfGuard")
            .field("key", &"<redacted>")
            .field("trusted", &self.trusted)
            .finish()
    }
}

impl CsrfGuard {
    pub fn new(secret: &[u8], trusted_origins: &[String]) -> Result<Self, ConfigError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakCsrfSecret {
                min: MIN_SECRET_LEN,
            });
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| ConfigError::WeakCsrfSecret {
            min: MIN_SECRET_LEN,
        })?;
        Ok(Self {
            mac,
            trusted: trusted_origins.iter().map(|o| authority_of(o)).collect(),
        })
    }

    pub fn with_random_secret(trusted_origins: &[String]) -> Result<Self, ConfigError> {
        let secret: [u8; MIN_SECRET_LEN] = rand::random();
        Self::new(&secret, trusted_origins)
    }

    pub fn from_config(cfg: &CsrfConfig) -> Result<Self, ConfigError> {
        match &cfg.secret {
            Some(s) => Self::new(s.as_bytes(), &cfg.trusted_origins),
            None => {
                warn!("CSRF_SECRET not set; using a random secret, tokens reset on restart");
                Self::with_random_secret(&cfg.trusted_origins)
            }
        }
    }

    pub fn issue_token(&self) -> String {
        let nonce: [u8; NONCE_LEN] = rand::random();
        format!("{}.{}", hex::encode(nonce), self.sign(&nonce))
    }

    pub fn verify_token(&self, token: &str) -> bool {
        let Some((nonce_hex, mac_hex)) = token.split_once('.') else {
            return false;
        };
        let (Ok(nonce), Ok(tag)) = (hex::decode(nonce_hex), hex::decode(mac_hex)) else {
            return false;
        };
        if nonce.len() != NONCE_LEN {
            return false;
        }
        let mut mac = self.mac.clone();
        mac.update(&nonce);
        mac.verify_slice(&tag).is_ok()
    }

    fn sign(&self, msg: &[u8]) -> String {
        let mut mac = self.mac.clone();
        mac.update(msg);
        hex::encode(mac.finalize().into_bytes())
    }

    fn is_trusted(&self, origin: &str, host: Option<&str>) -> bool {
        let Ok(url) = Url::parse(origin) else {
            return false;
        };
        let Some(h) = url.host_str() else {
            return false;
        };
        let authority = match url.port() {
            Some(p) => format!("{h}:{p}"),
            None => h.to_string(),
        }
        .to_ascii_lowercase();

        host.is_some_and(|h| h.eq_ignore_ascii_case(&authority))
            || self.trusted.iter().any(|t| *t == authority)
    }

    fn check_unsafe(&self, headers: &HeaderMap, cookie: Option<&str>) -> Result<(), &'static str> {
        let claimed = headers
            .get(ORIGIN)
            .or_else(|| headers.get(REFERER))
            .map(|v| v.to_str().unwrap_or_default());
        if let Some(origin) = claimed {
            let host = headers.get(HOST).and_then(|v| v.to_str().ok());
            if !self.is_trusted(origin, host) {
                return Err("origin not trusted");
            }
        }

        let sent = headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok());
        match (sent, cookie) {
            (Some(sent), Some(cookie)) if bool::from(sent.as_bytes().ct_eq(cookie.as_bytes())) => {
                Ok(())
            }
            _ => Err("CSRF token missing or invalid"),
        }
    }
}

/// axum middleware enforcing the rules above.
pub async fn protect(State(guard): State<Arc<CsrfGuard>>, req: Request, next: Next) -> Response {
    let cookie = cookie_value(req.headers(), CSRF_COOKIE).filter(|t| guard.verify_token(t));

    if is_safe(req.method()) {
        let (token, fresh) = match cookie {
            Some(t) => (t, false),
            None => (guard.issue_token(), true),
        };
        let mut resp = next.run(req).await;
        if let Ok(v) = HeaderValue::from_str(&token) {
            resp.headers_mut()
                .insert(HeaderName::from_static(CSRF_HEADER), v);
        }
        if fresh {
            let set = format!("{CSRF_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
            if let Ok(v) = HeaderValue::from_str(&set) {
                resp.headers_mut().append(SET_COOKIE, v);
            }
        }
        return resp;
    }

    if let Err(reason) = guard.check_unsafe(req.headers(), cookie.as_deref()) {
        warn!(
            target: "http",
            method = %req.method(),
            path = %req.uri().path(),
            reason,
            "CSRF check failed"
        );
        return (StatusCode::FORBIDDEN, reason).into_response();
    }
    next.run(req).await
}

fn is_safe(m: &Method) -> bool {
    matches!(*m, Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}

// "https://a.test:8443/" -> "a.test:8443", "A.test" -> "a.test"
fn authority_of(origin: &str) -> String {
    let o = origin.trim();
    let o = o
        .strip_prefix("https://")
        .or_else(|| o.strip_prefix("http://"))
        .unwrap_or(o);
    o.trim_end_matches('/').to_ascii_lowercase()
}
