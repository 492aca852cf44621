//! Session gate in front of the review page.
//!
//! Sign-in itself happens elsewhere. This module only answers two questions
//! per request: is the caller's session known yet, and is it authenticated.

use std::collections::HashSet;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::warn;

use crate::storage::RedisKv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub is_loading: bool,
    pub is_authenticated: bool,
}

impl SessionState {
    pub const RESOLVING: SessionState = SessionState {
        is_loading: true,
        is_authenticated: false,
    };
    pub const AUTHENTICATED: SessionState = SessionState {
        is_loading: false,
        is_authenticated: true,
    };
    pub const ANONYMOUS: SessionState = SessionState {
        is_loading: false,
        is_authenticated: false,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still resolving; take no action yet.
    Wait,
    Proceed,
    Redirect(String),
}

/// One-shot access decision for the review page of record `id`.
pub fn guard(session: SessionState, id: &str, auth_path: &str) -> GuardDecision {
    if session.is_loading {
        return GuardDecision::Wait;
    }
    if !session.is_authenticated {
        return GuardDecision::Redirect(auth_redirect(auth_path, id));
    }
    GuardDecision::Proceed
}

/// Sign-in location that returns the caller to `/resume/<id>` afterwards.
pub fn auth_redirect(auth_path: &str, id: &str) -> String {
    format!("{auth_path}?next=/resume/{}", urlencoding::encode(id))
}

/// Pulls the caller's session token from the session cookie, falling back
/// to an `Authorization: Bearer` header for API clients.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_string());
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Resolves a session token to its current state.
///
/// Carried in `AppState` as `Arc<dyn SessionResolver>`.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, token: Option<&str>) -> SessionState;
}

/// Sessions written by the sign-in flow as `session:<token>` keys in Redis.
pub struct RedisSessions {
    redis: RedisKv,
}

impl RedisSessions {
    pub fn new(client: redis::Client) -> Self {
        Self {
            redis: RedisKv::new(client),
        }
    }
}

#[async_trait]
impl SessionResolver for RedisSessions {
    async fn resolve(&self, token: Option<&str>) -> SessionState {
        let Some(token) = token else {
            return SessionState::ANONYMOUS;
        };
        match self.redis.exists(&format!("session:{token}")).await {
            Ok(true) => SessionState::AUTHENTICATED,
            Ok(false) => SessionState::ANONYMOUS,
            Err(e) => {
                // Unknown is not the same as signed out.
                warn!("Session lookup failed, treating as unresolved: {e}");
                SessionState::RESOLVING
            }
        }
    }
}

/// Fixed set of valid tokens, for the memory backend and tests.
#[derive(Default)]
pub struct MemorySessions {
    tokens: RwLock<HashSet<String>>,
}

impl MemorySessions {
    pub fn new(tokens: HashSet<String>) -> Self {
        Self {
            tokens: RwLock::new(tokens),
        }
    }
}

#[async_trait]
impl SessionResolver for MemorySessions {
    async fn resolve(&self, token: Option<&str>) -> SessionState {
        match token {
            Some(t) if self.tokens.read().await.contains(t) => SessionState::AUTHENTICATED,
            _ => SessionState::ANONYMOUS,
        }
    }
}
