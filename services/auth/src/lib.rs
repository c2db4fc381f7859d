//! Authentication service for auth-hub
//!
//! Registration, credential login, and token-based identity lookup over the
//! `ah_users` table, with stateless HS256 JWTs carrying the subject user id.

pub mod jwt;
pub mod models;
pub mod password;
pub mod repositories;
pub mod routes;
pub mod service;
pub mod validation;

use sqlx::PgPool;

use crate::service::AuthService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
}
