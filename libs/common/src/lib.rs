//! Common library for the auth-hub application
//!
//! This crate provides the infrastructure shared by auth-hub services:
//! PostgreSQL connection pooling, configuration loading, and the database
//! error types.

pub mod database;
pub mod error;
