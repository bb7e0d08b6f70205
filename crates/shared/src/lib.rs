//! Shared types, errors, and configuration for ContentForge.
//!
//! This crate provides common types used across all other crates:
//! - Money amounts in minor units with currency
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT issuing and validation
//! - Transactional email over the Resend SMTP relay

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::{AppConfig, EmailConfig};
pub use email::{EmailError, EmailService};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
