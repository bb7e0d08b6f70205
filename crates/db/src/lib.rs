//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the existing ContentForge schema
//! - Repository abstractions for data access
//!
//! Schema migrations are managed outside this service.

pub mod entities;
pub mod repositories;

pub use repositories::{
    AccountRepository, BrandRepository, NewBrand, NewOutput, NewProject, NewTransaction,
    OutputRepository, ProcessingStatus, ProjectRepository, SessionContext, SessionRepository,
    Settlement, SubscriptionRepository, TeamError, TeamRepository, TransactionError,
    TransactionRepository, UserError, UserRepository, VerificationPurpose, VerificationRepository,
};

use contentforge_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.as_str());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    tracing::info!(
        max_connections = config.max_connections,
        "Connected to database"
    );
    Ok(db)
}
