//! `SeaORM` entities for the ContentForge schema.
//!
//! Tables and columns keep the existing camelCase names; the schema is owned
//! elsewhere and never migrated from here.

pub mod prelude;
pub mod sea_orm_active_enums;

pub mod account;
pub mod brand;
pub mod output;
pub mod project;
pub mod session;
pub mod subscription;
pub mod team;
pub mod team_member;
pub mod transaction;
pub mod user;
pub mod verification;
