//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod account;
pub mod brand;
pub mod output;
pub mod project;
pub mod session;
pub mod subscription;
pub mod team;
pub mod transaction;
pub mod user;
pub mod verification;

pub use account::{AccountRepository, CREDENTIAL_PROVIDER};
pub use brand::{BrandRepository, NewBrand};
pub use output::{NewOutput, OutputRepository};
pub use project::{NewProject, ProcessingStatus, ProjectRepository};
pub use session::{SessionContext, SessionRepository};
pub use subscription::SubscriptionRepository;
pub use team::{TeamError, TeamRepository};
pub use transaction::{NewTransaction, Settlement, TransactionError, TransactionRepository};
pub use user::{UserError, UserRepository};
pub use verification::{VerificationPurpose, VerificationRepository};
