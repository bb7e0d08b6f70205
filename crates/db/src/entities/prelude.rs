//! Entity re-exports.

pub use super::account::Entity as Account;
pub use super::brand::Entity as Brand;
pub use super::output::Entity as Output;
pub use super::project::Entity as Project;
pub use super::session::Entity as Session;
pub use super::subscription::Entity as Subscription;
pub use super::team::Entity as Team;
pub use super::team_member::Entity as TeamMember;
pub use super::transaction::Entity as Transaction;
pub use super::user::Entity as User;
pub use super::verification::Entity as Verification;
