pub mod cascade;
pub mod ownership;
pub mod role_resolver;

pub use cascade::{CascadeDeleter, CascadeOutcome, CascadeStep};
pub use ownership::{authorize_mutation, can_mutate, creation_owner, GuardError, MissionActor};
pub use role_resolver::RoleResolver;
