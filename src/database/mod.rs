pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::{MemoryStore, StoreOperation};
pub use postgres::{PgMissionStore, PgRoleStore};
pub use store::{MissionStore, RoleStore};
