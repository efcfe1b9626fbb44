pub mod account;
pub mod policy;
pub mod role;
pub mod server;
pub mod token;
