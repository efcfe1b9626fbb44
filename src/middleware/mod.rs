pub mod auth;
pub mod authorize;
pub mod response;

pub use auth::{extract_bearer_token, AuthenticatedActor, VerifiedIdentity};
pub use authorize::authorize_request;
pub use response::{ApiResponse, ApiResult};
