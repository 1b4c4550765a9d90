pub mod auth;
pub mod response;

pub use auth::{jwt_auth_middleware, require_admin, CurrentAccount};
pub use response::{ApiResponse, ApiResult};
