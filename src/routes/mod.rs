mod auth;
mod health_check;
mod users;

pub use auth::{
    login, logout, refresh_token, register, LoginRequest, LoginResponse, MessageResponse,
    RefreshRequest, RefreshResponse, RegisterRequest, RegisterResponse, RegisteredUser,
};
pub use health_check::health_check;
pub use users::{all_users, current_user};

use crate::error::AppError;

/// Fallback for authenticated requests to routes that do not exist
pub async fn route_not_found() -> Result<actix_web::HttpResponse, AppError> {
    Err(AppError::NotFound("route not found".to_string()))
}
