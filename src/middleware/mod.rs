/// Middleware module
///
/// Session authentication for protected scopes.

mod auth_guard;

pub use auth_guard::AuthGuard;
