/// User Routes
///
/// Profile reads for authenticated users. Require the auth guard, which
/// injects `AuthenticatedUser` into the request.

use actix_web::{web, HttpResponse};

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AuthError};
use crate::store::{CredentialStore, PublicUser};

/// GET /api/users
///
/// The authenticated user's own profile.
pub async fn current_user<S: CredentialStore + 'static>(
    user: web::ReqData<AuthenticatedUser>,
    store: web::Data<S>,
) -> Result<HttpResponse, AppError> {
    let user_id = user.id()?;

    let user = store
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(HttpResponse::Ok().json(PublicUser::from(user)))
}

/// GET /api/users/all
pub async fn all_users<S: CredentialStore + 'static>(
    store: web::Data<S>,
) -> Result<HttpResponse, AppError> {
    let users: Vec<PublicUser> = store
        .list_users()
        .await?
        .into_iter()
        .map(PublicUser::from)
        .collect();

    Ok(HttpResponse::Ok().json(users))
}
