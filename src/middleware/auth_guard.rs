/// Auth Guard Middleware
///
/// Validates the access-token cookie and injects the authenticated user into
/// request extensions for use by route handlers. Signature and expiry
/// failures produce the same 401.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::{validate_access_token, AuthenticatedUser, Clock};
use crate::configuration::JwtSettings;
use crate::cookies::access_token_from;
use crate::error::{AppError, AuthError};

/// Guard for routes that require a session
pub struct AuthGuard {
    jwt_config: JwtSettings,
    clock: Arc<dyn Clock>,
}

impl AuthGuard {
    pub fn new(jwt_config: JwtSettings, clock: Arc<dyn Clock>) -> Self {
        Self { jwt_config, clock }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGuardService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthGuardService {
            service: Rc::new(service),
            jwt_config: self.jwt_config.clone(),
            clock: self.clock.clone(),
        }))
    }
}

pub struct AuthGuardService<S> {
    service: Rc<S>,
    jwt_config: JwtSettings,
    clock: Arc<dyn Clock>,
}

impl<S> AuthGuardService<S> {
    fn authenticate(&self, req: &ServiceRequest) -> Result<AuthenticatedUser, AuthError> {
        let token = access_token_from(req.request()).ok_or(AuthError::MissingToken)?;
        let claims = validate_access_token(&token, &self.jwt_config, self.clock.now())?;

        Ok(AuthenticatedUser { user_id: claims.sub })
    }
}

impl<S, B> Service<ServiceRequest> for AuthGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.authenticate(&req) {
            Ok(user) => {
                tracing::debug!(user_id = %user.user_id, "Access token validated");
                req.extensions_mut().insert(user);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                let error: Error = AppError::from(e).into();
                Box::pin(async move { Err(error) })
            }
        }
    }
}
