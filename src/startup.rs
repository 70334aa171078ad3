use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::Clock;
use crate::configuration::Settings;
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::AuthGuard;
use crate::routes::{
    all_users, current_user, health_check, login, logout, refresh_token, register,
    route_not_found,
};
use crate::store::CredentialStore;

/// Build CORS for the configured client origin; credentials are allowed so
/// the browser sends the session cookies.
fn build_cors(client_origin: &str) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .supports_credentials();

    if client_origin == "*" {
        cors.allow_any_origin()
    } else {
        cors.allowed_origin(client_origin)
    }
}

/// Body extractor errors surface as 400 validation errors
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::Validation(ValidationError::MalformedBody(err.to_string())).into()
    })
}

pub fn run<S>(
    listener: TcpListener,
    store: S,
    settings: Settings,
    clock: Arc<dyn Clock>,
) -> Result<Server, std::io::Error>
where
    S: CredentialStore + Sync + 'static,
{
    let store = web::Data::new(store);
    let jwt_config = web::Data::new(settings.jwt.clone());
    let cookie_config = web::Data::new(settings.cookies.clone());
    let clock_data: web::Data<dyn Clock> = web::Data::from(clock.clone());
    let client_origin = settings.application.client_origin.clone();

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(build_cors(&client_origin))
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(json_config())
            .app_data(store.clone())
            .app_data(jwt_config.clone())
            .app_data(cookie_config.clone())
            .app_data(clock_data.clone())

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/auth")
                    .route("/register", web::post().to(register::<S>))
                    .route("/login", web::post().to(login::<S>))
                    .route("/logout", web::post().to(logout))
                    .route("/refresh-token", web::post().to(refresh_token)),
            )

            // Protected routes
            .service(
                web::scope("/api/users")
                    .wrap(AuthGuard::new(jwt_config.get_ref().clone(), clock.clone()))
                    .route("", web::get().to(current_user::<S>))
                    .route("/", web::get().to(current_user::<S>))
                    .route("/all", web::get().to(all_users::<S>)),
            )
            .service(
                web::scope("/api/posts")
                    .wrap(AuthGuard::new(jwt_config.get_ref().clone(), clock.clone()))
                    .default_service(web::to(route_not_found)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
