// Session cookies
//
// Both session tokens travel as http-only cookies. Login sets both, refresh
// replaces the access cookie, logout removes both.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;

use crate::configuration::CookieSettings;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Http-only session cookie as set at login
pub fn session_cookie<'a>(name: &'a str, token: &str, config: &CookieSettings) -> Cookie<'a> {
    Cookie::build(name, token.to_string())
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .finish()
}

/// Access cookie set by the refresh endpoint.
///
/// Always `Secure` and `SameSite=None` so a client on another origin can
/// keep renewing its session.
pub fn refreshed_access_cookie<'a>(token: &str) -> Cookie<'a> {
    Cookie::build(ACCESS_TOKEN_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .finish()
}

/// Expired, empty cookie that makes the client drop `name`
pub fn removal_cookie<'a>(name: &'a str) -> Cookie<'a> {
    let mut cookie = Cookie::build(name, "").path("/").http_only(true).finish();
    cookie.make_removal();
    cookie
}

pub fn access_token_from(req: &HttpRequest) -> Option<String> {
    req.cookie(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|token| !token.is_empty())
}
