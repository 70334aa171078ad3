//! Shared harness for the integration tests.
//!
//! Each test gets its own server on a random port, backed by a fresh
//! in-memory credential store and a manually driven clock.

#![allow(dead_code)]

use reqwest::Response;
use serde_json::{json, Value};
use social_backend::auth::MockClock;
use social_backend::configuration::{
    ApplicationSettings, CookieSettings, DatabaseSettings, JwtSettings, Settings,
};
use social_backend::startup::run;
use social_backend::store::InMemoryCredentialStore;
use std::net::TcpListener;
use std::sync::Arc;

pub const ACCESS_SECRET: &str = "integration-access-secret";
pub const REFRESH_SECRET: &str = "integration-refresh-secret";

pub struct TestApp {
    pub address: String,
    pub store: InMemoryCredentialStore,
    pub clock: MockClock,
    pub jwt: JwtSettings,
    pub client: reqwest::Client,
}

pub fn test_settings() -> Settings {
    Settings {
        database: DatabaseSettings {
            username: "postgres".to_string(),
            password: "password".to_string(),
            port: 5432,
            host: "localhost".to_string(),
            database_name: "unused".to_string(),
        },
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            client_origin: "http://localhost:3000".to_string(),
        },
        jwt: JwtSettings {
            access_secret: ACCESS_SECRET.to_string(),
            refresh_secret: REFRESH_SECRET.to_string(),
            access_token_expiry: 15,
            refresh_token_expiry: 600,
            issuer: "social-backend".to_string(),
        },
        cookies: CookieSettings { secure: true },
    }
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let settings = test_settings();
    let jwt = settings.jwt.clone();
    let store = InMemoryCredentialStore::new();
    let clock = MockClock::starting_now();

    let server = run(listener, store.clone(), settings, Arc::new(clock.clone()))
        .expect("Failed to create server");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        clock,
        jwt,
        client: reqwest::Client::new(),
    }
}

/// Value of the named cookie in the response's `Set-Cookie` headers
pub fn set_cookie_value(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .filter_map(|header| header.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
}

/// Full `Set-Cookie` header for the named cookie
pub fn set_cookie_header(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .find(|header| header.starts_with(&prefix))
        .map(str::to_string)
}

impl TestApp {
    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(&format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn register(&self, name: &str, username: &str, password: &str) -> Response {
        self.post_json(
            "/api/auth/register",
            &json!({
                "name": name,
                "username": username,
                "email": format!("{}@example.com", username),
                "password": password,
            }),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.post_json(
            "/api/auth/login",
            &json!({ "username": username, "password": password }),
        )
        .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Response {
        self.post_json(
            "/api/auth/refresh-token",
            &json!({ "refreshToken": refresh_token }),
        )
        .await
    }

    /// GET with the access token sent back as a cookie
    pub async fn get_with_token(&self, path: &str, access_token: Option<&str>) -> Response {
        let mut request = self.client.get(&format!("{}{}", self.address, path));
        if let Some(token) = access_token {
            request = request.header(
                reqwest::header::COOKIE,
                format!("access_token={}", token),
            );
        }
        request.send().await.expect("Failed to execute request.")
    }

    /// Register and log in; returns `(access_token, refresh_token)` from the cookies
    pub async fn login_fresh_user(&self, username: &str, password: &str) -> (String, String) {
        let response = self.register("Alice Smith", username, password).await;
        assert_eq!(201, response.status().as_u16());

        let response = self.login(username, password).await;
        assert_eq!(200, response.status().as_u16());

        let access = set_cookie_value(&response, "access_token").expect("no access cookie");
        let refresh = set_cookie_value(&response, "refresh_token").expect("no refresh cookie");
        (access, refresh)
    }
}

pub async fn error_type(response: Response) -> String {
    let body: Value = response.json().await.expect("Failed to parse error body");
    body["error_type"].as_str().unwrap_or_default().to_string()
}
