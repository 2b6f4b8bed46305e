//! Shared harness for the API service HTTP tests

#![allow(dead_code)]

use std::sync::Arc;

use api::{AppState, create_router};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use common::{
    cache::MemoryKeyValueStore,
    models::{Listing, ListingStatus, NewBusinessVerification, NewListing, NewUser, Role, User},
    notify::MemoryEmailSender,
    policy::AccessPolicy,
    repositories::{Repositories, memory::MemoryStore},
    token::{JwtConfig, JwtService},
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub router: Router,
    pub repos: Repositories,
    pub jwt: JwtService,
    pub email: Arc<MemoryEmailSender>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Value,
}

pub fn test_app() -> TestApp {
    let repos = Repositories::in_memory(MemoryStore::new());
    let jwt = JwtService::new(JwtConfig::with_secret("api-test-secret")).unwrap();
    let email = Arc::new(MemoryEmailSender::new());

    let state = AppState::new(
        repos.clone(),
        jwt.clone(),
        Arc::new(MemoryKeyValueStore::new()),
        email.clone(),
        AccessPolicy::default(),
    );

    TestApp {
        router: create_router(state),
        repos,
        jwt,
        email,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|value| value.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            location,
            body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request("GET", uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request("POST", uri, Some(token), Some(body)).await
    }

    /// Register a user directly in storage, optionally with a role
    pub async fn user(&self, email: &str, role: Option<Role>) -> User {
        let user = self
            .repos
            .users
            .create(&NewUser {
                name: email.split('@').next().unwrap_or("user").to_string(),
                email: email.to_string(),
                password_hash: "not-a-real-hash".to_string(),
            })
            .await
            .unwrap();

        match role {
            Some(role) => self.repos.users.assign_role(user.id, role).await.unwrap(),
            None => user,
        }
    }

    /// Provider whose business verification was approved
    pub async fn verified_provider(&self, email: &str) -> User {
        let provider = self.user(email, Some(Role::Provider)).await;
        let request = self
            .repos
            .verifications
            .submit(&NewBusinessVerification {
                user_id: provider.id,
                business_name: "Harbour Stays".to_string(),
                registration_number: "REG-001".to_string(),
                document_url: None,
                contact_phone: None,
            })
            .await
            .unwrap();
        self.repos
            .verifications
            .approve(request.id, Uuid::new_v4())
            .await
            .unwrap();

        self.repos
            .users
            .find_by_id(provider.id)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn approved_listing(&self, provider: &User, price_per_night: f64) -> Listing {
        let listing = self
            .repos
            .listings
            .create(&NewListing {
                provider_id: provider.id,
                title: "Harbour loft".to_string(),
                description: "Two rooms by the water".to_string(),
                category: "apartment".to_string(),
                location: "Lisbon".to_string(),
                price_per_night,
                capacity: 2,
            })
            .await
            .unwrap();

        self.repos
            .listings
            .set_status(listing.id, ListingStatus::Approved, None)
            .await
            .unwrap()
    }

    pub fn token(&self, user: &User) -> String {
        self.jwt.generate_access_token(user).unwrap()
    }
}
