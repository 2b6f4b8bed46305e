//! Application state shared across handlers

use std::sync::Arc;

use common::{
    cache::KeyValueStore,
    notify::{EmailSender, NotificationDispatcher, RepositoryDispatcher},
    policy::AccessPolicy,
    repositories::Repositories,
    risk::RiskService,
    token::JwtService,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub risk: RiskService,
    pub dispatcher: Arc<dyn NotificationDispatcher>,
    pub email: Arc<dyn EmailSender>,
    pub jwt: JwtService,
    /// Revoked tokens, shared with the auth service
    pub revocations: Arc<dyn KeyValueStore>,
    pub policy: AccessPolicy,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        jwt: JwtService,
        revocations: Arc<dyn KeyValueStore>,
        email: Arc<dyn EmailSender>,
        policy: AccessPolicy,
    ) -> Self {
        let dispatcher = Arc::new(RepositoryDispatcher::new(repos.notifications.clone()));

        Self {
            risk: RiskService::new(repos.clone()),
            repos,
            dispatcher,
            email,
            jwt,
            revocations,
            policy,
        }
    }
}
