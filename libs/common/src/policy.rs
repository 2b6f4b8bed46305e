//! Request-time access policy
//!
//! Every inbound request is classified into an [`AccessState`] from the
//! authenticated principal (if any), and the state decides whether the target
//! path is allowed or which page the caller must be redirected to. Evaluation
//! is pure: the only output is the [`AccessDecision`].

use serde::Serialize;

use crate::models::{Principal, Role};

/// Where a rejected request is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectTarget {
    SignIn,
    RoleSelection,
    Verification,
    Forbidden,
    Home,
    Admin,
}

/// Outcome of evaluating the policy for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Redirect(RedirectTarget),
}

/// Per-identity state of the onboarding/authorization machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    Unauthenticated,
    /// Signed in but no role picked yet
    NoRole,
    Customer,
    Provider { verified: bool },
    Admin,
}

impl AccessState {
    pub fn of(principal: Option<&Principal>) -> Self {
        match principal {
            None => AccessState::Unauthenticated,
            Some(principal) => match principal.role {
                None => AccessState::NoRole,
                Some(Role::Customer) => AccessState::Customer,
                Some(Role::Provider) => AccessState::Provider {
                    verified: principal.verified,
                },
                Some(Role::Admin) => AccessState::Admin,
            },
        }
    }
}

/// Paths the policy knows about
#[derive(Debug, Clone)]
pub struct PolicyPaths {
    pub home: String,
    pub sign_in: String,
    pub role_selection: String,
    pub verification: String,
    pub forbidden: String,
    pub admin: String,
    pub provider_prefixes: Vec<String>,
    /// Reachable without signing in
    pub public_prefixes: Vec<String>,
}

impl Default for PolicyPaths {
    fn default() -> Self {
        Self {
            home: "/".to_string(),
            sign_in: "/sign-in".to_string(),
            role_selection: "/onboarding/role".to_string(),
            verification: "/onboarding/verification".to_string(),
            forbidden: "/403".to_string(),
            admin: "/admin".to_string(),
            provider_prefixes: vec!["/provider".to_string()],
            public_prefixes: vec![
                "/listings".to_string(),
                "/sign-in".to_string(),
                "/403".to_string(),
            ],
        }
    }
}

impl PolicyPaths {
    /// Location header value for a redirect target
    pub fn location(&self, target: RedirectTarget) -> &str {
        match target {
            RedirectTarget::SignIn => &self.sign_in,
            RedirectTarget::RoleSelection => &self.role_selection,
            RedirectTarget::Verification => &self.verification,
            RedirectTarget::Forbidden => &self.forbidden,
            RedirectTarget::Home => &self.home,
            RedirectTarget::Admin => &self.admin,
        }
    }

    fn is_home(&self, path: &str) -> bool {
        normalize(path) == normalize(&self.home)
    }

    fn is_public(&self, path: &str) -> bool {
        self.is_home(path)
            || self
                .public_prefixes
                .iter()
                .any(|prefix| under(path, prefix))
    }

    fn is_admin(&self, path: &str) -> bool {
        under(path, &self.admin)
    }

    fn is_provider_area(&self, path: &str) -> bool {
        self.provider_prefixes
            .iter()
            .any(|prefix| under(path, prefix))
    }

    fn is_role_selection(&self, path: &str) -> bool {
        under(path, &self.role_selection)
    }

    fn is_verification(&self, path: &str) -> bool {
        under(path, &self.verification)
    }
}

/// Trailing slashes are not significant ("/admin/" == "/admin")
fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// Segment-aware prefix match
fn under(path: &str, prefix: &str) -> bool {
    let path = normalize(path);
    let prefix = normalize(prefix);
    if prefix == "/" {
        return true;
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// The access policy evaluated once per request
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    paths: PolicyPaths,
}

impl AccessPolicy {
    pub fn new(paths: PolicyPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &PolicyPaths {
        &self.paths
    }

    /// Decide access for the principal (if any) requesting `path`
    pub fn evaluate(&self, principal: Option<&Principal>, path: &str) -> AccessDecision {
        self.decide(AccessState::of(principal), path)
    }

    pub fn decide(&self, state: AccessState, path: &str) -> AccessDecision {
        use AccessDecision::{Allow, Redirect};

        let paths = &self.paths;
        match state {
            AccessState::Unauthenticated => {
                if paths.is_public(path) {
                    Allow
                } else {
                    Redirect(RedirectTarget::SignIn)
                }
            }
            // Admins bypass every other rule
            AccessState::Admin => {
                if paths.is_admin(path) || paths.is_home(path) {
                    Allow
                } else {
                    Redirect(RedirectTarget::Admin)
                }
            }
            AccessState::NoRole => {
                if paths.is_role_selection(path) || paths.is_verification(path) {
                    Allow
                } else {
                    Redirect(RedirectTarget::RoleSelection)
                }
            }
            AccessState::Customer => {
                if paths.is_role_selection(path) {
                    Redirect(RedirectTarget::Home)
                } else if paths.is_admin(path) || paths.is_provider_area(path) {
                    Redirect(RedirectTarget::Forbidden)
                } else {
                    Allow
                }
            }
            AccessState::Provider { verified } => {
                if paths.is_admin(path) {
                    Redirect(RedirectTarget::Forbidden)
                } else if paths.is_role_selection(path) {
                    if verified {
                        Redirect(RedirectTarget::Home)
                    } else {
                        Redirect(RedirectTarget::Verification)
                    }
                } else if !verified && paths.is_provider_area(path) {
                    Redirect(RedirectTarget::Verification)
                } else {
                    Allow
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn principal(role: Option<Role>, verified: bool) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            role,
            verified,
            is_face_verified: false,
            is_otp_verified: false,
        }
    }

    const PROTECTED: &[&str] = &[
        "/reservations",
        "/reservations/abc/cancel",
        "/provider/listings",
        "/admin",
        "/admin/verifications",
        "/onboarding/role",
        "/onboarding/verification",
        "/messages",
        "/notifications",
        "/users/1/trust",
    ];

    #[test]
    fn unauthenticated_requests_to_protected_paths_redirect_to_sign_in() {
        let policy = AccessPolicy::default();
        for path in PROTECTED {
            assert_eq!(
                policy.evaluate(None, path),
                AccessDecision::Redirect(RedirectTarget::SignIn),
                "path {path}"
            );
        }
    }

    #[test]
    fn unauthenticated_requests_to_public_paths_are_allowed() {
        let policy = AccessPolicy::default();
        for path in ["/", "/listings", "/listings/42", "/sign-in", "/403"] {
            assert_eq!(policy.evaluate(None, path), AccessDecision::Allow, "path {path}");
        }
    }

    #[test]
    fn admin_is_redirected_to_admin_area_except_home_and_admin() {
        let policy = AccessPolicy::default();
        let admin = principal(Some(Role::Admin), false);

        for path in ["/", "/admin", "/admin/", "/admin/listings/1/moderate"] {
            assert_eq!(policy.evaluate(Some(&admin), path), AccessDecision::Allow);
        }
        for path in [
            "/listings",
            "/reservations",
            "/provider/listings",
            "/onboarding/role",
            "/403",
            "/administrator",
        ] {
            assert_eq!(
                policy.evaluate(Some(&admin), path),
                AccessDecision::Redirect(RedirectTarget::Admin),
                "path {path}"
            );
        }
    }

    #[test]
    fn user_without_role_is_sent_to_role_selection() {
        let policy = AccessPolicy::default();
        let fresh = principal(None, false);

        assert_eq!(
            policy.evaluate(Some(&fresh), "/onboarding/role"),
            AccessDecision::Allow
        );
        assert_eq!(
            policy.evaluate(Some(&fresh), "/onboarding/verification"),
            AccessDecision::Allow
        );
        for path in ["/", "/listings", "/reservations", "/admin"] {
            assert_eq!(
                policy.evaluate(Some(&fresh), path),
                AccessDecision::Redirect(RedirectTarget::RoleSelection),
                "path {path}"
            );
        }
    }

    #[test]
    fn customer_revisiting_role_selection_goes_home() {
        let policy = AccessPolicy::default();
        let customer = principal(Some(Role::Customer), false);

        assert_eq!(
            policy.evaluate(Some(&customer), "/onboarding/role"),
            AccessDecision::Redirect(RedirectTarget::Home)
        );
        assert_eq!(
            policy.evaluate(Some(&customer), "/reservations"),
            AccessDecision::Allow
        );
    }

    #[test]
    fn non_admins_on_admin_paths_are_forbidden() {
        let policy = AccessPolicy::default();
        for user in [
            principal(Some(Role::Customer), false),
            principal(Some(Role::Provider), true),
            principal(Some(Role::Provider), false),
        ] {
            assert_eq!(
                policy.evaluate(Some(&user), "/admin/users"),
                AccessDecision::Redirect(RedirectTarget::Forbidden)
            );
        }
    }

    #[test]
    fn unverified_provider_is_sent_to_verification() {
        let policy = AccessPolicy::default();
        let provider = principal(Some(Role::Provider), false);

        assert_eq!(
            policy.evaluate(Some(&provider), "/provider/listings"),
            AccessDecision::Redirect(RedirectTarget::Verification)
        );
        assert_eq!(
            policy.evaluate(Some(&provider), "/onboarding/role"),
            AccessDecision::Redirect(RedirectTarget::Verification)
        );
        assert_eq!(
            policy.evaluate(Some(&provider), "/onboarding/verification"),
            AccessDecision::Allow
        );
        assert_eq!(
            policy.evaluate(Some(&provider), "/messages"),
            AccessDecision::Allow
        );
    }

    #[test]
    fn verified_provider_reaches_provider_area() {
        let policy = AccessPolicy::default();
        let provider = principal(Some(Role::Provider), true);

        assert_eq!(
            policy.evaluate(Some(&provider), "/provider/reservations/1/confirm"),
            AccessDecision::Allow
        );
        assert_eq!(
            policy.evaluate(Some(&provider), "/onboarding/role"),
            AccessDecision::Redirect(RedirectTarget::Home)
        );
    }

    #[test]
    fn customer_cannot_enter_provider_area() {
        let policy = AccessPolicy::default();
        let customer = principal(Some(Role::Customer), true);

        assert_eq!(
            policy.evaluate(Some(&customer), "/provider/listings"),
            AccessDecision::Redirect(RedirectTarget::Forbidden)
        );
        assert_eq!(
            policy.evaluate(Some(&customer), "/providers"),
            AccessDecision::Allow
        );
    }

    #[test]
    fn redirect_locations_follow_configured_paths() {
        let paths = PolicyPaths {
            sign_in: "https://auth.example.com/sign-in".to_string(),
            ..PolicyPaths::default()
        };
        let policy = AccessPolicy::new(paths);

        assert_eq!(
            policy.paths().location(RedirectTarget::SignIn),
            "https://auth.example.com/sign-in"
        );
        assert_eq!(policy.paths().location(RedirectTarget::Forbidden), "/403");
    }
}
