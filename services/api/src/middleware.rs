//! Access policy middleware
//!
//! Resolves the caller from the bearer token, evaluates the access policy for
//! the request path and either forwards the request with the [`Principal`] in
//! its extensions or answers with a temporary redirect.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::{models::Principal, policy::AccessDecision, token::TokenType};
use tracing::debug;

use crate::{error::ApiResult, state::AppState};

/// Evaluate the access policy for every guarded request
pub async fn access_policy(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let principal = match bearer {
        Some(TypedHeader(Authorization(bearer))) => {
            resolve_principal(&state, bearer.token()).await?
        }
        None => None,
    };

    match state.policy.evaluate(principal.as_ref(), req.uri().path()) {
        AccessDecision::Allow => {
            if let Some(principal) = principal {
                req.extensions_mut().insert(principal);
            }
            Ok(next.run(req).await)
        }
        AccessDecision::Redirect(target) => {
            let location = state.policy.paths().location(target);
            debug!("Redirecting {} to {}", req.uri().path(), location);
            Ok(Redirect::temporary(location).into_response())
        }
    }
}

/// Identity behind a bearer token; unusable tokens mean an anonymous caller
async fn resolve_principal(state: &AppState, token: &str) -> ApiResult<Option<Principal>> {
    let claims = match state.jwt.validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("Ignoring bearer token: {}", e);
            return Ok(None);
        }
    };

    if claims.token_type != TokenType::Access {
        return Ok(None);
    }

    if state
        .jwt
        .is_revoked(state.revocations.as_ref(), token)
        .await?
    {
        return Ok(None);
    }

    let principal = claims.principal();
    if principal.role.is_some() {
        return Ok(Some(principal));
    }

    // Tokens minted before role selection still carry no role
    let user = state.repos.users.find_by_id(principal.id).await?;
    Ok(user.map(|user| user.principal()))
}
