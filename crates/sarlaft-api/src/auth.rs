//! # Authentication & Authorization Middleware
//!
//! Bearer-token middleware with role extraction.
//!
//! ## Token Format
//!
//! ```text
//! Bearer {role}:{actor_id}:{secret}
//! ```
//!
//! The role tag and actor id identify the caller; the shared secret
//! authenticates the gateway that minted the token. Session issuance lives
//! entirely outside this service — the API validates, it does not mint.
//!
//! Every authenticated request gets a [`CallerIdentity`] injected into the
//! request extensions; handlers extract it via `FromRequestParts` and pass
//! an explicit [`ActorRef`] into the case service. The engine re-checks the
//! role on every mutating operation — the middleware narrows who gets in,
//! it never widens what a role may do.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use subtle::ConstantTimeEq;

use sarlaft_core::{ActorRef, Role};

use crate::error::{AppError, ErrorBody, ErrorDetail};

// ─── CallerIdentity ──────────────────────────────────────────────────

/// Identity of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// The caller's directory account.
    pub actor_id: String,
    /// The role the token presented.
    pub role: Role,
}

impl CallerIdentity {
    /// The actor reference handlers pass into the case service.
    pub fn actor(&self) -> ActorRef {
        ActorRef::new(self.actor_id.as_str(), self.role)
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

// ─── Auth Configuration ──────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the secret to keep it out of logs.
#[derive(Clone)]
pub struct AuthConfig {
    /// The shared secret; `None` disables authentication.
    pub secret: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ─── Token Validation ────────────────────────────────────────────────

/// Constant-time comparison of the shared secret.
///
/// When lengths differ, a dummy comparison keeps timing independent of
/// where the mismatch is.
fn constant_time_secret_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token of the form `{role}:{actor_id}:{secret}`.
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<CallerIdentity, String> {
    let parts: Vec<&str> = provided.splitn(3, ':').collect();
    if parts.len() != 3 {
        return Err("invalid token format - expected {role}:{actor_id}:{secret}".to_string());
    }
    let (role_tag, actor_id, secret) = (parts[0], parts[1], parts[2]);

    if !constant_time_secret_eq(secret, expected_secret) {
        return Err("invalid bearer token".to_string());
    }
    let role = Role::parse(role_tag).map_err(|e| e.to_string())?;
    if actor_id.is_empty() {
        return Err("actor id must be non-empty".to_string());
    }
    Ok(CallerIdentity {
        actor_id: actor_id.to_string(),
        role,
    })
}

// ─── Middleware ──────────────────────────────────────────────────────

/// Extract and validate the bearer token, injecting [`CallerIdentity`]
/// into request extensions for downstream handlers.
///
/// With no secret configured (development mode), every request runs as the
/// compliance officer.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let config = request.extensions().get::<AuthConfig>().cloned();

    match config {
        Some(AuthConfig {
            secret: Some(ref expected),
        }) => {
            let auth_header = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            match auth_header {
                Some(value) if value.starts_with("Bearer ") => {
                    match parse_bearer_token(&value[7..], expected) {
                        Ok(identity) => {
                            request.extensions_mut().insert(identity);
                            next.run(request).await
                        }
                        Err(msg) => {
                            tracing::warn!(reason = %msg, "authentication failed");
                            unauthorized_response(&msg)
                        }
                    }
                }
                Some(_) => {
                    unauthorized_response("authorization header must use Bearer scheme")
                }
                None => unauthorized_response("missing authorization header"),
            }
        }
        _ => {
            request.extensions_mut().insert(CallerIdentity {
                actor_id: "dev".to_string(),
                role: Role::ComplianceOfficer,
            });
            next.run(request).await
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_token() {
        let identity = parse_bearer_token("compliance_officer:mgarcia:s3cret", "s3cret").unwrap();
        assert_eq!(identity.role, Role::ComplianceOfficer);
        assert_eq!(identity.actor_id, "mgarcia");
    }

    #[test]
    fn rejects_wrong_secret() {
        assert!(parse_bearer_token("commercial:jperez:wrong", "s3cret").is_err());
    }

    #[test]
    fn rejects_unknown_role() {
        let err = parse_bearer_token("superadmin:x:s3cret", "s3cret").unwrap_err();
        assert!(err.contains("superadmin"));
    }

    #[test]
    fn rejects_malformed_token() {
        assert!(parse_bearer_token("justasecret", "justasecret").is_err());
        assert!(parse_bearer_token("commercial:jperez", "s3cret").is_err());
    }

    #[test]
    fn rejects_empty_actor() {
        assert!(parse_bearer_token("commercial::s3cret", "s3cret").is_err());
    }

    #[test]
    fn actor_ref_carries_role() {
        let identity = parse_bearer_token("auditor:insp1:s", "s").unwrap();
        let actor = identity.actor();
        assert_eq!(actor.role, Role::Auditor);
        assert_eq!(actor.id.as_str(), "insp1");
    }
}
