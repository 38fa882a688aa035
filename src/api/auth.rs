//! Bearer token authentication.
//!
//! Tokens are HS256 JWTs signed with the configured secret. The `scope`
//! claim may be a JSON array or a space separated string. Handlers receive
//! the caller as a [`Caller`] extractor and check route scopes on it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error::{ApiErrorResponse, ErrorKind};
use super::handlers::AppState;
use crate::domain::{ScopeRequirement, ScopeSet};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingCredentials,

    #[error("Authorization must be a Bearer token")]
    InvalidScheme,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

// =============================================================================
// Claims
// =============================================================================

/// The `scope` claim as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScopeClaim {
    List(Vec<String>),
    Delimited(String),
}

impl Default for ScopeClaim {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl ScopeClaim {
    #[must_use]
    pub fn to_scope_set(&self) -> ScopeSet {
        match self {
            Self::List(scopes) => scopes.iter().map(String::as_str).collect(),
            Self::Delimited(raw) => ScopeSet::from_delimited(raw),
        }
    }
}

/// JWT claims understood by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub scope: ScopeClaim,
    pub iat: i64,
    pub exp: i64,
}

// =============================================================================
// Token Service
// =============================================================================

/// Signs and verifies HS256 tokens with one shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Issues a token for `subject` valid for `lifetime`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if the claims cannot be encoded.
    pub fn issue(
        &self,
        subject: &str,
        scopes: &ScopeSet,
        lifetime: Duration,
    ) -> Result<String, AuthError> {
        let issued_at = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            scope: ScopeClaim::List(scopes.iter().map(str::to_string).collect()),
            iat: issued_at.timestamp(),
            exp: (issued_at + lifetime).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|error| AuthError::Signing(error.to_string()))
    }

    /// Verifies signature and expiry and returns the claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any rejected token.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|error| AuthError::InvalidToken(error.to_string()))
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TokenService")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
///
/// # Errors
///
/// Returns `AuthError::MissingCredentials` when the header is absent and
/// `AuthError::InvalidScheme` when it does not carry a bearer token.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingCredentials)?;

    let token = authorization
        .strip_prefix("Bearer ")
        .or_else(|| authorization.strip_prefix("bearer "))
        .map(str::trim)
        .ok_or(AuthError::InvalidScheme)?;

    if token.is_empty() {
        return Err(AuthError::InvalidScheme);
    }
    Ok(token)
}

// =============================================================================
// Caller
// =============================================================================

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub subject: String,
    pub scopes: ScopeSet,
}

impl Caller {
    /// Checks a route requirement.
    ///
    /// # Errors
    ///
    /// Returns a 403 response carrying the route's denial message.
    pub fn require(&self, requirement: ScopeRequirement) -> Result<(), ApiErrorResponse> {
        if requirement.is_satisfied_by(&self.scopes) {
            Ok(())
        } else {
            tracing::info!(subject = %self.subject, denial = requirement.denial, "Scope check failed");
            Err(ApiErrorResponse::new(ErrorKind::Forbidden, requirement.denial))
        }
    }
}

impl From<Claims> for Caller {
    fn from(claims: Claims) -> Self {
        Self {
            scopes: claims.scope.to_scope_set(),
            subject: claims.sub,
        }
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = state.tokens.verify(token)?;
        Ok(Self::from(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rstest::{fixture, rstest};

    #[fixture]
    fn service() -> TokenService {
        TokenService::new(b"test-secret")
    }

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(authorization).unwrap(),
        );
        headers
    }

    #[rstest]
    fn issued_tokens_verify(service: TokenService) {
        let scopes = ScopeSet::from_delimited("todo.read todo.list");
        let token = service
            .issue("user-1", &scopes, Duration::minutes(5))
            .unwrap();

        let caller = Caller::from(service.verify(&token).unwrap());

        assert_eq!(caller.subject, "user-1");
        assert_eq!(caller.scopes, scopes);
    }

    #[rstest]
    fn expired_tokens_are_rejected(service: TokenService) {
        let token = service
            .issue("user-1", &ScopeSet::new(), Duration::hours(-1))
            .unwrap();

        assert!(matches!(
            service.verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[rstest]
    fn tokens_from_another_secret_are_rejected(service: TokenService) {
        let token = TokenService::new(b"other-secret")
            .issue("user-1", &ScopeSet::new(), Duration::minutes(5))
            .unwrap();

        assert!(service.verify(&token).is_err());
    }

    #[rstest]
    #[case(serde_json::json!(["todo.read", "todo.list"]))]
    #[case(serde_json::json!("todo.read todo.list"))]
    fn scope_claim_accepts_array_and_string(#[case] raw: serde_json::Value) {
        let claim: ScopeClaim = serde_json::from_value(raw).unwrap();

        assert_eq!(
            claim.to_scope_set(),
            ScopeSet::from_delimited("todo.list todo.read")
        );
    }

    #[rstest]
    fn missing_scope_claim_grants_nothing() {
        let claims: Claims =
            serde_json::from_value(serde_json::json!({"sub": "u", "iat": 0, "exp": 1})).unwrap();

        assert!(claims.scope.to_scope_set().is_empty());
    }

    #[rstest]
    #[case(HeaderMap::new(), Err(AuthError::MissingCredentials))]
    #[case(headers("Basic dXNlcjpwYXNz"), Err(AuthError::InvalidScheme))]
    #[case(headers("Bearer "), Err(AuthError::InvalidScheme))]
    #[case(headers("Bearer abc.def.ghi"), Ok("abc.def.ghi"))]
    #[case(headers("bearer abc.def.ghi"), Ok("abc.def.ghi"))]
    fn bearer_token_extraction(
        #[case] headers: HeaderMap,
        #[case] expected: Result<&str, AuthError>,
    ) {
        assert_eq!(bearer_token(&headers), expected);
    }

    #[rstest]
    fn require_rejects_with_route_message() {
        let caller = Caller {
            subject: "user-1".to_string(),
            scopes: ScopeSet::from_delimited("todo.read"),
        };

        assert!(caller.require(crate::domain::scope::READ_TODO).is_ok());
        let rejection = caller
            .require(crate::domain::scope::DELETE_TODO)
            .unwrap_err();
        assert_eq!(rejection.error.message, "Token not allowed to delete todos");
    }
}
