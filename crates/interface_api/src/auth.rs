//! Authentication and authorization

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use domain_claims::claim::{Actor, ActorRole};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User's roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("No recognized role")]
    NoRecognizedRole,
}

/// Creates a new JWT token
pub fn create_token(
    user_id: &str,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        if matches!(
            e.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ) {
            AuthError::TokenExpired
        } else {
            AuthError::InvalidToken
        }
    })?;

    Ok(token_data.claims)
}

/// Resolves the strongest lifecycle role a token carries
///
/// Admin outranks approver outranks auditor outranks member; a token with no
/// recognized role cannot act on claims at all.
pub fn resolve_role(claims: &Claims) -> Result<ActorRole, AuthError> {
    let mut resolved: Option<ActorRole> = None;
    for role in &claims.roles {
        let parsed = match role.as_str() {
            "admin" => ActorRole::Admin,
            "approver" => ActorRole::Approver,
            "auditor" => ActorRole::Auditor,
            "member" => ActorRole::Member,
            _ => continue,
        };
        resolved = Some(match resolved {
            None => parsed,
            Some(current) if rank(parsed) > rank(current) => parsed,
            Some(current) => current,
        });
    }
    resolved.ok_or(AuthError::NoRecognizedRole)
}

/// Builds the lifecycle actor for a validated token
pub fn actor_from_claims(claims: &Claims) -> Result<Actor, AuthError> {
    Ok(Actor::new(claims.sub.clone(), resolve_role(claims)?))
}

fn rank(role: ActorRole) -> u8 {
    match role {
        ActorRole::Admin => 3,
        ActorRole::Approver => 2,
        ActorRole::Auditor => 1,
        ActorRole::Member => 0,
    }
}
