//! Manage session tokens.
//!
//! A session is a HS256 JSON web token carrying the account standing at the
//! time it was issued. Expiry is checked against the injected [`Clock`], and
//! terminated sessions are kept in a revocation list until their natural
//! expiry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::account::{Account, AccountId, Role, Standing, Status};
use crate::clock::Clock;
use crate::error::{Result, ToStoreError};

pub const TOKEN_TYPE: &str = "Bearer";

/// Pieces of information asserted on a JWT.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Account ID.
    sub: String,
    role: Role,
    status: Status,
    /// Issue time, in seconds since epoch.
    iat: i64,
    /// Expiration time, in seconds since epoch.
    exp: i64,
    /// Session ID.
    jti: String,
    /// Identifies the instance that issued the JWT.
    iss: String,
}

/// Verified content of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub account_id: AccountId,
    pub standing: Standing,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Stable across renewals.
    pub session_id: String,
}

impl SessionClaims {
    #[inline]
    pub fn role(&self) -> Role {
        self.standing.role()
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.standing.status()
    }
}

/// Signed token and the claims it carries.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub claims: SessionClaims,
}

/// Issue, verify and terminate sessions.
pub struct SessionIssuer {
    name: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
    max_age: TimeDelta,
    clock: Arc<dyn Clock>,
    // Session ID to expiry of its latest token.
    revoked: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl SessionIssuer {
    /// Create a new [`SessionIssuer`] signing with `secret`.
    pub fn new(
        name: &str,
        secret: &[u8],
        max_age: TimeDelta,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name: name.to_owned(),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            max_age,
            clock,
            revoked: RwLock::new(HashMap::new()),
        }
    }

    /// Open a new session for `account`.
    pub fn issue(&self, account: &Account) -> Result<Session> {
        self.sign(account, Uuid::new_v4().to_string())
    }

    /// Re-derive `claims` from the current state of `account`. The session
    /// ID is kept so terminating the session covers every token it produced.
    pub fn renew(
        &self,
        claims: &SessionClaims,
        account: &Account,
    ) -> Result<Session> {
        self.sign(account, claims.session_id.clone())
    }

    fn sign(&self, account: &Account, session_id: String) -> Result<Session> {
        // JWT times have a one second resolution.
        let now = self.clock.now().timestamp();
        let exp = now + self.max_age.num_seconds();

        let claims = Claims {
            sub: account.id.to_string(),
            role: account.standing.role(),
            status: account.standing.status(),
            iat: now,
            exp,
            jti: session_id,
            iss: self.name.clone(),
        };
        let token =
            encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
                .catch()?;

        Ok(Session {
            token,
            claims: SessionClaims {
                account_id: account.id,
                standing: account.standing,
                issued_at: DateTime::from_timestamp(now, 0).unwrap_or_default(),
                expires_at: DateTime::from_timestamp(exp, 0).unwrap_or_default(),
                session_id: claims.jti,
            },
        })
    }

    /// Decode and check a token. Any failure is an absent session.
    pub async fn verify(&self, token: &str) -> Option<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_issuer(&[&self.name]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        let claims = match decode::<Claims>(token, &self.decoding, &validation)
        {
            Ok(data) => data.claims,
            Err(err) => {
                tracing::debug!(error = %err, "rejected session token");
                return None;
            },
        };

        if claims.exp <= self.clock.now().timestamp() {
            return None;
        }
        if self.revoked.read().await.contains_key(&claims.jti) {
            return None;
        }

        Some(SessionClaims {
            account_id: claims.sub.parse().ok()?,
            standing: Standing::from_parts(claims.role, claims.status),
            issued_at: DateTime::from_timestamp(claims.iat, 0)?,
            expires_at: DateTime::from_timestamp(claims.exp, 0)?,
            session_id: claims.jti,
        })
    }

    /// Whether `claims` were issued at least `update_age` ago.
    pub fn is_stale(&self, claims: &SessionClaims, update_age: TimeDelta) -> bool {
        self.clock.now() - claims.issued_at >= update_age
    }

    /// Revoke every token of the session until its natural expiry.
    /// Idempotent.
    pub async fn terminate(&self, claims: &SessionClaims) {
        let now = self.clock.now();
        let mut revoked = self.revoked.write().await;

        revoked.retain(|_, expires_at| *expires_at > now);
        let expires_at = revoked
            .entry(claims.session_id.clone())
            .or_insert(claims.expires_at);
        // Renewed tokens outlive the ones they replace.
        *expires_at = (*expires_at).max(claims.expires_at);
    }
}
