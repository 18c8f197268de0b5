//! Issuing and verifying the JSON web tokens used for authentication.
//!
//! Access tokens are short lived and sent with every request. Refresh tokens
//! are signed with a different secret, live longer and can only be exchanged
//! for a new access token.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::UserID};

/// How long an access token is valid for.
pub const ACCESS_TOKEN_DURATION: Duration = Duration::hours(1);

/// How long a refresh token is valid for.
pub const REFRESH_TOKEN_DURATION: Duration = Duration::days(7);

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// The user the token was issued to.
    pub id: UserID,
    /// The time the token was issued as a unix timestamp.
    pub iat: i64,
    /// The expiry time of the token as a unix timestamp.
    pub exp: i64,
}

/// The key pair for signing and verifying one kind of token.
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Create the keys from a shared secret.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Everything needed to hash passwords and issue tokens.
#[derive(Clone)]
pub struct AuthConfig {
    /// Keys for access tokens.
    pub access_keys: JwtKeys,
    /// Keys for refresh tokens.
    pub refresh_keys: JwtKeys,
    /// How long an access token is valid for.
    pub access_token_duration: Duration,
    /// How long a refresh token is valid for.
    pub refresh_token_duration: Duration,
    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token_duration", &self.access_token_duration)
            .field("refresh_token_duration", &self.refresh_token_duration)
            .field("password_cost", &self.password_cost)
            .finish_non_exhaustive()
    }
}

impl AuthConfig {
    /// Create the config from the access and refresh token secrets with the default token durations.
    pub fn new(jwt_secret: &str, jwt_refresh_secret: &str) -> Self {
        Self {
            access_keys: JwtKeys::from_secret(jwt_secret),
            refresh_keys: JwtKeys::from_secret(jwt_refresh_secret),
            access_token_duration: ACCESS_TOKEN_DURATION,
            refresh_token_duration: REFRESH_TOKEN_DURATION,
            password_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Use `cost` rounds of hashing for new passwords.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    /// Issue an access token for `user_id`.
    pub fn issue_access_token(&self, user_id: UserID) -> Result<String, Error> {
        encode_jwt(
            user_id,
            &self.access_keys,
            self.access_token_duration,
            OffsetDateTime::now_utc(),
        )
    }

    /// Issue a refresh token for `user_id`.
    pub fn issue_refresh_token(&self, user_id: UserID) -> Result<String, Error> {
        encode_jwt(
            user_id,
            &self.refresh_keys,
            self.refresh_token_duration,
            OffsetDateTime::now_utc(),
        )
    }

    /// Check an access token and return its claims.
    ///
    /// # Errors
    /// Returns [Error::InvalidToken] if the token is malformed, expired or signed with another key.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, Error> {
        decode_jwt(token, &self.access_keys).map_err(|_| Error::InvalidToken)
    }

    /// Check a refresh token and return its claims.
    ///
    /// # Errors
    /// Returns [Error::InvalidRefreshToken] if the token is malformed, expired or signed with another key.
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, Error> {
        decode_jwt(token, &self.refresh_keys).map_err(|_| Error::InvalidRefreshToken)
    }
}

fn encode_jwt(
    user_id: UserID,
    keys: &JwtKeys,
    duration: Duration,
    now: OffsetDateTime,
) -> Result<String, Error> {
    let claims = Claims {
        id: user_id,
        iat: now.unix_timestamp(),
        exp: (now + duration).unix_timestamp(),
    };

    encode(&Header::default(), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

fn decode_jwt(token: &str, keys: &JwtKeys) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(token, &keys.decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
}
