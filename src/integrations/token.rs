use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::TokenError;

const DEMO_ROLE: &str = "intapp-crm-demo";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenFields {
    pub role: String,
}

/// Claims understood by the gateway when it identifies the end user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserClaims {
    pub id: String,
    pub name: String,
    pub fields: TokenFields,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs short-lived user tokens with the workspace credentials.
pub struct TokenIssuer {
    workspace_key: String,
    algorithm: Algorithm,
    key: EncodingKey,
    ttl_secs: i64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("workspace_key", &self.workspace_key)
            .field("algorithm", &self.algorithm)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn from_config(config: &AppConfig) -> Result<Self, TokenError> {
        if config.workspace_key.is_empty() {
            return Err(TokenError::MissingWorkspaceKey);
        }
        if config.workspace_secret.is_empty() {
            return Err(TokenError::MissingWorkspaceSecret);
        }

        let (algorithm, key) = match config.token_algorithm.to_ascii_uppercase().as_str() {
            "ES256" => (
                Algorithm::ES256,
                EncodingKey::from_ec_pem(config.workspace_secret.as_bytes())
                    .map_err(TokenError::InvalidKey)?,
            ),
            "HS256" => (
                Algorithm::HS256,
                EncodingKey::from_secret(config.workspace_secret.as_bytes()),
            ),
            other => return Err(TokenError::UnsupportedAlgorithm(other.to_string())),
        };

        let ttl_secs = i64::try_from(config.token_ttl_secs)
            .map_err(|_| TokenError::TtlOutOfRange(config.token_ttl_secs))?;

        Ok(Self {
            workspace_key: config.workspace_key.clone(),
            algorithm,
            key,
            ttl_secs,
        })
    }

    pub fn claims(&self, user_id: &str, user_name: &str) -> Result<UserClaims, TokenError> {
        self.claims_at(chrono::Utc::now().timestamp(), user_id, user_name)
    }

    fn claims_at(&self, now: i64, user_id: &str, user_name: &str) -> Result<UserClaims, TokenError> {
        let exp = now
            .checked_add(self.ttl_secs)
            .ok_or(TokenError::TtlOutOfRange(self.ttl_secs as u64))?;
        Ok(UserClaims {
            id: user_id.to_string(),
            name: user_name.to_string(),
            fields: TokenFields {
                role: DEMO_ROLE.to_string(),
            },
            iss: self.workspace_key.clone(),
            iat: now,
            exp,
        })
    }

    pub fn issue(&self, user_id: &str, user_name: &str) -> Result<String, TokenError> {
        let claims = self.claims(user_id, user_name)?;
        let token = encode(&Header::new(self.algorithm), &claims, &self.key)?;
        log::debug!("Issued gateway token for user {} (expires at {})", user_id, claims.exp);
        Ok(token)
    }
}

/// A throwaway user id, unique per process start.
pub fn demo_user_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
    format!("demo-user-{}", to_base36(millis))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
