//! Credential check for mutating requests

use subtle::{Choice, ConstantTimeEq};

use crate::{
    config::{AuthConfig, Credential},
    error::{AppError, AppResult},
};

/// Static username/password table.
///
/// Every entry is compared on every attempt and the comparisons are
/// constant-time, so neither the mismatch position nor the existence of the
/// username shows up in response timing.
#[derive(Clone)]
pub struct AuthService {
    credentials: Vec<Credential>,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            credentials: config.credentials,
        }
    }

    /// Check a username/password pair; returns the username on success
    pub fn authenticate(&self, username: &str, password: &str) -> AppResult<String> {
        let mut matched = Choice::from(0u8);
        for credential in &self.credentials {
            let user_ok = credential.username.as_bytes().ct_eq(username.as_bytes());
            let pass_ok = credential.password.as_bytes().ct_eq(password.as_bytes());
            matched |= user_ok & pass_ok;
        }

        if bool::from(matched) {
            Ok(username.to_string())
        } else {
            tracing::warn!("Rejected credentials for user {:?}", username);
            Err(AppError::invalid_credentials())
        }
    }
}
