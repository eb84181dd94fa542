use std::sync::Arc;

use crate::config::{AdminCredentials, AdminPassword};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};

#[derive(Debug, thiserror::Error)]
pub enum AdminAuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Password hashing failed: {0}")]
    HashingError(String),
    #[error("Password verification aborted: {0}")]
    Aborted(String),
}

pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

/// Verifies the single configured admin account.
pub struct AdminAuthService {
    username: String,
    password_hash: String,
}

impl AdminAuthService {
    pub fn new(credentials: &AdminCredentials) -> Result<Self, AdminAuthError> {
        let password_hash = match &credentials.password {
            AdminPassword::Hash(hash) => hash.clone(),
            AdminPassword::Plain(plain) => hash_password(plain)?,
        };

        Ok(Self {
            username: credentials.username.clone(),
            password_hash,
        })
    }

    /// Returns the admin username on success.
    pub fn authenticate(&self, request: &AdminLoginRequest) -> Result<String, AdminAuthError> {
        // Always run the verifier so a wrong username costs the same as a wrong password.
        let password_ok = verify_password(&request.password, &self.password_hash);
        if request.username != self.username || !password_ok {
            tracing::warn!(username = %request.username, "admin login rejected");
            return Err(AdminAuthError::InvalidCredentials);
        }

        Ok(self.username.clone())
    }

    /// Runs `authenticate` on the blocking pool; argon2 is too slow for a worker thread.
    pub async fn verify(
        self: Arc<Self>,
        request: AdminLoginRequest,
    ) -> Result<String, AdminAuthError> {
        tokio::task::spawn_blocking(move || self.authenticate(&request))
            .await
            .map_err(|e| AdminAuthError::Aborted(e.to_string()))?
    }
}

pub fn hash_password(password: &str) -> Result<String, AdminAuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AdminAuthError::HashingError(e.to_string()))
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    if let Ok(parsed_hash) = PasswordHash::new(password_hash) {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn credentials(password: AdminPassword) -> AdminCredentials {
        AdminCredentials {
            username: "admin".to_string(),
            password,
        }
    }

    fn login(username: &str, password: &str) -> AdminLoginRequest {
        AdminLoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_plain_password_is_hashed_and_verified() {
        let service =
            AdminAuthService::new(&credentials(AdminPassword::Plain("s3cret!".to_string())))
                .unwrap();

        assert_eq!(service.authenticate(&login("admin", "s3cret!")).unwrap(), "admin");
        assert!(matches!(
            service.authenticate(&login("admin", "wrong")),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_configured_hash_is_used() {
        let hash = hash_password("hunter22").unwrap();
        let service = AdminAuthService::new(&credentials(AdminPassword::Hash(hash))).unwrap();

        assert!(service.authenticate(&login("admin", "hunter22")).is_ok());
    }

    #[test]
    fn test_wrong_username_rejected() {
        let service =
            AdminAuthService::new(&credentials(AdminPassword::Plain("pw".to_string()))).unwrap();
        assert!(matches!(
            service.authenticate(&login("root", "pw")),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        let service =
            AdminAuthService::new(&credentials(AdminPassword::Hash("$argon2-garbage".to_string())))
                .unwrap();
        assert!(service.authenticate(&login("admin", "anything")).is_err());
    }

    #[tokio::test]
    async fn test_verify_leaves_runtime_free() {
        let service = Arc::new(
            AdminAuthService::new(&credentials(AdminPassword::Plain("pw".to_string()))).unwrap(),
        );
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = ticks.clone();
            tokio::spawn(async move {
                loop {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            })
        };

        // Single-threaded runtime: the ticker only runs if verification yields
        let username = service.clone().verify(login("admin", "pw")).await.unwrap();
        assert_eq!(username, "admin");
        assert!(ticks.load(Ordering::SeqCst) > 0);

        assert!(matches!(
            service.verify(login("admin", "nope")).await,
            Err(AdminAuthError::InvalidCredentials)
        ));
        ticker.abort();
    }
}
