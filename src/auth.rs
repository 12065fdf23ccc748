use thiserror::Error;

use crate::data::{DashboardData, FetchError};
use crate::db::Store;
use crate::models::User;

pub use bcrypt::DEFAULT_COST;

const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

fn well_formed(email: &str, password: &str) -> bool {
    let email_ok = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    };
    email_ok && password.chars().count() >= MIN_PASSWORD_LENGTH
}

/// Check a login attempt against the stored bcrypt hash.
///
/// Returns `Ok(None)` for malformed credentials, unknown emails and wrong
/// passwords alike.
pub async fn authenticate<S: Store>(
    data: &DashboardData<S>,
    email: &str,
    password: &str,
) -> Result<Option<User>, AuthError> {
    if !well_formed(email, password) {
        tracing::info!("Invalid credentials");
        return Ok(None);
    }

    let Some(user) = data.get_user(email).await? else {
        tracing::info!("Invalid credentials");
        return Ok(None);
    };

    if verify_password(password, &user.password)? {
        Ok(Some(user))
    } else {
        tracing::info!("Invalid credentials");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::seed;

    async fn data() -> DashboardData<MemoryStore> {
        let store = MemoryStore::new();
        seed::run(&store, 4).await.unwrap();
        DashboardData::new(store)
    }

    #[test]
    fn hash_round_trips() {
        let hash = hash_password("password123", 4).unwrap();
        assert!(verify_password("password123", &hash).unwrap());
        assert!(!verify_password("password124", &hash).unwrap());
    }

    #[tokio::test]
    async fn accepts_seeded_credentials() {
        let data = data().await;

        let user = authenticate(&data, "johndoe1@example.com", "password123")
            .await
            .unwrap()
            .expect("user");
        assert_eq!(user.name, "John Doe1");
    }

    #[tokio::test]
    async fn rejects_bad_credentials() {
        let data = data().await;

        for (email, password) in [
            ("johndoe1@example.com", "wrong-password"),
            ("nobody@example.com", "password123"),
            ("not-an-email", "password123"),
            ("johndoe1@example.com", "short"),
        ] {
            let result = authenticate(&data, email, password).await.unwrap();
            assert!(result.is_none(), "{email} / {password}");
        }
    }
}
