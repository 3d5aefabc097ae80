use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::store::Store;
use crate::error::{Error, Result};
use crate::models::user::{Role, User};

/// Role lookups by email with a small TTL cache in front of the store.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
    cache: Arc<RwLock<HashMap<String, (Role, Instant)>>>,
    ttl: Duration,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, ttl: Duration) -> Self {
        Self {
            store,
            cache: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Creates or refreshes the caller's record. Admins are provisioned out
    /// of band and cannot be self-assigned.
    pub async fn register(
        &self,
        id: Uuid,
        email: &str,
        display_name: &str,
        role: Role,
    ) -> Result<User> {
        if role == Role::Admin {
            return Err(Error::Forbidden(
                "The admin role cannot be self-assigned".to_string(),
            ));
        }
        if let Some(existing) = self.store.find_user_by_email(email).await? {
            if existing.role == Role::Admin {
                return Err(Error::Forbidden(
                    "Admin accounts cannot be re-registered".to_string(),
                ));
            }
        }

        let user = self.store.upsert_user(id, email, display_name, role).await?;
        self.cache
            .write()
            .await
            .insert(cache_key(email), (user.role, Instant::now()));
        tracing::info!(user_id = %user.id, role = user.role.as_str(), "user registered");
        Ok(user)
    }

    /// Unknown emails resolve to `Role::User`.
    pub async fn role_for_email(&self, email: &str) -> Result<Role> {
        let key = cache_key(email);
        if let Some((role, cached_at)) = self.cache.read().await.get(&key) {
            if cached_at.elapsed() < self.ttl {
                return Ok(*role);
            }
        }

        let role = self
            .store
            .find_user_by_email(email)
            .await?
            .map_or(Role::User, |user| user.role);
        self.cache.write().await.insert(key, (role, Instant::now()));
        Ok(role)
    }
}

fn cache_key(email: &str) -> String {
    email.trim().to_lowercase()
}
