use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::repo::{StoreError, StoreResult, UserStore};
use super::repo_types::{NewUser, UniqueField, User};

/// Process-local [`UserStore`]. Uniqueness checks and writes happen under a
/// single write lock, so concurrent inserts cannot both win.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    last_id: i64,
    users: BTreeMap<i64, User>,
}

impl Inner {
    fn conflict(&self, username: &str, email: &str, token: &str) -> Option<UniqueField> {
        self.users.values().find_map(|u| {
            if u.username == username {
                Some(UniqueField::Username)
            } else if u.email == email {
                Some(UniqueField::Email)
            } else if u.token == token {
                Some(UniqueField::Token)
            } else {
                None
            }
        })
    }
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, new_user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        if let Some(field) = inner.conflict(&new_user.username, &new_user.email, &new_user.token) {
            return Err(StoreError::Duplicate(field));
        }
        inner.last_id += 1;
        let user = new_user.with_id(inner.last_id);
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn update(&self, user: &User) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        let taken = inner
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username);
        if taken {
            return Err(StoreError::Duplicate(UniqueField::Username));
        }
        let stored = inner
            .users
            .get_mut(&user.id)
            .ok_or(StoreError::Missing(user.id))?;
        stored.username = user.username.clone();
        stored.birthdate = user.birthdate.clone();
        stored.status = user.status;
        Ok(stored.clone())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        Ok(self.inner.read().await.users.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::OffsetDateTime;

    use super::*;
    use crate::users::repo_types::UserStatus;

    fn candidate(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password: "pw".into(),
            token: uuid::Uuid::new_v4().to_string(),
            status: UserStatus::Online,
            creation_date: OffsetDateTime::now_utc(),
            registration_date: "19-10-2026 12:00:00".into(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let store = InMemoryUserStore::new();
        let a = store.insert(candidate("a", "a@x.com")).await.expect("insert");
        let b = store.insert(candidate("b", "b@x.com")).await.expect("insert");
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.list().await.expect("list users").len(), 2);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_username_and_email() {
        let store = InMemoryUserStore::new();
        store.insert(candidate("a", "a@x.com")).await.expect("insert");

        let err = store.insert(candidate("a", "other@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::Username)));

        let err = store.insert(candidate("other", "a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::Email)));
    }

    #[tokio::test]
    async fn concurrent_inserts_of_same_username_yield_one_winner() {
        let store = Arc::new(InMemoryUserStore::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert(candidate("racer", &format!("r{i}@x.com"))).await
            }));
        }
        let mut ok = 0;
        for h in handles {
            if h.await.expect("join task").is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn update_writes_mutable_columns_only() {
        let store = InMemoryUserStore::new();
        let mut user = store.insert(candidate("a", "a@x.com")).await.expect("insert");
        user.username = "a2".into();
        user.birthdate = Some("01-01-2000".into());
        user.status = UserStatus::Offline;
        user.email = "changed@x.com".into();

        let saved = store.update(&user).await.expect("update");
        assert_eq!(saved.username, "a2");
        assert_eq!(saved.birthdate.as_deref(), Some("01-01-2000"));
        assert_eq!(saved.status, UserStatus::Offline);
        assert_eq!(saved.email, "a@x.com");
        assert!(store.find_by_username("a").await.expect("lookup by username").is_none());
    }

    #[tokio::test]
    async fn update_rejects_taken_username_and_missing_id() {
        let store = InMemoryUserStore::new();
        store.insert(candidate("a", "a@x.com")).await.expect("insert");
        let mut b = store.insert(candidate("b", "b@x.com")).await.expect("insert");

        b.username = "a".into();
        let err = store.update(&b).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::Username)));

        b.id = 99;
        b.username = "z".into();
        let err = store.update(&b).await.unwrap_err();
        assert!(matches!(err, StoreError::Missing(99)));
    }
}
