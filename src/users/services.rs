use std::sync::Arc;

use time::{macros::format_description, OffsetDateTime};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::dto::{LoginRequest, OfflineRequest, RegisterRequest, UpdateUserRequest};
use super::error::{DirectoryError, DirectoryResult};
use super::repo::{StoreError, UserStore};
use super::repo_types::{NewUser, UniqueField, User, UserStatus};

/// Business rules for the user lifecycle: uniqueness on registration,
/// password login, token-guarded profile edits and presence changes.
///
/// Holds no state of its own; every read and write goes to the store.
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn UserStore>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> DirectoryResult<Vec<User>> {
        Ok(self.store.list().await?)
    }

    pub async fn get_by_id(&self, id: i64) -> DirectoryResult<User> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| user_not_found(id))
    }

    pub async fn register(&self, candidate: RegisterRequest) -> DirectoryResult<User> {
        let username_taken = self.store.find_by_username(&candidate.username).await?.is_some();
        let email_taken = self.store.find_by_email(&candidate.email).await?.is_some();
        match (username_taken, email_taken) {
            (true, true) => return Err(not_unique("username and email", "are", "created")),
            (true, false) => return Err(not_unique("username", "is", "created")),
            (false, true) => return Err(not_unique("email", "is", "created")),
            (false, false) => {}
        }

        let now = OffsetDateTime::now_utc();
        let new_user = NewUser {
            username: candidate.username,
            email: candidate.email,
            password: candidate.password,
            token: Uuid::new_v4().to_string(),
            status: UserStatus::Online,
            creation_date: now,
            registration_date: format_registration_date(now)?,
        };

        // The pre-check above can lose a race; the store has the final word.
        let user = self.store.insert(new_user).await.map_err(|e| match e {
            StoreError::Duplicate(field @ (UniqueField::Username | UniqueField::Email)) => {
                not_unique(&field.to_string(), "is", "created")
            }
            // A clashing token stays a store error and answers 500.
            other => other.into(),
        })?;

        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user)
    }

    pub async fn login(&self, credentials: LoginRequest) -> DirectoryResult<User> {
        let Some(mut user) = self.store.find_by_username(&credentials.username).await? else {
            warn!(username = %credentials.username, "login unknown username");
            return Err(DirectoryError::BadRequest("username not found".into()));
        };

        // Plain-text comparison; passwords are stored as given.
        if user.password != credentials.password {
            warn!(user_id = user.id, "login invalid password");
            return Err(DirectoryError::Unauthorized(
                "password does not match with username".into(),
            ));
        }

        user.status = UserStatus::Online;
        let user = self.save(&user).await?;
        info!(user_id = user.id, "user logged in");
        Ok(user)
    }

    pub async fn update(&self, id: i64, requester: UpdateUserRequest) -> DirectoryResult<User> {
        let mut user = self.get_by_id(id).await?;
        authorize(&requester.token, &user)?;

        if requester.username != user.username {
            if let Some(other) = self.store.find_by_username(&requester.username).await? {
                if other.id != id {
                    warn!(user_id = id, "update to a taken username");
                    return Err(not_unique("username", "is", "updated"));
                }
            }
        }

        user.username = requester.username;
        user.birthdate = requester.birthdate;
        let user = self.save(&user).await?;
        info!(user_id = user.id, "user profile updated");
        Ok(user)
    }

    pub async fn set_offline(&self, id: i64, requester: OfflineRequest) -> DirectoryResult<User> {
        let mut user = self.get_by_id(id).await?;
        authorize(&requester.token, &user)?;

        user.status = UserStatus::Offline;
        let user = self.save(&user).await?;
        info!(user_id = user.id, "user set offline");
        Ok(user)
    }

    async fn save(&self, user: &User) -> DirectoryResult<User> {
        self.store.update(user).await.map_err(|e| match e {
            StoreError::Duplicate(UniqueField::Username) => not_unique("username", "is", "updated"),
            StoreError::Missing(id) => user_not_found(id),
            other => other.into(),
        })
    }
}

fn authorize(presented: &str, user: &User) -> DirectoryResult<()> {
    if presented != user.token {
        warn!(user_id = user.id, "token does not match user");
        return Err(DirectoryError::Unauthorized(
            "You have no access to change this user's information".into(),
        ));
    }
    debug!(user_id = user.id, "token accepted");
    Ok(())
}

fn not_unique(what: &str, verb: &str, action: &str) -> DirectoryError {
    DirectoryError::Conflict(format!(
        "The {what} provided {verb} not unique. Therefore, the user could not be {action}!"
    ))
}

fn user_not_found(id: i64) -> DirectoryError {
    DirectoryError::NotFound(format!("User with id {id} does not exist"))
}

pub(crate) fn format_registration_date(at: OffsetDateTime) -> DirectoryResult<String> {
    at.format(format_description!("[day]-[month]-[year] [hour]:[minute]:[second]"))
        .map_err(|e| DirectoryError::Internal(format!("format registration date: {e}")))
}
