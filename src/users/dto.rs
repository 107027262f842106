use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::{User, UserStatus};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for a profile update. Both profile fields are always written.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub token: String,
    pub username: String,
    #[serde(default)]
    pub birthdate: Option<String>,
}

/// Request body for logout.
#[derive(Debug, Deserialize)]
pub struct OfflineRequest {
    pub token: String,
}

/// Public part of the user returned to any client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub status: UserStatus,
    pub birthdate: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub creation_date: OffsetDateTime,
    pub registration_date: String,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            status: u.status,
            birthdate: u.birthdate,
            creation_date: u.creation_date,
            registration_date: u.registration_date,
        }
    }
}

/// Returned to the owner after register or login: the public view plus the
/// token needed to authorize later changes.
#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub user: UserView,
    pub token: String,
}

impl From<User> for SessionView {
    fn from(mut u: User) -> Self {
        let token = std::mem::take(&mut u.token);
        Self {
            user: u.into(),
            token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User {
            id: 1,
            username: "alice".into(),
            email: "a@x.com".into(),
            password: "secret-pw".into(),
            token: "secret-token".into(),
            status: UserStatus::Online,
            creation_date: OffsetDateTime::UNIX_EPOCH,
            registration_date: "01-01-1970 00:00:00".into(),
            birthdate: None,
        }
    }

    #[test]
    fn user_view_hides_credentials() {
        let json = serde_json::to_string(&UserView::from(sample())).expect("serialize");
        assert!(json.contains("\"username\":\"alice\""));
        assert!(json.contains("\"status\":\"ONLINE\""));
        assert!(json.contains("\"registrationDate\""));
        assert!(!json.contains("secret-pw"));
        assert!(!json.contains("secret-token"));
    }

    #[test]
    fn session_view_carries_token_but_not_password() {
        let value = serde_json::to_value(SessionView::from(sample())).expect("serialize");
        assert_eq!(value["token"], "secret-token");
        assert_eq!(value["id"], 1);
        assert!(value.get("password").is_none());
    }

    #[test]
    fn update_request_birthdate_defaults_to_none() {
        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"token":"t","username":"bob"}"#).expect("deserialize");
        assert_eq!(req.birthdate, None);
    }
}
