use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Presence of a user. Login forces `Online`, logout forces `Offline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    Online,
    Offline,
}

/// User record in the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,                       // assigned by the store
    pub username: String,              // unique
    pub email: String,                 // unique, immutable
    pub password: String,              // plain text, never rendered
    pub token: String,                 // minted once at registration
    pub status: UserStatus,
    pub creation_date: OffsetDateTime,
    pub registration_date: String,     // DD-MM-YYYY HH:MM:SS
    pub birthdate: Option<String>,
}

/// A fully prepared record waiting for the store to assign its id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub token: String,
    pub status: UserStatus,
    pub creation_date: OffsetDateTime,
    pub registration_date: String,
}

impl NewUser {
    pub(crate) fn with_id(self, id: i64) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            password: self.password,
            token: self.token,
            status: self.status,
            creation_date: self.creation_date,
            registration_date: self.registration_date,
            birthdate: None,
        }
    }
}

/// Columns carrying a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
    Token,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            UniqueField::Username => "username",
            UniqueField::Email => "email",
            UniqueField::Token => "token",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&UserStatus::Online).expect("serialize"), "\"ONLINE\"");
        assert_eq!(serde_json::to_string(&UserStatus::Offline).expect("serialize"), "\"OFFLINE\"");
    }

    #[test]
    fn new_user_with_id_keeps_fields_and_has_no_birthdate() {
        let new = NewUser {
            username: "alice".into(),
            email: "a@x.com".into(),
            password: "pw".into(),
            token: "tok".into(),
            status: UserStatus::Online,
            creation_date: OffsetDateTime::UNIX_EPOCH,
            registration_date: "01-01-1970 00:00:00".into(),
        };
        let user = new.with_id(7);
        assert_eq!(user.id, 7);
        assert_eq!(user.username, "alice");
        assert_eq!(user.token, "tok");
        assert_eq!(user.birthdate, None);
    }
}
