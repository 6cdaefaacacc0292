use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::validation::{self, ValidationErrors};

/// Stored account. Rendered to clients only as [`UserProfile`].
#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Regular,
    Superuser,
}

impl Role {
    /// `(is_staff, is_superuser)`
    pub fn flags(self) -> (bool, bool) {
        match self {
            Role::Regular => (false, false),
            Role::Superuser => (true, true),
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
}

impl From<&UserModel> for UserProfile {
    fn from(user: &UserModel) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserPayload {
    pub email: Option<String>,
    pub password: Option<SecretString>,
    pub name: Option<String>,
}

/// A validated account request with a normalized email.
#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: SecretString,
}

impl NewUser {
    pub fn new(
        email: Option<&str>,
        name: Option<String>,
        password: Option<&str>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let email = validation::email(&mut errors, "email", email);
        let name = validation::text(&mut errors, "name", name, true);
        let password = validation::password(&mut errors, "password", password, true);

        match (email, name, password) {
            (Some(email), Some(name), Some(password)) if errors.is_empty() => Ok(Self {
                email,
                name,
                password: SecretString::from(password.to_string()),
            }),
            _ => Err(errors),
        }
    }
}

impl CreateUserPayload {
    pub fn validate(self) -> Result<NewUser, ValidationErrors> {
        NewUser::new(
            self.email.as_deref(),
            self.name,
            self.password.as_ref().map(|p| p.expose_secret()),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenPayload {
    pub email: Option<String>,
    pub password: Option<SecretString>,
}

#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl TokenPayload {
    pub fn validate(self) -> Result<Credentials, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let email = validation::text(&mut errors, "email", self.email, true);
        let password = match self.password {
            None => {
                errors.add("password", validation::REQUIRED);
                None
            }
            Some(p) if p.expose_secret().is_empty() => {
                errors.add("password", validation::BLANK);
                None
            }
            Some(p) => Some(p),
        };

        match (email, password) {
            (Some(email), Some(password)) => Ok(Credentials {
                email: validation::normalize_email(&email),
                password,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfilePayload {
    pub name: Option<String>,
    pub password: Option<SecretString>,
}

#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub password: Option<SecretString>,
}

impl UpdateProfilePayload {
    pub fn validate(self) -> Result<ProfileChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = validation::text(&mut errors, "name", self.name, false);
        let password = validation::password(
            &mut errors,
            "password",
            self.password.as_ref().map(|p| p.expose_secret()),
            false,
        )
        .map(|p| SecretString::from(p.to_string()));

        errors.finish(|| ProfileChanges { name, password })
    }
}
