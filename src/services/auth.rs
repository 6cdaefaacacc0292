use crate::{
    errors::ApiError,
    models::user::{Credentials, NewUser, ProfileChanges, Role, UserModel},
    store::{TokenRepository, UserRepository},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use nanoid::nanoid;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use tracing::instrument;

const TOKEN_LENGTH: usize = 40;
const BAD_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";

#[derive(Clone, Debug)]
pub struct AuthService {
    users: UserRepository,
    tokens: TokenRepository,
}

impl AuthService {
    pub fn new(users: UserRepository, tokens: TokenRepository) -> Self {
        Self { users, tokens }
    }

    #[instrument(name = "AuthService: Register", skip(self, new_user), fields(user_email = %new_user.email))]
    pub async fn register(&self, new_user: &NewUser, role: Role) -> Result<UserModel, ApiError> {
        let hash = hash_password(&new_user.password)?;

        match self
            .users
            .create_user(&new_user.email, &new_user.name, &hash, role)
            .await?
        {
            Some(user) => {
                tracing::info!(user_id = user.id, "User registered");
                Ok(user)
            }
            None => {
                tracing::warn!("Registration failed: email already taken");
                Err(ApiError::invalid(
                    "email",
                    "user with this email already exists.",
                ))
            }
        }
    }

    #[instrument(
        name = "AuthService: Login attempt",
        skip(self, credentials),
        fields(user_email = %credentials.email)
    )]
    pub async fn login(&self, credentials: &Credentials) -> Result<UserModel, ApiError> {
        // 1. Fetch User
        let user = match self.users.find_by_email(&credentials.email).await? {
            Some(u) if u.is_active => u,
            Some(_) => {
                tracing::warn!("Login failed: user is inactive");
                return Err(ApiError::invalid("non_field_errors", BAD_CREDENTIALS));
            }
            None => {
                tracing::warn!("Login failed: User not found");
                return Err(ApiError::invalid("non_field_errors", BAD_CREDENTIALS));
            }
        };

        // 2. Verify Password
        if !verify_password(&credentials.password, &user.password_hash)? {
            tracing::warn!("Login failed: Invalid password provided");
            return Err(ApiError::invalid("non_field_errors", BAD_CREDENTIALS));
        }

        tracing::info!("User authenticated successfully");
        Ok(user)
    }

    /// Issues a fresh opaque token for `user_id`. Only its digest is kept.
    #[instrument(name = "AuthService: Issue token", skip(self))]
    pub async fn issue_token(&self, user_id: i64) -> Result<String, ApiError> {
        let token = nanoid!(TOKEN_LENGTH);
        self.tokens.store(&token_digest(&token), user_id).await?;
        tracing::info!("Token issued for user");
        Ok(token)
    }

    #[instrument(name = "AuthService: Resolve token", skip_all)]
    pub async fn authenticate_token(&self, token: &str) -> Result<UserModel, ApiError> {
        self.tokens
            .find_user(&token_digest(token))
            .await?
            .ok_or_else(|| {
                tracing::warn!("Unknown or revoked token presented");
                ApiError::Authentication
            })
    }

    #[instrument(name = "AuthService: Update profile", skip(self, changes))]
    pub async fn update_profile(
        &self,
        user_id: i64,
        changes: &ProfileChanges,
    ) -> Result<UserModel, ApiError> {
        let hash = changes.password.as_ref().map(hash_password).transpose()?;

        self.users
            .update_profile(user_id, changes.name.as_deref(), hash.as_deref())
            .await?
            .ok_or(ApiError::NotFound)
    }
}

fn hash_password(password: &SecretString) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &SecretString, stored_hash: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(stored_hash).map_err(|e| {
        tracing::error!("Critical: Failed to parse password hash from DB: {:?}", e);
        anyhow::anyhow!("stored password hash is malformed")
    })?;

    Ok(Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &parsed_hash)
        .is_ok())
}

fn token_digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}
