//! The authentication protocol core
//!
//! [`AuthService`] ties validation, password hashing, the token codec, and
//! the user repository together into the three operations the service
//! exposes: registration, credential authentication, and identity resolution
//! from a presented token.

use thiserror::Error;
use tracing::{error, info};

use crate::jwt::{JwtService, TokenError};
use crate::models::{NewUser, RegisterRequest, User};
use crate::password;
use crate::repositories::{StoreError, UserRepository};
use crate::validation::{self, ValidationErrors};

/// Failure kinds of the authentication protocol
#[derive(Debug, Error)]
pub enum AuthFlowError {
    /// One or more fields violated a registration rule
    #[error("validation failed")]
    Validation(ValidationErrors),
    /// Unknown username or wrong password; deliberately undifferentiated
    #[error("invalid credentials")]
    InvalidCredentials,
    /// No token was presented
    #[error("token absent")]
    TokenAbsent,
    /// The presented token's expiry has elapsed
    #[error("token expired")]
    TokenExpired,
    /// The presented token failed signature or structural checks
    #[error("token invalid")]
    TokenInvalid,
    /// The token verified but its subject no longer exists
    #[error("user not found")]
    UserNotFound,
    /// Infrastructure failure: signing or storage unavailable
    #[error("service error: {0}")]
    Service(#[source] anyhow::Error),
}

impl From<StoreError> for AuthFlowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(field) => {
                // A concurrent registration slipped in between the probe and
                // the insert; report it like the probe would have.
                let mut errors = ValidationErrors::default();
                errors.add(field, validation::taken_message(field));
                AuthFlowError::Validation(errors)
            }
            StoreError::Unavailable(e) => AuthFlowError::Service(e.into()),
        }
    }
}

impl From<TokenError> for AuthFlowError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthFlowError::TokenExpired,
            TokenError::Invalid => AuthFlowError::TokenInvalid,
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    jwt: JwtService,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(users: UserRepository, jwt: JwtService) -> Self {
        Self { users, jwt }
    }

    /// Register a new user and issue a token for them
    ///
    /// All validation runs before anything is persisted; a failing request
    /// leaves the store untouched and gets the full field-error map back.
    pub async fn register(&self, input: RegisterRequest) -> Result<(User, String), AuthFlowError> {
        info!("Registration attempt for username: {}", input.username);

        let mut errors = validation::validate_register(&input);

        if !input.username.is_empty() && self.users.username_taken(&input.username).await? {
            errors.add("username", validation::taken_message("username"));
        }
        if !input.email.is_empty() && self.users.email_taken(&input.email).await? {
            errors.add("email", validation::taken_message("email"));
        }

        if !errors.is_empty() {
            return Err(AuthFlowError::Validation(errors));
        }

        let password_hash = password::hash(&input.password).map_err(AuthFlowError::Service)?;

        let user = self
            .users
            .create(&NewUser {
                username: input.username,
                email: input.email,
                password: password_hash,
                first_name: input.first_name,
                middle_name: input.middle_name,
                last_name: input.last_name,
                role_id: None,
            })
            .await?;

        let token = self.issue_token(&user)?;

        info!("Registered user {} with id {}", user.username, user.user_id);
        Ok((user, token))
    }

    /// Authenticate a username/password pair and issue a token
    ///
    /// Unknown usernames and wrong passwords are indistinguishable to the
    /// caller.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<String, AuthFlowError> {
        info!("Login attempt for username: {}", username);

        let Some(user) = self.users.find_by_username(username).await? else {
            // Burn the same hashing cost as a wrong password so an unknown
            // username is not distinguishable by response timing either.
            password::verify(password, password::dummy_hash());
            return Err(AuthFlowError::InvalidCredentials);
        };

        if !password::verify(password, &user.password) {
            return Err(AuthFlowError::InvalidCredentials);
        }

        self.issue_token(&user)
    }

    /// Resolve the user a presented token was issued for
    pub async fn resolve_identity(&self, token: Option<&str>) -> Result<User, AuthFlowError> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Err(AuthFlowError::TokenAbsent),
        };

        let claims = self.jwt.verify(token)?;

        self.users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthFlowError::UserNotFound)
    }

    fn issue_token(&self, user: &User) -> Result<String, AuthFlowError> {
        self.jwt.issue(user.user_id).map_err(|e| {
            error!("Failed to issue token for user {}: {}", user.user_id, e);
            AuthFlowError::Service(e)
        })
    }
}
