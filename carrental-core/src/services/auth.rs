//! Auth service - desk user accounts and the login gate

use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::domain::User;
use crate::ports::Repository;

pub struct AuthService {
    repository: Arc<dyn Repository>,
}

impl AuthService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Create a user. Usernames are trimmed and must be unique.
    pub fn register(&self, username: &str, password: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::validation("Username is required"));
        }
        if password.is_empty() {
            return Err(Error::validation("Password is required"));
        }
        if self.repository.get_user_by_username(username)?.is_some() {
            return Err(Error::validation(format!(
                "Username {} is already taken",
                username
            )));
        }

        let mut user = User::new(username, password);
        user.id = self.repository.insert_user(&user)?;
        Ok(user)
    }

    /// Check credentials
    ///
    /// Unknown user and wrong password fail the same way.
    pub fn login(&self, username: &str, password: &str) -> Result<User> {
        match self.repository.get_user_by_username(username.trim())? {
            Some(user) if user.verify_password(password) => Ok(user),
            _ => Err(Error::InvalidCredentials),
        }
    }
}
