//! Customer domain model

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Loose `local@domain.tld` shape check, not RFC 5322
const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// Digits with optional spaces, dashes, dots, parentheses and leading plus
const PHONE_PATTERN: &str = r"^\+?[0-9 ()\-.]{5,20}$";

/// A customer who can rent cars
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Assigned by the store; 0 until persisted
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl Customer {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Trim whitespace and lowercase the email
    pub fn normalize(&mut self) {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.phone = self.phone.trim().to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_name.trim().is_empty() {
            return Err(Error::validation("First name is required"));
        }
        if self.last_name.trim().is_empty() {
            return Err(Error::validation("Last name is required"));
        }

        let email_re = Regex::new(EMAIL_PATTERN).map_err(|e| Error::validation(e.to_string()))?;
        if !email_re.is_match(self.email.trim()) {
            return Err(Error::validation(format!("Invalid email: {}", self.email)));
        }

        let phone_re = Regex::new(PHONE_PATTERN).map_err(|e| Error::validation(e.to_string()))?;
        if !phone_re.is_match(self.phone.trim()) {
            return Err(Error::validation(format!("Invalid phone number: {}", self.phone)));
        }

        Ok(())
    }
}
