//! Interactive password prompts.

use anyhow::{Context, Result, ensure};
use inquire::{Confirm, Password, PasswordDisplayMode, min_length};

use crate::secret::Secret;

pub struct Prompt {
    password_min_length: usize,
}

impl Prompt {
    pub const fn new(password_min_length: usize) -> Self {
        Self { password_min_length }
    }

    /// Asks for a new password twice and enforces the minimum length.
    pub fn encryption_password(&self) -> Result<Secret> {
        let password = Password::new("Enter encryption password:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .with_validator(min_length!(self.password_min_length, format!("Password must be at least {} characters", self.password_min_length)))
            .with_custom_confirmation_message("Confirm password:")
            .with_custom_confirmation_error_message("Passwords do not match")
            .prompt()
            .context("password prompt failed")?;

        ensure!(!password.trim().is_empty(), "password cannot be blank");
        Ok(Secret::from_string(password))
    }

    /// Asks for an existing password once. No length policy: old files may predate it.
    pub fn decryption_password(&self) -> Result<Secret> {
        let password = Password::new("Enter decryption password:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
            .context("password prompt failed")?;

        Ok(Secret::from_string(password))
    }

    pub fn confirm(&self, message: &str) -> Result<bool> {
        Confirm::new(message).with_default(false).prompt().context("confirmation prompt failed")
    }
}
