use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

const MIN_PASSWORD_LENGTH: usize = 6;
const MIN_FULL_NAME_LENGTH: usize = 3;

/// 入力値の検証エラー。通信の前に検出する。
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Email is required")]
    EmailRequired,
    #[error("Please enter a valid email address")]
    EmailInvalid,
    #[error("Password is required")]
    PasswordRequired,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Full name is required")]
    FullNameRequired,
    #[error("Full name must be at least 3 characters")]
    FullNameTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::EmailInvalid);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

pub fn validate_full_name(full_name: &str) -> Result<(), ValidationError> {
    if full_name.is_empty() {
        return Err(ValidationError::FullNameRequired);
    }
    if full_name.trim().chars().count() < MIN_FULL_NAME_LENGTH {
        return Err(ValidationError::FullNameTooShort);
    }
    Ok(())
}

/// パスワードと確認用パスワードが一致するか検証する。
pub fn validate_confirmation(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}
