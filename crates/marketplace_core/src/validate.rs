use std::fmt;

use crate::{Role, ValidationError};

/// Email/password pair that passed local validation.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Result<Self, ValidationError> {
        let email = required("email", email)?.trim().to_string();
        let password = required("password", password)?.to_string();
        Ok(Self { email, password })
    }
}

// Keep passwords out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    pub name: String,
    pub credentials: Credentials,
    pub role: Role,
}

impl SignUpRequest {
    /// Validates name, email and password in that order.
    pub fn new(name: &str, email: &str, password: &str, role: Role) -> Result<Self, ValidationError> {
        let name = required("name", name)?.trim().to_string();
        let credentials = Credentials::new(email, password)?;
        Ok(Self {
            name,
            credentials,
            role,
        })
    }
}

/// Trimmed comment body, rejected when blank.
pub fn comment_body(body: &str) -> Result<String, ValidationError> {
    required("comment", body).map(|body| body.trim().to_string())
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{comment_body, Credentials, SignUpRequest};
    use crate::{Role, ValidationError};

    #[test]
    fn credentials_trim_email_but_not_password() {
        let creds = Credentials::new("  a@b.com ", " pw ").unwrap();
        assert_eq!(creds.email, "a@b.com");
        assert_eq!(creds.password, " pw ");
    }

    #[test]
    fn sign_up_reports_first_missing_field() {
        assert_eq!(
            SignUpRequest::new("", "", "", Role::Customer),
            Err(ValidationError::MissingField("name"))
        );
        assert_eq!(
            SignUpRequest::new("A", "   ", "pw", Role::Customer),
            Err(ValidationError::BlankField("email"))
        );
        assert_eq!(
            SignUpRequest::new("A", "a@b.com", "", Role::Professional),
            Err(ValidationError::MissingField("password"))
        );
    }

    #[test]
    fn debug_output_redacts_password() {
        let creds = Credentials::new("a@b.com", "hunter2").unwrap();
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("a@b.com"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn blank_comment_is_rejected() {
        assert_eq!(comment_body(" \n"), Err(ValidationError::BlankField("comment")));
        assert_eq!(comment_body(" nice ").unwrap(), "nice");
    }
}
