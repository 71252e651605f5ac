//! User records and the shapes accepted for creating and changing them.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::DomainError;

const MAX_NAME_CHARS: usize = 100;
const MAX_EMAIL_CHARS: usize = 254;
const MAX_PHONE_CHARS: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewUser {
    /// Trim every attribute and check it against the field rules.
    pub fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            first_name: name("first_name", &self.first_name)?,
            last_name: name("last_name", &self.last_name)?,
            email: email(&self.email)?,
            phone: self.phone.as_deref().map(phone).transpose()?,
        })
    }
}

/// Partial update; absent attributes keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl UserChanges {
    pub fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            first_name: self
                .first_name
                .as_deref()
                .map(|value| name("first_name", value))
                .transpose()?,
            last_name: self
                .last_name
                .as_deref()
                .map(|value| name("last_name", value))
                .transpose()?,
            email: self.email.as_deref().map(email).transpose()?,
            phone: self.phone.as_deref().map(phone).transpose()?,
        })
    }
}

fn name(field: &'static str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(DomainError::validation(
            field,
            format!("must be at most {MAX_NAME_CHARS} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

fn email(value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.chars().count() > MAX_EMAIL_CHARS {
        return Err(DomainError::validation(
            "email",
            format!("must be at most {MAX_EMAIL_CHARS} characters"),
        ));
    }

    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !trimmed.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(DomainError::validation("email", "must be a valid address"));
    }

    Ok(trimmed.to_string())
}

fn phone(value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("phone", "must not be empty"));
    }
    if trimmed.chars().count() > MAX_PHONE_CHARS {
        return Err(DomainError::validation(
            "phone",
            format!("must be at most {MAX_PHONE_CHARS} characters"),
        ));
    }
    let allowed = |ch: char| ch.is_ascii_digit() || matches!(ch, '+' | '-' | ' ' | '(' | ')');
    if !trimmed.chars().all(allowed) || !trimmed.chars().any(|ch| ch.is_ascii_digit()) {
        return Err(DomainError::validation(
            "phone",
            "may only contain digits, spaces and + - ( )",
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn alice() -> NewUser {
        NewUser {
            first_name: "  Alice ".into(),
            last_name: "Liddell".into(),
            email: "alice@example.com ".into(),
            phone: None,
        }
    }

    #[test]
    fn new_user_is_trimmed() {
        let user = alice().validate().expect("valid user");
        assert_eq!(user.first_name, "Alice");
        assert_eq!(user.email, "alice@example.com");
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = NewUser {
            last_name: "   ".into(),
            ..alice()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, DomainError::validation("last_name", "must not be empty"));
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for candidate in ["alice", "@example.com", "alice@", "alice@example", "a b@example.com", "a@b@c.com"] {
            let result = NewUser {
                email: candidate.into(),
                ..alice()
            }
            .validate();
            assert!(result.is_err(), "{candidate} should be rejected");
        }
    }

    #[test]
    fn phone_must_look_like_a_number() {
        let ok = NewUser {
            phone: Some("+1 (555) 010-0000".into()),
            ..alice()
        };
        assert!(ok.validate().is_ok());

        let bad = NewUser {
            phone: Some("call me".into()),
            ..alice()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn changes_validate_only_present_fields() {
        let changes = UserChanges {
            first_name: Some(" Alicia ".into()),
            ..Default::default()
        }
        .validate()
        .expect("valid changes");

        assert_eq!(changes.first_name.as_deref(), Some("Alicia"));
        assert!(changes.email.is_none());
    }

    #[test]
    fn record_timestamps_serialize_as_rfc3339() {
        let record = UserRecord {
            id: Uuid::nil(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            email: "alice@example.com".into(),
            phone: None,
            created_at: datetime!(2024-05-01 12:00:00 UTC),
            updated_at: datetime!(2024-05-01 12:00:00 UTC),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["created_at"], "2024-05-01T12:00:00Z");

        let back: UserRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
