//! Customer model and form validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Customer row: a billable party.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub mobileno: String,
    pub address: Option<String>,
    pub entered_by: Uuid,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating or updating a customer.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomerInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub email: Option<String>,
    #[validate(custom(function = validate_mobileno))]
    pub mobileno: String,
    pub address: Option<String>,
}

impl CustomerInput {
    /// Optional fields are stored as absent, not as empty strings.
    pub fn normalized_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn normalized_address(&self) -> Option<String> {
        self.address
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

fn validate_mobileno(value: &str) -> Result<(), ValidationError> {
    if value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("mobileno");
        err.message = Some("Mobile number must be exactly 10 digits".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, mobileno: &str) -> CustomerInput {
        CustomerInput {
            name: name.to_string(),
            email: None,
            mobileno: mobileno.to_string(),
            address: None,
        }
    }

    #[test]
    fn accepts_ten_digit_mobile_number() {
        assert!(input("Alice", "0711234567").validate().is_ok());
    }

    #[test]
    fn rejects_nine_digit_mobile_number() {
        assert!(input("Alice", "071123456").validate().is_err());
    }

    #[test]
    fn rejects_eleven_digit_mobile_number() {
        assert!(input("Alice", "07112345678").validate().is_err());
    }

    #[test]
    fn rejects_non_numeric_mobile_number() {
        assert!(input("Alice", "07112345ab").validate().is_err());
    }

    #[test]
    fn rejects_empty_name() {
        assert!(input("", "0711234567").validate().is_err());
    }

    #[test]
    fn blank_optional_fields_normalize_to_none() {
        let mut form = input("Alice", "0711234567");
        form.email = Some("  ".to_string());
        form.address = Some(String::new());
        assert_eq!(form.normalized_email(), None);
        assert_eq!(form.normalized_address(), None);

        form.email = Some("alice@example.com".to_string());
        assert_eq!(
            form.normalized_email(),
            Some("alice@example.com".to_string())
        );
    }
}
