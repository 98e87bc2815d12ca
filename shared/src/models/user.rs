//! User Registration Model

use crate::document::{FieldMap, ToFields, field};
use crate::error::{AppError, AppResult, ErrorCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Collection holding user accounts
pub const COLLECTION: &str = "users";

/// Youngest age accepted at sign-up
pub const MINIMUM_AGE: u32 = 16;

/// Wire format of `dateOfBirth`
pub const DATE_OF_BIRTH_FORMAT: &str = "%d/%m/%Y";

pub mod fields {
    pub const FIRST_NAME: &str = "firstName";
    pub const LAST_NAME: &str = "lastName";
    pub const EMAIL: &str = "email";
    pub const MOBILE_NUMBER: &str = "mobileNumber";
    pub const DATE_OF_BIRTH: &str = "dateOfBirth";
    pub const UNIANDES_CODE: &str = "uniandesCode";
    pub const PASSWORD: &str = "password";
}

fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

fn validate_mobile_number(value: &str) -> Result<(), ValidationError> {
    if value.len() == 10 && all_digits(value) {
        Ok(())
    } else {
        Err(ValidationError::new("mobile_number"))
    }
}

fn validate_university_code(value: &str) -> Result<(), ValidationError> {
    if (6..=10).contains(&value.len()) && all_digits(value) {
        Ok(())
    } else {
        Err(ValidationError::new("university_code"))
    }
}

/// Sign-up form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserRegistration {
    #[validate(length(min = 1, message = "First name cannot be empty."))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name cannot be empty."))]
    pub last_name: String,
    #[validate(email(message = "Invalid email format."))]
    pub email: String,
    #[validate(custom(
        function = "validate_mobile_number",
        message = "Mobile number must be numeric and 10 digits."
    ))]
    pub mobile_number: String,
    pub date_of_birth: NaiveDate,
    #[validate(custom(
        function = "validate_university_code",
        message = "Uniandes code should be between 6 - 10 numbers."
    ))]
    pub university_code: String,
    #[validate(length(
        min = 1,
        max = 30,
        message = "Password must be between 1 and 30 characters."
    ))]
    pub password: String,
}

/// Whole years between `born` and `today`
pub fn age_on(born: NaiveDate, today: NaiveDate) -> u32 {
    today.years_since(born).unwrap_or(0)
}

impl UserRegistration {
    /// Field validation plus the minimum-age rule evaluated on `today`
    pub fn check(&self, today: NaiveDate) -> AppResult<()> {
        let age_error = (age_on(self.date_of_birth, today) < MINIMUM_AGE).then(|| {
            format!("You must be at least {} years old.", MINIMUM_AGE)
        });
        match (self.validate(), age_error) {
            (Ok(()), None) => Ok(()),
            (Ok(()), Some(message)) => Err(AppError::new(ErrorCode::ValidationFailed)
                .with_detail("date_of_birth", message)),
            (Err(errors), age_error) => {
                let mut err = AppError::from(errors);
                if let Some(message) = age_error {
                    err = err.with_detail("date_of_birth", message);
                }
                Err(err)
            }
        }
    }

    pub fn date_of_birth_wire(&self) -> String {
        self.date_of_birth.format(DATE_OF_BIRTH_FORMAT).to_string()
    }
}

impl ToFields for UserRegistration {
    fn to_fields(&self) -> FieldMap {
        FieldMap::from([
            field(fields::FIRST_NAME, self.first_name.as_str()),
            field(fields::LAST_NAME, self.last_name.as_str()),
            field(fields::EMAIL, self.email.as_str()),
            field(fields::MOBILE_NUMBER, self.mobile_number.as_str()),
            field(fields::DATE_OF_BIRTH, self.date_of_birth_wire()),
            field(fields::UNIANDES_CODE, self.university_code.as_str()),
            field(fields::PASSWORD, self.password.as_str()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentValue;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 27).unwrap()
    }

    fn registration() -> UserRegistration {
        UserRegistration {
            first_name: "Ana".into(),
            last_name: "Ruiz".into(),
            email: "a.ruiz@uniandes.edu.co".into(),
            mobile_number: "3001234567".into(),
            date_of_birth: NaiveDate::from_ymd_opt(2001, 3, 9).unwrap(),
            university_code: "202012345".into(),
            password: "secret".into(),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(registration().check(today()).is_ok());
    }

    #[test]
    fn test_field_rules() {
        let mut bad = registration();
        bad.mobile_number = "300123".into();
        bad.university_code = "12a456".into();
        bad.password = "x".repeat(31);
        bad.email = "not-an-email".into();
        let fields = bad.check(today()).unwrap_err().field_errors();
        assert_eq!(fields["mobile_number"], "Mobile number must be numeric and 10 digits.");
        assert!(fields.contains_key("university_code"));
        assert!(fields.contains_key("password"));
        assert_eq!(fields["email"], "Invalid email format.");
    }

    #[test]
    fn test_minimum_age() {
        let mut young = registration();
        young.date_of_birth = NaiveDate::from_ymd_opt(2008, 11, 28).unwrap();
        let err = young.check(today()).unwrap_err();
        assert!(err.field_errors().contains_key("date_of_birth"));

        young.date_of_birth = NaiveDate::from_ymd_opt(2008, 11, 27).unwrap();
        assert!(young.check(today()).is_ok());
    }

    #[test]
    fn test_wire_fields() {
        let map = registration().to_fields();
        assert_eq!(map.len(), 7);
        assert_eq!(map[fields::DATE_OF_BIRTH], DocumentValue::from("09/03/2001"));
        assert_eq!(map[fields::UNIANDES_CODE], DocumentValue::from("202012345"));
    }
}
