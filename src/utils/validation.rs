use rust_decimal::Decimal;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{Error, Result};

/// Runs the derived rules plus any cross-field checks, reporting every failure at once.
pub fn validate_all<T: Validate>(val: &T, extra: impl FnOnce(&mut ValidationErrors)) -> Result<()> {
    let mut errors = val.validate().err().unwrap_or_else(ValidationErrors::new);
    extra(&mut errors);
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors))
    }
}

pub fn non_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Builds a single-field validation failure.
pub fn field_error(field: &'static str, code: &'static str, message: String) -> Error {
    let mut errors = ValidationErrors::new();
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    errors.add(field, err);
    Error::Validation(errors)
}

pub fn salary_range_error(min: Option<Decimal>, max: Option<Decimal>) -> Option<ValidationError> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => {
            let mut err = ValidationError::new("salary_range");
            err.message =
                Some(format!("salary_min ({}) must not exceed salary_max ({})", min, max).into());
            Some(err)
        }
        _ => None,
    }
}

pub fn check_salary_range(min: Option<Decimal>, max: Option<Decimal>) -> Result<()> {
    match salary_range_error(min, max) {
        Some(err) => {
            let mut errors = ValidationErrors::new();
            errors.add("salary_min", err);
            Err(Error::Validation(errors))
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Named {
        #[validate(length(min = 1))]
        title: String,
    }

    #[test]
    fn salary_range_rejects_inverted_bounds() {
        assert!(check_salary_range(Some(Decimal::from(25)), Some(Decimal::from(15))).is_err());
        assert!(check_salary_range(Some(Decimal::from(15)), Some(Decimal::from(15))).is_ok());
        assert!(check_salary_range(None, Some(Decimal::from(1))).is_ok());
    }

    #[test]
    fn validate_all_merges_field_and_range_failures() {
        let payload = Named { title: String::new() };
        let err = validate_all(&payload, |errors| {
            if let Some(e) = salary_range_error(Some(Decimal::from(9)), Some(Decimal::from(1))) {
                errors.add("salary_min", e);
            }
        })
        .unwrap_err();
        let Error::Validation(errors) = err else { panic!("expected validation error") };
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("salary_min"));
    }
}
