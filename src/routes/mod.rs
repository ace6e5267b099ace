use std::{collections::HashMap, fmt::Display, str::FromStr};

use crate::error::{AppError, FieldError};

pub mod auth;
pub mod dashboard;
pub mod emergency;
pub mod inventory;
pub mod users;
pub mod vehicle;

/// Pulls a required text field out of a collected multipart form, reporting
/// its absence the same way a failed field rule is reported.
pub(crate) fn take_field(
    fields: &mut HashMap<String, String>,
    name: &'static str,
) -> Result<String, AppError> {
    fields.remove(name).ok_or_else(|| {
        AppError::Validation(vec![FieldError {
            field: name.to_string(),
            message: "is required".to_string(),
        }])
    })
}

pub(crate) fn parse_field<T: FromStr>(
    fields: &mut HashMap<String, String>,
    name: &'static str,
) -> Result<T, AppError>
where
    T::Err: Display,
{
    take_field(fields, name)?.parse().map_err(|_| {
        AppError::Validation(vec![FieldError {
            field: name.to_string(),
            message: "must be a number".to_string(),
        }])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_field_reports_missing_as_field_error() {
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), "Kamal".to_string());

        assert_eq!(take_field(&mut fields, "name").unwrap(), "Kamal");

        let err = take_field(&mut fields, "phone").unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation variant");
        };
        assert_eq!(errors[0].field, "phone");
        assert_eq!(errors[0].message, "is required");
    }

    #[test]
    fn parse_field_rejects_non_numbers() {
        let mut fields = HashMap::new();
        fields.insert("latitude".to_string(), "north".to_string());

        assert!(matches!(
            parse_field::<f64>(&mut fields, "latitude"),
            Err(AppError::Validation(_))
        ));
    }
}
