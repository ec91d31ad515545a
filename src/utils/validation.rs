use validator::{Validate, ValidationErrors};

use crate::utils::ApiError;

pub fn validate_dto<T: Validate>(dto: &T) -> Result<(), ApiError> {
    dto.validate()
        .map_err(|errors| ApiError::bad_request(format!("Validation failed: {}", describe(&errors))))
}

fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();

    messages.sort();
    messages.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillingInterval, CreateSubscriptionDto, Currency};

    #[test]
    fn collects_every_field_message() {
        let dto = CreateSubscriptionDto {
            donor_id: String::new(),
            amount: -1.0,
            currency: Currency::Cad,
            interval: BillingInterval::Weekly,
            campaign_description: "Books".to_string(),
        };

        let err = validate_dto(&dto).unwrap_err();
        assert_eq!(
            err.message,
            "Validation failed: amount must be a positive number; donorId is required and must be a string"
        );
    }
}
