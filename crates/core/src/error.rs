use crate::types::SlotId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Capacity check failed for a requested slot. Retryable after the
    /// caller reloads availability.
    #[error("Slot {slot_id} is full")]
    SlotFull { slot_id: SlotId },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{field}: {msg}"),
                    None => format!("{field}: {}", e.code),
                })
            })
            .collect();
        messages.sort();
        CoreError::Validation(messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn validation_errors_are_flattened_and_sorted() {
        let mut errors = ValidationErrors::new();
        errors.add("mobile_number", ValidationError::new("blank"));
        let mut named = ValidationError::new("blank");
        named.message = Some("must not be blank".into());
        errors.add("full_name", named);

        let err = CoreError::from(errors);
        match err {
            CoreError::Validation(msg) => {
                assert_eq!(msg, "full_name: must not be blank; mobile_number: blank");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn slot_full_names_the_slot() {
        let err = CoreError::SlotFull { slot_id: 12 };
        assert_eq!(err.to_string(), "Slot 12 is full");
    }
}
