//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that the game terms checkbox was actually ticked.
///
/// The form cannot be submitted without accepting the terms, so a `false`
/// value is a validation failure rather than a recordable answer.
pub fn validate_terms_accepted(accepted: &bool) -> Result<(), ValidationError> {
    if !accepted {
        let mut err = ValidationError::new("terms_not_accepted");
        err.message = Some("The game terms must be accepted before submitting".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_terms_accepted() {
        assert!(validate_terms_accepted(&true).is_ok());
        assert!(validate_terms_accepted(&false).is_err());
    }
}
