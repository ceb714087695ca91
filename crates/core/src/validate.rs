//! Request-body validation.
//!
//! Validation is a plain value constructed by the caller and handed to the
//! components that need it. It holds no process-wide state.

use crate::error::{DomainError, DomainResult};

/// Implemented by request types that can check their own shape.
pub trait Validate {
    fn validate(&self, validator: &RequestValidator) -> DomainResult<()>;
}

/// Stateless validator for inbound requests.
///
/// The checks mirror the field rules of the HTTP contracts: required ids,
/// non-empty lists, non-zero or strictly positive quantities. The first
/// failing field is reported.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RequestValidator {
    _private: (),
}

impl RequestValidator {
    pub fn new() -> Self {
        Self { _private: () }
    }

    pub fn check<T: Validate + ?Sized>(&self, request: &T) -> DomainResult<()> {
        request.validate(self)
    }

    pub fn non_empty<T>(&self, field: &str, items: &[T]) -> DomainResult<()> {
        if items.is_empty() {
            return Err(DomainError::invalid(format!("{field} must contain at least one item")));
        }
        Ok(())
    }

    pub fn required_id(&self, field: &str, id: i64) -> DomainResult<()> {
        if id <= 0 {
            return Err(DomainError::invalid(format!("{field} is required")));
        }
        Ok(())
    }

    pub fn non_zero(&self, field: &str, value: i64) -> DomainResult<()> {
        if value == 0 {
            return Err(DomainError::invalid(format!("{field} must not be zero")));
        }
        Ok(())
    }

    pub fn positive(&self, field: &str, value: i64) -> DomainResult<()> {
        if value <= 0 {
            return Err(DomainError::invalid(format!("{field} must be greater than zero")));
        }
        Ok(())
    }

    pub fn not_negative(&self, field: &str, value: i64) -> DomainResult<()> {
        if value < 0 {
            return Err(DomainError::invalid(format!("{field} must not be negative")));
        }
        Ok(())
    }

    pub fn not_blank(&self, field: &str, value: &str) -> DomainResult<()> {
        if value.trim().is_empty() {
            return Err(DomainError::invalid(format!("{field} must not be blank")));
        }
        Ok(())
    }
}

impl<T: Validate> Validate for [T] {
    fn validate(&self, validator: &RequestValidator) -> DomainResult<()> {
        self.iter().try_for_each(|item| item.validate(validator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Line {
        id: i64,
        qty: i64,
    }

    impl Validate for Line {
        fn validate(&self, v: &RequestValidator) -> DomainResult<()> {
            v.required_id("id", self.id)?;
            v.positive("qty", self.qty)
        }
    }

    #[test]
    fn reports_first_failing_field() {
        let v = RequestValidator::new();
        let err = v.check(&Line { id: 0, qty: 0 }).unwrap_err();
        assert_eq!(err, DomainError::invalid("id is required"));
    }

    #[test]
    fn slices_validate_every_item() {
        let v = RequestValidator::new();
        let lines = [Line { id: 1, qty: 1 }, Line { id: 2, qty: -1 }];
        assert!(v.check(&lines[..]).is_err());
        assert!(v.check(&lines[..1]).is_ok());
    }

    #[test]
    fn empty_list_is_rejected() {
        let v = RequestValidator::new();
        assert!(v.non_empty::<u8>("products", &[]).is_err());
    }
}
