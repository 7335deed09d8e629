//! Order commands.

use serde::{Deserialize, Serialize};

use super::OrderError;

/// Request to create an order for a single book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    /// ISBN of the requested book.
    pub isbn: String,

    /// Number of copies.
    pub quantity: i32,
}

impl CreateOrder {
    /// Creates a new CreateOrder command.
    pub fn new(isbn: impl Into<String>, quantity: i32) -> Self {
        Self {
            isbn: isbn.into(),
            quantity,
        }
    }

    /// Checks the request before any catalog lookup or write happens.
    ///
    /// The ISBN is checked first, so a request that is wrong on both counts
    /// reports [`OrderError::EmptyIsbn`].
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.isbn.trim().is_empty() {
            return Err(OrderError::EmptyIsbn);
        }
        if self.quantity <= 0 {
            return Err(OrderError::InvalidQuantity {
                quantity: self.quantity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_command() {
        assert!(CreateOrder::new("1234567891", 1).validate().is_ok());
    }

    #[test]
    fn test_non_positive_quantity_is_rejected() {
        assert_eq!(
            CreateOrder::new("1234567891", 0).validate(),
            Err(OrderError::InvalidQuantity { quantity: 0 })
        );
        assert_eq!(
            CreateOrder::new("1234567891", -2).validate(),
            Err(OrderError::InvalidQuantity { quantity: -2 })
        );
    }

    #[test]
    fn test_blank_isbn_is_rejected() {
        assert_eq!(CreateOrder::new("", 1).validate(), Err(OrderError::EmptyIsbn));
        assert_eq!(CreateOrder::new("   ", 1).validate(), Err(OrderError::EmptyIsbn));
        assert_eq!(CreateOrder::new(" ", 0).validate(), Err(OrderError::EmptyIsbn));
    }

    #[test]
    fn test_deserializes_request_body() {
        let cmd: CreateOrder = serde_json::from_str(r#"{"isbn":"123","quantity":2}"#).unwrap();
        assert_eq!(cmd, CreateOrder::new("123", 2));
    }
}
