//! Order records.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::book::Book;

use super::{Money, OrderError, OrderStatus, Version};

/// An order that has been decided but not yet persisted.
///
/// It carries no identifier, version or audit data; the repository assigns
/// those on insert and hands back an [`Order`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub book_isbn: String,
    pub book_name: Option<String>,
    pub book_price: Option<Money>,
    pub quantity: i32,
    pub status: OrderStatus,
}

impl NewOrder {
    /// Builds an accepted order priced from the catalog book.
    pub fn accepted(isbn: impl Into<String>, quantity: i32, book: &Book) -> Self {
        Self {
            book_isbn: isbn.into(),
            book_name: Some(book.display_name()),
            book_price: Some(book.price),
            quantity,
            status: OrderStatus::Accepted,
        }
    }

    /// Builds a rejected order. No book snapshot is kept.
    pub fn rejected(isbn: impl Into<String>, quantity: i32) -> Self {
        Self {
            book_isbn: isbn.into(),
            book_name: None,
            book_price: None,
            quantity,
            status: OrderStatus::Rejected,
        }
    }

    /// Attaches the storage-assigned fields.
    pub fn into_order(self, id: OrderId, version: Version, audit: AuditInfo) -> Order {
        Order {
            id,
            book_isbn: self.book_isbn,
            book_name: self.book_name,
            book_price: self.book_price,
            quantity: self.quantity,
            status: self.status,
            version,
            audit,
        }
    }
}

/// Audit metadata kept on every persisted order.
///
/// Dates are always present. The `*_by` fields are only filled in when the
/// write carried a caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditInfo {
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub last_modified_by: Option<UserId>,
}

impl AuditInfo {
    /// Audit data for a fresh insert.
    pub fn created(at: DateTime<Utc>, by: Option<UserId>) -> Self {
        Self {
            created_date: at,
            last_modified_date: at,
            created_by: by.clone(),
            last_modified_by: by,
        }
    }

    /// Records a later modification. `created_*` is never touched, and
    /// `last_modified_by` only changes when an identity is given.
    pub fn touch(&mut self, at: DateTime<Utc>, by: Option<UserId>) {
        self.last_modified_date = at;
        if let Some(user) = by {
            self.last_modified_by = Some(user);
        }
    }
}

/// A persisted book order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub book_isbn: String,
    pub book_name: Option<String>,
    pub book_price: Option<Money>,
    pub quantity: i32,
    pub status: OrderStatus,
    pub version: Version,
    #[serde(flatten)]
    pub audit: AuditInfo,
}

impl Order {
    /// Returns the order moved to `DISPATCHED`.
    ///
    /// The version is left as read: the repository compares it against the
    /// stored row and bumps it on a successful write.
    pub fn dispatched(&self) -> Result<Order, OrderError> {
        if !self.status.can_dispatch() {
            return Err(OrderError::InvalidStateTransition {
                current: self.status,
                action: "dispatch",
            });
        }
        Ok(self.with_status(OrderStatus::Dispatched))
    }

    pub(crate) fn with_status(&self, status: OrderStatus) -> Order {
        Order {
            status,
            ..self.clone()
        }
    }

    /// Returns true if the book name and price are present exactly when the
    /// status calls for them.
    pub fn has_consistent_snapshot(&self) -> bool {
        let expected = self.status.carries_book_snapshot();
        self.book_name.is_some() == expected && self.book_price.is_some() == expected
    }

    /// Returns the user who created the order, if known.
    pub fn created_by(&self) -> Option<&UserId> {
        self.audit.created_by.as_ref()
    }

    /// Returns the user who last modified the order, if known.
    pub fn last_modified_by(&self) -> Option<&UserId> {
        self.audit.last_modified_by.as_ref()
    }
}
