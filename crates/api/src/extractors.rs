//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;

use crate::error::ApiError;

/// Header carrying the caller's subject, set by the upstream gateway after
/// token verification.
pub const IDENTITY_HEADER: &str = "x-authenticated-user";

/// Optional caller identity.
///
/// A missing, blank or non-UTF-8 header yields `Identity(None)`; extraction
/// never rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub Option<UserId>);

impl Identity {
    /// Returns the user or `Unauthorized`.
    pub fn require(&self) -> Result<&UserId, ApiError> {
        self.0.as_ref().ok_or(ApiError::Unauthorized)
    }

    /// Returns the user if one is present.
    pub fn user(&self) -> Option<&UserId> {
        self.0.as_ref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|subject| !subject.is_empty())
            .map(UserId::new);

        Ok(Identity(user))
    }
}
