//! Error taxonomy for the register workflows.
//!
//! Three of the four variants are local rejections that happen before any
//! mutating network call; only `Backend` means a request went out and
//! failed. Display strings are the user-facing messages (the shop's UI is
//! Spanish); the command layer flattens them to plain `String`s.

use thiserror::Error;

use crate::events::UserAction;
use crate::gate::DenialReason;

#[derive(Debug, Error)]
pub enum RegisterError {
    /// A field failed local validation. Nothing was sent.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// The gate denied the action for this date. Nothing was sent.
    #[error("{message}")]
    NotPermitted {
        reason: DenialReason,
        message: String,
    },

    /// The same action already has a request in flight. Nothing was sent.
    #[error("{message}")]
    Busy {
        action: UserAction,
        message: String,
    },

    /// Transport failure or non-success HTTP response.
    #[error("{0}")]
    Backend(String),
}

impl RegisterError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_permitted(reason: DenialReason, message: impl Into<String>) -> Self {
        Self::NotPermitted {
            reason,
            message: message.into(),
        }
    }
}
