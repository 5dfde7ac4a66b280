//! Local validation for the give-help write path. Rejects bad input before
//! anything is sent to the gateway; transaction states themselves come from
//! `common::chain`.

use common::types::{Address, MAX_MESSAGE_CHARS, MIN_MESSAGE_CHARS};
use thiserror::Error;

/// Raw form input, exactly as the user typed it.
#[derive(Debug, Clone)]
pub struct GiveHelpInput {
    pub recipient: String,
    pub message: String,
}

/// Input that passed validation and may be submitted.
#[derive(Debug, Clone)]
pub struct GiveHelp {
    pub recipient: Address,
    pub message: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("please enter a valid wallet address")]
    InvalidRecipient,
    #[error("message must be at least 3 characters long")]
    MessageTooShort,
    #[error("message cannot exceed 280 characters")]
    MessageTooLong,
}

impl GiveHelpInput {
    pub fn validate(&self) -> Result<GiveHelp, ValidationError> {
        let recipient: Address = self
            .recipient
            .parse()
            .map_err(|_| ValidationError::InvalidRecipient)?;
        let chars = self.message.chars().count();
        if chars < MIN_MESSAGE_CHARS {
            return Err(ValidationError::MessageTooShort);
        }
        if chars > MAX_MESSAGE_CHARS {
            return Err(ValidationError::MessageTooLong);
        }
        Ok(GiveHelp {
            recipient,
            message: self.message.clone(),
        })
    }
}
