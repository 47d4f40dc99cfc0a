// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of GridPulse.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use thiserror::Error;

/// ISO-NE web services errors
#[derive(Error, Debug)]
pub enum IsoNeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("ISO-NE API returned status {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Authentication failed - check ISO-NE username and password")]
    AuthenticationFailed,

    #[error("Invalid response body: {0}")]
    InvalidResponse(String),

    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type IsoNeResult<T> = Result<T, IsoNeError>;

impl IsoNeError {
    /// True for failures where a later request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            IsoNeError::HttpError(_) | IsoNeError::RetriesExhausted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = IsoNeError::RetriesExhausted {
            attempts: 4,
            last_error: "HTTP 503 Service Unavailable".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "Gave up after 4 attempts: HTTP 503 Service Unavailable"
        );
        assert!(err.is_transient());

        let err = IsoNeError::ApiError {
            status: 404,
            message: "not found".to_owned(),
        };
        assert!(err.to_string().contains("404"));
        assert!(!err.is_transient());
        assert!(!IsoNeError::AuthenticationFailed.is_transient());
    }
}
