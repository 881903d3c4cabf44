//! Transport errors and the messages users see for them

use thiserror::Error;

/// Shown whenever the server did not give us anything better to say
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again later.";

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("request to {endpoint} failed: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {}", .message.as_deref().unwrap_or("<no message>"))]
    Api {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },

    #[error("could not decode response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} reported failure: {}", .message.as_deref().unwrap_or("<no message>"))]
    Rejected {
        endpoint: String,
        message: Option<String>,
    },

    #[error("invalid multipart part {part}: {source}")]
    InvalidPart {
        part: String,
        #[source]
        source: reqwest::Error,
    },
}

impl IntakeError {
    /// Server-supplied message when there is one, otherwise [`GENERIC_FAILURE`]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message: Some(m), .. } | Self::Rejected { message: Some(m), .. } if !m.trim().is_empty() => {
                m.clone()
            }
            _ => GENERIC_FAILURE.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network { source, .. } | Self::Deserialization { source, .. } => {
                source.status().map(|s| s.as_u16())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_used_verbatim() {
        let err = IntakeError::Api {
            endpoint: "POST /api/consultations".into(),
            status: 422,
            message: Some("Phone number already registered".into()),
        };
        assert_eq!(err.user_message(), "Phone number already registered");
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn missing_or_blank_message_falls_back() {
        let err = IntakeError::Api {
            endpoint: "POST /api/reviews".into(),
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE);

        let err = IntakeError::Rejected {
            endpoint: "GET /api/gallery".into(),
            message: Some("  ".into()),
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }
}
