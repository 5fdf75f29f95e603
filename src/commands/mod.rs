mod reader;

pub use reader::*;

use thiserror::Error;

/// Why a request produced no result
#[derive(Debug, Error)]
pub enum RequestError {
    /// Rejected before any image was touched
    #[error("{0}")]
    Malformed(String),
    #[error("Failed to fetch {key}: {source:#}")]
    Fetch {
        key: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("{0:#}")]
    Processing(#[from] anyhow::Error),
}

impl RequestError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// HTTP-style status for callers that expose these over a wire
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Malformed(_) => 400,
            Self::Fetch { .. } | Self::Processing(_) => 500,
        }
    }

    /// `{"error": ...}` body returned in place of a result
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_payloads() {
        let malformed = RequestError::malformed("Missing image_url");
        assert_eq!(malformed.status_code(), 400);
        assert_eq!(malformed.to_payload()["error"], "Missing image_url");

        let fetch = RequestError::Fetch {
            key: "map.png".to_string(),
            source: anyhow::anyhow!("not found"),
        };
        assert_eq!(fetch.status_code(), 500);
        assert_eq!(fetch.to_string(), "Failed to fetch map.png: not found");

        let processing: RequestError = anyhow::anyhow!("bad pixel").into();
        assert_eq!(processing.to_payload()["error"], "bad pixel");
    }
}
