//! JSON payloads returned by the daemon

use serde::{Deserialize, Serialize};

/// Result of `LABSEQ <n>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabSeqResponse {
    pub index: i64,
    /// Decimal string; values outgrow every JSON number type
    pub value: String,
    pub calculation_time_ms: u64,
    pub cache_size: usize,
}

/// Result of `CACHE STATS`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsResponse {
    pub cache_size: usize,
}

/// Result of `CACHE CLEAR`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
    pub cache_size: usize,
}

/// Body of an error reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
}

impl ErrorResponse {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            error: "Invalid input".to_string(),
            message: message.into(),
            status: 400,
        }
    }

    pub fn calculation_error(message: impl std::fmt::Display) -> Self {
        Self {
            error: "Calculation error".to_string(),
            message: format!("An unexpected error occurred: {}", message),
            status: 500,
        }
    }
}
