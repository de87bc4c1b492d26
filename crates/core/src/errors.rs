use thiserror::Error;

/// Unified error type for the crypto-tracker-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
///
/// The `CryptoStore` never lets one of these escape: it logs it and turns it
/// into a notification (and, for market refreshes, a stored error message).
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Storage ─────────────────────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Coin not found: {0}")]
    CoinNotFound(String),

    // ── Export ──────────────────────────────────────────────────────
    #[error("Export failed: {0}")]
    Export(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL; drop the query so API keys
        // passed as parameters never reach logs.
        CoreError::Network(redact_query(&e.to_string()))
    }
}

impl From<csv::Error> for CoreError {
    fn from(e: csv::Error) -> Self {
        CoreError::Export(e.to_string())
    }
}

/// Strip everything after the first `?` of a message that may embed a URL.
pub(crate) fn redact_query(msg: &str) -> String {
    match msg.find('?') {
        Some(idx) => format!("{}?<query redacted>", &msg[..idx]),
        None => msg.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_query_string() {
        let msg = "error sending request for url (https://api.example.com/simple/price?ids=bitcoin&key=secret)";
        assert_eq!(
            redact_query(msg),
            "error sending request for url (https://api.example.com/simple/price?<query redacted>"
        );
    }

    #[test]
    fn leaves_plain_messages_alone() {
        assert_eq!(redact_query("connection refused"), "connection refused");
    }
}
