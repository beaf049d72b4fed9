//! MCP Protocol types (version 2025-11-25)

mod messages;
mod types;

pub use messages::*;
pub use types::*;

/// MCP Protocol version
pub const PROTOCOL_VERSION: &str = "2025-11-25";

/// Protocol versions this server can speak, newest first
pub const SUPPORTED_VERSIONS: &[&str] = &["2025-11-25", "2025-06-18", "2025-03-26", "2024-11-05"];

/// Pick the protocol version for a session.
///
/// Echoes the client's version when supported, otherwise answers with the
/// newest version this server implements.
#[must_use]
pub fn negotiate_version(client_version: &str) -> &'static str {
    SUPPORTED_VERSIONS
        .iter()
        .find(|v| **v == client_version)
        .copied()
        .unwrap_or(PROTOCOL_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiate_echoes_supported_version() {
        assert_eq!(negotiate_version("2024-11-05"), "2024-11-05");
        assert_eq!(negotiate_version("2025-03-26"), "2025-03-26");
    }

    #[test]
    fn negotiate_falls_back_to_latest() {
        assert_eq!(negotiate_version("1999-01-01"), PROTOCOL_VERSION);
        assert_eq!(negotiate_version(""), PROTOCOL_VERSION);
    }
}
