//! Marquee IPC Protocol
//!
//! Shared types for launcher-CLI communication. Each connection to the
//! loopback socket carries one JSON request line and one JSON response line.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default loopback address the launcher listens on.
pub const DEFAULT_IPC_ADDR: &str = "127.0.0.1:47130";

/// Upper bound for a single request or response line.
pub const MAX_IPC_MESSAGE_SIZE: u64 = 64 * 1024;

/// How long either side waits for the other's line.
pub const IPC_READ_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum IpcError {
    #[error("Invalid message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message exceeds {MAX_IPC_MESSAGE_SIZE} bytes")]
    TooLarge,

    #[error("Connection closed before a message was received")]
    Closed,
}

/// Commands that can be sent from the CLI to the launcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpcCommand {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    /// Activate the highlighted item, as if Enter had been pressed.
    Select,
    /// Run a command string through the launcher's dispatch table.
    Execute { command: String },
    /// Query the navigation state.
    QueryState,
    /// Reload configuration and layout from disk.
    Reload,
    /// Quit the launcher.
    Stop,
}

/// Which part of the screen has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Focus {
    Sidebar,
    Menu,
}

/// Selection inside the current menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuCursor {
    pub title: String,
    pub row: usize,
    pub column: usize,
    /// Index of the highlighted card.
    pub entry: usize,
    /// Title of the highlighted card.
    pub entry_title: String,
}

/// Responses from the launcher to the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IpcResponse {
    /// Command executed successfully.
    Ok,
    /// Command failed with an error.
    Error { message: String },
    /// Navigation state query response.
    State {
        focus: Focus,
        sidebar_index: usize,
        sidebar_title: String,
        /// Present when the current sidebar entry is a menu.
        menu: Option<MenuCursor>,
        /// Shifts or a press animation are in flight.
        animating: bool,
        /// A launched application is still running.
        application_running: bool,
    },
}

impl IpcResponse {
    /// Create an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Serialize a message as one protocol line, newline included.
pub fn encode_line<T: Serialize>(message: &T) -> Result<String, IpcError> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

/// Parse one protocol line.
pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T, IpcError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(IpcError::Closed);
    }
    if line.len() as u64 > MAX_IPC_MESSAGE_SIZE {
        return Err(IpcError::TooLarge);
    }
    Ok(serde_json::from_str(line)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_names() {
        let json = serde_json::to_string(&IpcCommand::MoveLeft).unwrap();
        assert_eq!(json, r#"{"type":"move_left"}"#);

        let json = serde_json::to_string(&IpcCommand::QueryState).unwrap();
        assert_eq!(json, r#"{"type":"query_state"}"#);
    }

    #[test]
    fn test_execute_command_serialization() {
        let cmd = IpcCommand::Execute {
            command: ":shutdown".to_string(),
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("execute"));
        assert!(json.contains(":shutdown"));

        let cmd2: IpcCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(cmd, cmd2);
    }

    #[test]
    fn test_state_response_serialization() {
        let resp = IpcResponse::State {
            focus: Focus::Menu,
            sidebar_index: 2,
            sidebar_title: "Games".to_string(),
            menu: Some(MenuCursor {
                title: "Games".to_string(),
                row: 1,
                column: 2,
                entry: 5,
                entry_title: "Quake".to_string(),
            }),
            animating: false,
            application_running: true,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""status":"state""#));
        assert!(json.contains(r#""focus":"menu""#));

        let resp2: IpcResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(resp, resp2);
    }

    #[test]
    fn test_error_response() {
        let resp = IpcResponse::error("Something went wrong");
        if let IpcResponse::Error { message } = resp {
            assert_eq!(message, "Something went wrong");
        } else {
            panic!("Expected Error response");
        }
    }

    #[test]
    fn test_line_delimited_protocol() {
        let line = encode_line(&IpcCommand::Select).unwrap();
        assert!(line.ends_with('\n'));
        let parsed: IpcCommand = decode_line(&line).unwrap();
        assert_eq!(parsed, IpcCommand::Select);

        let line = encode_line(&IpcResponse::Ok).unwrap();
        let parsed: IpcResponse = decode_line(&line).unwrap();
        assert_eq!(parsed, IpcResponse::Ok);
    }

    #[test]
    fn test_invalid_lines() {
        assert!(matches!(
            decode_line::<IpcCommand>("not valid json"),
            Err(IpcError::Json(_))
        ));
        assert!(decode_line::<IpcCommand>(r#"{"type": "focus_left"}"#).is_err());
        assert!(decode_line::<IpcResponse>(r#"{"status": "invalid"}"#).is_err());
        assert!(matches!(
            decode_line::<IpcCommand>("\n"),
            Err(IpcError::Closed)
        ));
    }

    #[test]
    fn test_oversized_line_is_rejected() {
        let command = "x".repeat(MAX_IPC_MESSAGE_SIZE as usize);
        let line = encode_line(&IpcCommand::Execute { command }).unwrap();
        assert!(matches!(
            decode_line::<IpcCommand>(&line),
            Err(IpcError::TooLarge)
        ));
    }

    #[test]
    fn test_default_address_is_loopback() {
        let addr: std::net::SocketAddr = DEFAULT_IPC_ADDR.parse().unwrap();
        assert!(addr.ip().is_loopback());
    }
}
