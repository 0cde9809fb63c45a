//! Request/response channels between a window's UI context and the host
//!
//! The UI side holds an [`IpcRenderer`] and can only reach the host by
//! sending named requests through it. The host side registers one handler per
//! channel on [`IpcMain`] and services every request in its own task, so a
//! slow handler never delays an unrelated one.

mod main;
mod renderer;

pub use main::{IpcMain, InvokeEvent};
pub use renderer::{IpcReceiver, IpcRenderer, IpcRequest, channel};

use serde_json::Value;

use crate::error::{Error, Result};

/// Channel names that form the wire contract between host and UI
pub mod channels {
    pub const LOG_ERROR: &str = "log-error";
    pub const GET_LOG_PATH: &str = "get-log-path";
    pub const SHOW_MESSAGE: &str = "show-message";
    pub const GET_APP_INFO: &str = "get-app-info";
}

/// Read a string argument from an invocation payload
pub fn arg_str(channel: &str, args: &[Value], index: usize) -> Result<String> {
    args.get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidArgument {
            channel: channel.to_string(),
            index,
            expected: "string",
        })
}

/// Read an arbitrary argument, treating a missing one as `null`
pub fn arg_value(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_arg_str_reads_strings() {
        let args = vec![json!("hello"), json!(3)];
        assert_eq!(arg_str("x", &args, 0).unwrap(), "hello");
    }

    #[test]
    fn test_arg_str_rejects_wrong_type_and_missing() {
        let args = vec![json!(3)];
        let err = arg_str("show-message", &args, 0).unwrap_err();
        assert_eq!(err.code(), "E204");
        assert!(arg_str("show-message", &args, 4).is_err());
    }

    #[test]
    fn test_arg_value_defaults_to_null() {
        assert_eq!(arg_value(&[], 1), Value::Null);
    }
}
