//! The capabilities a window's preload step exposes to UI code

use std::collections::BTreeMap;

use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use super::capability::{Capability, CapabilityTable};
use crate::error::{Error, Result};
use crate::ipc::{IpcRenderer, arg_str, arg_value, channels};

/// Every capability name, in the order UI code looks them up
pub const EXPOSED_NAMES: [&str; 7] = [
    "getAppInfo",
    "getLogPath",
    "logError",
    "send",
    "sha256sum",
    "showMessage",
    "versions",
];

/// Lowercase hex SHA-256 of `data`
pub fn sha256sum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Versions of the host runtime components
pub fn versions() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("portico".to_string(), env!("CARGO_PKG_VERSION").to_string()),
        ("platform".to_string(), std::env::consts::OS.to_string()),
        ("arch".to_string(), std::env::consts::ARCH.to_string()),
        ("family".to_string(), std::env::consts::FAMILY.to_string()),
    ])
}

/// Build the exposed table for one UI context.
///
/// Call-time capabilities go through `ipc`; `sha256sum` and `versions` are
/// answered locally.
pub fn exposed_capabilities(ipc: IpcRenderer) -> Result<CapabilityTable> {
    let send = {
        let ipc = ipc.clone();
        Capability::function(move |args| {
            let ipc = ipc.clone();
            async move {
                let channel = arg_str("send", &args, 0)?;
                let message = arg_value(&args, 1);
                ipc.invoke(&channel, vec![message]).await
            }
        })
    };

    let log_error = {
        let ipc = ipc.clone();
        Capability::function(move |args| {
            let ipc = ipc.clone();
            async move {
                let kind = arg_str(channels::LOG_ERROR, &args, 0)?;
                let data = arg_value(&args, 1);
                ipc.invoke(channels::LOG_ERROR, vec![json!(kind), data]).await
            }
        })
    };

    let get_log_path = {
        let ipc = ipc.clone();
        Capability::function(move |_args| {
            let ipc = ipc.clone();
            async move { ipc.invoke(channels::GET_LOG_PATH, Vec::new()).await }
        })
    };

    let show_message = {
        let ipc = ipc.clone();
        Capability::function(move |args| {
            let ipc = ipc.clone();
            async move {
                let message = arg_str(channels::SHOW_MESSAGE, &args, 0)?;
                ipc.invoke(channels::SHOW_MESSAGE, vec![json!(message)]).await
            }
        })
    };

    let get_app_info = Capability::function(move |_args| {
        let ipc = ipc.clone();
        async move { ipc.invoke(channels::GET_APP_INFO, Vec::new()).await }
    });

    let sha = Capability::function(|args| async move {
        match args.first() {
            Some(Value::String(s)) => Ok(json!(sha256sum(s.as_bytes()))),
            Some(Value::Array(items)) => {
                let bytes = items
                    .iter()
                    .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect::<Option<Vec<u8>>>()
                    .ok_or_else(|| Error::InvalidArgument {
                        channel: "sha256sum".to_string(),
                        index: 0,
                        expected: "string or byte array",
                    })?;
                Ok(json!(sha256sum(&bytes)))
            }
            _ => Err(Error::InvalidArgument {
                channel: "sha256sum".to_string(),
                index: 0,
                expected: "string or byte array",
            }),
        }
    });

    CapabilityTable::new()
        .declare("getAppInfo", get_app_info)?
        .declare("getLogPath", get_log_path)?
        .declare("logError", log_error)?
        .declare("send", send)?
        .declare("sha256sum", sha)?
        .declare("showMessage", show_message)?
        .declare("versions", Capability::value(json!(versions())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::{IpcMain, channel};
    use std::sync::Arc;
    use uuid::Uuid;

    #[test]
    fn test_sha256sum_known_vectors() {
        assert_eq!(
            sha256sum(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256sum(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_table_matches_exposed_names() {
        let (ipc, _rx) = channel(Uuid::new_v4());
        let table = exposed_capabilities(ipc).unwrap();
        assert_eq!(table.names(), EXPOSED_NAMES.to_vec());
    }

    #[tokio::test]
    async fn test_sha_capability_accepts_strings_and_bytes() {
        let (ipc, _rx) = channel(Uuid::new_v4());
        let table = exposed_capabilities(ipc).unwrap();
        let sha = table.get("sha256sum").unwrap();

        let from_str = sha.call("sha256sum", vec![json!("hello")]).await.unwrap();
        let from_bytes = sha
            .call("sha256sum", vec![json!([104, 101, 108, 108, 111])])
            .await
            .unwrap();
        assert_eq!(from_str, from_bytes);
        assert!(sha.call("sha256sum", vec![json!(5)]).await.is_err());
    }

    #[tokio::test]
    async fn test_send_forwards_to_named_channel() {
        let host = Arc::new(IpcMain::new());
        host.handle("ping", |_, args| async move { Ok(json!({"pong": args})) })
            .unwrap();
        let (ipc, rx) = channel(Uuid::new_v4());
        host.serve(rx);

        let table = exposed_capabilities(ipc).unwrap();
        let reply = table
            .get("send")
            .unwrap()
            .call("send", vec![json!("ping"), json!("hello")])
            .await
            .unwrap();
        assert_eq!(reply, json!({"pong": ["hello"]}));
    }

    #[test]
    fn test_versions_value() {
        let (ipc, _rx) = channel(Uuid::new_v4());
        let table = exposed_capabilities(ipc).unwrap();
        let versions = table.get("versions").unwrap().as_value().unwrap();
        assert_eq!(versions["portico"], json!(env!("CARGO_PKG_VERSION")));
    }
}
