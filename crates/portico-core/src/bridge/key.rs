//! Derivation of namespace keys from capability names
//!
//! A capability is bound under the standard base64 form of its name. Both
//! sides derive the key independently from the same name list. The encoding
//! only keeps bridge bindings apart from ordinary UI globals.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};

/// Key under which `name` is bound in a UI namespace
pub fn encode_key(name: &str) -> String {
    STANDARD.encode(name.as_bytes())
}

/// Recover the capability name a key was derived from
pub fn decode_key(key: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(key)
        .map_err(|_| Error::InvalidCapabilityKey(key.to_string()))?;
    String::from_utf8(bytes).map_err(|_| Error::InvalidCapabilityKey(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys() {
        assert_eq!(encode_key("getAppInfo"), "Z2V0QXBwSW5mbw==");
        assert_eq!(encode_key("send"), "c2VuZA==");
        assert_eq!(encode_key("sha256sum"), "c2hhMjU2c3Vt");
        assert_eq!(encode_key("versions"), "dmVyc2lvbnM=");
    }

    #[test]
    fn test_decode_recovers_names() {
        for name in [
            "getAppInfo",
            "getLogPath",
            "logError",
            "send",
            "sha256sum",
            "showMessage",
            "versions",
            "MixedCaseName",
            "x",
        ] {
            assert_eq!(decode_key(&encode_key(name)).unwrap(), name);
        }
    }

    #[test]
    fn test_encoding_is_deterministic_and_distinct_from_name() {
        assert_eq!(encode_key("logError"), encode_key("logError"));
        assert_ne!(encode_key("logError"), "logError");
        assert_ne!(encode_key("logError"), encode_key("LogError"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_key("not base64!!").unwrap_err();
        assert_eq!(err.code(), "E100");
        // valid base64, invalid UTF-8
        assert!(decode_key("/w==").is_err());
    }
}
