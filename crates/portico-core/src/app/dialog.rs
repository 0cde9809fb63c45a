//! Message dialogs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageBoxKind {
    #[default]
    None,
    Info,
    Error,
    Question,
    Warning,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBoxOptions {
    #[serde(rename = "type")]
    pub kind: MessageBoxKind,
    pub title: String,
    pub message: String,
    pub buttons: Vec<String>,
    pub default_id: Option<usize>,
    pub checkbox_label: Option<String>,
}

impl MessageBoxOptions {
    /// Informational box with a single "OK" button
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: MessageBoxKind::Info,
            title: title.into(),
            message: message.into(),
            buttons: vec!["OK".to_string()],
            ..Self::default()
        }
    }
}

/// Outcome of a message box
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBoxResult {
    /// Index of the clicked button
    pub response: usize,
    pub checkbox_checked: bool,
}

/// Presents dialogs to the user
#[async_trait]
pub trait DialogProvider: Send + Sync {
    async fn show_message_box(&self, options: MessageBoxOptions) -> Result<MessageBoxResult>;
}

/// Headless provider: logs the dialog and answers with the default button
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDialog;

#[async_trait]
impl DialogProvider for LogDialog {
    async fn show_message_box(&self, options: MessageBoxOptions) -> Result<MessageBoxResult> {
        match options.kind {
            MessageBoxKind::Error => error!(title = %options.title, "{}", options.message),
            MessageBoxKind::Warning => warn!(title = %options.title, "{}", options.message),
            _ => info!(title = %options.title, "{}", options.message),
        }
        Ok(MessageBoxResult {
            response: options.default_id.unwrap_or(0),
            checkbox_checked: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_dialog_answers_default_button() {
        let mut options = MessageBoxOptions::info("Message", "hi");
        assert_eq!(LogDialog.show_message_box(options.clone()).await.unwrap().response, 0);

        options.buttons.push("Cancel".to_string());
        options.default_id = Some(1);
        assert_eq!(LogDialog.show_message_box(options).await.unwrap().response, 1);
    }

    #[test]
    fn test_result_wire_shape() {
        let json = serde_json::to_value(MessageBoxResult::default()).unwrap();
        assert_eq!(json, serde_json::json!({"response": 0, "checkboxChecked": false}));
    }
}
