//! Application lifecycle events

use serde::Serialize;
use uuid::Uuid;

/// Event broadcast by the host application
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum AppEvent {
    /// Host initialization finished
    Ready,
    /// Another launch was redirected to this instance
    SecondInstance { argv: Vec<String> },
    /// The application was re-activated (dock click, relaunch)
    Activate,
    WindowCreated { id: Uuid },
    /// The last open window was closed
    WindowAllClosed,
    UpdateAvailable { version: String },
    /// Quit was requested; windows are about to go away
    WillQuit,
}

impl AppEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::SecondInstance { .. } => "second-instance",
            Self::Activate => "activate",
            Self::WindowCreated { .. } => "window-created",
            Self::WindowAllClosed => "window-all-closed",
            Self::UpdateAvailable { .. } => "update-available",
            Self::WillQuit => "will-quit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = AppEvent::UpdateAvailable {
            version: "1.2.0".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "update-available");
        assert_eq!(json["version"], "1.2.0");
        assert_eq!(event.name(), "update-available");
    }
}
