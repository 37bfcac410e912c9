//! Notification type definitions.

use serde::Serialize;

/// Something the user should hear about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WatchEvent {
    ChannelWentLive {
        name: String,
        title: Option<String>,
        game: Option<String>,
    },
    CheckFailed {
        message: String,
    },
    AuthFailed {
        message: String,
    },
    CredentialsCleared,
}

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// Rendered text for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub kind: ToastKind,
}

impl WatchEvent {
    pub fn to_toast(&self) -> Toast {
        match self {
            Self::ChannelWentLive { name, game, .. } => Toast {
                title: "Channel Live!".into(),
                message: format!(
                    "{name} is now live playing {}!",
                    game.as_deref().unwrap_or("something")
                ),
                kind: ToastKind::Success,
            },
            Self::CheckFailed { message } => Toast {
                title: "Check Failed".into(),
                message: message.clone(),
                kind: ToastKind::Error,
            },
            Self::AuthFailed { message } => Toast {
                title: "Auth Error".into(),
                message: message.clone(),
                kind: ToastKind::Error,
            },
            Self::CredentialsCleared => Toast {
                title: "Credentials Cleared".into(),
                message: "Enter a new Client ID and Access Token to resume checking".into(),
                kind: ToastKind::Info,
            },
        }
    }

    pub fn is_went_live(&self) -> bool {
        matches!(self, Self::ChannelWentLive { .. })
    }
}
