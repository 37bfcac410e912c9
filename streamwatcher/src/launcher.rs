//! The "launch" action for a live channel.
//!
//! A command template with a `{{url}}` placeholder is rendered for the
//! channel and then either run through the platform shell or copied to the
//! clipboard. The variant is chosen once at startup from configuration.

use async_trait::async_trait;

pub const URL_PLACEHOLDER: &str = "{{url}}";
const CHANNEL_URL_BASE: &str = "https://twitch.tv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    Process,
    Clipboard,
}

impl LaunchMode {
    pub fn from_str_setting(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "clipboard" => Self::Clipboard,
            _ => Self::Process,
        }
    }
}

/// What the user sees after triggering the action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchFeedback {
    Launched { stdout: String },
    Copied,
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("failed to start command: {0}")]
    Io(#[from] std::io::Error),

    #[error("command exited with {code:?}: {stderr}")]
    Exit { code: Option<i32>, stderr: String },

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
}

pub fn channel_url(channel: &str) -> String {
    format!("{CHANNEL_URL_BASE}/{channel}")
}

/// Replace every `{{url}}` in the template with the channel's stream URL.
pub fn render_command(template: &str, channel: &str) -> String {
    template.replace(URL_PLACEHOLDER, &channel_url(channel))
}

#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self, command: &str) -> Result<LaunchFeedback, LaunchError>;
}

/// Runs the command through the platform shell and waits for it.
pub struct ProcessLauncher;

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(&self, command: &str) -> Result<LaunchFeedback, LaunchError> {
        tracing::info!(command, "Executing launch command");
        let stdout = run_shell(command).await?;
        Ok(LaunchFeedback::Launched { stdout })
    }
}

/// Copies the command text for the user to run themselves.
pub struct ClipboardLauncher;

#[async_trait]
impl Launcher for ClipboardLauncher {
    async fn launch(&self, command: &str) -> Result<LaunchFeedback, LaunchError> {
        let text = command.to_string();
        tokio::task::spawn_blocking(move || {
            arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text))
        })
        .await
        .map_err(|e| LaunchError::Clipboard(e.to_string()))?
        .map_err(|e| LaunchError::Clipboard(e.to_string()))?;
        Ok(LaunchFeedback::Copied)
    }
}

pub fn launcher_for(mode: LaunchMode) -> Box<dyn Launcher> {
    match mode {
        LaunchMode::Process => Box::new(ProcessLauncher),
        LaunchMode::Clipboard => Box::new(ClipboardLauncher),
    }
}

/// Run a command line through `sh -c` (or `cmd /C` on Windows) and return
/// its stdout.
pub async fn run_shell(command: &str) -> Result<String, LaunchError> {
    let mut cmd = if cfg!(windows) {
        let mut c = tokio::process::Command::new("cmd");
        c.arg("/C");
        c
    } else {
        let mut c = tokio::process::Command::new("sh");
        c.arg("-c");
        c
    };
    let output = cmd.arg(command).output().await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::error!(code = output.status.code(), "Launch command failed: {stderr}");
        return Err(LaunchError::Exit {
            code: output.status.code(),
            stderr,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
