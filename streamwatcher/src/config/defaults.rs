//! All setting definitions with their default values.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Poll interval choices offered to the user, in minutes.
pub const POLL_INTERVAL_CHOICES: &[u64] = &[1, 2, 5, 10, 15, 30];

pub const DEFAULT_POLL_INTERVAL_MINUTES: u64 = 2;
pub const DEFAULT_COMMAND_TEMPLATE: &str = "streamlink {{url}} best";

type DefTuple = (&'static str, &'static str, bool, &'static str);

const DEFS: &[DefTuple] = &[
    ("CHANNELS", "", false, "Tracked channel names, one per line"),
    ("POLL_INTERVAL_MINUTES", "2", true, "Minutes between stream checks"),
    (
        "COMMAND_TEMPLATE",
        DEFAULT_COMMAND_TEMPLATE,
        true,
        "Launch command; {{url}} is replaced with the stream URL",
    ),
    (
        "LAUNCH_MODE",
        "process",
        true,
        "process runs the launch command, clipboard copies it",
    ),
    (
        "NOTIFICATION_SOUND",
        "",
        false,
        "Command run as an audio cue when a channel goes live",
    ),
    ("AUTO_START", "true", true, "Start polling as soon as the watcher starts"),
];

/// A single setting definition.
#[derive(Debug, Clone)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// Global setting definitions indexed by key.
pub static DEFAULT_SETTINGS: LazyLock<HashMap<&'static str, SettingDef>> = LazyLock::new(|| {
    DEFS.iter()
        .map(|&(key, default, required, description)| {
            (
                key,
                SettingDef {
                    key,
                    default,
                    required,
                    description,
                },
            )
        })
        .collect()
});
