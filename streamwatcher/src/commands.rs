//! Interactive commands read from stdin.

use std::fmt::Write as _;
use std::path::PathBuf;

use twitch_client::ChannelStatus;

use crate::app::SharedState;
use crate::channels::{add_channel, load_channel_file, remove_channel};
use crate::config::defaults::POLL_INTERVAL_CHOICES;
use crate::launcher::LaunchFeedback;
use crate::poller::PollOutcome;

pub const HELP: &str = "\
Commands:
  list                 show tracked channels and their status
  live                 show live channels only
  launch <n|name>      run the launch action for a channel
  check                check now
  start | stop         start or stop periodic checks
  interval <minutes>   set the check interval (1, 2, 5, 10, 15, 30)
  add <name>           track a channel
  remove <name>        stop tracking a channel
  load <file.txt>      replace the list from a file, one name per line
  settings             show stored settings
  reset <KEY>          restore a setting's default
  reload               re-read settings from the store
  logout               forget saved credentials
  help                 show this text
  quit                 exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// 1-based position in the tracked list.
    Index(usize),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Live,
    Launch(Target),
    Check,
    Start,
    Stop,
    Interval(u64),
    Add(String),
    Remove(String),
    Load(PathBuf),
    Settings,
    Reset(String),
    Reload,
    Logout,
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error("interval must be one of {choices:?} minutes, got '{value}'")]
    InvalidInterval { value: String, choices: &'static [u64] },
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let arg = |name: &'static str| {
        if rest.is_empty() {
            Err(CommandError::MissingArgument(name))
        } else {
            Ok(rest.to_string())
        }
    };

    match word.to_lowercase().as_str() {
        "" => Err(CommandError::Empty),
        "list" | "ls" => Ok(Command::List),
        "live" => Ok(Command::Live),
        "launch" | "open" => {
            let target = arg("launch")?;
            Ok(Command::Launch(match target.parse::<usize>() {
                Ok(n) if n > 0 => Target::Index(n),
                _ => Target::Name(target),
            }))
        }
        "check" => Ok(Command::Check),
        "start" => Ok(Command::Start),
        "stop" => Ok(Command::Stop),
        "interval" => {
            let value = arg("interval")?;
            match value.parse::<u64>() {
                Ok(n) if POLL_INTERVAL_CHOICES.contains(&n) => Ok(Command::Interval(n)),
                _ => Err(CommandError::InvalidInterval {
                    value,
                    choices: POLL_INTERVAL_CHOICES,
                }),
            }
        }
        "add" => Ok(Command::Add(arg("add")?)),
        "remove" | "rm" => Ok(Command::Remove(arg("remove")?)),
        "load" => Ok(Command::Load(PathBuf::from(arg("load")?))),
        "settings" => Ok(Command::Settings),
        "reset" => Ok(Command::Reset(arg("reset")?.to_uppercase())),
        "reload" => Ok(Command::Reload),
        "logout" => Ok(Command::Logout),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

impl Reply {
    fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

pub async fn execute(state: &SharedState, command: Command) -> Result<Reply, anyhow::Error> {
    let poller = state.poller();
    match command {
        Command::List => Ok(Reply::Text(render_list(state))),
        Command::Live => Ok(Reply::Text(render_live(state))),
        Command::Launch(target) => {
            let channel = resolve_target(state, &target)?;
            // The command may block until the player exits.
            let launch_state = state.clone();
            let launch_channel = channel.clone();
            tokio::spawn(async move {
                match launch_state.launch(&launch_channel).await {
                    Ok(LaunchFeedback::Launched { stdout }) => {
                        println!("Launch for {launch_channel} finished");
                        if !stdout.trim().is_empty() {
                            println!("{}", stdout.trim_end());
                        }
                    }
                    Ok(LaunchFeedback::Copied) => {
                        println!("Command for {launch_channel} copied to clipboard");
                    }
                    Err(e) => println!("Launch for {launch_channel} failed: {e}"),
                }
            });
            Ok(Reply::Text(format!("Launching {channel}")))
        }
        Command::Check => match poller.poll_once().await? {
            PollOutcome::Completed(report) => Ok(Reply::Text(format!(
                "{} tracked, {} live",
                report.tracked, report.live
            ))),
            PollOutcome::Skipped => Ok(Reply::text("A check is already running")),
            PollOutcome::NoCredentials => Ok(Reply::text("No credentials")),
        },
        Command::Start => {
            state.start_polling().await;
            let minutes = state.config().await.poll_interval_minutes;
            Ok(Reply::Text(format!("Checking every {minutes} min")))
        }
        Command::Stop => {
            if state.polling().stop() {
                Ok(Reply::text("Stopped"))
            } else {
                Ok(Reply::text("Not running"))
            }
        }
        Command::Interval(minutes) => {
            state.set_poll_interval(minutes).await?;
            Ok(Reply::Text(format!("Interval set to {minutes} min")))
        }
        Command::Add(name) => {
            let channels = add_channel(&poller.channels(), &name);
            let count = channels.len();
            state.set_channels(channels).await?;
            Ok(Reply::Text(format!("Tracking {count} channels")))
        }
        Command::Remove(name) => {
            let channels = remove_channel(&poller.channels(), &name);
            let count = channels.len();
            state.set_channels(channels).await?;
            Ok(Reply::Text(format!("Tracking {count} channels")))
        }
        Command::Load(path) => {
            let channels = load_channel_file(&path).await?;
            let count = channels.len();
            state.set_channels(channels).await?;
            Ok(Reply::Text(format!(
                "Loaded {count} channels from {}",
                path.display()
            )))
        }
        Command::Settings => {
            let mut out = String::new();
            for (key, info) in state.settings().get_all_settings()? {
                let _ = writeln!(out, "{key} = {:?}  # {}", info.value, info.description);
            }
            Ok(Reply::Text(out.trim_end().to_string()))
        }
        Command::Reset(key) => {
            state.settings().reset_setting(&key)?;
            state.reload_config().await?;
            Ok(Reply::Text(format!("{key} reset to default")))
        }
        Command::Reload => {
            state.reload_config().await?;
            Ok(Reply::text("Settings reloaded"))
        }
        Command::Logout => {
            poller.clear_credentials()?;
            Ok(Reply::text("Credentials cleared"))
        }
        Command::Help => Ok(Reply::text(HELP)),
        Command::Quit => Ok(Reply::Quit),
    }
}

fn resolve_target(state: &SharedState, target: &Target) -> Result<String, anyhow::Error> {
    let channels = state.poller().channels();
    match target {
        Target::Index(n) => n
            .checked_sub(1)
            .and_then(|i| channels.get(i))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no channel #{n}, the list has {}", channels.len())),
        Target::Name(name) => Ok(channels
            .iter()
            .find(|c| c.eq_ignore_ascii_case(name))
            .cloned()
            .unwrap_or_else(|| name.clone())),
    }
}

fn render_list(state: &SharedState) -> String {
    let channels = state.poller().channels();
    let snapshot = state.poller().snapshot();
    if channels.is_empty() {
        return "No channels tracked, use 'add <name>' or 'load <file>'".into();
    }

    let mut out = String::new();
    for (i, name) in channels.iter().enumerate() {
        let _ = write!(out, "{:>3}. {name}", i + 1);
        match snapshot.status(name) {
            Some(status) if status.is_live => write_live_details(&mut out, status),
            Some(_) => out.push_str("  offline"),
            None => out.push_str("  not checked yet"),
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

fn render_live(state: &SharedState) -> String {
    let channels = state.poller().channels();
    let snapshot = state.poller().snapshot();
    let live = snapshot.live_channels(&channels);
    if live.is_empty() {
        return "Nobody is live".into();
    }

    let mut out = String::new();
    for status in live {
        out.push_str(&status.name);
        write_live_details(&mut out, status);
        out.push('\n');
    }
    out.trim_end().to_string()
}

fn write_live_details(out: &mut String, status: &ChannelStatus) {
    let _ = write!(out, "  LIVE  {}", status.game.as_deref().unwrap_or("something"));
    if let Some(title) = &status.title {
        let _ = write!(out, " - {title}");
    }
    if let Some(viewers) = &status.viewers {
        let _ = write!(out, " ({viewers} viewers)");
    }
}
