//! Terminal front end: resolves credentials, starts polling and reads
//! commands from stdin until `quit` or Ctrl+C.

use std::io::Write as _;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use streamwatcher::Foundation;
use streamwatcher::app::SharedState;
use streamwatcher::commands::{CommandError, HELP, Reply, execute, parse_command};
use streamwatcher::config::validation::validate_client_id;
use streamwatcher::credentials::{CredentialSource, Credentials, resolve_credentials};
use streamwatcher::notification::ConsoleSink;
use streamwatcher::poller::HelixBackend;
use streamwatcher::shutdown::graceful_shutdown;

type StdinLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting StreamWatcher");

    let Foundation {
        db,
        config,
        config_file,
        data_dir,
    } = streamwatcher::init_foundation()?;
    let auto_start = config.auto_start;
    let sink = Arc::new(ConsoleSink::new(Some(config.notification_sound.clone())));
    let state = SharedState::new(
        db,
        config,
        config_file.clone(),
        data_dir,
        Arc::new(HelixBackend::default()),
        sink,
    );
    tracing::info!("Data directory: {}", state.data_dir().display());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    match resolve_credentials(config_file.as_ref(), |key| std::env::var(key).ok(), state.db())? {
        Some(resolved) => {
            println!("Using credentials from {}", resolved.describe());
            state.poller().set_credentials(Some(resolved.credentials));
        }
        None => {
            if !prompt_credentials(&state, &mut lines).await? {
                graceful_shutdown(&state).await;
                return Ok(());
            }
        }
    }

    if auto_start {
        state.start_polling().await;
    }
    println!("Type 'help' for commands.");

    let mut credentials = state.poller().subscribe_credentials();
    loop {
        prompt("> ")?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
            changed = credentials.changed() => {
                if changed.is_err() {
                    break;
                }
                let cleared = credentials.borrow_and_update().is_none();
                if cleared && !prompt_credentials(&state, &mut lines).await? {
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(command) => match execute(&state, command).await {
                        Ok(Reply::Quit) => break,
                        Ok(Reply::Text(text)) => println!("{text}"),
                        Err(e) => println!("Error: {e}"),
                    },
                    Err(CommandError::Empty) => {}
                    Err(e @ CommandError::Unknown(_)) => println!("{e}\n\n{HELP}"),
                    Err(e) => println!("{e}"),
                }
            }
        }
    }

    graceful_shutdown(&state).await;
    Ok(())
}

fn prompt(text: &str) -> std::io::Result<()> {
    print!("{text}");
    std::io::stdout().flush()
}

async fn read_line(lines: &mut StdinLines, text: &str) -> anyhow::Result<Option<String>> {
    prompt(text)?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => Ok(None),
        line = lines.next_line() => Ok(line?),
    }
}

/// Ask for a client id and access token until a pair passes validation.
/// Returns `false` when input ends.
async fn prompt_credentials(state: &SharedState, lines: &mut StdinLines) -> anyhow::Result<bool> {
    println!("Enter your Twitch Client ID and an app Access Token.");
    loop {
        let Some(client_id) = read_line(lines, "Client ID: ").await? else {
            return Ok(false);
        };
        let Some(token) = read_line(lines, "Access Token: ").await? else {
            return Ok(false);
        };

        let creds = Credentials::new(&client_id, &token, None);
        if let Err(e) = validate_client_id(&creds.client_id) {
            println!("{e}");
            continue;
        }
        if !state
            .poller()
            .validate(&creds.client_id, &creds.access_token)
            .await
        {
            println!("Twitch rejected those credentials, try again.");
            continue;
        }

        state.poller().commit_credentials(creds)?;
        println!("Credentials saved ({}).", CredentialSource::ManualEntry);
        return Ok(true);
    }
}
