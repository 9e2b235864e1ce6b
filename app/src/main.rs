//! Prism binary
//!
//! Wires the settings store, authenticator and sync loop together and drives
//! everything from a single task: the timer tick and the stdin command
//! channel alternate, so at most one cycle is ever in flight.

use std::path::PathBuf;

use clap::Parser;
use prism_core::{
    ColorMode, Config, SessionAuthenticator, SettingsStore, StatusSink, SyncLoop, SEPARATOR,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Debug, Parser)]
#[command(name = "prism", about = "Sync a wifi bulb to the current track's album artwork")]
struct Args {
    /// Path to the settings file; created with defaults when absent
    #[arg(long, env = "PRISM_SETTINGS", default_value = "settings.json")]
    settings: PathBuf,
}

/// Status entries go to stdout, one separator line after each.
struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn publish(&mut self, entry: &str) {
        println!("{entry}");
        println!("{SEPARATOR}");
    }
}

/// Line commands read from stdin.
#[derive(Debug)]
enum Command {
    SetMode(ColorMode),
    SignIn,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some(("mode", rest)) => match rest.trim().parse::<ColorMode>() {
            Ok(mode) => Some(Command::SetMode(mode)),
            Err(_) => None,
        },
        None if line == "signin" => Some(Command::SignIn),
        None if line == "quit" || line == "exit" => Some(Command::Quit),
        _ => None,
    }
}

fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<Command> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        return;
                    }
                }
                None => eprintln!("commands: mode <prominent|average>, signin, quit"),
            }
        }
    });

    rx
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    prism_core::init_logging();
    let args = Args::parse();

    let store = SettingsStore::load_or_init(&args.settings)?;

    let mut sink = ConsoleSink;
    sink.publish("Welcome to Prism");

    let config = match Config::from_constants(&store.settings().constants) {
        Ok(config) => config,
        Err(e) => {
            sink.publish("Please fill in the configuration file");
            return Err(e.into());
        }
    };

    let auth = SessionAuthenticator::new(config.provider.clone(), store);
    let mut sync = SyncLoop::new(&config, auth, sink);
    let mut commands = spawn_stdin_reader();

    loop {
        match sync.tick_interval() {
            Some(interval) => {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        if let Err(e) = sync.tick().await {
                            tracing::error!(error = %e, "Tick failed");
                        }
                    }
                    command = commands.recv() => {
                        if !handle_command(&mut sync, command).await {
                            break;
                        }
                    }
                }
            }
            // Degraded: nothing is scheduled; only commands are serviced.
            None => {
                if !handle_command(&mut sync, commands.recv().await).await {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Returns false when the loop should stop.
async fn handle_command(sync: &mut SyncLoop<ConsoleSink>, command: Option<Command>) -> bool {
    match command {
        Some(Command::SetMode(mode)) => {
            if let Err(e) = sync.set_mode(mode).await {
                tracing::error!(error = %e, "Mode change failed");
            }
            true
        }
        Some(Command::SignIn) => {
            if let Err(e) = sync.sign_in().await {
                tracing::error!(error = %e, "Sign-in failed");
            }
            true
        }
        Some(Command::Quit) | None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_commands() {
        assert!(matches!(
            parse_command("mode average"),
            Some(Command::SetMode(ColorMode::Average))
        ));
        assert!(matches!(
            parse_command("mode prominent"),
            Some(Command::SetMode(ColorMode::Prominent))
        ));
        assert!(parse_command("mode vivid").is_none());
    }

    #[test]
    fn test_parse_simple_commands() {
        assert!(matches!(parse_command("signin"), Some(Command::SignIn)));
        assert!(matches!(parse_command("quit"), Some(Command::Quit)));
        assert!(matches!(parse_command(" exit "), Some(Command::Quit)));
        assert!(parse_command("dance").is_none());
    }
}
