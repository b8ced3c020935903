//! skynote - Post note selections to Bluesky
//!
//! Host adapter for the skynote commands. Each run loads the plugin, runs
//! one command and unloads it. Commands that need a session (posting and
//! the timeline) load it with the automatic login; `login`, the app password
//! reset and the settings commands do not, so no run contacts the service
//! more than once. Command outcomes are notifications on stderr; only
//! failures of the adapter itself produce a non-zero exit status.

use anyhow::Result;
use clap::{Parser, Subcommand};
use libskynote::config::resolve_config_path;
use libskynote::dispatcher::{CommandId, EDITOR_MENU_TITLE};
use libskynote::lifecycle::{Core, CoreParts};
use libskynote::{Command, SkynoteError};
use std::io::{self, Read};

#[derive(Parser)]
#[command(name = "skynote")]
#[command(version)]
#[command(about = "Post note selections to Bluesky", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with the stored identifier and app password
    Login,

    /// Post the selected text (read from stdin when omitted)
    PostSelectionText {
        /// Text to post
        text: Option<String>,
    },

    /// Post the selected text, as from the editor context menu
    PostSelectionMenu {
        /// Text to post
        text: Option<String>,
    },

    /// Clear the stored app password
    InitAppPassword,

    /// Save one page of the home timeline to a new note
    GetTimelineUnstable,

    /// List the registered commands
    Commands,

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

impl Commands {
    /// Whether the command works on an existing session
    fn needs_session(&self) -> bool {
        matches!(
            self,
            Commands::PostSelectionText { .. }
                | Commands::PostSelectionMenu { .. }
                | Commands::GetTimelineUnstable
        )
    }
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show the current identifier (the app password is never shown)
    Show,

    /// Save the account identifier
    Identifier {
        /// Handle or domain, e.g. alice.bsky.social
        value: String,
    },

    /// Store the app password in local storage
    AppPassword {
        /// Read the app password from stdin (for automation)
        #[arg(long)]
        stdin: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libskynote::logging::init_default(cli.verbose);

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {}", e);
        let code = e
            .downcast_ref::<SkynoteError>()
            .map(SkynoteError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(command: Commands) -> Result<()> {
    if let Commands::Commands = command {
        list_commands();
        return Ok(());
    }

    let parts = CoreParts::from_config_path(resolve_config_path()?)?;
    let core = Core::initialize_with(parts, command.needs_session()).await?;
    let dispatcher = core.dispatcher();

    match command {
        Commands::Login => {
            dispatcher.run(Command::Login).await;
        }
        Commands::PostSelectionText { text } | Commands::PostSelectionMenu { text } => {
            let selection = match text {
                Some(text) => Some(text),
                None => read_selection()?,
            };
            dispatcher.run(Command::PostSelection(selection)).await;
        }
        Commands::InitAppPassword => {
            dispatcher.run(Command::InitAppPassword).await;
        }
        Commands::GetTimelineUnstable => {
            dispatcher.run(Command::FetchTimelineToNote).await;
        }
        Commands::Settings { action } => match action {
            SettingsAction::Show => {
                let panel = core.settings();
                println!("identifier: {}", panel.identifier());
                println!(
                    "app password: {}",
                    if panel.has_app_password() { "set" } else { "not set" }
                );
            }
            SettingsAction::Identifier { value } => {
                core.settings().set_identifier(value.trim()).await;
            }
            SettingsAction::AppPassword { stdin } => {
                let value = read_app_password(stdin)?;
                core.settings().set_app_password(&value);
            }
        },
        Commands::Commands => list_commands(),
    }

    core.shutdown();
    Ok(())
}

fn list_commands() {
    for id in CommandId::ALL {
        println!("{:<24} {}", id.id(), id.name());
    }
    println!("{:<24} {}", "(editor menu)", EDITOR_MENU_TITLE);
}

/// Read the selection from piped stdin; an interactive terminal yields none
fn read_selection() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    // Drop the newline the pipe adds; the rest of the selection is kept as-is
    let text = buffer
        .strip_suffix('\n')
        .map(|s| s.strip_suffix('\r').unwrap_or(s))
        .unwrap_or(&buffer);
    Ok(Some(text.to_string()))
}

fn read_app_password(use_stdin: bool) -> Result<String> {
    let value = if use_stdin || !atty::is(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer.trim().to_string()
    } else {
        rpassword::prompt_password("Bluesky app password: ")?
    };

    if value.is_empty() {
        return Err(SkynoteError::InvalidInput("App password cannot be empty".to_string()).into());
    }

    Ok(value)
}
