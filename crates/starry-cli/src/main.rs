mod output;
mod run;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use starry_core::secure_storage::SecureStorage;
use starry_core::ConsoleConfig;

#[derive(Parser)]
#[command(name = "starry")]
#[command(about = "Operator console for the Starry community bot")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, short, global = true)]
    pretty: bool,

    /// Path to JSON config file (baseUrl, credentials, dataDir, limits)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Dashboard backend URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Bearer token for this invocation (not stored)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Guild to operate on (defaults to the remembered one)
    #[arg(long, short = 'g', global = true)]
    guild: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a credential in the OS keyring
    Login {
        /// Dashboard API token
        #[arg(
            long,
            value_name = "TOKEN",
            conflicts_with = "cookie",
            required_unless_present = "cookie"
        )]
        bearer: Option<String>,
        /// Dashboard session cookie value
        #[arg(long)]
        cookie: Option<String>,
    },

    /// Remove the stored credential
    Logout,

    /// Show the signed-in operator and their guilds
    Me,

    /// Show ticket/giveaway/poll/application counters
    Summary {
        /// Counters across all guilds instead of the selected one
        #[arg(long)]
        global: bool,
    },

    /// List tickets of the selected guild
    Tickets {
        /// Substring of ticket id, user id, thread id or claimer id
        #[arg(long, short = 's', default_value = "")]
        search: String,
        /// open, claimed, closed or all
        #[arg(long, default_value = "all")]
        status: String,
    },

    /// Close, claim, release or add a user to a ticket
    TicketAction {
        #[arg(long)]
        thread: String,
        #[arg(long)]
        actor: String,
        /// close, claim, release or add_user
        #[arg(long)]
        action: String,
        #[arg(long, default_value = "")]
        user: String,
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Applications config and review threads
    Applications {
        #[command(subcommand)]
        command: ApplicationsCommand,
    },

    /// Guild settings overrides
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },

    /// Canned ticket replies from the settings overrides
    Snippets,

    /// Member search and live users
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },

    /// Recent backend log events
    Logs {
        /// Keep printing pushed events until the feed closes
        #[arg(long, short = 'f')]
        follow: bool,
    },

    /// Stored birthdays
    Birthdays,

    /// Send a plain message to a channel
    Message {
        #[arg(long)]
        channel: String,
        #[arg(long)]
        content: String,
    },

    /// Send an embed to a channel
    Embed {
        #[arg(long)]
        channel: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        color: String,
        #[arg(long, default_value = "")]
        footer: String,
        #[arg(long, default_value = "")]
        thumbnail: String,
        #[arg(long, default_value = "")]
        image: String,
        /// `name|value|inline`, repeatable
        #[arg(long = "field")]
        fields: Vec<String>,
    },

    /// Time a member out
    Timeout {
        #[arg(long)]
        user: String,
        #[arg(long)]
        moderator: String,
        #[arg(long)]
        minutes: String,
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Kick a member
    Kick {
        #[arg(long)]
        user: String,
        #[arg(long)]
        moderator: String,
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Ban a member
    Ban {
        #[arg(long)]
        user: String,
        #[arg(long)]
        moderator: String,
        #[arg(long, default_value = "0")]
        delete_days: String,
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Delete recent messages in a channel
    Purge {
        #[arg(long)]
        channel: String,
        #[arg(long)]
        moderator: String,
        #[arg(long)]
        amount: String,
        /// Only messages by this member
        #[arg(long, default_value = "")]
        user: String,
    },

    /// Give a member a role
    RoleAdd {
        #[arg(long)]
        user: String,
        #[arg(long)]
        role: String,
    },

    /// Take a role from a member
    RoleRemove {
        #[arg(long)]
        user: String,
        #[arg(long)]
        role: String,
    },
}

#[derive(Subcommand)]
enum ApplicationsCommand {
    /// List application threads
    List {
        #[arg(long, short = 's', default_value = "")]
        search: String,
        #[arg(long, default_value = "all")]
        status: String,
    },
    /// Print the applications config
    Config,
    /// Replace the applications config with a JSON file (`-` for stdin)
    Save { file: String },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the settings overrides
    Get,
    /// Replace the settings overrides with a JSON file (`-` for stdin)
    Save { file: String },
    /// Reformat a JSON file without sending it (`-` for stdin)
    Prettify { file: String },
}

#[derive(Subcommand)]
enum UsersCommand {
    /// Search members by name
    Search { query: String },
    /// Members currently active
    Live,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = starry_core::tracing_setup::init_tracing("starry") {
        eprintln!("Warning: {:#}", e);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match runtime.block_on(dispatch(cli)) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the command finished without error notices
async fn dispatch(cli: Cli) -> Result<bool> {
    match &cli.command {
        Commands::Login { bearer, cookie } => {
            run::login(bearer.clone(), cookie.clone())?;
            return Ok(true);
        }
        Commands::Logout => {
            SecureStorage::clear_credential()?;
            eprintln!("Credential removed");
            return Ok(true);
        }
        _ => {}
    }

    let config = load_config(&cli)?;
    run::run(cli, config).await
}

/// Resolve configuration: flags > environment > keyring > file > defaults
fn load_config(cli: &Cli) -> Result<ConsoleConfig> {
    let mut config = match &cli.config {
        Some(path) => ConsoleConfig::load(path)?,
        None => ConsoleConfig::default(),
    };

    if let Some(credential) = SecureStorage::load_credential() {
        config.set_credential(credential);
    }

    config.apply_env();
    apply_flags(&mut config, cli.base_url.as_deref(), cli.token.as_deref());
    Ok(config)
}

fn apply_flags(config: &mut ConsoleConfig, base_url: Option<&str>, token: Option<&str>) {
    if let Some(url) = base_url {
        config.base_url = url.trim().to_string();
    }
    if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
        config.set_token(token.trim().to_string());
    }
}

/// File contents, or stdin for `-`
fn read_input(path: &str) -> Result<String> {
    use anyhow::Context;
    use std::io::Read;

    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(Path::new(path)).with_context(|| format!("Failed to read {}", path))
}
