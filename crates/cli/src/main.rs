use clap::{Parser, Subcommand};
use lib::chat::{GoogleChatClient, TextMessage};

#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(about = "Google Chat relay gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the relay server (GET / and POST / forward query params to the default space).
    Serve {
        /// Config file path (default: CHATRELAY_CONFIG_PATH or ~/.chatrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 8080)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Send a one-shot message to a space without starting the server.
    Send {
        /// Message text to post.
        message: String,

        /// Space name from the config map (default: the configured default space)
        #[arg(long, value_name = "NAME")]
        space: Option<String>,

        /// Config file path (default: CHATRELAY_CONFIG_PATH or ~/.chatrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("chatrelay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("serve failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Send {
            message,
            space,
            config,
        }) => {
            if let Err(e) = run_send(config, space, message).await {
                log::error!("send failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, _path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.server.port = p;
    }
    log::info!(
        "starting relay on {}:{}",
        config.server.bind,
        config.server.port
    );
    lib::server::run_server(config).await
}

async fn run_send(
    config_path: Option<std::path::PathBuf>,
    space: Option<String>,
    message: String,
) -> anyhow::Result<()> {
    let (config, _path) = lib::config::load_config(config_path)?;
    let space_id = lib::config::resolve_space(&config, space.as_deref())?;
    let token = lib::config::resolve_chat_token(&config);
    let client = GoogleChatClient::new(config.chat.api_base.clone(), token);
    client
        .create_message(&space_id, &TextMessage::from_text(message.clone()))
        .await?;
    println!("message posted to {}: '{}'", space_id, message);
    Ok(())
}
