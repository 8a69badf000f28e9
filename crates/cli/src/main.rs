use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "replier")]
#[command(about = "Replier CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config with sample FAQ and news entries.
    Init {
        /// Config file path (default: REPLIER_CONFIG_PATH or ~/.replier/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the LINE webhook gateway. Requires LINE credentials (config or LINE_CHANNEL_ACCESS_TOKEN / LINE_CHANNEL_SECRET).
    Gateway {
        /// Config file path (default: REPLIER_CONFIG_PATH or ~/.replier/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from PORT, config, or 5000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Run one message through the responder chain locally and print the reply.
    Ask {
        /// Config file path (default: REPLIER_CONFIG_PATH or ~/.replier/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Message text.
        text: String,
    },
}

#[tokio::main]
async fn main() {
    load_dotenv(None);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("replier {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Gateway { config, port }) => {
            if let Err(e) = run_gateway(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Ask { config, text }) => {
            if let Err(e) = run_ask(config, &text).await {
                log::error!("ask failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

/// Load `.env` (current directory or parents, or `path`) into the process env. Existing vars win.
fn load_dotenv(path: Option<&std::path::Path>) -> bool {
    let loaded = match path {
        Some(p) => dotenvy::from_path(p).is_ok(),
        None => dotenvy::dotenv().is_ok(),
    };
    if !loaded {
        log::debug!("no .env file loaded");
    }
    loaded
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(replier::config::default_config_path);
    let dir = replier::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_gateway(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = replier::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    replier::gateway::run_gateway(config).await
}

async fn run_ask(config_path: Option<std::path::PathBuf>, text: &str) -> anyhow::Result<()> {
    let (config, _path) = replier::config::load_config(config_path)?;
    replier::config::require_generation(&config)?;
    let chain = replier::chain::ResponderChain::from_config(&config);
    match chain.dispatch(text).await {
        Some(reply) => println!("{}", reply.text),
        None => println!("(no responder answered)"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotenv_file_sets_missing_vars_only() {
        let dir = std::env::temp_dir().join(format!("replier-dotenv-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join(".env");
        std::fs::write(
            &file,
            "REPLIER_DOTENV_TEST_TOKEN=from-file\nREPLIER_DOTENV_TEST_KEEP=from-file\n",
        )
        .unwrap();
        std::env::set_var("REPLIER_DOTENV_TEST_KEEP", "from-env");

        assert!(load_dotenv(Some(&file)));
        assert_eq!(
            std::env::var("REPLIER_DOTENV_TEST_TOKEN").unwrap(),
            "from-file"
        );
        assert_eq!(std::env::var("REPLIER_DOTENV_TEST_KEEP").unwrap(), "from-env");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_dotenv_file_is_not_an_error() {
        let missing = std::env::temp_dir().join("replier-no-such-dir").join(".env");
        assert!(!load_dotenv(Some(&missing)));
    }
}
