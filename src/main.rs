use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use ytplcli::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Search every CSV row on YouTube and add the matches to the playlist
    Run(RunOptions),

    /// Authorize with the YouTube Data API
    Auth(AuthOptions),

    /// Show how many rows of the CSV are still pending (no API calls)
    Info(InfoOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct RunOptions {
    /// CSV file with the songs (overrides YTPL_INPUT_FILE)
    #[clap(long)]
    input: Option<PathBuf>,

    /// Exact name of the target playlist (overrides YTPL_PLAYLIST_NAME)
    #[clap(long)]
    playlist: Option<String>,

    /// Progress log file (overrides YTPL_PROGRESS_LOG_FILE)
    #[clap(long)]
    log: Option<PathBuf>,

    /// Search only; do not add anything to the playlist
    #[clap(long)]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    /// Discard stored credentials and authorize again
    #[clap(long)]
    force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct InfoOptions {
    #[clap(long)]
    input: Option<PathBuf>,
    #[clap(long)]
    log: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();
    let cfg = config::Config::from_env();

    let result = match cli.command {
        Command::Run(opt) => {
            let cfg = cfg
                .with_input_file(opt.input.as_deref())
                .with_playlist_name(opt.playlist.as_deref())
                .with_progress_log_file(opt.log.as_deref());
            cli::run(cfg, opt.dry_run).await
        }
        Command::Auth(opt) => cli::auth(cfg, opt.force).await,
        Command::Info(opt) => {
            let cfg = cfg
                .with_input_file(opt.input.as_deref())
                .with_progress_log_file(opt.log.as_deref());
            cli::info(cfg).await
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{}", e);
    }
}
