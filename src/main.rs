use clap::Parser;
use cloudkeychain::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

/// Log filter variable, e.g. `CLOUDKEYCHAIN_LOG=cloudkeychain=debug`.
const LOG_ENV: &str = "CLOUDKEYCHAIN_LOG";

fn main() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { ref hint } => {
            cloudkeychain::cli::commands::init::execute(&cli, hint.as_deref())
        }
        Commands::Add {
            ref title,
            ref username,
            ref url,
            ref notes,
        } => cloudkeychain::cli::commands::add::execute(
            &cli,
            title,
            username,
            url.as_deref(),
            notes.as_deref(),
        ),
        Commands::List { trashed } => cloudkeychain::cli::commands::list::execute(&cli, trashed),
        Commands::Show { ref uuid, reveal } => {
            cloudkeychain::cli::commands::show::execute(&cli, uuid, reveal)
        }
        Commands::Trash { ref uuid, restore } => {
            cloudkeychain::cli::commands::trash::execute(&cli, uuid, restore)
        }
        Commands::ChangePassword => cloudkeychain::cli::commands::change_password::execute(&cli),
        Commands::Info => cloudkeychain::cli::commands::info::execute(&cli),
    };

    if let Err(e) = result {
        cloudkeychain::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
