use clap::Parser;
use liarvote::cli::{self, Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => cli::handle_serve().await,
        Command::Store { admin_secret } => cli::handle_store(admin_secret).await,
        Command::Status { port, host } => cli::handle_status(&host, port).await,
        Command::Config(ConfigCommand::Show) => cli::handle_config_show(),
        Command::Config(ConfigCommand::Path) => {
            cli::handle_config_path();
            Ok(())
        }
        Command::Version => {
            cli::handle_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
