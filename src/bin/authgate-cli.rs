use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use time::OffsetDateTime;

use authgate::client::{self, AuthClient, FileTokenStore, LoginForm, Session, TokenStore};
use authgate::config::ClientConfig;
use authgate::telemetry;

#[derive(Parser, Debug)]
#[command(name = "authgate-cli", about = "Log in to an authgate server and inspect the local session")]
struct Cli {
    /// Base URL of the server
    #[arg(long, env = "AUTH_API_URL")]
    api_url: Option<String>,

    /// File holding the session token
    #[arg(long, env = "AUTH_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in, or sign up when the email is new
    Login {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Show the user from the stored token (no server call)
    Whoami,
    /// Ask the server who the stored token belongs to
    Me,
    /// Forget the stored token
    Logout,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    if let Err(e) = telemetry::init_tracing("authgate=warn") {
        eprintln!("warning: logging disabled: {e:#}");
    }

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // clap already folds the environment into these flags.
    let config = ClientConfig::from_lookup(|key| match key {
        "AUTH_API_URL" => cli.api_url.clone(),
        "AUTH_TOKEN_FILE" => cli.token_file.as_ref().map(|p| p.display().to_string()),
        _ => None,
    })?;

    let store = FileTokenStore::new(&config.token_file);
    let api = AuthClient::new(&config.api_url);

    match cli.command {
        Command::Login { name, email, password } => {
            // A usable stored session skips the form.
            if let Session::Active(user) = client::bootstrap(&store, OffsetDateTime::now_utc()) {
                println!("Already logged in as {} <{}>", user.name, user.email);
                return Ok(ExitCode::SUCCESS);
            }

            let form = LoginForm::new(name, email, password);
            match client::submit_login(&api, &store, &form).await {
                Ok(outcome) => {
                    let user = &outcome.response().user;
                    if outcome.is_signup() {
                        println!("Account created. Welcome, {}!", user.name);
                    } else {
                        println!("Welcome back, {}!", user.name);
                    }
                    println!("Email: {}", user.email);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Whoami => match client::bootstrap(&store, OffsetDateTime::now_utc()) {
            Session::Active(user) => {
                println!("Welcome, {}!", user.name);
                println!("Email: {}", user.email);
                Ok(ExitCode::SUCCESS)
            }
            Session::LoggedOut => {
                println!("Please log in");
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Me => {
            let Some(token) = store.get()? else {
                println!("Please log in");
                return Ok(ExitCode::FAILURE);
            };
            match api.me(&token).await {
                Ok(user) => {
                    println!("{} <{}>", user.name, user.email);
                    println!("Created At: {}", user.created_at);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Logout => {
            client::logout(&store)?;
            println!("Logged out");
            Ok(ExitCode::SUCCESS)
        }
    }
}
