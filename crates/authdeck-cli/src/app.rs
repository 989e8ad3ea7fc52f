//! Command handling for the authdeck terminal front-end.
//!
//! `App` wires the configured cookie jar to a session controller and maps
//! each command onto one controller operation. Only commands that talk to the
//! backend build an API client, so `signout`, `status` and `init` work before
//! a base URL is configured.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use authdeck_core::{
    ApiClient, ApiError, Config, Navigator, SessionController, SessionError, SessionStore,
    SignInData, SignUpData,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::navigator::ConsoleNavigator;

/// Environment variable read before prompting for a password
const PASSWORD_ENV: &str = "AUTHDECK_PASSWORD";

pub const USAGE: &str = "\
Usage: authdeck <command>

Commands:
  signin <email>              Sign in and store the session token
  signup <username> <email>   Register a new account
  signout                     Clear the stored session
  status                      Show the current session state
  get <path>                  Authenticated GET against the API
  init <api_base_url>         Save the API base URL to the config file
  help                        Show this message

The API base URL comes from AUTHDECK_API_URL or api_base_url in the config file.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SignIn { email: String },
    SignUp { username: String, email: String },
    SignOut,
    Status,
    Get { path: String },
    Init { api_base_url: String },
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match args.as_slice() {
            [] | ["help"] | ["--help"] | ["-h"] => Ok(Command::Help),
            ["signin", email] => Ok(Command::SignIn {
                email: email.to_string(),
            }),
            ["signup", username, email] => Ok(Command::SignUp {
                username: username.to_string(),
                email: email.to_string(),
            }),
            ["signout"] => Ok(Command::SignOut),
            ["status"] => Ok(Command::Status),
            ["get", path] => Ok(Command::Get {
                path: path.to_string(),
            }),
            ["init", url] => Ok(Command::Init {
                api_base_url: url.to_string(),
            }),
            [name, ..] => Err(anyhow::anyhow!(
                "Unknown command or wrong arguments: {}",
                name
            )),
        }
    }
}

pub struct App {
    config: Config,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl App {
    /// Create the application from the on-disk configuration
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_navigator(config, Arc::new(ConsoleNavigator))
    }

    pub fn with_navigator(config: Config, navigator: Arc<dyn Navigator>) -> Result<Self> {
        debug!(store = ?config.store, "Config loaded");
        let store = SessionStore::new(config.cookie_jar()?);
        Ok(Self {
            config,
            store,
            navigator,
        })
    }

    /// HTTP client for the configured base URL. Fails when none is set.
    fn api(&self) -> Result<ApiClient> {
        let base_url = self.config.api_base_url()?;
        debug!(base_url = %base_url, "Building API client");
        ApiClient::new(
            base_url,
            self.config.request_timeout(),
            Arc::new(self.store.clone()),
        )
        .context("Failed to build HTTP client")
    }

    fn session<B>(&self, backend: B) -> SessionController<B> {
        SessionController::new(backend, self.store.clone(), Arc::clone(&self.navigator))
            .with_timings(self.config.timings())
            .with_policy(self.config.authenticated_policy)
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::SignIn { email } => {
                let session = self.session(self.api()?);
                let password = Self::password()?;
                println!("Signing in...");
                session.sign_in(&SignInData::new(email, password)).await?;
                println!("Signed in.");
            }
            Command::SignUp { username, email } => {
                let session = self.session(self.api()?);
                let password = Self::password()?;
                let payload = session
                    .sign_up(&SignUpData::new(username, email, password))
                    .await?;
                println!("{}", Self::render_payload(&payload));
                println!(
                    "Redirecting to sign-in in {}s...",
                    session.timings().sign_up_redirect.as_secs()
                );
                // Let the scheduled redirect fire before the process exits
                session.shutdown().await;
            }
            Command::SignOut => {
                println!("Signing out...");
                self.session(()).sign_out().await;
            }
            Command::Status => self.print_status()?,
            Command::Get { path } => {
                let body: Value = self.api()?.get(&path).await?;
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            Command::Init { api_base_url } => {
                let mut config = self.config.clone();
                config.api_base_url = Some(api_base_url);
                config.save()?;
                println!("Saved config to {}", Config::config_path()?.display());
            }
            Command::Help => println!("{}", USAGE),
        }
        Ok(())
    }

    fn print_status(&self) -> Result<()> {
        let session = self.session(());
        println!("{}", serde_json::to_string_pretty(&session.state())?);

        match session.store().cookie()? {
            Some(cookie) => println!(
                "Session expires in {} min ({:?} store)",
                cookie.time_until_expiry().num_minutes().max(0),
                self.config.store
            ),
            None => println!("No stored session"),
        }
        Ok(())
    }

    fn password() -> Result<String> {
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            return Ok(password);
        }
        io::stdout().flush()?;
        let password = rpassword::prompt_password("Password: ")?;
        Ok(password)
    }

    /// Sign-up confirmations are usually `{"message": ...}`; show just the text.
    fn render_payload(payload: &Value) -> String {
        match payload {
            Value::String(s) => s.clone(),
            Value::Null => "Account created.".to_string(),
            other => other
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        }
    }

    /// Provide user-friendly error messages based on error type
    pub fn user_message(error: &anyhow::Error) -> String {
        let api_error = match error.downcast_ref::<SessionError>() {
            Some(SessionError::Api(e)) => Some(e),
            Some(SessionError::Storage(e)) => {
                return format!("Signed in, but the session could not be saved: {:#}", e)
            }
            None => error.downcast_ref::<ApiError>(),
        };

        match api_error {
            Some(ApiError::Authentication { message, .. }) => {
                format!("Invalid email or password ({})", message)
            }
            Some(ApiError::Registration { message, .. }) => {
                format!("Registration failed: {}", message)
            }
            Some(ApiError::Transport(e)) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            Some(ApiError::Transport(_)) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            Some(other) => other.to_string(),
            None => format!("{:#}", error),
        }
    }
}
