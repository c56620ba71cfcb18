use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use dialoguer::{Confirm, Input, Password};
use tracing_subscriber::EnvFilter;

use docsearch::action;
use docsearch::api;
use docsearch::config::Config;
use docsearch::prefs::{Preferences, Theme};
use docsearch::search::SearchOptions;
use docsearch::session::password_strength;
use docsearch::shell;
use docsearch::vault::Confirmer;
use docsearch::view::{DocumentsView, Notice, Renderer, SearchView};
use docsearch::{App, ClientError};

/// Search, upload and manage documents on a RAG search backend.
#[derive(Parser, Debug)]
#[command(name = "docsearch", author, version, about, long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the config file
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// More logging (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account (log in afterwards)
    Signup {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the stored session
    Logout {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the logged-in user
    Whoami {
        /// Ask the backend instead of reading the stored profile
        #[arg(long)]
        remote: bool,
    },
    /// Upload a PDF, TXT or DOCX file (max 10MB by default)
    Upload { file: PathBuf },
    /// List uploaded documents
    Docs {
        /// Show the last fetched listing without contacting the backend
        #[arg(long)]
        offline: bool,
    },
    /// Delete a document by id (or unique id prefix)
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Search documents
    Search {
        #[arg(required = true)]
        query: Vec<String>,
        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Skip the synthesized answer
        #[arg(long)]
        no_rag: bool,
    },
    /// Interactive search; a new query supersedes one still running
    Shell {
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        #[arg(long)]
        no_rag: bool,
    },
    /// Check that the backend is up
    Health,
    /// Show backend chunking and embedding settings
    Info,
    /// Show usage analytics
    Stats,
    /// Show or change display preferences
    Prefs {
        #[command(subcommand)]
        setting: Option<PrefsAction>,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions { shell: clap_complete::Shell },
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    /// Colour theme
    Theme { value: ThemeArg },
    /// Compact one-line listings
    Compact { value: SwitchArg },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ThemeArg {
    Light,
    Dark,
    Toggle,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SwitchArg {
    On,
    Off,
    Toggle,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the JSON schema of config.toml
    Schema,
    /// Print the default config file location
    Path,
}

struct PromptConfirmer {
    assume_yes: bool,
}

impl Confirmer for PromptConfirmer {
    /// Fails rather than assuming "no" when there is no terminal to ask on.
    fn confirm(&self, prompt: &str) -> docsearch::Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| ClientError::Prompt(format!("{e} (pass --yes to skip it)")))
    }
}

fn init_tracing(verbose: u8, default_level: &str) {
    let fallback = match verbose {
        0 => default_level.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn search_options(top_k: Option<usize>, no_rag: bool) -> SearchOptions {
    SearchOptions {
        top_k,
        use_rag: no_rag.then_some(false),
    }
}

fn info(renderer: &Renderer, message: &str) {
    eprintln!("{}", renderer.notice(Notice::Info, message));
}

fn success(renderer: &Renderer, message: &str) {
    println!("{}", renderer.notice(Notice::Success, message));
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::debug!("{e:?}");
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    init_tracing(cli.verbose, &config.log_level);

    // Commands that need neither the store nor the network.
    match &cli.command {
        Command::Config { action } => {
            match action {
                ConfigAction::Show => print!("{}", config.to_toml()?),
                ConfigAction::Schema => println!("{}", Config::json_schema()?),
                ConfigAction::Path => match Config::default_path() {
                    Some(path) => println!("{}", path.display()),
                    None => anyhow::bail!("No config directory on this platform"),
                },
            }
            return Ok(());
        }
        Command::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "docsearch", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let app = App::open(config)?;
    let renderer = app.renderer();

    match cli.command {
        Command::Login { email, password } => {
            let email = match email {
                Some(email) => email,
                None => Input::<String>::new().with_prompt("Email").interact_text()?,
            };
            let password = match password {
                Some(password) => password,
                None => Password::new().with_prompt("Password").interact()?,
            };
            let session =
                action::perform("login", app.sessions.login(&app.api, &email, &password)).await?;
            success(&renderer, "Login successful");
            println!("{}", renderer.welcome(&session.user));
        }

        Command::Signup { name, email } => {
            let name = match name {
                Some(name) => name,
                None => Input::<String>::new().with_prompt("Full name").interact_text()?,
            };
            let email = match email {
                Some(email) => email,
                None => Input::<String>::new().with_prompt("Email").interact_text()?,
            };
            let password = Password::new().with_prompt("Password").interact()?;
            info(
                &renderer,
                &format!("Password strength: {}%", password_strength(&password)),
            );
            let confirm = Password::new().with_prompt("Confirm password").interact()?;
            action::perform(
                "signup",
                app.sessions
                    .signup(&app.api, &name, &email, &password, &confirm),
            )
            .await?;
            success(&renderer, "Account created successfully! Please login.");
        }

        Command::Logout { yes } => {
            if app.sessions.current_user().is_none() {
                info(&renderer, "Not logged in");
                return Ok(());
            }
            let confirmer = PromptConfirmer { assume_yes: yes };
            if confirmer.confirm("Are you sure you want to logout?")? {
                app.sessions.logout(&app.api)?;
                success(&renderer, "Logged out successfully!");
            }
        }

        Command::Whoami { remote } => {
            let session = app.require_session()?;
            let user = if remote {
                action::perform("whoami", app.sessions.me(&app.api)).await?
            } else {
                session.user
            };
            println!("{}", renderer.user(&user));
        }

        Command::Upload { file } => {
            app.require_session()?;
            info(&renderer, "Uploading document...");
            let report = action::perform("upload", app.vault.upload(&file)).await?;
            success(&renderer, &renderer.upload(&report));
        }

        Command::Docs { offline } => {
            app.require_session()?;
            let documents = if offline {
                if let Some(at) = app.vault.cache().refreshed_at()? {
                    info(&renderer, &format!("Cached listing from {at}"));
                }
                app.vault.cached()?
            } else {
                action::perform("list", app.vault.list()).await?
            };
            println!("{}", renderer.documents(&DocumentsView::from_documents(&documents)));
        }

        Command::Delete { id, yes } => {
            app.require_session()?;
            let confirmer = PromptConfirmer { assume_yes: yes };
            let outcome = action::perform("delete", app.vault.delete(&id, &confirmer)).await?;
            success(&renderer, &renderer.delete(&outcome));
        }

        Command::Search {
            query,
            top_k,
            no_rag,
        } => {
            app.require_session()?;
            let query = query.join(" ");
            let options = search_options(top_k, no_rag);
            if !query.trim().is_empty() {
                info(&renderer, "Searching...");
            }
            let response = action::perform("search", app.search.search(&query, options)).await?;
            println!("{}", renderer.search(&SearchView::from_response(&response)));
        }

        Command::Shell { top_k, no_rag } => {
            let session = app.require_session()?;
            println!("{}", renderer.welcome(&session.user));
            shell::run(app.search.clone(), renderer, search_options(top_k, no_rag)).await?;
        }

        Command::Health => {
            let health = action::perform("health", api::health(&app.api)).await?;
            println!("{}", renderer.health(&health));
        }

        Command::Info => {
            let info = action::perform("info", api::info(&app.api)).await?;
            println!("{}", renderer.info(&info));
        }

        Command::Stats => {
            app.require_session()?;
            let stats = action::perform("stats", api::stats(&app.api)).await?;
            println!("{}", renderer.stats(&stats));
        }

        Command::Prefs { setting } => {
            match setting {
                None => {}
                Some(PrefsAction::Theme { value }) => {
                    match value {
                        ThemeArg::Light => Preferences::set_theme(&app.store, Theme::Light)?,
                        ThemeArg::Dark => Preferences::set_theme(&app.store, Theme::Dark)?,
                        ThemeArg::Toggle => Preferences::toggle_theme(&app.store)?,
                    };
                }
                Some(PrefsAction::Compact { value }) => {
                    match value {
                        SwitchArg::On => Preferences::set_sidebar_collapsed(&app.store, true)?,
                        SwitchArg::Off => Preferences::set_sidebar_collapsed(&app.store, false)?,
                        SwitchArg::Toggle => Preferences::toggle_sidebar(&app.store)?,
                    };
                }
            }
            let prefs = app.preferences();
            println!("theme   = {}", prefs.theme);
            println!("compact = {}", prefs.sidebar_collapsed);
        }

        Command::Config { .. } | Command::Completions { .. } => {}
    }

    Ok(())
}
