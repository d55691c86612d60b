use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use catalog_core::{
    AssetUpload, ConsoleEvent, DialogKind, EditorMode, HttpCatalogClient, InputKind,
    ProductConsole,
};
use clap::Parser;
use shared::domain::Session;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::TryRecvError},
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod terminal;
mod token_store;

use commands::{Command, HELP};
use config::{load_settings, Settings};
use terminal::{render_event, render_product, TerminalSurface};
use token_store::TokenStore;

#[derive(Parser, Debug)]
#[command(name = "product-console", about = "Terminal console for a hosted product catalog")]
struct Args {
    /// API base URL, e.g. https://host/v2
    #[arg(long)]
    api_base: Option<String>,
    /// Per-account API path segment
    #[arg(long)]
    api_path: Option<String>,
    #[arg(long)]
    token_path: Option<PathBuf>,
    #[arg(long)]
    log_filter: Option<String>,
}

impl Args {
    fn apply(self, settings: &mut Settings) {
        if let Some(v) = self.api_base {
            settings.api_base = v;
        }
        if let Some(v) = self.api_path {
            settings.api_path = v;
        }
        if let Some(v) = self.token_path {
            settings.token_path = Some(v);
        }
        if let Some(v) = self.log_filter {
            settings.log_filter = v;
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct Shell {
    console: Arc<ProductConsole>,
    surface: TerminalSurface,
    store: TokenStore,
    events: broadcast::Receiver<ConsoleEvent>,
    stored: Option<Session>,
}

impl Shell {
    async fn run(&mut self, command: Command) -> Result<()> {
        let console = &self.console;
        // Failures from the console are published as events and rendered by
        // `flush_events`; only local I/O errors come back from here.
        match command {
            Command::Help => println!("{HELP}"),
            Command::SignIn { username, password } => {
                if console.sign_in(&username, &password).await.is_ok() {
                    let _ = console.start().await;
                }
            }
            Command::Check => {
                let _ = console.check_session().await;
            }
            Command::List { page } => {
                let _ = match page {
                    Some(page) => console.go_to_page(page).await,
                    None => console.refresh().await,
                };
            }
            Command::Next => {
                if let Ok(None) = console.next_page().await {
                    println!("already on the last page");
                }
            }
            Command::Prev => {
                if let Ok(None) = console.previous_page().await {
                    println!("already on the first page");
                }
            }
            Command::New => {
                console.open_for_create().await;
                println!("{}", render_product(&console.draft().await));
            }
            Command::Edit { id } => match console.find_product(&id).await {
                Some(product) => {
                    console.open_for_edit(product).await;
                    println!("{}", render_product(&console.draft().await));
                }
                None => println!("no product {id} on this page"),
            },
            Command::Set { field, value } => {
                let _ = console
                    .set_field(field.name(), &value, Command::input_kind(field))
                    .await;
            }
            Command::Toggle { checked } => {
                let _ = console
                    .set_field("is_enabled", "", InputKind::Toggle { checked })
                    .await;
            }
            Command::Image { index, url } => {
                let len = console.draft().await.images_url.len();
                if index < len {
                    console.set_image_at(index, &url).await;
                } else {
                    println!("no image slot {index}; the draft has {len}");
                }
            }
            Command::AddImage => {
                if console.can_append_image().await {
                    let draft = console.append_image().await;
                    println!("image slot {} added", draft.images_url.len() - 1);
                } else {
                    println!("fill the last image slot first (at most 5 images)");
                }
            }
            Command::RemoveImage => {
                if console.draft().await.images_url.is_empty() {
                    println!("no image slots to remove");
                } else {
                    console.remove_last_image().await;
                }
            }
            Command::Upload { path } => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("failed to read '{}'", path.display()))?;
                let filename = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let _ = console.upload_image(AssetUpload::new(filename, bytes)).await;
            }
            Command::Draft => {
                if console.editor_mode().await == EditorMode::Unset {
                    println!("nothing is being edited; use new or edit <id>");
                } else {
                    println!("{}", render_product(&console.draft().await));
                }
            }
            Command::Submit => {
                let _ = console.submit().await;
            }
            Command::Cancel => {
                if !self.surface.dismiss(DialogKind::Editor) {
                    println!("editor window is not available");
                }
            }
            Command::Detail { id } => match console.find_product(&id).await {
                Some(product) => {
                    println!("{}", render_product(&product));
                    console.open_detail(product).await;
                }
                None => println!("no product {id} on this page"),
            },
            Command::Close => console.close_detail().await,
            Command::Delete { id } => {
                let _ = console.delete(&id).await;
            }
            Command::Logout => console.sign_out().await,
            Command::Quit => {}
        }
        Ok(())
    }

    fn flush_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    if let Some(line) = render_event(&event) {
                        println!("{line}");
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "console events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    /// Mirrors the console's credential into the token file.
    async fn sync_token(&mut self) {
        let current = self.console.session().await;
        if current == self.stored {
            return;
        }
        let result = match &current {
            Some(session) => self.store.save(session),
            None => self.store.clear(),
        };
        match result {
            Ok(()) => self.stored = current,
            Err(error) => warn!(error = %format!("{error:#}"), "token file not updated"),
        }
    }
}

fn prompt() {
    use std::io::Write as _;
    print!("> ");
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings();
    args.apply(&mut settings);
    init_tracing(&settings.log_filter);

    let client = HttpCatalogClient::new(
        &settings.api_base,
        settings.api_path.clone(),
        settings.request_timeout(),
    )
    .with_context(|| format!("invalid API settings for '{}'", settings.api_base))?;
    info!(api_base = %settings.api_base, api_path = %settings.api_path, "console starting");

    let surface = TerminalSurface::default();
    let console = ProductConsole::new(Arc::new(client), &surface);
    let store = TokenStore::new(settings.resolved_token_path());
    let stored = store.load();
    debug!(token_path = ?store.path(), restored = stored.is_some(), "token store ready");
    let mut shell = Shell {
        events: console.subscribe_events(),
        console,
        surface,
        store,
        stored: stored.clone(),
    };

    match stored {
        Some(session) => {
            shell.console.install_session(session).await;
            let _ = shell.console.start().await;
        }
        None => println!("not signed in; use: signin <username> <password>"),
    }
    shell.flush_events();
    shell.sync_token().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        if !line.trim().is_empty() {
            match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => {
                    if let Err(error) = shell.run(command).await {
                        println!("✘ {error:#}");
                    }
                }
                Err(message) => println!("{message}"),
            }
            shell.console.pump_dialogs().await;
            shell.flush_events();
            shell.sync_token().await;
        }
        prompt();
    }

    shell.console.dispose().await;
    info!("console stopped");
    Ok(())
}
