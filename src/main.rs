use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use formatos_lib::data::SqliteSettings;
use formatos_lib::models::notification::NotificationKind;
use formatos_lib::models::view::{SortKey, SortOrder, TypeFilter};
use formatos_lib::remote::download::HttpDownloader;
use formatos_lib::remote::http_store::HttpFileStore;
use formatos_lib::services::confirm_service::{Confirm, FixedAnswer};
use formatos_lib::services::listing_service::format_size;
use formatos_lib::services::permission_service::{Role, SessionPermissions};
use formatos_lib::state::RenameState;
use formatos_lib::{AppConfig, FileManager, Ports, UploadFile};

#[derive(Parser, Debug)]
#[command(name = "formatos")]
#[command(about = "Browse and manage the Formatos document repository", long_about = None)]
struct Cli {
    /// Answer "yes" to every confirmation prompt
    #[arg(short, long, global = true)]
    yes: bool,

    /// Override the session role from FORMATOS_ROLE
    #[arg(long, global = true, value_parser = parse_role)]
    role: Option<Role>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the current folder
    Ls {
        /// Case-insensitive name filter
        #[arg(short, long)]
        search: Option<String>,
        /// all, document, image, video, audio, archive, code or other
        #[arg(short = 't', long = "type")]
        type_filter: Option<TypeFilter>,
        /// name, size, created_at or type
        #[arg(long)]
        sort: Option<SortKey>,
        #[arg(long)]
        desc: bool,
    },
    /// Go to an absolute location ("" or "/" for the root)
    Cd { path: String },
    /// Enter a subfolder of the current location
    Open { folder: String },
    /// Go to the parent folder
    Up,
    /// Go to the breadcrumb at the given depth (0 is the root)
    Crumb { depth: usize },
    /// Create a folder in the current location
    Mkdir { name: String },
    /// Rename a folder in the current location
    Rename { folder: String, new_name: String },
    /// Delete a folder and everything in it
    Rmdir { folder: String },
    /// Upload local files into the current location
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Download a file from the current location
    Get { name: String },
    /// Delete a file from the current location
    Rm { name: String },
}

fn parse_role(value: &str) -> Result<Role, String> {
    Role::parse(value).map_err(|e| e.to_string())
}

struct StdinConfirm;

#[async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            eprint!("{prompt} [y/N] ");
            io::stderr().flush().ok();
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line).ok();
            matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
        })
        .await;
        answer.unwrap_or(false)
    }
}

fn init_tracing() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to init logging filter")?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
    Ok(())
}

async fn build_manager(cli: &Cli, config: &AppConfig) -> Result<FileManager> {
    let store = HttpFileStore::new(&config.api_url, config.api_token.clone(), config.timeout)
        .context("failed to create file store client")?;
    let settings =
        SqliteSettings::open(&config.db_path()).context("failed to open settings database")?;
    let downloads = HttpDownloader::new(config.download_dir.clone(), config.timeout)
        .context("failed to create download client")?;
    let confirm: Arc<dyn Confirm> = if cli.yes {
        Arc::new(FixedAnswer(true))
    } else {
        Arc::new(StdinConfirm)
    };
    let role = cli.role.unwrap_or(config.role);

    tracing::info!(api = %config.api_url, role = role.as_str(), "starting formatos");

    let ports = Ports {
        store: Arc::new(store),
        settings: Arc::new(settings),
        permissions: Arc::new(SessionPermissions::new(Some(role))),
        confirm,
        downloads: Arc::new(downloads),
    };
    Ok(FileManager::open(ports).await)
}

async fn run(manager: &FileManager, command: Command) {
    match command {
        Command::Ls {
            search,
            type_filter,
            sort,
            desc,
        } => {
            if let Some(term) = search {
                manager.set_search_term(&term);
            }
            if let Some(filter) = type_filter {
                manager.set_type_filter(filter);
            }
            if let Some(key) = sort {
                manager.set_sort(key);
            }
            let wanted = if desc { SortOrder::Desc } else { SortOrder::Asc };
            let query = manager.query();
            if query.sort_order != wanted {
                manager.set_sort(query.sort_key);
            }
        }
        Command::Cd { path } => manager.navigate_to(&path).await,
        Command::Open { folder } => manager.navigate_into_folder(&folder).await,
        Command::Up => manager.navigate_up().await,
        Command::Crumb { depth } => manager.navigate_to_breadcrumb(depth).await,
        Command::Mkdir { name } => {
            manager.set_new_folder_draft(&name);
            manager.create_folder_from_draft().await;
        }
        Command::Rename { folder, new_name } => {
            manager.start_rename(&folder);
            manager.update_rename_draft(&new_name);
            manager.commit_rename().await;
            if let RenameState::Editing { .. } = manager.rename_state() {
                eprintln!("rename skipped: the new name is blank");
                manager.cancel_rename();
            }
        }
        Command::Rmdir { folder } => manager.delete_folder(&folder).await,
        Command::Upload { files } => {
            let mut batch = Vec::with_capacity(files.len());
            for path in &files {
                match UploadFile::from_path(path).await {
                    Ok(file) => batch.push(file),
                    Err(err) => eprintln!("skipping {}: {}", path.display(), err.user_message()),
                }
            }
            if !batch.is_empty() {
                manager.upload_batch(&batch).await;
            }
        }
        Command::Get { name } => manager.download_file(&name).await,
        Command::Rm { name } => manager.delete_file(&name).await,
    }
}

fn print_listing(manager: &FileManager) {
    let view = manager.view();
    println!("{}", manager.current_path());

    for folder in &view.visible_folders {
        println!("  {folder}/");
    }
    for file in &view.visible_files {
        println!(
            "  {:<40} {:>10}  {:<8}  {}",
            file.name,
            format_size(file.size_bytes),
            file.mime_category.as_str(),
            file.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
    }
    if view.visible_folders.is_empty() && view.visible_files.is_empty() {
        println!("  (empty)");
    }
}

fn print_notifications(manager: &FileManager) {
    for note in manager.notifications() {
        let tag = match note.kind {
            NotificationKind::Success => "ok",
            NotificationKind::Error => "error",
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warn",
        };
        eprintln!("[{tag}] {}", note.message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let config = AppConfig::from_env().context("failed to load config")?;
    let manager = build_manager(&cli, &config).await?;

    run(&manager, cli.command).await;

    print_notifications(&manager);
    print_listing(&manager);
    let failed = manager
        .notifications()
        .iter()
        .any(|n| n.kind == NotificationKind::Error);
    manager.shutdown();

    if failed {
        anyhow::bail!("one or more operations failed");
    }
    Ok(())
}
