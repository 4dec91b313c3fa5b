//! shiori: drive the bookmark engine from a terminal.
//!
//! Bookmarks live in `<data-dir>/bookmarks.json`; layout, search settings
//! and the snapshot live under `<data-dir>/state/`.
//!
//! Usage:
//!   shiori tree
//!   shiori ls 1
//!   shiori reorder 1 5 3 4
//!   shiori paste --cut 5 --into 2 --index 0
//!   shiori --json search rust

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt};

use shiori_engine::{EngineConfig, FileStateStore, FolderView, JsonFileStore, NewTabSession, ToggleMode};
use shiori_types::{ApplyResult, BookmarkId, BookmarkNode, FolderContext};

/// Bookmark tree engine for the shiori new-tab page.
#[derive(Parser, Debug)]
#[command(name = "shiori")]
#[command(about = "Browse and rearrange bookmarks the way the new-tab page does")]
struct Args {
    /// Directory holding bookmarks.json and persisted state
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Engine config file (default: <data-dir>/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the folder toggle mode (independent, accordion)
    #[arg(long, global = true)]
    toggle_mode: Option<ToggleMode>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the whole tree
    Tree,
    /// Open a folder (default: the startup or last open folder) and list it
    Ls { folder: Option<BookmarkId> },
    /// Write a new child order for PARENT
    Reorder {
        parent: BookmarkId,
        #[arg(required = true)]
        ids: Vec<BookmarkId>,
    },
    /// Cut or copy a node and paste it into another folder
    Paste {
        #[arg(long, conflicts_with = "copy", required_unless_present = "copy")]
        cut: Option<BookmarkId>,
        #[arg(long)]
        copy: Option<BookmarkId>,
        #[arg(long)]
        into: BookmarkId,
        #[arg(long)]
        index: Option<usize>,
    },
    /// Create a folder
    Mkdir { parent: BookmarkId, title: String },
    /// Create a bookmark
    Add {
        parent: BookmarkId,
        title: String,
        url: String,
    },
    /// Retitle a node, and re-point a bookmark
    Edit {
        id: BookmarkId,
        #[arg(long)]
        title: String,
        #[arg(long)]
        url: Option<String>,
    },
    /// Delete a bookmark
    Rm { id: BookmarkId },
    /// Search bookmark titles and urls
    Search { query: String },
    /// Toggle the startup folder
    Startup { id: BookmarkId },
    /// Toggle a pin
    Pin { id: BookmarkId },
    /// Expand or collapse FOLDER inside CONTEXT (a folder id or __root__)
    Expand {
        folder: BookmarkId,
        #[arg(long = "in")]
        context: Option<String>,
    },
    /// Remember folder expansion between sessions
    KeepExpansion {
        #[arg(action = clap::ArgAction::Set)]
        keep: bool,
    },
    /// Forget layout and search settings (bookmarks are untouched)
    ResetSettings,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let data_dir = match args.data_dir.clone() {
        Some(dir) => dir,
        None => dirs::data_dir()
            .context("no data directory on this platform; pass --data-dir")?
            .join("shiori"),
    };
    let config_path = args.config.clone().unwrap_or_else(|| data_dir.join("config.toml"));
    let mut config = EngineConfig::load(&config_path)
        .with_context(|| format!("reading config {}", config_path.display()))?;
    if let Some(mode) = args.toggle_mode {
        config.navigation.toggle_mode = mode;
    }

    let store = JsonFileStore::open(data_dir.join("bookmarks.json"))
        .await
        .with_context(|| format!("opening bookmarks in {}", data_dir.display()))?;
    let state = FileStateStore::new(data_dir.join("state"));
    tracing::debug!(data_dir = %data_dir.display(), "opening session");

    let session = NewTabSession::open(Arc::new(store), Arc::new(state), config).await;
    session.load_bookmarks().await;

    let ok = run(&session, args.command, args.json).await?;
    session.flush().await;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Run one command. Returns false when the engine reported a failure.
async fn run(session: &NewTabSession, command: Command, json: bool) -> Result<bool> {
    match command {
        Command::Tree => {
            let tree = session.tree();
            if json {
                print_json(&tree)?;
            } else {
                for node in &tree {
                    print_tree(node, 0);
                }
            }
            Ok(true)
        }
        Command::Ls { folder } => {
            let view = match folder {
                Some(id) => session.navigate_to_folder(Some(id)),
                None => session.view(),
            };
            print_view(&view, json)?;
            Ok(true)
        }
        Command::Reorder { parent, ids } => {
            session.navigate_to_folder(Some(parent));
            let result: ApplyResult = session.reorder(ids).await.into();
            report(result, json)
        }
        Command::Paste {
            cut,
            copy,
            into,
            index,
        } => {
            let captured = match (cut, copy) {
                (Some(id), _) => session.cut(&id),
                (None, Some(id)) => session.copy(&id),
                (None, None) => ApplyResult::failed("nothing to paste"),
            };
            if !captured.success {
                return report(captured, json);
            }
            report(session.paste(&into, index).await, json)
        }
        Command::Mkdir { parent, title } => report(session.create_folder(&parent, &title, None).await, json),
        Command::Add { parent, title, url } => {
            report(session.create_bookmark(&parent, &title, &url, None).await, json)
        }
        Command::Edit { id, title, url } => report(session.edit(&id, &title, url.as_deref()).await, json),
        Command::Rm { id } => report(session.delete(&id).await, json),
        Command::Search { query } => {
            let hits = session.search(&query);
            if json {
                print_json(&hits)?;
            } else {
                for hit in &hits {
                    println!("{:>6}  {}  {}  ({})", hit.id, hit.title, hit.url, hit.path_string());
                }
            }
            Ok(true)
        }
        Command::Startup { id } => {
            let view = session.toggle_startup_folder(id);
            print_view(&view, json)?;
            Ok(true)
        }
        Command::Pin { id } => {
            let pinned = session.toggle_pin(id.clone());
            if json {
                print_json(&serde_json::json!({ "id": id, "pinned": pinned }))?;
            } else {
                println!("{id} {}", if pinned { "pinned" } else { "unpinned" });
            }
            Ok(true)
        }
        Command::Expand { folder, context } => {
            let context = context.as_deref().map(FolderContext::from_key);
            let view = session.toggle_folder(folder, context);
            print_view(&view, json)?;
            Ok(true)
        }
        Command::KeepExpansion { keep } => {
            let view = session.set_keep_folder_expansion(keep);
            print_view(&view, json)?;
            Ok(true)
        }
        Command::ResetSettings => report(session.reset_settings().await, json),
    }
}

fn report(result: ApplyResult, json: bool) -> Result<bool> {
    if json {
        print_json(&result)?;
    } else if let Some(error) = &result.error {
        eprintln!("error: {error}");
    } else {
        println!("ok");
    }
    Ok(result.success)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_tree(node: &BookmarkNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match &node.url {
        Some(url) => println!("{indent}{:>6}  {}  {url}", node.id, node.display_title()),
        None if node.id.is_root() => {}
        None => println!("{indent}{:>6}  {}/", node.id, node.display_title()),
    }
    let next = if node.id.is_root() { depth } else { depth + 1 };
    for child in node.children() {
        print_tree(child, next);
    }
}

fn print_view(view: &FolderView, json: bool) -> Result<()> {
    if json {
        return print_json(view);
    }
    let crumbs: Vec<&str> = view.breadcrumbs.iter().map(|c| c.title.as_str()).collect();
    println!("/{}", crumbs.join("/"));
    if view.offline {
        println!("(offline: showing cached bookmarks)");
    }
    if let Some(error) = &view.error_message {
        eprintln!("warning: {error}");
    }
    for node in &view.nodes {
        let pin = if view.pinned_ids.contains(&node.id) { "*" } else { " " };
        let mark = if view.expanded_ids.contains(&node.id) { "-" } else { "+" };
        match &node.url {
            Some(url) => println!("{pin} {:>6}  {}  {url}", node.id, node.display_title()),
            None => println!("{pin} {:>6}  {}/ [{mark}]", node.id, node.display_title()),
        }
    }
    Ok(())
}
