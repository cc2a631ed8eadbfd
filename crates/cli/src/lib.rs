use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doc_model::screens::UploadForm;
use doc_model::{ContentType, Document, DocumentId, DocumentMetadata};
use doc_render::{adjust_brightness, decode_image, default_renderer, OpenSource, PageRenderer};
use doc_store::{DocumentStore, NewDocument};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Parser)]
#[command(name = "docshelf-cli")]
#[command(about = "DocShelf CLI")]
pub struct Cli {
    /// Override the storage directory.
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Copy a file into the store with its metadata.
    Upload {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        description: String,
    },
    /// Print every stored document as JSON.
    List,
    /// Print machine-readable details for one document.
    Info {
        #[arg(value_name = "ID")]
        id: u64,
    },
    /// Remove one document and its metadata.
    Delete {
        #[arg(value_name = "ID")]
        id: u64,
    },
    /// Remove every stored document.
    Clear,
    /// Render a page of a stored document to a PNG.
    RenderPage {
        #[arg(value_name = "ID")]
        id: u64,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
        #[arg(long, default_value_t = 1.0)]
        brightness: f32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Open a stored document in the desktop app.
    Open {
        #[arg(value_name = "ID")]
        id: u64,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct DocumentOutput {
    id: u64,
    name: String,
    date: String,
    content_type: String,
    path: String,
    title: String,
    author: String,
    description: String,
}

impl From<&Document> for DocumentOutput {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id.0,
            name: document.name.clone(),
            date: document.date.clone(),
            content_type: document.content_type.extension().to_owned(),
            path: document.content_path.display().to_string(),
            title: document.metadata.title.clone(),
            author: document.metadata.author.clone(),
            description: document.metadata.description.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    #[serde(flatten)]
    document: DocumentOutput,
    page_count: u32,
}

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    let store = match cli.root {
        Some(root) => DocumentStore::with_root(root),
        None => DocumentStore::from_default_project()?,
    };

    match cli.command {
        Commands::Upload { file, name, title, author, description } => {
            run_upload(&store, &file, name, title, author, description)
        }
        Commands::List => run_list(&store),
        Commands::Info { id } => run_info(&store, DocumentId(id)),
        Commands::Delete { id } => run_delete(&store, DocumentId(id)),
        Commands::Clear => run_clear(&store),
        Commands::RenderPage { id, page, scale, brightness, output } => {
            run_render_page(&store, DocumentId(id), page, scale, brightness, output.as_deref())
        }
        Commands::Open { id } => run_open(&store, DocumentId(id)),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_upload(
    store: &DocumentStore,
    file: &Path,
    name: String,
    title: String,
    author: String,
    description: String,
) -> Result<()> {
    let form = UploadForm {
        source: Some(file.to_path_buf()),
        name,
        title,
        author,
        description,
    };
    form.validate()?;

    ensure_source_file(file)?;

    let new = NewDocument {
        id: store.next_id()?,
        date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        metadata: DocumentMetadata {
            title: form.title,
            author: form.author,
            description: form.description,
        },
    };

    let saved = store.save(&new, file).context("failed to store document")?;

    let json = serde_json::to_string_pretty(&DocumentOutput::from(&saved))?;
    println!("{json}");

    Ok(())
}

fn run_list(store: &DocumentStore) -> Result<()> {
    let mut documents = store.list()?;
    documents.sort_by_key(|document| document.id);

    let payload: Vec<DocumentOutput> = documents.iter().map(DocumentOutput::from).collect();

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    Ok(())
}

fn run_info(store: &DocumentStore, id: DocumentId) -> Result<()> {
    let document = require_document(store, id)?;

    let page_count = match document.content_type {
        ContentType::Pdf => {
            let mut renderer = default_renderer();
            let handle = renderer
                .open(OpenSource::from(document.content_path.as_path()))
                .context("failed to open PDF")?;
            let count = renderer.page_count(handle)?;
            renderer.close(handle)?;
            count
        }
        ContentType::Png | ContentType::Jpeg => 1,
    };

    let payload = InfoOutput { document: DocumentOutput::from(&document), page_count };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    Ok(())
}

fn run_delete(store: &DocumentStore, id: DocumentId) -> Result<()> {
    let document = require_document(store, id)?;
    store.delete(&document)?;

    println!("deleted {id}");
    Ok(())
}

fn run_clear(store: &DocumentStore) -> Result<()> {
    let removed = store.delete_all()?;

    println!("removed {removed}");
    Ok(())
}

fn run_render_page(
    store: &DocumentStore,
    id: DocumentId,
    page: u32,
    scale: f32,
    brightness: f32,
    output: Option<&Path>,
) -> Result<()> {
    if page == 0 {
        anyhow::bail!("--page is 1-based and must be >= 1");
    }

    let document = require_document(store, id)?;

    let mut image = match document.content_type {
        ContentType::Pdf => {
            let mut renderer = default_renderer();
            let handle = renderer
                .open(OpenSource::from(document.content_path.as_path()))
                .context("failed to open PDF")?;
            let image = renderer
                .render_page(handle, page - 1, scale)
                .context("failed to render page")?;
            renderer.close(handle)?;
            image
        }
        ContentType::Png | ContentType::Jpeg => {
            if page != 1 {
                anyhow::bail!("images have a single page");
            }
            let bytes = fs::read(&document.content_path)?;
            decode_image(&bytes).context("failed to decode image")?
        }
    };

    if brightness != 1.0 {
        adjust_brightness(&mut image, brightness);
    }

    let output =
        output.map(ToOwned::to_owned).unwrap_or_else(|| default_render_output(&document, page));

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }

    image
        .save(&output)
        .with_context(|| format!("failed to write image to {}", output.display()))?;

    println!("{}", output.display());
    Ok(())
}

fn run_open(store: &DocumentStore, id: DocumentId) -> Result<()> {
    let document = require_document(store, id)?;

    if std::env::var_os("DOCSHELF_TEST_NO_SPAWN").is_some() {
        println!("open:{}", document.content_path.display());
        return Ok(());
    }

    let desktop_bin =
        std::env::var_os("DOCSHELF_APP_BIN").unwrap_or_else(|| OsString::from("docshelf"));

    let status = Command::new(desktop_bin)
        .arg(&document.content_path)
        .status()
        .context("failed to launch desktop app")?;

    if !status.success() {
        anyhow::bail!("desktop app exited with status {status}");
    }

    Ok(())
}

fn require_document(store: &DocumentStore, id: DocumentId) -> Result<Document> {
    store.get(id)?.with_context(|| format!("document {id} not found"))
}

fn ensure_source_file(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}

fn default_render_output(document: &Document, page: u32) -> PathBuf {
    document.content_path.with_file_name(format!("{}-page-{page}.png", document.id))
}
