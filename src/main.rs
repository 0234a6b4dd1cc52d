mod session;


use std::path::{Path, PathBuf};

use canvas::doc::RectanglePatch;
use canvas::engine::{Action, EngineCore};
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::session::{ImageInfo, Session, SessionError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("export failed: {0}")]
    Voc(#[from] voc::VocError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unknown label `{0}`; add it with `annotate attr add`")]
    UnknownLabel(String),
    #[error("no rectangle with id {0}")]
    UnknownRectangle(Uuid),
    #[error("nothing to change; pass at least one field flag")]
    EmptyPatch,
}

#[derive(Parser, Debug)]
#[command(name = "annotate", about = "Rectangle annotation sessions with Pascal-VOC export")]
struct Cli {
    #[arg(long, env = "ANNOTATE_SESSION", default_value = "annotations.json")]
    session: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a session for an image.
    Init(InitArgs),
    /// Manage the label vocabulary.
    Attr(AttrCommand),
    /// Add a rectangle centered on the image.
    Add { label: String },
    /// Print every rectangle.
    List,
    /// Edit fields of a rectangle.
    Set(SetArgs),
    /// Delete a rectangle.
    Rm { id: Uuid },
    /// Write the Pascal-VOC XML file.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    filename: String,

    #[arg(long, value_parser = finite)]
    width: f64,

    #[arg(long, value_parser = finite)]
    height: f64,

    #[arg(long = "attr", help = "Initial label; repeat for more")]
    attributes: Vec<String>,

    #[arg(long, default_value_t = false)]
    force: bool,
}

#[derive(Args, Debug)]
struct AttrCommand {
    #[command(subcommand)]
    command: AttrSubcommand,
}

#[derive(Subcommand, Debug)]
enum AttrSubcommand {
    Add { name: String },
    Remove { name: String },
    List,
}

#[derive(Args, Debug)]
struct SetArgs {
    id: Uuid,

    #[arg(long, allow_hyphen_values = true, value_parser = finite)]
    x: Option<f64>,

    #[arg(long, allow_hyphen_values = true, value_parser = finite)]
    y: Option<f64>,

    #[arg(long, value_parser = finite)]
    width: Option<f64>,

    #[arg(long, value_parser = finite)]
    height: Option<f64>,

    #[arg(long, allow_hyphen_values = true, value_parser = finite)]
    rotation: Option<f64>,

    #[arg(long)]
    label: Option<String>,

    #[arg(long)]
    name: Option<String>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(long, help = "Output path; defaults to <image stem>_VOC.xml next to the session")]
    out: Option<PathBuf>,

    #[arg(long, default_value_t = voc::DEFAULT_DEPTH)]
    depth: u32,
}

/// Parse a number, refusing NaN and infinities.
fn finite(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e| format!("`{raw}` is not a number: {e}"))?;
    if !value.is_finite() {
        return Err(format!("`{raw}` is not a finite number"));
    }
    Ok(value)
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let output = run(&cli.session, cli.command)?;
    print_json(&output)
}

fn run(path: &Path, command: Command) -> Result<Value, CliError> {
    match command {
        Command::Init(args) => run_init(path, args),
        Command::Attr(attr) => run_attr(path, attr),
        Command::Add { label } => run_add(path, &label),
        Command::List => {
            let session = Session::load(path)?;
            Ok(serde_json::to_value(session.store.rectangles())?)
        }
        Command::Set(args) => run_set(path, args),
        Command::Rm { id } => run_rm(path, id),
        Command::Export(args) => run_export(path, args),
    }
}

fn run_init(path: &Path, args: InitArgs) -> Result<Value, CliError> {
    if path.exists() && !args.force {
        return Err(SessionError::Exists(path.to_path_buf()).into());
    }
    let image = ImageInfo { filename: args.filename, width: args.width, height: args.height };
    let session = Session::new(image, &args.attributes);

    // Opening validates the filename and size before anything is written.
    let core = session.clone().open()?;
    Session::from_engine(&core).save(path)?;
    tracing::info!(path = %path.display(), image = %session.image.filename, "session created");
    Ok(serde_json::to_value(&session)?)
}

fn run_attr(path: &Path, attr: AttrCommand) -> Result<Value, CliError> {
    if matches!(attr.command, AttrSubcommand::List) {
        let session = Session::load(path)?;
        return Ok(json!(session.store.attributes()));
    }
    edit(path, |core| {
        let changed = match &attr.command {
            AttrSubcommand::Add { name } => core.doc.add_attribute(name),
            AttrSubcommand::Remove { name } => core.doc.remove_attribute(name),
            AttrSubcommand::List => false,
        };
        tracing::info!(changed, "attributes edited");
        Ok(json!({ "changed": changed, "attributes": core.doc.attributes() }))
    })
}

fn run_add(path: &Path, label: &str) -> Result<Value, CliError> {
    edit(path, |core| {
        if !core.doc.has_attribute(label) {
            return Err(CliError::UnknownLabel(label.to_owned()));
        }
        let created = core.add_annotation(label).into_iter().find_map(|action| match action {
            Action::RectangleCreated(rect) => Some(rect),
            _ => None,
        });
        let rect = created.ok_or_else(|| CliError::UnknownLabel(label.to_owned()))?;
        tracing::info!(id = %rect.id, label, "rectangle added");
        Ok(serde_json::to_value(&rect)?)
    })
}

fn run_set(path: &Path, args: SetArgs) -> Result<Value, CliError> {
    let patch = RectanglePatch {
        x: args.x,
        y: args.y,
        width: args.width,
        height: args.height,
        rotation: args.rotation,
        label: args.label,
        name: args.name,
        ..RectanglePatch::default()
    };
    if patch.is_empty() {
        return Err(CliError::EmptyPatch);
    }
    edit(path, |core| {
        if core.rectangle(&args.id).is_none() {
            return Err(CliError::UnknownRectangle(args.id));
        }
        if let Some(label) = &patch.label {
            if !core.doc.has_attribute(label) {
                return Err(CliError::UnknownLabel(label.clone()));
            }
        }
        core.update_rectangle(&args.id, patch);
        tracing::info!(id = %args.id, "rectangle updated");
        Ok(serde_json::to_value(core.rectangle(&args.id))?)
    })
}

fn run_rm(path: &Path, id: Uuid) -> Result<Value, CliError> {
    edit(path, |core| {
        if core.remove_rectangle(&id).is_empty() {
            return Err(CliError::UnknownRectangle(id));
        }
        tracing::info!(%id, "rectangle removed");
        Ok(json!({ "removed": id }))
    })
}

fn run_export(path: &Path, args: ExportArgs) -> Result<Value, CliError> {
    let core = Session::load(path)?.open()?;
    let out = args.out.unwrap_or_else(|| default_export_path(path, core.image.filename()));
    let document = core.voc_document(args.depth);
    document.write_to(&out)?;
    tracing::info!(out = %out.display(), objects = document.objects.len(), "VOC exported");
    Ok(json!({ "path": out.display().to_string(), "objects": document.objects.len() }))
}

/// `<image stem>_VOC.xml` in the session file's directory.
fn default_export_path(session_path: &Path, image_filename: &str) -> PathBuf {
    let base = Path::new(image_filename)
        .file_name()
        .map_or_else(|| image_filename.to_owned(), |name| name.to_string_lossy().into_owned());
    session_path.with_file_name(voc::export_filename(&base))
}

/// Load the session, apply `f` to its editor, and save the result.
///
/// Nothing is written when `f` fails.
fn edit<T>(path: &Path, f: impl FnOnce(&mut EngineCore) -> Result<T, CliError>) -> Result<T, CliError> {
    let mut core = Session::load(path)?.open()?;
    let out = f(&mut core)?;
    Session::from_engine(&core).save(path)?;
    Ok(out)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
