//! Schema Fusion CLI
//!
//! Command-line interface for fusing, patching and validating JSON Schemas
//! and for selecting streams in Singer catalogs.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use schema_fusion::{
    check_tap_requirements, fuse_all, load_document, load_document_auto, load_document_str,
    load_schema, lookup_dotted, validate, walk, AddNulls, Catalog, DocumentFormat, Draft,
    FillEmpty, ReplicationMethod, Selection, StripKeys, Transform, ValidateError,
};

#[derive(Parser)]
#[command(name = "schema-fusion")]
#[command(about = "Fuse, patch and validate observed JSON Schemas")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fuse schemas into one that accepts everything each of them accepts
    Fuse {
        /// Schema sources: file paths or URLs (http:// or https://)
        #[arg(required = true)]
        schemas: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the value at a dot-separated path of a JSON or YAML document
    Get {
        /// Document source: file path or URL
        document: String,

        /// Dot-separated path (e.g. paths./accounts.get.responses.200)
        path: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Patch a fused schema (fill empty nodes, add nulls, strip keys)
    Patch {
        /// Schema source: file path or URL
        schema: String,

        /// Documentation document used to fill empty `{}` nodes
        #[arg(long, requires = "doc_path")]
        doc: Option<String>,

        /// Dot-separated path to the schema inside the documentation document
        #[arg(long, requires = "doc")]
        doc_path: Option<String>,

        /// Add "null" to the type of every property
        #[arg(long)]
        add_nulls: bool,

        /// Remove this key from every node (repeatable)
        #[arg(long = "strip", value_name = "KEY")]
        strip: Vec<String>,

        /// Fail if the patched schema violates tap requirements
        #[arg(long)]
        check: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Validate a document against a schema
    Validate {
        /// Schema file or URL
        schema: String,

        /// Document file or URL
        document: String,

        /// Draft version, by short (v7) or validator name (Draft7Validator)
        #[arg(long, default_value = "v7")]
        draft: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Inspect or edit a Singer catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
}

#[derive(Subcommand)]
enum CatalogCommands {
    /// List streams with their selection state
    Streams {
        /// Catalog file (stdin if not specified)
        file: Option<PathBuf>,
    },

    /// Select or de-select streams
    Select(SelectArgs),
}

#[derive(Args)]
#[command(group = clap::ArgGroup::new("selection").required(true).multiple(false))]
struct SelectArgs {
    /// Catalog file (stdin if not specified)
    file: Option<PathBuf>,

    /// Names of streams to select
    #[arg(short, long, num_args = 1.., group = "selection")]
    select: Vec<String>,

    /// Names of streams to de-select
    #[arg(short = 'x', long, num_args = 1.., group = "selection")]
    exclude: Vec<String>,

    /// Select all streams
    #[arg(short, long, group = "selection")]
    all: bool,

    /// Leave only `{}` schemas for all streams
    #[arg(long)]
    remove_schema: bool,

    /// Sync streams with this method
    #[arg(long, value_enum)]
    replication_method: Option<MethodArg>,

    /// Force streams to sync with this method
    #[arg(long, value_enum)]
    forced_replication_method: Option<MethodArg>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct OutputArgs {
    /// Output file (stdout if not specified)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    #[value(name = "INCREMENTAL")]
    Incremental,
    #[value(name = "FULL_TABLE")]
    FullTable,
    #[value(name = "LOG_BASED")]
    LogBased,
}

impl From<MethodArg> for ReplicationMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Incremental => ReplicationMethod::Incremental,
            MethodArg::FullTable => ReplicationMethod::FullTable,
            MethodArg::LogBased => ReplicationMethod::LogBased,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fuse { schemas, output } => run_fuse(&schemas, &output),
        Commands::Get {
            document,
            path,
            pretty,
        } => run_get(&document, &path, pretty),
        Commands::Patch {
            schema,
            doc,
            doc_path,
            add_nulls,
            strip,
            check,
            output,
        } => run_patch(PatchArgs {
            schema,
            documentation: doc.zip(doc_path),
            add_nulls,
            strip,
            check,
            output,
        }),
        Commands::Validate {
            schema,
            document,
            draft,
            json,
        } => run_validate(&schema, &document, &draft, json),
        Commands::Catalog { command } => match command {
            CatalogCommands::Streams { file } => run_streams(file.as_deref()),
            CatalogCommands::Select(args) => run_select(args),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Log to stderr so stdout stays parseable; `RUST_LOG` overrides the default.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("schema_fusion=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_fuse(sources: &[String], output: &OutputArgs) -> Result<(), u8> {
    let mut schemas = Vec::with_capacity(sources.len());
    for source in sources {
        let schema = load_schema(source).map_err(|e| {
            eprintln!("Error loading {}: {}", source, e);
            e.exit_code() as u8
        })?;
        schemas.push(schema);
    }

    info!(count = schemas.len(), "fusing schemas");
    let fused = fuse_all(&schemas).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    write_json(&fused.to_value(), output)
}

fn run_get(source: &str, path: &str, pretty: bool) -> Result<(), u8> {
    let document = load_document_auto(source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let value = lookup_dotted(&document, path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    write_json(
        value,
        &OutputArgs {
            output: None,
            pretty,
        },
    )
}

struct PatchArgs {
    schema: String,
    documentation: Option<(String, String)>,
    add_nulls: bool,
    strip: Vec<String>,
    check: bool,
    output: OutputArgs,
}

fn run_patch(args: PatchArgs) -> Result<(), u8> {
    let PatchArgs {
        schema: schema_source,
        documentation,
        add_nulls,
        strip,
        check,
        output,
    } = args;

    let schema = load_document_auto(&schema_source).map_err(|e| {
        eprintln!("Error loading schema: {}", e);
        e.exit_code() as u8
    })?;

    let documentation = match documentation {
        Some((source, path)) => {
            let document = load_document_auto(&source).map_err(|e| {
                eprintln!("Error loading documentation: {}", e);
                e.exit_code() as u8
            })?;
            let value = lookup_dotted(&document, &path).map_err(|e| {
                eprintln!("Error: {}", e);
                e.exit_code() as u8
            })?;
            Some(value.clone())
        }
        None => None,
    };

    let mut fill = documentation.as_ref().map(FillEmpty::new);
    let mut nulls = AddNulls;
    let mut stripper = StripKeys::new(strip.iter().cloned());

    let mut transforms: Vec<&mut dyn Transform> = Vec::new();
    if let Some(fill) = fill.as_mut() {
        transforms.push(fill);
    }
    if add_nulls {
        transforms.push(&mut nulls);
    }
    if !strip.is_empty() {
        transforms.push(&mut stripper);
    }
    debug!(transforms = transforms.len(), "patching schema");

    let patched = walk(&schema, &mut transforms);

    if let Some(fill) = &fill {
        if !fill.missing().is_empty() {
            eprintln!("Empty nodes without replacement:");
            for path in fill.missing() {
                eprintln!("  {}", path);
            }
        }
    }

    write_json(&patched, &output)?;

    if check {
        let issues = check_tap_requirements(&patched);
        if !issues.is_empty() {
            eprintln!("Tap requirements not met:");
            for issue in &issues {
                eprintln!("  {}", issue);
            }
            return Err(1);
        }
    }

    Ok(())
}

fn run_validate(
    schema_source: &str,
    document_source: &str,
    draft: &str,
    json_output: bool,
) -> Result<(), u8> {
    let draft: Draft = draft.parse().map_err(|e: ValidateError| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    let schema = load_document_auto(schema_source).map_err(|e| {
        report_error(json_output, &format!("loading schema: {}", e));
        e.exit_code() as u8
    })?;

    let document = load_document_auto(document_source).map_err(|e| {
        report_error(json_output, &format!("loading document: {}", e));
        e.exit_code() as u8
    })?;

    match validate(&schema, &document, draft) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_streams(file: Option<&Path>) -> Result<(), u8> {
    let catalog = read_catalog(file)?;
    print!("{}", catalog.summary());
    Ok(())
}

fn run_select(args: SelectArgs) -> Result<(), u8> {
    let mut catalog = read_catalog(args.file.as_deref())?;

    let selection = if args.all {
        Selection::All
    } else if !args.select.is_empty() {
        Selection::Select(args.select)
    } else {
        Selection::Exclude(args.exclude)
    };

    if args.remove_schema {
        catalog.remove_schemas();
    }

    catalog
        .apply_selection(
            &selection,
            args.replication_method.map(Into::into),
            args.forced_replication_method.map(Into::into),
        )
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

    let value = catalog.to_value().map_err(|e| {
        eprintln!("Error serializing catalog: {}", e);
        e.exit_code() as u8
    })?;

    write_json(&value, &args.output)
}

fn read_catalog(file: Option<&Path>) -> Result<Catalog, u8> {
    let document = match file {
        Some(path) => load_document(path),
        None => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content).map_err(|e| {
                eprintln!("Error reading stdin: {}", e);
                3u8
            })?;
            load_document_str(&content, DocumentFormat::Json)
        }
    }
    .map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    Catalog::from_value(document).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn write_json(value: &Value, args: &OutputArgs) -> Result<(), u8> {
    let json_output = if args.pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}
