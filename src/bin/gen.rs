//! pdlkit Generator Binary
//!
//! Parses a PDL schema and writes source code for one or more targets.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use pdlkit::codegen::{self, target_by_name};
use pdlkit::config::{GenerationRun, GeneratorOptions};
use pdlkit::schema::{self, snapshot, validate, ProtocolDefinition, Severity};
use pdlkit::{PdlError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// pdlkit code generator
#[derive(Parser, Debug)]
#[command(name = "pdlkit-gen")]
#[command(about = "Generate serializers, clients and servers from a PDL schema")]
#[command(version)]
struct Args {
    /// Schema file (.pdl source or .pdlc snapshot)
    #[arg(required_unless_present = "config")]
    schema: Option<PathBuf>,

    /// JSON run file listing schema, output root and languages
    #[arg(short, long, conflicts_with = "schema")]
    config: Option<PathBuf>,

    /// Target languages: rust, csharp, cpp
    #[arg(short, long, default_value = "rust", value_delimiter = ',')]
    lang: Vec<String>,

    /// Output directory; with several languages each gets a subdirectory
    #[arg(short, long, default_value = "./generated")]
    out: PathBuf,

    /// Override the target namespace
    #[arg(short, long, default_value = "")]
    namespace: String,

    /// Skip serializer units
    #[arg(long)]
    no_serialization: bool,

    /// Skip client and server units
    #[arg(long)]
    no_client_server: bool,

    /// Skip the type registry unit
    #[arg(long)]
    no_factories: bool,

    /// Also write a compiled snapshot of the schema
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Parse and validate only
    #[arg(long)]
    check: bool,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pdlkit=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    if let Some(config) = &args.config {
        return run_config(config, args);
    }

    let schema_path = args
        .schema
        .as_deref()
        .ok_or_else(|| PdlError::Config("no schema given".to_string()))?;
    let definition = load_checked(schema_path)?;

    if let Some(path) = &args.snapshot {
        snapshot::save(&definition, path)?;
        tracing::info!("Snapshot written to {}", path.display());
    }
    if args.check {
        tracing::info!("{} is valid", schema_path.display());
        return Ok(());
    }

    let multiple = args.lang.len() > 1;
    for lang in &args.lang {
        let out = if multiple {
            args.out.join(lang)
        } else {
            args.out.clone()
        };
        let options = GeneratorOptions::builder()
            .namespace(args.namespace.clone())
            .output_dir(out)
            .generate_serialization(!args.no_serialization)
            .generate_client_server(!args.no_client_server)
            .generate_factories(!args.no_factories)
            .build();
        generate(lang, &definition, &options)?;
    }
    Ok(())
}

fn run_config(path: &Path, args: &Args) -> Result<()> {
    let run = GenerationRun::load(path)?;
    let definition = load_checked(&run.schema_path)?;

    if args.check {
        tracing::info!("{} is valid", run.schema_path.display());
        return Ok(());
    }

    for language in run.enabled_languages() {
        let options = run.options_for(language);
        generate(&language.name, &definition, &options)?;
    }
    Ok(())
}

fn generate(lang: &str, definition: &ProtocolDefinition, options: &GeneratorOptions) -> Result<()> {
    let target = target_by_name(lang)
        .ok_or_else(|| PdlError::Config(format!("unknown target language '{}'", lang)))?;
    let report = codegen::generate(target.as_ref(), definition, options)?;
    for file in &report.files {
        println!("{}", report.output_dir.join(file).display());
    }
    Ok(())
}

/// Load, report diagnostics, refuse on errors
fn load_checked(path: &Path) -> Result<ProtocolDefinition> {
    let output = schema::load(path)?;
    let mut diagnostics = output.diagnostics;
    diagnostics.extend(validate(&output.definition));

    for diagnostic in &diagnostics {
        match diagnostic.severity {
            Severity::Error => tracing::error!("{}: {}", path.display(), diagnostic),
            Severity::Warning => tracing::warn!("{}: {}", path.display(), diagnostic),
        }
    }

    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        return Err(PdlError::Schema(format!(
            "{}: {} error(s)",
            path.display(),
            errors
        )));
    }
    Ok(output.definition)
}
