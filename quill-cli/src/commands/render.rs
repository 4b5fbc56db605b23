//! `quill <infile>`: render one template, update its metadata, and
//! optionally emit a dependency manifest.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::Value;

use quill_build::{pipeline, write_manifest, RenderRequest, WriteResult};
use quill_core::{CommandResolver, CreationTimeResolver, FileTimeResolver, DEFAULT_METADATA_FILE};
use quill_renderer::{functions::load_module, parse_literal, Bindings};

/// Arguments for rendering a single template.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Template file to render.
    pub infile: PathBuf,

    /// Output file (default: <input>-render.<ext> next to the input).
    #[arg(long = "out", value_name = "FILE")]
    pub outfile: Option<PathBuf>,

    /// Metadata sidecar name, looked up in the input's directory.
    #[arg(long = "meta", value_name = "FILE", default_value = DEFAULT_METADATA_FILE)]
    pub metadata: String,

    /// Write a Makefile dependency rule for TARGET to FILE.
    #[arg(long = "dep", num_args = 2, value_names = ["FILE", "TARGET"])]
    pub dependency: Option<Vec<String>>,

    /// Set a template variable; VALUE is read as JSON when it parses.
    #[arg(
        long = "var",
        num_args = 2,
        value_names = ["KEY", "VALUE"],
        allow_hyphen_values = true,
        conflicts_with = "variable_file"
    )]
    pub variables: Vec<String>,

    /// Load every template variable from a JSON, YAML or TOML file.
    #[arg(long = "varfile", value_name = "FILE")]
    pub variable_file: Option<PathBuf>,

    /// Program that prints a file's creation time (epoch seconds) given its
    /// path, e.g. scripts/get_creation.sh for git history. Without it the
    /// filesystem birth time (or mtime) is used.
    #[arg(long = "creation-cmd", value_name = "PROGRAM")]
    pub creation_cmd: Option<PathBuf>,

    /// Render without writing the output or the dependency manifest.
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

impl RenderArgs {
    pub fn run(self) -> Result<()> {
        tracing::debug!("{:#?}", self);

        let request = self.request()?;
        let resolver = self.resolver();
        let outcome = pipeline::render(&request, resolver.as_ref())
            .with_context(|| format!("failed to render '{}'", request.infile.display()))?;

        tracing::debug!("dependencies: {:?}", outcome.dependencies);

        if let (false, Some(dep)) = (self.dry_run, self.dependency.as_deref()) {
            let [manifest, target] = dep else {
                bail!("--dep expects FILE and TARGET");
            };
            write_manifest(Path::new(manifest), target, &outcome.dependencies)
                .with_context(|| format!("failed to write dependency manifest '{manifest}'"))?;
        }

        print_result(&outcome.write);
        Ok(())
    }

    fn request(&self) -> Result<RenderRequest> {
        let mut request = RenderRequest::new(&self.infile);
        if let Some(out) = &self.outfile {
            request.outfile = out.clone();
        }
        request.metadata_name = self.metadata.clone();
        request.bindings = self.bindings()?;
        request.dry_run = self.dry_run;
        Ok(request)
    }

    fn bindings(&self) -> Result<Bindings> {
        if let Some(path) = &self.variable_file {
            return load_variable_file(path);
        }
        Ok(self
            .variables
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), parse_literal(&pair[1])))
            .collect())
    }

    fn resolver(&self) -> Box<dyn CreationTimeResolver> {
        match &self.creation_cmd {
            Some(program) => Box::new(CommandResolver::new(program)),
            None => Box::new(FileTimeResolver),
        }
    }
}

fn load_variable_file(path: &Path) -> Result<Bindings> {
    let value = load_module(path)
        .with_context(|| format!("cannot load variables from '{}'", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        other => bail!(
            "variable file '{}' must define a mapping, found {}",
            path.display(),
            kind_of(&other)
        ),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

fn print_result(write: &WriteResult) {
    match write {
        WriteResult::Written { path } => println!("  {}  {}", "✎".green(), path.display()),
        WriteResult::WouldWrite { path } => {
            println!("{}  ~  {}", "[dry-run]".yellow(), path.display())
        }
    }
}
