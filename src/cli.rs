//! CLI commands for octoschema (spec.md §6.5).

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::error::CoreError;
use crate::model::Project;
use crate::{layout, topology, worker};

#[derive(Parser)]
#[command(name = "octoschema")]
#[command(about = "Octilinear metro-map layout optimizer and branch-topology analyzer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the layout optimizer over a project file and print the resulting
    /// `OptimizeResponse` JSON.
    Optimize {
        /// Project JSON file (spec.md §6.3)
        project: PathBuf,

        /// Override a `LayoutConfig` field, e.g. `--set max_iterations=500`.
        /// May be repeated.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Write the response to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Analyze one line's branch topology and print it as XML
    /// (spec.md §6.4).
    AnalyzeLine {
        /// Project JSON file
        project: PathBuf,

        /// The line id to analyze
        line_id: String,

        /// Write the XML to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Exit codes per spec.md §6.5: 0 success, 1 validation error, 2
/// unrecoverable internal error.
const EXIT_VALIDATION_ERROR: u8 = 1;
const EXIT_INTERNAL_ERROR: u8 = 2;

impl Cli {
    pub fn run(self) -> ExitCode {
        let result = match self.command {
            Commands::Optimize {
                project,
                set,
                output,
            } => run_optimize(&project, &set, output.as_deref()),
            Commands::AnalyzeLine {
                project,
                line_id,
                output,
            } => run_analyze_line(&project, &line_id, output.as_deref()),
        };

        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("error: {err:#}");
                match err.downcast_ref::<CoreError>() {
                    Some(CoreError::InvalidInput(_)) => ExitCode::from(EXIT_VALIDATION_ERROR),
                    Some(CoreError::InternalInvariantFailure(_)) => {
                        ExitCode::from(EXIT_INTERNAL_ERROR)
                    }
                    None => ExitCode::from(EXIT_VALIDATION_ERROR),
                }
            }
        }
    }
}

fn load_project(path: &PathBuf) -> Result<Project> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading project file {}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|e| CoreError::InvalidInput(format!("malformed project JSON: {e}")))
        .context("parsing project JSON")
}

/// Apply `--set key=value` overrides onto a `LayoutConfig`, parsing each
/// value as JSON first (so `--set cooling=0.95` and `--set hard_crossing_passes=3`
/// both work) and falling back to a bare string if that fails.
fn apply_config_overrides(
    config: crate::model::LayoutConfig,
    overrides: &[String],
) -> Result<crate::model::LayoutConfig> {
    if overrides.is_empty() {
        return Ok(config);
    }
    let mut value = serde_json::to_value(config).context("serializing base layout config")?;
    let object = value
        .as_object_mut()
        .expect("LayoutConfig always serializes to a JSON object");
    for entry in overrides {
        let (key, raw) = entry
            .split_once('=')
            .ok_or_else(|| CoreError::InvalidInput(format!("--set {entry}: expected KEY=VALUE")))?;
        let parsed = serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
        object.insert(key.to_string(), parsed);
    }
    crate::model::LayoutConfig::from_partial_json(value)
        .map_err(|e| CoreError::InvalidInput(format!("invalid --set override: {e}")).into())
}

fn run_optimize(project_path: &PathBuf, overrides: &[String], output: Option<&std::path::Path>) -> Result<()> {
    let project = load_project(project_path)?;
    let config = apply_config_overrides(project.layout_config, overrides)?;

    let request = crate::model::OptimizeRequest {
        stations: project.stations,
        edges: project.edges,
        lines: project.lines,
        config,
        request_id: format!("cli-{}", project.id),
    };

    layout::validate_request(&request.stations, &request.edges, &request.lines)
        .map_err(anyhow::Error::from)?;
    let response = worker::submit_optimize(request);
    if !response.ok {
        anyhow::bail!(CoreError::InternalInvariantFailure(
            response
                .error
                .clone()
                .unwrap_or_else(|| "optimization failed".to_string())
        ));
    }

    let json = serde_json::to_string_pretty(&response).context("serializing OptimizeResponse")?;
    write_output(&json, output)
}

fn run_analyze_line(project_path: &PathBuf, line_id: &str, output: Option<&std::path::Path>) -> Result<()> {
    let project = load_project(project_path)?;
    let line_id = line_id.to_string();
    let results = topology::analyze_line(&project, &line_id);

    let Some(line) = project.lines.iter().find(|l| l.id == line_id) else {
        anyhow::bail!(CoreError::InvalidInput(format!(
            "unknown line id: {line_id}"
        )));
    };

    let xml = topology::xml::render_line(line, &results);
    write_output(&xml, output)
}

fn write_output(content: &str, output: Option<&std::path::Path>) -> Result<()> {
    match output {
        Some(path) => fs::write(path, content)
            .with_context(|| format!("writing output to {}", path.display())),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}
