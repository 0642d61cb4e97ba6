//! foampath CLI - foam toolpaths and G-code from selected mesh regions
//!
//! Runs a JSON job (mesh, camera, regions) through the selection, sampling,
//! planning and emission pipeline and writes the resulting programs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn, LevelFilter};
use std::path::{Path, PathBuf};

use foampath::foampath_gcode::MachineProfile;
use foampath::{FoampathConfig, ModelKind, Pipeline, PipelineContext};

mod job;

use job::Job;

#[derive(Parser)]
#[command(name = "foampath")]
#[command(about = "Foam toolpath and G-code generator", long_about = None)]
struct Cli {
    /// Log stage summaries
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log everything
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a job file through the pipeline and write G-code
    Run {
        /// Input job (.json)
        job: PathBuf,
        /// Configuration file (.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output G-code file (default: <name>.gcode next to the job)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write a base-constraint outline to this file
        #[arg(long)]
        base: Option<PathBuf>,
        /// Built-in machine profile, overriding the config's machine section
        #[arg(short, long)]
        profile: Option<String>,
    },
    /// List built-in machine profiles
    Profiles,
    /// Print the default configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Run {
            job,
            config,
            output,
            base,
            profile,
        } => run_job(&job, config.as_deref(), output, base.as_deref(), profile.as_deref()),
        Commands::Profiles => {
            list_profiles();
            Ok(())
        }
        Commands::Config => {
            print!("{}", FoampathConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>, profile: Option<&str>) -> Result<FoampathConfig> {
    let mut config = match path {
        Some(path) => FoampathConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => FoampathConfig::default(),
    };
    if let Some(name) = profile {
        config.machine = find_profile(name)?;
    }
    Ok(config)
}

fn find_profile(name: &str) -> Result<MachineProfile> {
    let needle = name.to_lowercase();
    MachineProfile::all_profiles()
        .into_iter()
        .find(|p| p.name.to_lowercase().contains(&needle))
        .with_context(|| format!("no built-in profile matches '{name}'"))
}

fn run_job(
    path: &Path,
    config: Option<&Path>,
    output: Option<PathBuf>,
    base: Option<&Path>,
    profile: Option<&str>,
) -> Result<()> {
    let config = load_config(config, profile)?;
    let job = Job::load(path)?;
    let mut model = job.model()?;
    let mut pipeline = Pipeline::new(PipelineContext::from_config(config, job.camera.clone()));

    for event in job.events() {
        let outcome = pipeline.handle(&mut model, event)?;
        for notice in &outcome.notices {
            eprintln!("note: {notice}");
        }
    }

    if let Some(base) = base {
        let program = pipeline.base_constraints(&model)?;
        if program.is_empty() {
            warn!("{} has no triangles on the bed, base outline skipped", model.name);
        } else {
            write_program(base, &program.to_gcode())?;
        }
    }

    match &model.kind {
        ModelKind::Foam => {
            info!("{} is a foam model, no surface program", model.name);
        }
        ModelKind::Everyday(state) => {
            if state.program.is_empty() {
                println!("Nothing to print for {}", model.name);
                return Ok(());
            }
            let output = output.unwrap_or_else(|| path.with_file_name(format!("{}.gcode", job.name)));
            write_program(&output, &state.program.to_gcode())?;
            println!(
                "  {} samples, {} strokes, {:.2} mm filament",
                state.toolpath.samples.len(),
                state.toolpath.layers.len(),
                state.program.total_extrusion
            );
        }
    }
    Ok(())
}

fn write_program(path: &Path, gcode: &str) -> Result<()> {
    std::fs::write(path, gcode).with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn list_profiles() {
    println!("Built-in machine profiles:\n");
    for p in MachineProfile::all_profiles() {
        println!(
            "  {:<12} {:?}, bed {}°C, nozzles {}/{}°C, {}x{}x{} mm",
            p.name,
            p.flavor,
            p.bed_temp,
            p.left_nozzle_temp,
            p.right_nozzle_temp,
            p.machine_depth,
            p.machine_depth,
            p.machine_height
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_profile() {
        assert_eq!(find_profile("sv04").unwrap().name, "Sovol SV04");
        assert_eq!(find_profile("GENERIC").unwrap().name, "Generic");
        assert!(find_profile("prusa").is_err());
    }

    #[test]
    fn test_run_job_writes_gcode() {
        let dir = tempfile::tempdir().unwrap();
        let job_path = dir.path().join("square.json");
        std::fs::write(
            &job_path,
            r#"{
                "name": "square",
                "mesh": {
                    "vertices": [0, 0, 0, 8, 0, 0, 8, 8, 0, 0, 8, 0],
                    "indices": [0, 1, 2, 0, 2, 3]
                },
                "foam_region": { "points": [[-1, -1], [1, -1], [1, 1], [-1, 1], [-1, -1]] }
            }"#,
        )
        .unwrap();
        let base_path = dir.path().join("base.gcode");

        run_job(&job_path, None, None, Some(&base_path), None).unwrap();

        let gcode = std::fs::read_to_string(dir.path().join("square.gcode")).unwrap();
        assert!(gcode.contains("; move to start point"));
        assert!(gcode.contains("G92 E0"));
        let base = std::fs::read_to_string(base_path).unwrap();
        assert!(base.contains("T1; right extruder"));
    }
}
