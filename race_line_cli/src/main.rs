use clap::{Parser, Subcommand};
use race_line::{
    batch::{generate_raceline_file, process_folder},
    config::{read_solver_config, SolverConfig},
    elevation::{enrich_track, profile_for, read_elevation_config},
    io::track::{raceline_output_path, read_track, write_track},
    RaceLineParams,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Ideal racing line generation for track files.
#[derive(Parser)]
#[command(name = "race_line_cli", version)]
struct Cli {
    /// JSON solver configuration providing defaults for the solver flags
    #[arg(long, global = true)]
    config_file: Option<String>,
    /// Log stage details
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the racing line of one track file.
    Generate {
        input: String,
        /// Output path, defaults to `<stem>.raceline.yaml` next to the input
        #[arg(long)]
        output: Option<String>,
        #[arg(long)]
        samples: Option<usize>,
        #[arg(long)]
        smoothness: Option<f64>,
        #[arg(long)]
        max_iterations: Option<usize>,
    },
    /// Compute racing lines for every track file in a folder.
    Batch {
        #[arg(long)]
        input_folder: String,
        #[arg(long)]
        samples: Option<usize>,
        #[arg(long)]
        smoothness: Option<f64>,
        #[arg(long)]
        max_iterations: Option<usize>,
    },
    /// Apply elevation and banking from a profile config to a track file.
    Enrich {
        input: String,
        #[arg(long)]
        config: String,
        /// Output path, defaults to overwriting the input
        #[arg(long)]
        output: Option<String>,
        /// Profile name, defaults to the track's `name` or file stem
        #[arg(long)]
        track: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn solver_params(
    config_file: Option<&str>,
    samples: Option<usize>,
    smoothness: Option<f64>,
    max_iterations: Option<usize>,
) -> Option<RaceLineParams> {
    let base = match config_file {
        Some(path) => match read_solver_config(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Error reading {}: {}", path, e);
                return None;
            }
        },
        None => SolverConfig::default(),
    };
    Some(base.with_overrides(samples, smoothness, max_iterations).params())
}

fn track_name(explicit: Option<String>, stored: Option<&str>, input: &str) -> String {
    explicit
        .or_else(|| stored.map(str::to_string))
        .unwrap_or_else(|| {
            Path::new(input)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config_file = cli.config_file.as_deref();

    let ok = match cli.command {
        Commands::Generate {
            input,
            output,
            samples,
            smoothness,
            max_iterations,
        } => match solver_params(config_file, samples, smoothness, max_iterations) {
            Some(params) => {
                let output = output
                    .map(PathBuf::from)
                    .unwrap_or_else(|| raceline_output_path(&input));
                match generate_raceline_file(Path::new(&input), &output, &params) {
                    Ok(line) => {
                        println!(
                            "Wrote {} raceline points to {}",
                            line.points.len(),
                            output.display()
                        );
                        if !line.converged {
                            println!(
                                "Optimizer stopped after {} iterations without converging",
                                line.iterations
                            );
                        }
                        true
                    }
                    Err(e) => {
                        eprintln!("Error solving {}: {}", input, e);
                        false
                    }
                }
            }
            None => false,
        },
        Commands::Batch {
            input_folder,
            samples,
            smoothness,
            max_iterations,
        } => match solver_params(config_file, samples, smoothness, max_iterations) {
            Some(params) => match process_folder(Path::new(&input_folder), &params) {
                Ok(report) => {
                    for path in &report.written {
                        println!("Wrote {}", path.display());
                    }
                    for (path, reason) in &report.failed {
                        eprintln!("Error solving {}: {}", path.display(), reason);
                    }
                    println!(
                        "Processed {} tracks: {} written, {} failed",
                        report.total(),
                        report.written.len(),
                        report.failed.len()
                    );
                    true
                }
                Err(e) => {
                    eprintln!("Error processing {}: {}", input_folder, e);
                    false
                }
            },
            None => false,
        },
        Commands::Enrich {
            input,
            config,
            output,
            track,
        } => match read_elevation_config(&config) {
            Ok(profiles) => match read_track(&input) {
                Ok(mut file) => {
                    let name = track_name(track, file.name.as_deref(), &input);
                    let output = output.unwrap_or_else(|| input.clone());
                    let result = profile_for(&profiles, &name)
                        .and_then(|profile| enrich_track(&mut file, profile))
                        .and_then(|()| write_track(&output, &file));
                    match result {
                        Ok(()) => {
                            println!("Enriched {} as {} into {}", input, name, output);
                            true
                        }
                        Err(e) => {
                            eprintln!("Error enriching {}: {}", input, e);
                            false
                        }
                    }
                }
                Err(e) => {
                    eprintln!("Error reading {}: {}", input, e);
                    false
                }
            },
            Err(e) => {
                eprintln!("Error reading {}: {}", config, e);
                false
            }
        },
    };

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
