//! Command-line interface for principal error bars.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{AxisOrder, ToolConfig};
use crate::core::loaders::{load_grouped_csv, load_sample_csv, SampleGroup};
use crate::core::writers::{write_segments_csv, SegmentRecord};
use crate::processors::batch;
use crate::processors::principal::PrincipalErrors;

#[derive(Parser)]
#[command(name = "principal-errors")]
#[command(about = "Principal-axis error bars for 2D sample data", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute error bar segments for a sample CSV
    Compute {
        /// Input CSV with x and y columns
        input: PathBuf,
        /// Write segments to this CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the x coordinate of the segment centre
        #[arg(long, allow_hyphen_values = true)]
        x_mean: Option<f64>,
        /// Override the y coordinate of the segment centre
        #[arg(long, allow_hyphen_values = true)]
        y_mean: Option<f64>,
        /// Name of the x column
        #[arg(long)]
        x_column: Option<String>,
        /// Name of the y column
        #[arg(long)]
        y_column: Option<String>,
        /// Split rows into groups by this column
        #[arg(short, long)]
        group_column: Option<String>,
        /// Keep the eigensolver's axis order instead of major axis first
        #[arg(long)]
        native_order: bool,
    },

    /// Compute error bars for every sample CSV in a directory
    Batch {
        /// Directory containing sample CSV files
        input_dir: PathBuf,
        /// Output directory for segment CSVs
        output_dir: PathBuf,
        /// Regex that file stems must match
        #[arg(short, long)]
        pattern: Option<String>,
        /// Split rows into groups by this column
        #[arg(short, long)]
        group_column: Option<String>,
    },

    /// Render samples and their error bars as a PNG
    Plot {
        /// Input CSV with x and y columns
        input: PathBuf,
        /// Output PNG path (defaults to the input name with .png extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the x coordinate of the segment centre
        #[arg(long, allow_hyphen_values = true)]
        x_mean: Option<f64>,
        /// Override the y coordinate of the segment centre
        #[arg(long, allow_hyphen_values = true)]
        y_mean: Option<f64>,
        /// Maximum number of points to plot (subsamples if exceeded)
        #[arg(long)]
        max_points: Option<usize>,
        /// Alpha/transparency value for points (0.0 to 1.0)
        #[arg(long)]
        alpha: Option<f64>,
    },

    /// Write the default configuration as YAML
    InitConfig {
        /// Destination YAML file
        path: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<60} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 38 {
            format!("{}...", value.chars().take(35).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<38} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

fn fmt_point(x: f64, y: f64) -> String {
    format!("({:.6}, {:.6})", x, y)
}

fn errors_summary(errors: &PrincipalErrors) -> Vec<(&'static str, String)> {
    let mut items = vec![
        ("Samples", errors.sample_size.to_string()),
        ("Centroid", fmt_point(errors.centroid.x, errors.centroid.y)),
    ];
    for (i, (axis, segment)) in errors.axes.iter().zip(errors.segments.iter()).enumerate() {
        let (label_axis, label_start, label_end) = if i == 0 {
            ("Axis 0 sigma", "Axis 0 start", "Axis 0 end")
        } else {
            ("Axis 1 sigma", "Axis 1 start", "Axis 1 end")
        };
        items.push((label_axis, format!("{:.6}", axis.sigma)));
        items.push((label_start, fmt_point(segment.start.x, segment.start.y)));
        items.push((label_end, fmt_point(segment.end.x, segment.end.y)));
    }
    items
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match ToolConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                ToolConfig::default()
            }
        },
        None => ToolConfig::default(),
    };

    // Dispatch to subcommands
    match cli.command {
        Commands::Compute {
            input,
            output,
            x_mean,
            y_mean,
            x_column,
            y_column,
            group_column,
            native_order,
        } => {
            let mut config = config;
            if let Some(col) = x_column {
                config.input.x_column = col;
            }
            if let Some(col) = y_column {
                config.input.y_column = col;
            }
            if group_column.is_some() {
                config.input.group_column = group_column;
            }
            if native_order {
                config.errorbars.axis_order = AxisOrder::Native;
            }
            cmd_compute(&input, output.as_deref(), x_mean, y_mean, &config);
        }
        Commands::Batch {
            input_dir,
            output_dir,
            pattern,
            group_column,
        } => {
            let mut config = config;
            if let Some(p) = pattern {
                config.batch.pattern = p;
            }
            if group_column.is_some() {
                config.input.group_column = group_column;
            }
            cmd_batch(&input_dir, &output_dir, &config);
        }
        Commands::Plot {
            input,
            output,
            x_mean,
            y_mean,
            max_points,
            alpha,
        } => {
            let mut config = config;
            if let Some(n) = max_points {
                config.plot.max_points = n;
            }
            if let Some(a) = alpha {
                config.plot.alpha = a;
            }
            cmd_plot(&input, output, x_mean, y_mean, &config);
        }
        Commands::InitConfig { path } => {
            cmd_init_config(&path);
        }
    }
}

fn cmd_compute(
    input: &Path,
    output: Option<&Path>,
    x_mean: Option<f64>,
    y_mean: Option<f64>,
    config: &ToolConfig,
) {
    let start = Instant::now();

    let groups = match &config.input.group_column {
        Some(column) => {
            if x_mean.is_some() || y_mean.is_some() {
                warn!("--x-mean/--y-mean are ignored when grouping by '{}'", column);
            }
            load_grouped_csv(input, &config.input, column)
        }
        None => load_sample_csv(input, &config.input).map(|sample| {
            vec![SampleGroup {
                name: "all".to_string(),
                sample,
            }]
        }),
    };

    let groups = match groups {
        Ok(g) => g,
        Err(e) => {
            error!("Failed to load samples from {}: {}", input.display(), e);
            std::process::exit(1);
        }
    };

    let mut records = Vec::with_capacity(groups.len() * 2);
    let mut failures = 0usize;

    for group in &groups {
        let (gx, gy) = if config.input.group_column.is_some() {
            (None, None)
        } else {
            (x_mean, y_mean)
        };

        match PrincipalErrors::compute(&group.sample.x, &group.sample.y, gx, gy, &config.errorbars) {
            Ok(errors) => {
                let title = format!("Principal Errors [{}]", group.name);
                print_summary(&title, &errors_summary(&errors));
                records.extend(SegmentRecord::from_errors(&group.name, &errors));
            }
            Err(e) => {
                error!("Group '{}': {}", group.name, e);
                failures += 1;
            }
        }
    }

    if let Some(path) = output {
        if let Err(e) = write_segments_csv(path, &records) {
            error!("Failed to write segments: {}", e);
            std::process::exit(1);
        }
        info!("Segments CSV -> {}", path.display());
    }

    print_summary(
        "Compute Complete",
        &[
            ("Input file", input.display().to_string()),
            ("Groups", groups.len().to_string()),
            ("Failed groups", failures.to_string()),
            (
                "Output CSV",
                output.map_or_else(|| "-".to_string(), |p| p.display().to_string()),
            ),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    if failures == groups.len() {
        std::process::exit(1);
    }
}

fn cmd_batch(input_dir: &Path, output_dir: &Path, config: &ToolConfig) {
    let start = Instant::now();

    println!("Computing principal errors in batch mode...");
    println!("Input directory: {}", input_dir.display());
    println!("Output directory: {}", output_dir.display());
    println!("File pattern: {}", config.batch.pattern);

    let spinner = create_spinner("Processing sample files...");

    match batch::process_directory(input_dir, output_dir, config) {
        Ok(summary) => {
            spinner.finish_and_clear();

            print_summary(
                "Batch Complete",
                &[
                    ("Input directory", input_dir.display().to_string()),
                    ("Output directory", output_dir.display().to_string()),
                    ("Files found", summary.files_found.to_string()),
                    ("Files written", summary.files_written.to_string()),
                    ("Files failed", summary.files_failed.to_string()),
                    ("Groups computed", summary.groups_computed.to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );

            if summary.files_written == 0 {
                std::process::exit(1);
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Batch failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_plot(
    input: &Path,
    output: Option<PathBuf>,
    x_mean: Option<f64>,
    y_mean: Option<f64>,
    config: &ToolConfig,
) {
    use crate::visualization;

    let start = Instant::now();

    // Determine output path (default to same name as input with .png extension)
    let output_path = output.unwrap_or_else(|| input.with_extension("png"));

    println!("Plotting principal errors...");
    println!("Input: {}", input.display());
    println!("Output: {}", output_path.display());

    let spinner = create_spinner("Loading samples...");

    let sample = match load_sample_csv(input, &config.input) {
        Ok(s) => s,
        Err(e) => {
            spinner.finish_and_clear();
            error!("Failed to load samples: {}", e);
            std::process::exit(1);
        }
    };

    let errors = match PrincipalErrors::compute(&sample.x, &sample.y, x_mean, y_mean, &config.errorbars) {
        Ok(errors) => errors,
        Err(e) => {
            spinner.finish_and_clear();
            error!("Computation failed: {}", e);
            std::process::exit(1);
        }
    };

    spinner.set_message("Generating plot...");

    match visualization::plot_error_bars(&output_path, &sample, &errors, &config.plot) {
        Ok(()) => {
            spinner.finish_and_clear();

            let mut items = vec![
                ("Input file", input.display().to_string()),
                ("Output PNG", output_path.display().to_string()),
            ];
            items.extend(errors_summary(&errors));
            items.push(("Duration", format!("{:.2?}", start.elapsed())));

            print_summary("Plot Complete", &items);
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Plotting failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_init_config(path: &Path) {
    match ToolConfig::default().to_yaml(path) {
        Ok(()) => println!("Wrote default config to {}", path.display()),
        Err(e) => {
            error!("Failed to write config to {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_compute_with_negative_override() {
        let cli = Cli::try_parse_from([
            "principal-errors",
            "-vv",
            "compute",
            "samples.csv",
            "--x-mean",
            "-1.5",
            "--group-column",
            "label",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Compute {
                input,
                x_mean,
                y_mean,
                group_column,
                ..
            } => {
                assert_eq!(input, PathBuf::from("samples.csv"));
                assert_eq!(x_mean, Some(-1.5));
                assert_eq!(y_mean, None);
                assert_eq!(group_column.as_deref(), Some("label"));
            }
            _ => panic!("Expected compute subcommand"),
        }
    }

    #[test]
    fn test_parse_batch() {
        let cli = Cli::try_parse_from([
            "principal-errors",
            "batch",
            "in",
            "out",
            "--pattern",
            "^run_",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Commands::Batch { pattern: Some(ref p), .. } if p == "^run_"
        ));
    }

    #[test]
    fn test_parse_plot() {
        let cli = Cli::try_parse_from([
            "principal-errors",
            "plot",
            "samples.csv",
            "--max-points",
            "500",
            "--alpha",
            "0.3",
            "--y-mean",
            "-2",
        ])
        .unwrap();

        match cli.command {
            Commands::Plot {
                output,
                y_mean,
                max_points,
                alpha,
                ..
            } => {
                assert_eq!(output, None);
                assert_eq!(y_mean, Some(-2.0));
                assert_eq!(max_points, Some(500));
                assert_eq!(alpha, Some(0.3));
            }
            _ => panic!("Expected plot subcommand"),
        }

        assert!(Cli::try_parse_from(["principal-errors", "plot", "samples.csv", "--title", "t"]).is_err());
    }

    #[test]
    fn test_errors_summary_lists_both_axes() {
        let errors = PrincipalErrors::compute(
            &[0.0, 2.0],
            &[0.0, 0.0],
            None,
            None,
            &crate::config::ErrorBarConfig::default(),
        )
        .unwrap();

        let items = errors_summary(&errors);
        assert_eq!(items.len(), 8);
        assert_eq!(items[1].1, "(1.000000, 0.000000)");
        assert_eq!(items[2], ("Axis 0 sigma", "1.414214".to_string()));
    }
}
