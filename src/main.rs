//! flametree CLI
//!
//! Builds flame graph trees from sampled CPU profiles.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use flametree::commands::{execute_build, validate_args, validate_profile_file, BuildArgs};
use flametree::flamegraph::FlameGraphOptions;
use flametree::processor::StackProcessorKind;
use flametree::utils::config::DEFAULT_OUTPUT;

/// flametree - flame graphs from sampled CPU profiles
#[derive(Parser, Debug)]
#[command(name = "flametree")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a flame graph tree from one or more profiles
    Build {
        /// Profile JSON files; several are merged into one tree
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output path for the tree JSON
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Stack processor: default, java, nodejs, nodejs-package
        #[arg(short, long, default_value = "default")]
        stack_processor: StackProcessorKind,

        /// Leaf-first stacks
        #[arg(long)]
        inverted: bool,

        /// Build the tree from package names
        #[arg(long)]
        package_name: bool,

        /// Weight samples by their recorded value
        #[arg(long)]
        use_sample_value: bool,

        /// Match siblings regardless of lib-type
        #[arg(long)]
        ignore_libtype: bool,

        /// Only keep samples taken on this CPU
        #[arg(long)]
        cpu: Option<u32>,

        /// Only keep samples from this process
        #[arg(long)]
        pid: Option<u32>,

        /// Only keep samples from this thread
        #[arg(long)]
        tid: Option<u32>,

        /// Start of the time window, relative to the profile start
        #[arg(long)]
        range_start: Option<f64>,

        /// End of the time window (exclusive), relative to the profile start
        #[arg(long)]
        range_end: Option<f64>,

        /// Isolate the call tree leading into frames containing this text
        #[arg(long)]
        middle_out: Option<String>,

        /// Options as a JSON object; explicit flags take precedence
        #[arg(long, env = "FLAMETREE_OPTIONS")]
        extra_options: Option<String>,

        /// Write JSON without indentation
        #[arg(long)]
        compact: bool,

        /// Print a text summary to stdout
        #[arg(long)]
        summary: bool,

        /// Number of hot paths in the summary
        #[arg(long, default_value = "10")]
        top_paths: usize,
    },

    /// Check a profile for structural problems
    Validate {
        /// Path to profile JSON file
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Build {
            inputs,
            output,
            stack_processor,
            inverted,
            package_name,
            use_sample_value,
            ignore_libtype,
            cpu,
            pid,
            tid,
            range_start,
            range_end,
            middle_out,
            extra_options,
            compact,
            summary,
            top_paths,
        } => {
            let mut options = match extra_options {
                Some(json) => serde_json::from_str::<FlameGraphOptions>(&json)
                    .context("Invalid --extra-options JSON")?,
                None => FlameGraphOptions::new(),
            };

            if stack_processor != StackProcessorKind::Default {
                options.stack_processor = stack_processor;
            }
            options.inverted |= inverted;
            options.package_name |= package_name;
            options.use_sample_value |= use_sample_value;
            options.ignore_libtype |= ignore_libtype;
            options.cpu = cpu.or(options.cpu);
            options.pid = pid.or(options.pid);
            options.tid = tid.or(options.tid);
            options.range_start = range_start.or(options.range_start);
            options.range_end = range_end.or(options.range_end);
            options.middle_out = middle_out.or(options.middle_out);

            let args = BuildArgs {
                inputs,
                output,
                options,
                compact,
                print_summary: summary,
                top_paths,
            };

            // Validate args first
            validate_args(&args)?;

            execute_build(&args)?;
        }

        Commands::Validate { file } => {
            println!("{}", validate_profile_file(&file)?);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Display version information
///
/// **Private** - internal command implementation
fn display_version() {
    println!("flametree v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Flame graph construction from sampled CPU profiles.");
}
