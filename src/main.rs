use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use schur_specgen::codegen::factory::wildcards;
use schur_specgen::codegen::units::unit_stem;
use schur_specgen::{BlockSizes, Dispatcher, GeneratorConfig, Resolution};
use std::path::PathBuf;

/// Generate explicit template specializations for Schur elimination
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the specialization units and factories
    Generate {
        /// Configuration file (defaults to the stock catalog)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output root, overriding the configuration
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only generate these template sets
        #[arg(short, long)]
        template: Vec<String>,
    },

    /// Fail if checked-in units differ from what would be generated
    Check {
        /// Configuration file (defaults to the stock catalog)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output root, overriding the configuration
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only check these template sets
        #[arg(short, long)]
        template: Vec<String>,
    },

    /// Print the catalog and its diagnostics
    List {
        /// Configuration file (defaults to the stock catalog)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show which variant the factory builds for observed block sizes
    Resolve {
        /// Row block size (`d` for dynamic)
        #[arg(value_parser = parse_observed)]
        row: i32,

        /// E block size (`d` for dynamic)
        #[arg(value_parser = parse_observed)]
        e: i32,

        /// F block size (`d` for dynamic)
        #[arg(value_parser = parse_observed)]
        f: i32,

        /// Configuration file (defaults to the stock catalog)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Model a build with CERES_RESTRICT_SCHUR_SPECIALIZATION defined
        #[arg(long)]
        restricted: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt().with_env_filter(log_level).init();

    match cli.command {
        Commands::Generate {
            config,
            output,
            template,
        } => {
            let config = select(config, output, &template)?;
            let report = config
                .generate()
                .with_context(|| format!("Failed to generate under {:?}", config.output_dir))?;
            println!(
                "{} units: {} written, {} unchanged",
                report.total(),
                report.written.len(),
                report.unchanged.len()
            );
        }

        Commands::Check {
            config,
            output,
            template,
        } => {
            let config = select(config, output, &template)?;
            let report = config
                .check()
                .with_context(|| format!("Failed to check under {:?}", config.output_dir))?;
            for path in &report.stale {
                println!("stale:   {}", path.display());
            }
            for path in &report.missing {
                println!("missing: {}", path.display());
            }
            if !report.is_clean() {
                bail!(
                    "{} of {} generated units are out of date",
                    report.stale.len() + report.missing.len(),
                    report.up_to_date.len() + report.stale.len() + report.missing.len()
                );
            }
            println!("{} units up to date", report.up_to_date.len());
        }

        Commands::List { config } => {
            let config = load_config(config)?;
            let catalog = config.catalog()?;
            let sets = config.template_sets()?;

            for (index, spec) in catalog.iter().enumerate() {
                let free: Vec<&str> = wildcards(spec).iter().map(|p| p.name()).collect();
                let stems: Vec<String> = sets.iter().map(|t| unit_stem(t, spec)).collect();
                if spec.is_all_dynamic() {
                    println!("{:>3}  {:<7} fallback  {}", index, spec.to_string(), stems.join(" "));
                } else if free.is_empty() {
                    println!("{:>3}  {:<7} exact     {}", index, spec.to_string(), stems.join(" "));
                } else {
                    println!(
                        "{:>3}  {:<7} any {:<5} {}",
                        index,
                        spec.to_string(),
                        free.join(","),
                        stems.join(" ")
                    );
                }
            }

            let issues = catalog.report_diagnostics();
            if issues > 0 {
                println!("{} catalog diagnostics", issues);
            }
        }

        Commands::Resolve {
            row,
            e,
            f,
            config,
            restricted,
        } => {
            let catalog = load_config(config)?.catalog()?;
            let dispatcher = Dispatcher::new(&catalog).restricted(restricted);
            let sizes = BlockSizes::new(row, e, f);
            let resolution = dispatcher.resolve(sizes);
            match resolution {
                Resolution::Specialized { index, .. } => println!(
                    "{} -> <{}> (catalog entry {})",
                    sizes,
                    resolution.specialization(),
                    index
                ),
                Resolution::Fallback => {
                    println!("{} -> <{}> (fallback)", sizes, resolution.specialization())
                }
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<GeneratorConfig> {
    match path {
        Some(path) => GeneratorConfig::from_path(&path)
            .with_context(|| format!("Failed to load configuration {:?}", path)),
        None => Ok(GeneratorConfig::default()),
    }
}

/// Apply the command-line overrides to the loaded configuration.
fn select(
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    templates: &[String],
) -> Result<GeneratorConfig> {
    let mut config = load_config(config)?;
    config.select_templates(templates);
    if let Some(output) = output {
        config.output_dir = output;
    }
    Ok(config)
}

fn parse_observed(s: &str) -> Result<i32, String> {
    match s {
        "d" | "dynamic" | "Eigen::Dynamic" => Ok(BlockSizes::DYNAMIC),
        _ => s
            .parse::<i32>()
            .map_err(|e| format!("expected a block size or `d`: {}", e)),
    }
}
