use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use outbreak_predictor::{
    config::Config,
    ml::{ModelStore, OutbreakService, SyntheticGenerator},
    models::{Disease, PredictionRequest},
    state::{InMemoryObservationRepository, ObservationRepository},
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "outbreak-predictor")]
#[command(about = "Disease outbreak risk prediction", long_about = None, version)]
struct Cli {
    /// Configuration file (defaults to $OUTBREAK_CONFIG, then config/outbreak.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Model artifact directory (overrides the configured one)
    #[arg(short, long)]
    models_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write synthetic labelled observations for every disease
    Generate {
        #[arg(short, long, default_value = "data/observations.json")]
        output: PathBuf,

        #[arg(short = 'n', long, default_value = "50")]
        per_disease: usize,

        #[arg(short, long, default_value = "42")]
        seed: u64,
    },

    /// Train a model from an observations file
    Train {
        #[arg(short, long, default_value = "data/observations.json")]
        data: PathBuf,

        /// Train on one disease only (otherwise the combined model)
        #[arg(short = 'D', long)]
        disease: Option<Disease>,

        #[arg(short, long)]
        test_size: Option<f64>,

        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Predict outbreak risk for one county
    Predict(PredictArgs),

    /// Predict every request in a JSON array file
    Batch {
        #[arg(value_name = "REQUESTS_FILE")]
        input: PathBuf,
    },

    /// Show trained models
    Status,

    /// Summarize an observations file
    Stats {
        #[arg(short, long, default_value = "data/observations.json")]
        data: PathBuf,
    },
}

#[derive(Args)]
struct PredictArgs {
    #[arg(long)]
    county: String,

    #[arg(short = 'D', long)]
    disease: Disease,

    #[arg(long)]
    temperature: f64,

    #[arg(long)]
    humidity: f64,

    #[arg(long)]
    rainfall: f64,

    #[arg(long)]
    population_density: f64,

    #[arg(long)]
    access_to_water: f64,

    #[arg(long)]
    healthcare_coverage: f64,

    #[arg(long)]
    previous_cases: u32,

    #[arg(long)]
    vaccination_rate: f64,
}

impl From<PredictArgs> for PredictionRequest {
    fn from(args: PredictArgs) -> Self {
        Self {
            county: args.county,
            disease: args.disease,
            temperature: args.temperature,
            humidity: args.humidity,
            rainfall: args.rainfall,
            population_density: args.population_density,
            access_to_water: args.access_to_water,
            healthcare_coverage: args.healthcare_coverage,
            previous_cases: args.previous_cases,
            vaccination_rate: args.vaccination_rate,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let loaded = match cli.config.as_deref() {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });
    if let Some(dir) = cli.models_dir {
        config.models.dir = dir;
    }

    init_tracing(&config);
    tracing::debug!(models_dir = %config.models.dir.display(), "Configuration loaded");

    match cli.command {
        Commands::Generate {
            output,
            per_disease,
            seed,
        } => {
            let repository = InMemoryObservationRepository::new();
            repository.create_batch(SyntheticGenerator::new(seed).generate_all(per_disease))?;
            repository
                .save_json(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            print_json(&repository.statistics()?)?;
        }

        Commands::Train {
            data,
            disease,
            test_size,
            seed,
        } => {
            let repository = load_repository(&data)?;
            let service = open_service(&config)?;
            let outcome = service.train_from_repository(&repository, disease, test_size, seed);
            print_json(&outcome)?;
            if !outcome.is_success() {
                bail!("training failed");
            }
        }

        Commands::Predict(args) => {
            let service = open_service(&config)?;
            let response = service.predict(&args.into())?;
            print_json(&response)?;
        }

        Commands::Batch { input } => {
            let bytes = std::fs::read(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let requests: Vec<PredictionRequest> = serde_json::from_slice(&bytes)?;
            let service = open_service(&config)?;
            print_json(&service.predict_batch(&requests))?;
        }

        Commands::Status => {
            let service = open_service(&config)?;
            print_json(&service.model_status())?;
        }

        Commands::Stats { data } => {
            let repository = load_repository(&data)?;
            print_json(&repository.statistics()?)?;
        }
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.observability.log_level.clone().into());

    // Logs go to stderr so stdout stays valid JSON
    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn open_service(config: &Config) -> anyhow::Result<OutbreakService> {
    let store = ModelStore::open(&config.models.dir)
        .with_context(|| format!("opening model store at {}", config.models.dir.display()))?;
    Ok(OutbreakService::new(Arc::new(store), config.training.clone()))
}

fn load_repository(path: &Path) -> anyhow::Result<InMemoryObservationRepository> {
    InMemoryObservationRepository::load_json(path)
        .with_context(|| format!("loading observations from {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
