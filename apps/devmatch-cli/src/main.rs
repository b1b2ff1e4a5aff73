//! devmatch - identity resolution for (name, email) records
//!
//! Blocks records into candidate pairs, builds labelled training data,
//! trains the match model and scores candidates.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use devmatch_core::blocking::Blocker;
use devmatch_core::io::CandidateTable;
use devmatch_core::labels::convert_labels;
use devmatch_core::pipeline::{
    annotate_features, build_dataset_files, generate_candidates, score_candidates_file,
    train_model_file,
};
use devmatch_core::{DevmatchConfig, Selection};

#[derive(Parser, Debug)]
#[command(name = "devmatch", version, about = "Find records that belong to the same developer")]
struct Cli {
    /// Config file (TOML, or JSON by extension)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate candidate pairs from a records CSV (name, email, optional id)
    Block {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Skip buckets larger than this
        #[arg(long)]
        max_bucket_size: Option<usize>,
        /// Keep common email providers in domain keys
        #[arg(long)]
        keep_common_domains: bool,
    },

    /// Append the pair feature columns to a candidates CSV
    Features {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Turn a reviewed label sheet into labels and candidates CSVs
    ConvertLabels {
        /// Label sheet (.xlsx workbook or CSV export)
        #[arg(short, long)]
        sheet: PathBuf,
        #[arg(long)]
        labels_out: PathBuf,
        #[arg(long)]
        candidates_out: PathBuf,
    },

    /// Join labels onto candidates and compute training features
    BuildDataset {
        #[arg(long)]
        candidates: PathBuf,
        #[arg(long)]
        labels: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Train the logistic model and print the evaluation report
    Train {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        model_out: PathBuf,
        /// Also write the report as JSON
        #[arg(long)]
        report_out: Option<PathBuf>,
    },

    /// Score candidate pairs with a trained model
    Predict {
        #[arg(long)]
        candidates: PathBuf,
        #[arg(short, long)]
        model: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Convert labels, build the dataset, train, then score candidates
    Run {
        /// Label sheet (.xlsx workbook or CSV export)
        #[arg(short, long)]
        sheet: PathBuf,
        /// Candidates to score with the trained model
        #[arg(long)]
        candidates: PathBuf,
        /// Directory for intermediate and final files
        #[arg(short, long, default_value = ".")]
        workdir: PathBuf,
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long)]
        top_k: Option<usize>,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> devmatch_core::Result<DevmatchConfig> {
    match path {
        Some(path) => DevmatchConfig::load(path),
        None => Ok(DevmatchConfig::default()),
    }
}

fn selection(config: &DevmatchConfig, threshold: Option<f64>, top_k: Option<usize>) -> Selection {
    Selection::from_options(
        threshold.or(config.scoring.threshold),
        top_k.or(config.scoring.top_k),
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    execute(cli.command, config)
}

fn execute(
    command: Command,
    mut config: DevmatchConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Block {
            input,
            output,
            max_bucket_size,
            keep_common_domains,
        } => {
            if let Some(max) = max_bucket_size {
                config.blocking.max_bucket_size = max;
            }
            if keep_common_domains {
                config.blocking.ignore_common_domains = false;
            }
            config.validate()?;
            let blocker = Blocker::from_config(&config.blocking)?;
            let written = generate_candidates(&input, &output, &blocker)?;
            println!("output: {}  pairs={}", output.display(), written);
        }

        Command::Features { input, output } => {
            let table = annotate_features(CandidateTable::read(&input)?);
            table.write(&output)?;
            println!("output: {}  rows={}", output.display(), table.len());
        }

        Command::ConvertLabels {
            sheet,
            labels_out,
            candidates_out,
        } => {
            let rows = convert_labels(&sheet, &labels_out, &candidates_out)?;
            println!("Output saved: {}", labels_out.display());
            println!("Output saved: {}  rows={}", candidates_out.display(), rows);
        }

        Command::BuildDataset {
            candidates,
            labels,
            output,
        } => {
            let rows = build_dataset_files(&candidates, &labels, &output)?;
            println!("Output: {}  rows={}", output.display(), rows);
        }

        Command::Train {
            input,
            model_out,
            report_out,
        } => {
            let report = train_model_file(&input, &model_out, &config.training)?;
            let json = serde_json::to_string_pretty(&report)?;
            println!("{}", json);
            if let Some(path) = report_out {
                std::fs::write(path, json)?;
            }
        }

        Command::Predict {
            candidates,
            model,
            output,
            threshold,
            top_k,
        } => {
            let selection = selection(&config, threshold, top_k);
            let rows = score_candidates_file(&candidates, &model, &output, selection)?;
            println!("output: {}  rows={}", output.display(), rows);
        }

        Command::Run {
            sheet,
            candidates,
            workdir,
            threshold,
            top_k,
        } => {
            std::fs::create_dir_all(&workdir)?;
            let labels_csv = workdir.join("labels.csv");
            let sheet_candidates_csv = workdir.join("sheet_candidates.csv");
            let dataset_csv = workdir.join("train_dataset.csv");
            let model_json = workdir.join("model.json");
            let scored_csv = workdir.join("scored.csv");

            tracing::info!("Converting labels");
            convert_labels(&sheet, &labels_csv, &sheet_candidates_csv)?;

            tracing::info!("Building training dataset");
            build_dataset_files(&sheet_candidates_csv, &labels_csv, &dataset_csv)?;

            tracing::info!("Training logistic regression model");
            let report = train_model_file(&dataset_csv, &model_json, &config.training)?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            tracing::info!("Scoring candidate pairs with trained model");
            let selection = selection(&config, threshold, top_k);
            let rows = score_candidates_file(&candidates, &model_json, &scored_csv, selection)?;
            println!("output: {}  rows={}", scored_csv.display(), rows);
        }
    }

    Ok(())
}
