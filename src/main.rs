//! salescast CLI: forecast daily sales with a SARIMA + LSTM ensemble.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, LevelFilter};

use salescast::data::LoaderConfig;
use salescast::models::{LstmConfig, SARIMASpec};
use salescast::pipeline::{Pipeline, PipelineConfig, PipelineOutcome};
use salescast::{ForecastError, Result};

#[derive(Parser)]
#[command(name = "salescast")]
#[command(about = "Forecast daily sales with a weighted SARIMA + LSTM ensemble")]
#[command(version)]
struct Cli {
    /// Input CSV file
    #[arg(short, long, default_value = "sales_data.csv")]
    input: PathBuf,

    /// Header of the date column
    #[arg(long, default_value = "date")]
    date_column: String,

    /// Header of the numeric column summed per date
    #[arg(long, default_value = "sales")]
    value_column: String,

    /// Field delimiter (a single ASCII character)
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Fraction of observations used for training
    #[arg(long, default_value_t = 0.8)]
    train_fraction: f64,

    /// LSTM input window length
    #[arg(long, default_value_t = 30)]
    window: usize,

    /// LSTM training epochs
    #[arg(long, default_value_t = 70)]
    epochs: usize,

    /// LSTM mini-batch size
    #[arg(long, default_value_t = 32)]
    batch_size: usize,

    /// LSTM layer widths, comma separated
    #[arg(long, value_delimiter = ',', default_value = "128,128,64")]
    hidden: Vec<usize>,

    /// Dropout rate after each LSTM layer
    #[arg(long, default_value_t = 0.25)]
    dropout: f64,

    /// Adam learning rate
    #[arg(long, default_value_t = 0.001)]
    learning_rate: f64,

    /// Random seed for weight initialisation, dropout and shuffling
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Ensemble weight of the SARIMA forecast
    #[arg(long, default_value_t = 0.4)]
    sarima_weight: f64,

    /// Ensemble weight of the LSTM forecast
    #[arg(long, default_value_t = 0.6)]
    lstm_weight: f64,

    /// Maximum lag of the diagnostic correlograms
    #[arg(long, default_value_t = 30)]
    lags: usize,

    /// Directory for SVG charts and forecasts.csv
    #[arg(short, long, default_value = "salescast-output")]
    output_dir: PathBuf,

    /// Skip writing charts and the forecast CSV
    #[arg(long)]
    no_plots: bool,

    /// Log debug detail (per-epoch loss, optimiser progress)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        if !self.delimiter.is_ascii() {
            return Err(ForecastError::InvalidParameter(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            )));
        }

        let loader = LoaderConfig::default()
            .with_date_column(self.date_column.as_str())
            .with_value_column(self.value_column.as_str())
            .with_delimiter(self.delimiter as u8);
        let lstm = LstmConfig::default()
            .with_window(self.window)
            .with_hidden(self.hidden.clone())
            .with_dropout(self.dropout)
            .with_epochs(self.epochs)
            .with_batch_size(self.batch_size)
            .with_learning_rate(self.learning_rate)
            .with_seed(self.seed);

        let config = PipelineConfig::default()
            .with_input(&self.input)
            .with_loader(loader)
            .with_train_fraction(self.train_fraction)
            .with_sarima(SARIMASpec::default())
            .with_lstm(lstm)
            .with_weights(self.sarima_weight, self.lstm_weight)
            .with_lags(self.lags);

        Ok(if self.no_plots {
            config.without_output()
        } else {
            config.with_output_dir(&self.output_dir)
        })
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn print_summary(outcome: &PipelineOutcome) {
    let eval = &outcome.evaluation;
    println!("Test observations: {}", outcome.ensemble.len());
    println!("Threshold (training mean): {:.4}", outcome.threshold);
    println!();
    println!("Ensemble Model Performance:");
    println!("  R2 Score:  {:.4}", eval.regression.r_squared);
    println!("  MSE:       {:.4}", eval.regression.mse);
    println!("  Accuracy:  {:.4}", eval.classification.accuracy);
    println!("  Precision: {:.4}", eval.classification.precision);
    println!("  Recall:    {:.4}", eval.classification.recall);
    println!("  F1 Score:  {:.4}", eval.classification.f1);
    match eval.auc() {
        Some(auc) => println!("  AUC:       {auc:.4}"),
        None => println!("  AUC:       undefined (single class in test set)"),
    }
    println!();
    println!("Ljung-Box (ensemble residuals): {}", outcome.ljung_box);

    if !outcome.artifacts.is_empty() {
        println!();
        println!("Wrote {} files:", outcome.artifacts.len());
        for path in &outcome.artifacts {
            println!("  {}", path.display());
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = cli
        .pipeline_config()
        .and_then(|config| Pipeline::new(config).run());

    match outcome {
        Ok(outcome) => {
            print_summary(&outcome);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
