//! Command line forecasting tool
//!
//! Loads a CSV time series, runs the configured model through the
//! forecasting pipeline, and writes or prints the forecast table.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use ts_forecast::utils::{forecast_metrics, setup_logging, Config};
use ts_forecast::{
    DatasetConfig, ForecastDataset, ForecastModel, ForecastingPipeline, LinearModel,
    SeasonalNaiveModel, TimeSeriesFrame,
};

#[derive(Parser)]
#[command(name = "forecast")]
#[command(version)]
#[command(about = "Time series forecasting over CSV data", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Verbosity level (-v, -vv for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast past the end of each series in a CSV file
    Run {
        /// Input CSV with the historical time series
        #[arg(short, long)]
        data: PathBuf,

        /// CSV of future rows with known values (timestamps, controls)
        #[arg(short, long)]
        future: Option<PathBuf>,

        /// Where to write the forecast CSV (prints a preview either way)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target columns to forecast, comma separated
        #[arg(long, value_delimiter = ',')]
        targets: Vec<String>,

        /// Timestamp column name
        #[arg(long)]
        timestamp_column: Option<String>,

        /// Columns identifying separate series, comma separated
        #[arg(long, value_delimiter = ',')]
        id_columns: Vec<String>,

        /// History length fed to the model
        #[arg(long)]
        context_length: Option<usize>,

        /// Number of steps to forecast
        #[arg(long)]
        prediction_length: Option<usize>,

        /// Timestamp spacing, e.g. "1h", "15min", or a bare integer
        #[arg(long)]
        freq: Option<String>,

        /// Emit one row per forecast step instead of list columns
        #[arg(long)]
        explode: bool,

        /// Model to run: seasonal_naive or linear
        #[arg(long)]
        model: Option<String>,

        /// Season length for the seasonal naive model
        #[arg(long)]
        season_length: Option<usize>,
    },

    /// Score rolling forecasts against the known history
    Evaluate {
        /// Input CSV with the historical time series
        #[arg(short, long)]
        data: PathBuf,

        /// Target columns to forecast, comma separated
        #[arg(long, value_delimiter = ',')]
        targets: Vec<String>,

        /// Timestamp column name
        #[arg(long)]
        timestamp_column: Option<String>,

        /// Columns identifying separate series, comma separated
        #[arg(long, value_delimiter = ',')]
        id_columns: Vec<String>,

        /// History length fed to the model
        #[arg(long)]
        context_length: Option<usize>,

        /// Number of steps to forecast
        #[arg(long)]
        prediction_length: Option<usize>,

        /// Model to run: seasonal_naive or linear
        #[arg(long)]
        model: Option<String>,

        /// Season length for the seasonal naive model
        #[arg(long)]
        season_length: Option<usize>,
    },

    /// Write a default configuration file
    Init {
        /// Destination path for the new file
        #[arg(short, long, default_value = "config/default.toml")]
        output: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config);

    let level = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    setup_logging(level)?;

    match cli.command {
        Commands::Run {
            data,
            future,
            output,
            targets,
            timestamp_column,
            id_columns,
            context_length,
            prediction_length,
            freq,
            explode,
            model,
            season_length,
        } => {
            let mut config = config;
            apply_column_overrides(&mut config, targets, timestamp_column, id_columns);
            apply_model_overrides(&mut config, context_length, prediction_length, model, season_length);
            if let Some(freq) = freq {
                config.forecast.freq = Some(freq);
            }
            if explode {
                config.forecast.explode_forecasts = true;
            }
            run_forecast(&config, &data, future.as_deref(), output.as_deref())
        }
        Commands::Evaluate {
            data,
            targets,
            timestamp_column,
            id_columns,
            context_length,
            prediction_length,
            model,
            season_length,
        } => {
            let mut config = config;
            apply_column_overrides(&mut config, targets, timestamp_column, id_columns);
            apply_model_overrides(&mut config, context_length, prediction_length, model, season_length);
            evaluate(&config, &data)
        }
        Commands::Init { output } => init_config(&output),
    }
}

fn apply_column_overrides(
    config: &mut Config,
    targets: Vec<String>,
    timestamp_column: Option<String>,
    id_columns: Vec<String>,
) {
    if !targets.is_empty() {
        config.data.target_columns = targets;
    }
    if let Some(name) = timestamp_column {
        config.data.timestamp_column = Some(name);
    }
    if !id_columns.is_empty() {
        config.data.id_columns = id_columns;
    }
}

fn apply_model_overrides(
    config: &mut Config,
    context_length: Option<usize>,
    prediction_length: Option<usize>,
    model: Option<String>,
    season_length: Option<usize>,
) {
    if let Some(length) = context_length {
        config.forecast.context_length = length;
    }
    if let Some(length) = prediction_length {
        config.forecast.prediction_length = length;
    }
    if let Some(kind) = model {
        config.model.kind = kind;
    }
    if let Some(length) = season_length {
        config.model.season_length = length;
    }
}

fn run_forecast(
    config: &Config,
    data: &std::path::Path,
    future: Option<&std::path::Path>,
    output: Option<&std::path::Path>,
) -> Result<()> {
    info!("Loading time series from {}", data.display());
    let frame = load_frame(config, data)?;
    info!("Loaded {} rows, {} columns", frame.num_rows(), frame.num_columns());

    let model = build_model(config, &frame)?;
    let pipeline = ForecastingPipeline::new(model, config.to_pipeline_config()?)?;

    let forecasts = match future {
        Some(path) => {
            info!("Loading known future rows from {}", path.display());
            pipeline.forecast_with_future(&frame, path)?
        }
        None => pipeline.forecast(&frame)?,
    };
    info!("Produced {} forecast rows", forecasts.num_rows());

    println!("\n═══════════════════════════════════════");
    println!("  Forecast preview");
    println!("═══════════════════════════════════════");
    print_preview(&forecasts, 10);

    if let Some(path) = output {
        forecasts
            .write_csv(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Saved forecasts to {}", path.display());
    }

    Ok(())
}

fn evaluate(config: &Config, data: &std::path::Path) -> Result<()> {
    info!("Loading time series from {}", data.display());
    let frame = load_frame(config, data)?;
    info!("Loaded {} rows, {} columns", frame.num_rows(), frame.num_columns());

    let model = build_model(config, &frame)?;
    let pipeline = ForecastingPipeline::new(model, config.to_pipeline_config()?)?;

    let forecasts = pipeline.forecast(&frame)?;
    info!("Scoring {} forecast rows", forecasts.num_rows());

    println!("\n═══════════════════════════════════════");
    println!("  Forecast accuracy ({})", config.model.kind);
    println!("═══════════════════════════════════════");
    for target in &config.data.target_columns {
        let metrics = forecast_metrics(&forecasts, target)?;
        println!(
            "  {:<12} MAE {:>10.4}   RMSE {:>10.4}   MAPE {:>7.2}%   sMAPE {:>7.2}%",
            target, metrics.mae, metrics.rmse, metrics.mape, metrics.smape
        );
    }

    Ok(())
}

fn init_config(output: &str) -> Result<()> {
    let path = std::path::Path::new(output);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    Config::create_default(output)?;
    info!("Wrote default configuration to {output}");
    Ok(())
}

fn load_frame(config: &Config, data: &std::path::Path) -> Result<TimeSeriesFrame> {
    let frame = TimeSeriesFrame::read_csv(data, config.data.timestamp_column.as_deref())
        .with_context(|| format!("failed to read {}", data.display()))?;
    Ok(frame)
}

/// Builds the configured model, fitting it on the input history when the
/// model kind requires training.
fn build_model(config: &Config, frame: &TimeSeriesFrame) -> Result<Box<dyn ForecastModel>> {
    let context = config.forecast.context_length;
    let prediction = config.forecast.prediction_length;

    match config.model.kind.as_str() {
        "seasonal_naive" | "naive" => {
            let model = SeasonalNaiveModel::new(context, prediction, config.model.season_length)?;
            Ok(Box::new(model))
        }
        "linear" => {
            let dataset = ForecastDataset::new(frame, dataset_config(config))?;
            info!("Fitting linear model on {} windows", dataset.len());
            let mut model = LinearModel::new(context, prediction)?.with_ridge(config.model.ridge);
            model.fit(&dataset.batch()?)?;
            Ok(Box::new(model))
        }
        other => bail!("unknown model kind '{other}', expected seasonal_naive or linear"),
    }
}

fn dataset_config(config: &Config) -> DatasetConfig {
    let mut dataset = DatasetConfig::new()
        .with_target_columns(config.data.target_columns.clone())
        .with_observable_columns(config.data.observable_columns.clone())
        .with_control_columns(config.data.control_columns.clone())
        .with_conditional_columns(config.data.conditional_columns.clone())
        .with_static_categorical_columns(config.data.static_categorical_columns.clone())
        .with_id_columns(config.data.id_columns.clone())
        .with_context_length(config.forecast.context_length)
        .with_prediction_length(config.forecast.prediction_length)
        .with_fill_value(config.forecast.fill_value);
    if let Some(name) = &config.data.timestamp_column {
        dataset = dataset.with_timestamp_column(name.clone());
    }
    dataset
}

fn print_preview(frame: &TimeSeriesFrame, limit: usize) {
    let shown = frame.num_rows().min(limit);
    println!("  {}", frame.column_names().join(", "));
    for row in 0..shown {
        let cells: Vec<String> = frame
            .column_names()
            .iter()
            .map(|name| match frame.cell(row, name) {
                Ok(cell) => cell.to_string(),
                Err(_) => String::new(),
            })
            .collect();
        println!("  {}", cells.join(", "));
    }
    if frame.num_rows() > shown {
        println!("  ... {} more rows", frame.num_rows() - shown);
    }
}
