use anyhow::Context;
use clap::Parser;
use icu_los_kit::config::Config;
use icu_los_kit::cross_validation::ShuffleSplit;
use icu_los_kit::problem::PROBLEM_TITLE;
use icu_los_kit::workflow::{evaluate, Submission};
use icu_los_kit::DataLoader;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

#[derive(Parser, Debug)]
#[command(name = "icu-los", about = "Evaluate a submission of the ICU length-of-stay kit")]
struct Args {
    /// TOML config; defaults are used when the file does not exist
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Kit root holding the `data/` directory; overrides `data_path`
    #[arg(long)]
    root: Option<PathBuf>,

    /// `starting_kit`, `admission_type`, or `<extractor>:<regressor>`
    #[arg(long)]
    submission: Option<String>,

    /// Only use the first 100 rows of train and test data
    #[arg(long)]
    test_mode: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[instrument]
fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    info!("{}", PROBLEM_TITLE);

    debug!("Loading config from path: {}", args.config.display());
    let mut config = Config::load_or_default(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    if let Some(root) = args.root {
        config.data_path = root;
    }
    if let Some(submission) = args.submission {
        config.submission = submission;
    }
    config.test_mode |= args.test_mode;
    debug!(?config, "Config loaded successfully");

    let submission = Submission::by_name(&config.submission)?;
    info!(?submission, "Evaluating submission");

    let loader = DataLoader::new(&config, config.test_mode);
    let train = loader.get_train_data().context("failed to load training data")?;
    let test = loader.get_test_data().context("failed to load test data")?;
    info!(train_rows = train.len(), test_rows = test.len(), "Data loaded");

    let splits = ShuffleSplit::from(&config.cv).split(train.len())?;
    let evaluation = evaluate(&submission, &config.model_params, &train, &test, &splits)?;

    info!("----------------------------");
    info!("Mean CV scores");
    info!("----------------------------");
    for (train_summary, valid_summary) in evaluation
        .cv
        .train_summary()
        .iter()
        .zip(evaluation.cv.valid_summary().iter())
    {
        info!("train {} | valid {}", train_summary, valid_summary);
    }
    info!("test {}", evaluation.test);

    Ok(())
}
