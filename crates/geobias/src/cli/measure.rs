//! The `geobias measure` command.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, ValueEnum};
use geobias_core::config::LanguageModel;
use geobias_core::language::detector_for;
use geobias_core::{
    BackboneEngine, Config, CountryDatabase, Dataset, ManifestDataset, MeasurementMode, Measurer,
    ResultStore,
};

/// Measurement mode as given on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Samples per raw country string
    Count,
    /// Samples per GPS region
    GpsCount,
    /// Tag frequencies per country, features per (tag, subregion)
    Tag,
    /// Tag frequencies per GPS region
    GpsTag,
    /// Tag language and local/tourist features per country
    Language,
}

impl From<Mode> for MeasurementMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Count => MeasurementMode::Count,
            Mode::GpsCount => MeasurementMode::GpsCount,
            Mode::Tag => MeasurementMode::Tag,
            Mode::GpsTag => MeasurementMode::GpsTag,
            Mode::Language => MeasurementMode::Language,
        }
    }
}

/// Arguments for the `measure` command.
#[derive(Args, Debug)]
pub struct MeasureArgs {
    /// Dataset directory (categories.txt, samples.jsonl, optional boundaries.geojson)
    #[arg(required = true)]
    pub dataset: PathBuf,

    /// Modes to run, in order (repeatable)
    #[arg(short, long = "mode", value_enum, default_value = "count")]
    pub modes: Vec<Mode>,

    /// Run id snapshots are stored under (defaults to the dataset directory name)
    #[arg(short, long)]
    pub run_id: Option<String>,

    /// Run gps-count / gps-tag instead of count / tag when the dataset has boundaries
    #[arg(long)]
    pub follow_boundaries: bool,

    /// Maximum cached features per key
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Directory holding the country lookup tables
    #[arg(long)]
    pub lookup_dir: Option<PathBuf>,

    /// Directory snapshots are written under
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Skip feature extraction; tag and language modes still count
    #[arg(long)]
    pub no_features: bool,

    /// Treat unresolvable countries as unknown locality instead of failing
    #[arg(long)]
    pub lenient_countries: bool,

    /// Pretty-print snapshots
    #[arg(long)]
    pub pretty: bool,
}

/// Execute the measure command.
///
/// The pass itself is synchronous; it runs on the blocking pool so the
/// runtime stays free.
pub async fn execute(args: MeasureArgs, config: Config) -> anyhow::Result<()> {
    if !args.dataset.is_dir() {
        anyhow::bail!(
            "Dataset directory does not exist: {:?}\n\n  Hint: Pass a directory containing samples.jsonl and categories.txt.",
            args.dataset
        );
    }

    let config = apply_overrides(config, &args)?;
    let run_id = args
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(&args.dataset));

    let paths = tokio::task::spawn_blocking(move || run_modes(&args, &config, &run_id)).await??;
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}

/// Fold command-line overrides into the loaded config and re-validate it.
fn apply_overrides(mut config: Config, args: &MeasureArgs) -> anyhow::Result<Config> {
    if let Some(capacity) = args.capacity {
        config.features.capacity = capacity;
    }
    if let Some(dir) = &args.lookup_dir {
        config.general.lookup_dir = dir.clone();
    }
    if let Some(dir) = &args.results_dir {
        config.general.results_dir = dir.clone();
    }
    if args.no_features {
        config.features.enabled = false;
    }
    if args.lenient_countries {
        config.language.strict_country_resolution = false;
    }
    if args.pretty {
        config.output.pretty = true;
    }
    config.validate()?;
    Ok(config)
}

fn default_run_id(dataset: &Path) -> String {
    dataset
        .canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(dataset)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "default".to_string())
}

/// Resolve the requested modes against the dataset, dropping repeats.
fn resolve_modes(modes: &[Mode], follow_boundaries: bool, has_boundaries: bool) -> Vec<MeasurementMode> {
    let mut resolved: Vec<MeasurementMode> = Vec::new();
    for &mode in modes {
        let mut mode = MeasurementMode::from(mode);
        if follow_boundaries {
            mode = mode.for_dataset(has_boundaries);
        }
        if !resolved.contains(&mode) {
            resolved.push(mode);
        }
    }
    resolved
}

/// Load collaborators once, then run every mode and save its snapshot.
fn run_modes(args: &MeasureArgs, config: &Config, run_id: &str) -> anyhow::Result<Vec<PathBuf>> {
    let dataset = ManifestDataset::open(&args.dataset, &config.dataset.region_name_property)?;
    let modes = resolve_modes(
        &args.modes,
        args.follow_boundaries,
        dataset.geo_boundaries().is_some(),
    );
    let dataset = dataset.with_images(modes.iter().any(MeasurementMode::needs_images));

    let countries = CountryDatabase::load(&config.lookup_dir())?;
    let store = ResultStore::new(config.results_dir(), config.output.pretty);
    let extractor = if modes.iter().any(MeasurementMode::needs_features) {
        load_extractor(config)?
    } else {
        None
    };
    if modes.contains(&MeasurementMode::Language) && config.language.model == LanguageModel::Script {
        tracing::warn!(
            "Using the script heuristic for tag languages\n  \
             Latin-script tags without diacritics will all read as English."
        );
    }
    let detector = detector_for(config.language.model);

    let mut paths = Vec::with_capacity(modes.len());
    for mode in modes {
        let pb = create_progress_bar(mode, dataset.len_hint());
        let tick = || pb.inc(1);
        let mut measurer = Measurer::new(config, &countries, &store, run_id)
            .with_detector(detector)
            .with_progress(&tick);
        if let Some(engine) = extractor.as_ref() {
            measurer = measurer.with_extractor(engine);
        }

        let start = Instant::now();
        let result = measurer.run_and_save(mode, &dataset);
        pb.finish_and_clear();
        let path = result?;

        print_summary(mode, run_id, pb.position(), start.elapsed(), &path);
        paths.push(path);
    }
    Ok(paths)
}

/// Load the backbone, or `None` when features are disabled.
///
/// With features enabled a model that fails to load stops the run;
/// `--no-features` is the way to measure without one.
fn load_extractor(config: &Config) -> anyhow::Result<Option<BackboneEngine>> {
    if !config.features.enabled {
        tracing::info!("Feature extraction disabled, snapshots will hold no features");
        return Ok(None);
    }
    let engine = BackboneEngine::load(&config.features, &config.model_dir()).map_err(|e| {
        anyhow::anyhow!(
            "{e}\n\n  Hint: Export the backbone to {:?}, or pass --no-features to measure without it.",
            BackboneEngine::model_path(&config.features, &config.model_dir())
        )
    })?;
    tracing::info!("Feature model loaded");
    Ok(Some(engine))
}

/// Create a progress bar for one pass over the dataset.
fn create_progress_bar(mode: MeasurementMode, total: Option<usize>) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = match total {
        Some(total) => ProgressBar::new(total as u64),
        None => ProgressBar::new_spinner(),
    };
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb.set_message(mode.to_string());
    pb
}

/// Print a short summary after a mode finishes.
fn print_summary(mode: MeasurementMode, run_id: &str, samples: u64, elapsed: Duration, path: &Path) {
    let rate = if elapsed.as_secs_f64() > 0.0 {
        samples as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("    Mode:         {:>12}", mode.name());
    eprintln!("    Run:          {:>12}", run_id);
    eprintln!("  ------------------------------------");
    eprintln!("    Samples:      {:>12}", samples);
    eprintln!("    Duration:     {:>11.1}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} smp/sec", rate);
    eprintln!("  ====================================");
    eprintln!("    Snapshot: {}", path.display());
}
