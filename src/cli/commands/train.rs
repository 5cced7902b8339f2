//! Train command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{apply_overrides, load_config, validate_config, Cli, RunConfig};
use crate::data::{load_dataset, DatasetKind};
use crate::nn::build_model;
use crate::train::{RunPaths, TrainingRun};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub fn run_train(cli: Cli, level: LogLevel) -> Result<(), String> {
    let mut config = match &cli.config {
        Some(path) => load_config(path).map_err(|e| format!("Config error: {e}"))?,
        None => RunConfig::default(),
    };
    apply_overrides(&mut config, &cli);
    validate_config(&config, cli.classes).map_err(|e| format!("Invalid config: {e}"))?;

    let kind = DatasetKind::from_classes(cli.classes).map_err(|e| e.to_string())?;
    log(
        level,
        LogLevel::Normal,
        &format!("wig-ensemble: CIFAR-{} from {}", cli.classes, config.data_dir.display()),
    );
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  Model: {} blocks x {} features, dropout {}, weight decay {}",
            config.nb_layers, config.nb_features, config.dropout, config.weight_decay
        ),
    );
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  Schedule: {} epochs x {} steps, batch {}, lr {}, mixup alpha {}",
            config.epochs,
            config.steps_per_epoch,
            config.batch_size,
            config.learning_rate,
            config.mixup_alpha
        ),
    );

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let dataset = load_dataset(kind, &config.data_dir, config.train_per_class)
        .map_err(|e| e.to_string())?;
    log(
        level,
        LogLevel::Verbose,
        &format!("  Data: {} train / {} test images", dataset.train.len(), dataset.test.len()),
    );

    std::fs::create_dir_all(&config.output_dir).map_err(|e| {
        format!("cannot create output directory {}: {e}", config.output_dir.display())
    })?;
    let paths = RunPaths::new(&config.output_dir, &config.title, cli.classes);
    if paths.checkpoint.exists() {
        log(
            level,
            LogLevel::Normal,
            &format!("Found {}, skipping training", paths.checkpoint.display()),
        );
    }

    let mut model = build_model(&config.model_config(cli.classes), &mut rng);
    log(
        level,
        LogLevel::Verbose,
        &format!("  Parameters: {}", model.num_parameters()),
    );

    let mut run = TrainingRun::new(config.run_settings(), paths);
    let report = run
        .execute(&mut model, &dataset.train, &dataset.test, &mut rng, |line| {
            log(level, LogLevel::Normal, line);
        })
        .map_err(|e| format!("Training error: {e}"))?;

    log(level, LogLevel::Normal, report.to_string().trim_end());
    Ok(())
}
