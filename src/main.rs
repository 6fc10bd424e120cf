//! skill-matcher: semantic matching of required skills against resume skills

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use skill_matcher::cli::{Cli, Commands, ConfigAction, ModelAction};
use skill_matcher::config::{Config, EmbeddingProvider};
use skill_matcher::embedding::build_embedder;
use skill_matcher::embedding::model_manager::EmbeddingModelManager;
use skill_matcher::error::{Result, SkillMatcherError};
use skill_matcher::input::{SkillListReader, SkillNormalizer};
use skill_matcher::output::formatter::{formatter_for, parse_output_format, save_output};
use skill_matcher::output::MatchReportDocument;
use skill_matcher::{Embedder, SkillMatcher};
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, config_path).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, mut config: Config, config_path: PathBuf) -> Result<()> {
    match command {
        Commands::Match {
            required,
            resume,
            threshold,
            provider,
            model,
            normalize,
            detailed,
            output,
            save,
        } => {
            if let Some(provider) = provider {
                config.embedding.provider = provider.into();
            }
            if let Some(model) = model {
                match config.embedding.provider {
                    EmbeddingProvider::Local => config.embedding.local.model = model,
                    EmbeddingProvider::Remote => config.embedding.remote.model = model,
                }
            }
            if let Some(output) = output {
                config.output.format = parse_output_format(&output)?;
            }
            let threshold = threshold.unwrap_or(config.matching.threshold);
            let normalize = normalize || config.matching.normalize_labels;
            let detailed = detailed || config.output.detailed;

            let mut reader = SkillListReader::new();
            let mut required_skills = reader.resolve(&required).await?;
            let mut resume_skills = reader.resolve(&resume).await?;

            if normalize {
                let normalizer = SkillNormalizer::new();
                required_skills = normalizer.canonicalize_all(&required_skills);
                resume_skills = normalizer.canonicalize_all(&resume_skills);
            }

            info!(
                "Matching {} required skills against {} resume skills",
                required_skills.len(),
                resume_skills.len()
            );

            let start_time = Instant::now();
            let embedder = build_embedder(&config).await?;
            initialize_with_spinner(&embedder).await?;

            let matcher = SkillMatcher::new(embedder).with_threshold(config.matching.threshold);
            let outcome = matcher
                .match_skills_detailed(&required_skills, &resume_skills, threshold)
                .await;
            matcher.embedder().close().await;
            let report = outcome?;

            let document = MatchReportDocument::new(
                report,
                resume_skills.len(),
                start_time.elapsed().as_millis() as u64,
                normalize,
            );
            let formatter = formatter_for(config.output.format, config.output.color_output, detailed);
            let rendered = formatter.format_report(&document)?;
            println!("{}", rendered);

            if let Some(path) = save {
                // Files never carry terminal color codes
                let plain = formatter_for(config.output.format, false, detailed).format_report(&document)?;
                save_output(&path, &plain)?;
                println!("💾 Saved to {}", path.display());
            }
        }

        Commands::Models { action } => {
            let mut manager = EmbeddingModelManager::new(config.models_dir().clone()).await?;

            match action {
                ModelAction::List => {
                    println!("📚 Embedding Models\n");
                    for (id, info) in manager.list_available_models() {
                        let status = if manager.is_model_downloaded(id) { "✅ Downloaded" } else { "⬇️  Available" };
                        println!("  • {} ({}) - {} MB, {} dims [{}]", id, info.repo_id, info.size_mb, info.dimensions, status);
                        println!("    {}", info.description);
                    }
                    if manager.list_downloaded_models().is_empty() {
                        println!("\n💡 No models downloaded yet. Get started with:");
                        println!("   skill-matcher models download {}", manager.auto_select_model());
                    }
                }

                ModelAction::Download { model, force } => {
                    let model_id = manager
                        .resolve_model_id(&model)
                        .ok_or_else(|| SkillMatcherError::ModelNotFound(model.clone()))?;

                    if manager.is_model_downloaded(&model_id) {
                        if !force {
                            println!("✅ Model '{}' is already downloaded", model_id);
                            println!("💡 Use --force to re-download");
                            return Ok(());
                        }
                        manager.remove_model(&model_id).await?;
                    }

                    let path = manager.download_model(&model_id).await?;
                    println!("✅ Model '{}' downloaded to {}", model_id, path.display());
                }

                ModelAction::Remove { model } => {
                    let model_id = manager.resolve_model_id(&model).unwrap_or(model);
                    let path = manager.remove_model(&model_id).await?;
                    println!("🗑️  Removed model '{}' ({})", model_id, path.display());
                }

                ModelAction::Info { model } => {
                    let model_id = manager
                        .resolve_model_id(&model)
                        .ok_or_else(|| SkillMatcherError::ModelNotFound(model.clone()))?;
                    let info = manager
                        .get_model_info(&model_id)
                        .ok_or_else(|| SkillMatcherError::ModelNotFound(model_id.clone()))?;

                    println!("📋 Model Information for '{}'\n", model_id);
                    println!("Name: {}", info.name);
                    println!("Repository: {}", info.repo_id);
                    println!("Type: {:?}", info.model_type);
                    println!("Dimensions: {}", info.dimensions);
                    println!("Size: {} MB", info.size_mb);
                    println!("Description: {}", info.description);
                    match manager.get_model_path(&model_id) {
                        Some(path) => println!("Status: ✅ Downloaded ({})", path.display()),
                        None => println!("Status: ⬇️  Available (skill-matcher models download {})", model_id),
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                let content = toml::to_string_pretty(&config)
                    .map_err(|e| SkillMatcherError::Configuration(format!("Failed to serialize config: {}", e)))?;
                println!("⚙️  Configuration ({})\n", config_path.display());
                println!("{}", content);
            }

            Some(ConfigAction::Path) => {
                println!("{}", config_path.display());
            }

            Some(ConfigAction::Reset) => {
                Config::default().save_to(&config_path)?;
                println!("✅ Configuration reset to defaults");
            }

            Some(ConfigAction::Set { key, value }) => {
                config.set(&key, &value)?;
                config.save_to(&config_path)?;
                println!("🔧 {} = {}", key, value);
            }
        },
    }

    Ok(())
}

async fn initialize_with_spinner(embedder: &dyn Embedder) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Initializing embedding model {}", embedder.model_name()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = embedder.initialize().await;
    spinner.finish_and_clear();
    Ok(result?)
}
