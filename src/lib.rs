//! Translate Xcode String Catalogs (`.xcstrings`) with an OpenAI-compatible
//! chat model.
//!
//! The pipeline is: resolve [`config::Config`], load the [`catalog::Catalog`],
//! fill in missing languages with [`translator::translate_catalog`], and write
//! the result back through [`persistence::CatalogWriter`].

pub mod catalog;
pub mod config;
pub mod env_file;
pub mod openai;
pub mod persistence;
pub mod translator;
pub mod validator;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use catalog::Catalog;
use config::Config;
use openai::OpenAiClient;
use persistence::CatalogWriter;
use translator::{translate_catalog, BatchOptions, TranslationSummary};

/// Translate the catalog at `input` in place.
///
/// Per-string failures are recorded in the catalog and counted in the
/// returned summary; only I/O and setup failures are returned as errors.
pub async fn run(config: &Config, input: &Path) -> Result<TranslationSummary> {
    // Step 1: Load the catalog
    info!("Loading catalog from {}", input.display());
    let mut catalog = Catalog::load(input)
        .with_context(|| format!("Failed to load catalog {}", input.display()))?;
    info!(
        "Loaded {} keys (source language: {})",
        catalog.strings.len(),
        catalog.source_language
    );

    // Step 2: Translate, checkpointing after every batch unless disabled
    let client = OpenAiClient::new(config)?;
    let options = BatchOptions::from_config(config);
    let mut writer = CatalogWriter::new(input, config.skip_backup);

    let summary = if config.checkpoint {
        translate_catalog(&client, &mut catalog, &options, |c| writer.save(c)).await?
    } else {
        translate_catalog(&client, &mut catalog, &options, |_| Ok(())).await?
    };

    // Step 3: Save the result
    if summary.changed() == 0 {
        info!("Catalog already up to date, nothing written");
    } else {
        if !config.checkpoint {
            writer.save(&catalog)?;
        }
        info!("Saved catalog to {}", writer.path().display());
    }

    if summary.failed > 0 {
        info!(
            "{} strings failed and were marked with state \"error\"; rerun to retry them",
            summary.failed
        );
    }

    Ok(summary)
}
