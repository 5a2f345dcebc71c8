//! `sitecat` command line entry point.
//!
//! # Responsibility
//! - Merge the optional TOML config with command-line flags.
//! - Route subcommands to the core projector, catalog, photo and action
//!   log services.

mod cli;
mod commands;
mod error;

use clap::Parser;
use cli::{Cli, Commands};
use error::{exit_with_error, CliResult};
use log::debug;
use sitecat_core::{init_from_config, ContextFields, CoreConfig};

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        exit_with_error(e);
    }
}

fn load_config(cli: &Cli) -> CliResult<CoreConfig> {
    let mut config = match &cli.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    Ok(config)
}

fn run(cli: Cli) -> CliResult<()> {
    let config = load_config(&cli)?;
    // `--verbose` logs to stderr; otherwise only a configured `log_dir` logs.
    init_from_config(&config, cli.verbose)?;
    debug!(
        "event=cli_start module=cli status=ok db_path={} allocation_attempts={}",
        config.db_path.display(),
        config.allocation_attempts
    );

    match cli.command {
        Commands::ToUtm {
            latitude,
            longitude,
            zone,
        } => commands::to_utm(latitude, longitude, zone),

        Commands::ToLatlong {
            zone,
            hemisphere,
            easting,
            northing,
        } => commands::to_latlong(zone, hemisphere, easting, northing),

        Commands::RegisterArea { area, area_type } => {
            commands::register_area(&config, area, area_type)
        }

        Commands::NewContext {
            area,
            number,
            context_type,
            description,
        } => {
            let fields = ContextFields {
                context_type,
                description,
                ..ContextFields::default()
            };
            commands::new_context(&config, area, number, fields)
        }

        Commands::NewFind {
            context,
            number,
            material,
            category,
            notes,
        } => commands::new_find(&config, context, number, material.zip(category), notes),

        Commands::Finds { context } => commands::finds(&config, context),

        Commands::PhotoAdd {
            scope,
            extension,
            bag,
        } => commands::photo_add(&config, scope, extension, bag.map(Into::into)),

        Commands::Photos { scope, bag } => commands::photos(&config, scope, bag),

        Commands::PhotoReplace {
            scope,
            file_name,
            bag,
        } => commands::photo_replace(&config, scope, &file_name, bag),

        Commands::Types { list, add } => commands::types(&config, list.into(), add),

        Commands::History { object_id, limit } => commands::history(&config, object_id, limit),
    }
}
