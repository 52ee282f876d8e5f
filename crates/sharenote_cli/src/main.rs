//! CLI smoke entry point.
//!
//! # Responsibility
//! - Resolve configuration, start logging, open the configured store.
//! - Print schema and crate version so deployments can be checked quickly.

use log::error;
use sharenote_core::db::{migrations, open_db};
use sharenote_core::{core_version, init_logging, CoreConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = CoreConfig::from_env();

    if let Some(log_dir) = config.log_dir.as_deref() {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("sharenote: logging disabled: {err}");
        }
    }

    let conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            error!("event=cli_probe module=cli status=error error={err}");
            eprintln!("sharenote: cannot open {}: {err}", config.db_path.display());
            return ExitCode::FAILURE;
        }
    };

    let schema_version = match migrations::current_version(&conn) {
        Ok(version) => version,
        Err(err) => {
            eprintln!("sharenote: cannot read schema version: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("sharenote_core version={}", core_version());
    println!("db_path={}", config.db_path.display());
    println!(
        "schema_version={schema_version} latest={}",
        migrations::latest_version()
    );
    ExitCode::SUCCESS
}
