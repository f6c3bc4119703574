//! Named-query catalog entry point.
//!
//! With no arguments, loads the registry configured through `DAO_*`
//! environment variables and lists every file with its statement names.
//! With `<file> <name>`, prints that one statement.

use std::process::ExitCode;

use named_query::{NamedQueryConfig, QueryRegistry};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = NamedQueryConfig::from_env();
    let registry = match config.load_registry() {
        Ok(Some(registry)) => registry,
        Ok(None) => {
            tracing::warn!("set DAO_ENABLE_SQL_FILE=true to load named query files");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to load named query files");
            return ExitCode::FAILURE;
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => {
            print!("{}", render_catalog(&registry));
            ExitCode::SUCCESS
        }
        [file, name] => match registry.get(file, name) {
            Ok(sql) => {
                println!("{sql}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "lookup failed");
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("usage: sql-catalog [<file> <name>]");
            ExitCode::FAILURE
        }
    }
}

/// One line per file (`file (n queries)`), then its names indented, all sorted.
fn render_catalog(registry: &QueryRegistry) -> String {
    let mut files: Vec<_> = registry.file_keys().collect();
    files.sort_unstable();

    let mut out = String::new();
    for key in files {
        let Some(file) = registry.file(key) else {
            continue;
        };
        let mut names: Vec<_> = file.names().collect();
        names.sort_unstable();
        out.push_str(&format!("{key} ({} queries)\n", names.len()));
        for name in names {
            out.push_str(&format!("  {name}\n"));
        }
    }
    out
}
