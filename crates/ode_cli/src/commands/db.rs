use miette::Result;
use ode_core::config::OdeConfig;
use ode_core::db::{DatabaseConfig, Db, ops};
use owo_colors::OwoColorize;

use crate::output::Output;

fn human_size(size: u64) -> String {
    if size < 1024 {
        format!("{} bytes", size)
    } else if size < 1024 * 1024 {
        format!("{:.2} KB", size as f64 / 1024.0)
    } else {
        format!("{:.2} MB", size as f64 / (1024.0 * 1024.0))
    }
}

/// Show database statistics
pub async fn stats(db: &Db, config: &OdeConfig) -> Result<()> {
    let output = Output::new();

    output.section("Row Counts");
    for (table, count) in ops::table_counts(db).await? {
        output.kv(&table, &count.to_string().bright_white().to_string());
    }

    output.section("Database Info");
    match &config.database {
        DatabaseConfig::Memory => {
            output.kv("Type", "SurrealDB (in memory)");
            output.status("Nothing is persisted; counts reflect this run only");
        }
        DatabaseConfig::Embedded { path } => {
            output.kv("Type", "SurrealDB (embedded)");
            output.kv("File", &path.bright_white().to_string());
            // surrealkv stores a directory, so only report a size for plain files
            if let Ok(metadata) = std::fs::metadata(path) {
                if metadata.is_file() {
                    output.kv("Size", &human_size(metadata.len()));
                }
            }
        }
        #[allow(unreachable_patterns)]
        _ => output.kv("Type", "SurrealDB (remote)"),
    }

    Ok(())
}
