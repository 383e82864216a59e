//! CLI for the RIM redirect importer.

use anyhow::Result;
use clap::Parser;
use rim_core::config;
use rim_core::importer::{ImportOutcome, Importer};
use rim_core::lock::ImportLock;
use rim_core::resolve::{AlwaysOverwrite, ConflictResolver, Prompt};
use rim_core::store::RedirectDb;
use std::path::PathBuf;

/// Import redirects from a `;`-delimited CSV file (`old_path;new_path`).
#[derive(Debug, Parser)]
#[command(name = "rim")]
#[command(about = "rim: batch importer for site redirect mappings", long_about = None)]
pub struct Cli {
    /// Path to the CSV file. Delimiter: ";".
    pub file: PathBuf,

    /// Append log output to this file instead of stderr.
    #[arg(short = 'l', long = "log", value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Change new_path for existing redirects without prompting.
    #[arg(long)]
    pub change: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        let db = match &cfg.database_path {
            Some(path) => RedirectDb::open_at(path).await?,
            None => RedirectDb::open_default().await?,
        };

        let lock = ImportLock::new(ImportLock::default_path()?, cfg.lock_ttl_secs);
        let importer = Importer::new(&db, cfg.site_id, cfg.path_shape);

        let mut resolver: Box<dyn ConflictResolver> = if self.change {
            Box::new(AlwaysOverwrite)
        } else {
            Box::new(Prompt::stdio())
        };

        match importer.run(&self.file, &lock, resolver.as_mut()).await? {
            ImportOutcome::Completed(report) => {
                println!(
                    "Imported {} row(s): {} created, {} updated, {} skipped.",
                    report.total, report.created, report.updated, report.skipped
                );
            }
            ImportOutcome::AlreadyRunning => {
                // Soft skip, not a failure: another run owns the table.
                println!("Redirects are already being imported. Please repeat later.");
            }
        }

        Ok(())
    }
}
