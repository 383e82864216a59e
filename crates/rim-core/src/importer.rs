//! Import orchestration: lock, sniff, one transaction over the whole file.
//!
//! A run either commits every valid row or persists nothing. Lock release is
//! owned by a guard, so it happens on every exit path after acquisition.

use crate::error::ImportError;
use crate::lock::ImportLock;
use crate::reader::{self, ImportRow};
use crate::resolve::ConflictResolver;
use crate::store::RedirectDb;
use crate::validate::PathShape;
use std::path::Path;
use tracing::{error, info};

/// Per-run counters, logged at completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Terminal status of a run that did not fail.
#[derive(Debug)]
pub enum ImportOutcome {
    /// All rows applied and committed.
    Completed(ImportReport),
    /// Another import holds the lock; nothing was read or written.
    AlreadyRunning,
}

pub struct Importer<'a> {
    db: &'a RedirectDb,
    site_id: i64,
    shape: PathShape,
}

impl<'a> Importer<'a> {
    pub fn new(db: &'a RedirectDb, site_id: i64, shape: PathShape) -> Self {
        Importer { db, site_id, shape }
    }

    /// Run one whole-file import.
    pub async fn run(
        &self,
        file: &Path,
        lock: &ImportLock,
        resolver: &mut dyn ConflictResolver,
    ) -> Result<ImportOutcome, ImportError> {
        reader::check_usage(file)?;

        let Some(_guard) = lock.acquire()? else {
            error!("Redirects are already being imported. Please repeat later");
            return Ok(ImportOutcome::AlreadyRunning);
        };
        info!("import started: {}", file.display());

        let outcome = async {
            reader::sniff_delimiter(file)?;
            let rows = reader::read_rows(file)?;
            self.apply_rows(&rows, resolver).await
        }
        .await;

        match outcome {
            Ok(report) => {
                info!("Import completed successfully");
                info!(
                    "imported {} row(s): {} created, {} updated, {} skipped",
                    report.total, report.created, report.updated, report.skipped
                );
                Ok(ImportOutcome::Completed(report))
            }
            Err(err) => {
                error!("{}", err);
                Err(err)
            }
        }
        // _guard drops here, releasing the lock on both paths.
    }

    /// Validate and apply every row inside a single transaction. Any error
    /// drops the transaction, rolling back all rows from this run.
    async fn apply_rows(
        &self,
        rows: &[ImportRow],
        resolver: &mut dyn ConflictResolver,
    ) -> Result<ImportReport, ImportError> {
        let mut tx = self.db.begin().await?;
        let mut report = ImportReport {
            total: rows.len(),
            ..Default::default()
        };

        for row in rows {
            for path in [&row.old_path, &row.new_path] {
                if !self.shape.is_valid(path) {
                    return Err(ImportError::InvalidPath {
                        line: row.line,
                        path: path.clone(),
                    });
                }
            }

            match self.db.find(&mut tx, self.site_id, &row.old_path).await? {
                None => {
                    self.db
                        .create(&mut tx, self.site_id, &row.old_path, &row.new_path)
                        .await?;
                    report.created += 1;
                }
                Some(existing) if existing.new_path == row.new_path => {
                    report.skipped += 1;
                }
                Some(existing) => {
                    if resolver.resolve(&existing, &row.new_path)? {
                        self.db.update(&mut tx, &existing, &row.new_path).await?;
                        report.updated += 1;
                    } else {
                        report.skipped += 1;
                    }
                }
            }
        }

        tx.commit().await?;
        Ok(report)
    }
}
