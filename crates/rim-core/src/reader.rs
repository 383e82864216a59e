//! CSV source handling: usage checks, delimiter sniffing, row parsing.

use crate::error::ImportError;
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Bytes examined when sniffing the delimiter.
const SNIFF_WINDOW: usize = 2048;

/// The only delimiter the importer accepts.
const DELIMITER: u8 = b';';

/// One parsed line of the input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub old_path: String,
    pub new_path: String,
    /// 1-based line number, for error reporting.
    pub line: u64,
}

/// File-level checks that run before the lock is taken.
pub fn check_usage(path: &Path) -> Result<(), ImportError> {
    if !path.exists() {
        return Err(ImportError::Usage("File not found".to_string()));
    }
    if path.is_dir() {
        return Err(ImportError::Usage(format!(
            "{} is a directory",
            path.display()
        )));
    }
    Ok(())
}

/// Confirm the file looks like `;`-delimited CSV by sampling the first 2 KiB.
/// Every complete non-empty line in the sample must contain the delimiter.
pub fn sniff_delimiter(path: &Path) -> Result<(), ImportError> {
    let file = File::open(path)?;
    let mut buf = Vec::with_capacity(SNIFF_WINDOW);
    file.take(SNIFF_WINDOW as u64).read_to_end(&mut buf)?;
    let len = buf.len();
    let sample = String::from_utf8_lossy(&buf);

    // A full window may cut the final line mid-record; only judge complete lines.
    let truncated = len == SNIFF_WINDOW && !sample.ends_with('\n');
    let lines: Vec<&str> = sample.lines().collect();
    let usable = if truncated {
        lines.len().saturating_sub(1)
    } else {
        lines.len()
    };

    let mut checked = 0usize;
    for line in &lines[..usable] {
        if line.trim().is_empty() {
            continue;
        }
        if !line.contains(DELIMITER as char) {
            return Err(ImportError::Format);
        }
        checked += 1;
    }
    if checked == 0 {
        return Err(ImportError::Format);
    }
    Ok(())
}

/// Parse every row of the file. A row without exactly two fields is a format
/// error naming its line.
pub fn read_rows(path: &Path) -> Result<Vec<ImportRow>, ImportError> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(DELIMITER)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = (idx + 1) as u64;
        let record = result.map_err(|_| ImportError::Format)?;
        if record.len() != 2 {
            return Err(ImportError::RowShape(line));
        }
        rows.push(ImportRow {
            old_path: record.get(0).unwrap_or_default().to_string(),
            new_path: record.get(1).unwrap_or_default().to_string(),
            line,
        });
    }
    Ok(rows)
}
