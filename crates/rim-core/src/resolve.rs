//! Conflict resolution strategies.
//!
//! A conflict is an existing mapping whose stored target differs from the
//! incoming row. The orchestrator asks an injected [`ConflictResolver`]
//! whether to overwrite; interactive prompting is one strategy among others,
//! not wired into the import loop itself.

use crate::store::RedirectRecord;
use std::io::{self, BufRead, BufReader, Write};

pub trait ConflictResolver {
    /// Decide whether `existing.new_path` should be replaced with `proposed`.
    /// Called only when the two differ.
    fn resolve(&mut self, existing: &RedirectRecord, proposed: &str) -> io::Result<bool>;
}

/// Force-change behavior: always overwrite.
pub struct AlwaysOverwrite;

impl ConflictResolver for AlwaysOverwrite {
    fn resolve(&mut self, _existing: &RedirectRecord, _proposed: &str) -> io::Result<bool> {
        Ok(true)
    }
}

/// Keep every existing mapping untouched.
pub struct AlwaysSkip;

impl ConflictResolver for AlwaysSkip {
    fn resolve(&mut self, _existing: &RedirectRecord, _proposed: &str) -> io::Result<bool> {
        Ok(false)
    }
}

/// Ask on an interactive channel; only an explicit `y` overwrites.
/// Blank input, anything else, or EOF refuses.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl Prompt<BufReader<io::Stdin>, io::Stdout> {
    /// Interactive resolver on stdin/stdout for CLI use.
    pub fn stdio() -> Self {
        Prompt {
            input: BufReader::new(io::stdin()),
            output: io::stdout(),
        }
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompt { input, output }
    }
}

impl<R: BufRead, W: Write> ConflictResolver for Prompt<R, W> {
    fn resolve(&mut self, existing: &RedirectRecord, proposed: &str) -> io::Result<bool> {
        writeln!(
            self.output,
            "Redirect {} ---> {} exists. Change to {} ---> {} ?",
            existing.old_path, existing.new_path, existing.old_path, proposed
        )?;
        write!(
            self.output,
            "\"y\" for Yes or \"n\" for No (leave blank for \"n\"): "
        )?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(answer.trim() == "y")
    }
}
