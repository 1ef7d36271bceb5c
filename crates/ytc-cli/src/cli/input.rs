//! Gather input lines from a file, stdin and `--url` flags.

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Lines from `file` (or stdin) followed by `urls`.
///
/// Stdin is read when `file` is `-`, or when no file and no `--url` were given.
pub fn collect_lines(file: Option<&Path>, urls: &[String]) -> Result<Vec<String>> {
    let text = match file {
        Some(p) if p == Path::new("-") => read_stdin()?,
        Some(p) => fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?,
        None if urls.is_empty() => read_stdin()?,
        None => String::new(),
    };
    Ok(merge(&text, urls))
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("read stdin")?;
    Ok(text)
}

fn merge(text: &str, urls: &[String]) -> Vec<String> {
    text.lines()
        .map(str::to_string)
        .chain(urls.iter().cloned())
        .collect()
}
