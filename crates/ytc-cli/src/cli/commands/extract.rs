//! `ytc extract` – show what id each line yields, without any lookup.

use anyhow::Result;
use std::io::{self, Write};
use ytc_core::extract::extract_with_rule;

pub fn run_extract(lines: &[String]) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_extractions(&mut out, lines)?;
    Ok(())
}

/// One `<id>\t<rule>\t<input>` line per non-blank input; `-` when nothing matched.
pub(crate) fn write_extractions<W: Write>(out: &mut W, lines: &[String]) -> io::Result<()> {
    for line in lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        match extract_with_rule(line) {
            Some(ex) => writeln!(out, "{}\t{}\t{}", ex.id, ex.rule, line)?,
            None => writeln!(out, "-\t-\t{}", line)?,
        }
    }
    Ok(())
}
