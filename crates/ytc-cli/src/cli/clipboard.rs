//! Clipboard via an external helper (wl-copy, xclip, xsel, pbcopy).
//!
//! The helper comes from `[clipboard]` in config when set, otherwise the
//! first known helper found on PATH. Detection happens on first write, so a
//! run with nothing to copy never needs a helper.

use std::io::Write;
use std::process::{Command, Stdio};
use ytc_core::config::ClipboardConfig;
use ytc_core::export::{ClipboardError, ClipboardSink};

/// Known helpers in lookup order. `wl-copy` only under Wayland.
fn candidates(wayland: bool) -> Vec<ClipboardConfig> {
    let mut out = Vec::new();
    if wayland {
        out.push(helper("wl-copy", &[]));
    }
    out.push(helper("xclip", &["-selection", "clipboard"]));
    out.push(helper("xsel", &["--clipboard", "--input"]));
    out.push(helper("pbcopy", &[]));
    out
}

fn helper(command: &str, args: &[&str]) -> ClipboardConfig {
    ClipboardConfig {
        command: command.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
    }
}

fn detect() -> Result<ClipboardConfig, ClipboardError> {
    let wayland = std::env::var_os("WAYLAND_DISPLAY").is_some();
    let list = candidates(wayland);
    list.iter()
        .find(|c| which::which(&c.command).is_ok())
        .cloned()
        .ok_or_else(|| {
            let tried: Vec<&str> = list.iter().map(|c| c.command.as_str()).collect();
            ClipboardError::NoBackend(tried.join(", "))
        })
}

pub struct CommandClipboard {
    helper: Option<ClipboardConfig>,
}

impl CommandClipboard {
    /// `configured` wins over PATH detection.
    pub fn new(configured: Option<ClipboardConfig>) -> Self {
        Self { helper: configured }
    }
}

impl ClipboardSink for CommandClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let helper = match &self.helper {
            Some(h) => h.clone(),
            None => {
                let h = detect()?;
                self.helper = Some(h.clone());
                h
            }
        };
        tracing::debug!(command = %helper.command, "writing to clipboard");
        pipe_to(&helper, text)
    }
}

fn pipe_to(helper: &ClipboardConfig, text: &str) -> Result<(), ClipboardError> {
    let spawn_err = |source| ClipboardError::Spawn {
        program: helper.command.clone(),
        source,
    };
    let mut child = Command::new(&helper.command)
        .args(&helper.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(spawn_err)?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes()).map_err(spawn_err)?;
    }
    let status = child.wait().map_err(spawn_err)?;
    if !status.success() {
        return Err(ClipboardError::Exit {
            program: helper.command.clone(),
            status: status.to_string(),
        });
    }
    Ok(())
}
