//! Result and status lines for the terminal.

use std::path::Path;

use bytesize::ByteSize;
use console::style;

use crate::cipher::{Mode, Preview};
use crate::types::{CipherConfiguration, Processing};

pub fn show_success(processing: Processing, path: &Path, size: u64) {
    println!();
    println!("{} {}", style("✓").green(), style(format!("File {} successfully: {} ({})", processing.done_label(), path.display(), ByteSize::b(size))).bold());
}

pub fn show_failure(message: &str) {
    eprintln!("{} {}", style("✗").red(), style(message).red().bold());
}

pub fn show_cancelled(path: &Path) {
    eprintln!("{} {}", style("!").yellow(), style(format!("Cancelled; partial output removed: {}", path.display())).yellow());
}

pub fn show_configuration(config: &CipherConfiguration) {
    println!("{} {} | {} | {} iterations", style("•").cyan(), style(config.mode()).bold(), config.key_size(), config.iterations());
}

/// Salt and key fingerprint of the running operation. Both are safe to show.
pub fn artifacts_line(salt: &str, fingerprint: &str) -> String {
    format!("{} salt {}  key fingerprint {}", style("•").cyan(), style(salt).dim(), style(fingerprint).dim())
}

pub fn show_preview(preview: &Preview) {
    println!("{} {}", style("salt").bold(), preview.salt_hex());
    println!("{} {}", style("hash").bold(), preview.hash);
    println!("{}", style("Display only: a single PBKDF2 iteration, never used as a key.").dim());
}

/// CTR has no integrity check, so a wrong password cannot be reported.
pub fn show_mode_warning(mode: Mode) {
    if !mode.detects_wrong_key() {
        eprintln!("{} {}", style("!").yellow(), style(format!("{mode} cannot detect a wrong password or tampering; a wrong password produces garbage output.")).yellow());
    }
}
