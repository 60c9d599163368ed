//! Native sass integration.
//!
//! Invokes the system `sass` binary over stdin/stdout to implement the
//! [`StyleCompiler`] collaborator for CLI and desktop builds.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::Result;
use crate::render::{CompileOutput, StyleCompiler};

/// Check if sass is available on PATH.
pub fn is_sass_available() -> bool {
    Command::new("sass")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

/// Get the sass version string (first line of `sass --version`).
pub fn sass_version() -> Option<String> {
    Command::new("sass")
        .arg("--version")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .and_then(|s| s.lines().next().map(|l| l.to_string()))
}

/// Print installation instructions for sass.
pub fn print_install_instructions() {
    eprintln!("sass is not installed or not found on PATH.");
    eprintln!();
    eprintln!("To install sass:");
    eprintln!("  macOS:   brew install sass/sass/sass");
    eprintln!("  npm:     npm install -g sass");
    eprintln!("  Other:   https://sass-lang.com/install/");
}

/// [`StyleCompiler`] backed by the system `sass` binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct SassBinary;

impl StyleCompiler for SassBinary {
    fn compile(&self, source: &str) -> Result<CompileOutput> {
        let mut child = Command::new("sass")
            .arg("--stdin")
            .arg("--indented=false")
            .arg("--no-source-map")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // stdin is piped, so take() cannot fail here
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(source.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        let status = output.status.code().unwrap_or(-1);
        let text = if status == 0 {
            String::from_utf8_lossy(&output.stdout).into_owned()
        } else {
            String::from_utf8_lossy(&output.stderr).into_owned()
        };

        Ok(CompileOutput { status, text })
    }
}
