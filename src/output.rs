//! Report hand-off: optional plain-text echo plus the URL-safe base64
//! framing expected by the support intake.

use std::fs::File;
use std::io::{self, IsTerminal, Write};

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;

/// Emit the report JSON.
///
/// The readable JSON is printed unless `quiet`; the encoded payload goes to
/// `out_path` when given, otherwise to stdout only when stdout is a TTY
/// (keeps piped output clean for scripts that pass their own file).
pub fn send_out(data: &str, quiet: bool, out_path: Option<&str>) -> Result<()> {
    if !quiet {
        println!("{}", data);
        println!();
    }

    let encoded = URL_SAFE.encode(data.as_bytes());

    if let Some(path) = out_path {
        let mut file =
            File::create(path).with_context(|| format!("creating output file {}", path))?;
        writeln!(file, "{}", encoded).with_context(|| format!("writing {}", path))?;
    } else if io::stdout().is_terminal() {
        println!("{}", encoded);
    }

    Ok(())
}
