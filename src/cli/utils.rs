//! Convenience helpers for the binary.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};

/// Whether a failed run should hold the console open.
pub fn should_pause(debug: bool, no_pause: bool) -> bool {
    !debug && !no_pause && io::stdin().is_terminal()
}

/// Block until the user presses Enter.
pub fn pause_for_enter() -> Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "Press Enter to exit...").context("failed to write prompt")?;
    stdout.flush().context("failed to flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(())
}
