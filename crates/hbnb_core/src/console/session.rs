//! Line-oriented session loop.
//!
//! # Invariants
//! - One line is executed to completion before the next is read.
//! - A line that is not valid UTF-8 is still executed, with replacement
//!   characters, and never ends the session.
//! - `quit`, `EOF` and end of input all end the session normally.
//! - Non-interactive sessions end with one blank line so scripted callers
//!   get predictable output framing.

use super::dispatcher::{CommandOutcome, Console, ConsoleError, ConsoleResult};
use crate::storage::RecordStore;
use log::info;
use std::io::{BufRead, Write};

pub const PROMPT: &str = "(hbnb) ";

/// Reads commands from `input` until the session ends.
///
/// The prompt is only written when `interactive` is set.
pub fn run_session<S: RecordStore>(
    console: &Console<'_, S>,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
    interactive: bool,
) -> ConsoleResult<()> {
    info!("event=session_start module=console interactive={interactive}");
    let mut executed = 0usize;
    let mut buffer = Vec::new();

    loop {
        if interactive {
            write!(out, "{PROMPT}")?;
            out.flush()?;
        }

        buffer.clear();
        if input
            .read_until(b'\n', &mut buffer)
            .map_err(ConsoleError::Input)?
            == 0
        {
            if interactive {
                writeln!(out)?;
            }
            break;
        }

        executed += 1;
        // Invalid UTF-8 is replaced so the line fails validation on its own.
        let line = String::from_utf8_lossy(&buffer);
        if console.execute_line(&line, out)? == CommandOutcome::Quit {
            break;
        }
        out.flush()?;
    }

    if !interactive {
        writeln!(out)?;
    }
    out.flush()?;
    info!("event=session_end module=console commands={executed}");
    Ok(())
}
