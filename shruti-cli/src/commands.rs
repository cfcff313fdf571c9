//! Control commands read from stdin while listening.

use anyhow::{Result, anyhow, bail};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `tonic <hz>`: move Sa.
    SetTonic(f64),
    /// `raga`: print the current raga context.
    Raga,
    /// `history`: print the detection history.
    History,
    /// `quit`: stop listening.
    Quit,
}

/// Parses one input line. Blank lines yield `Ok(None)`.
#[cfg_attr(not(feature = "capture"), allow(dead_code))]
pub fn parse(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "tonic" | "sa" => {
            let value = words.next().ok_or_else(|| anyhow!("usage: tonic <hz>"))?;
            let hz: f64 = value
                .parse()
                .map_err(|_| anyhow!("not a frequency: {value}"))?;
            Command::SetTonic(hz)
        }
        "raga" => Command::Raga,
        "history" => Command::History,
        "quit" | "exit" | "q" => Command::Quit,
        other => bail!("unknown command: {other}"),
    };

    if let Some(extra) = words.next() {
        bail!("unexpected argument: {extra}");
    }
    Ok(Some(command))
}
