//! Output formatting: `human` (plain, operator-facing) or `json`
//! (machine-readable), selected by the top-level `--format` flag.

use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

pub trait Render: Serialize {
    fn render_human(&self) -> String;
}

pub fn write_output<T: Render>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match format {
        OutputFormat::Human => writeln!(handle, "{}", value.render_human())?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut handle, value)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}
