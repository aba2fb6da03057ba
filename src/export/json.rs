use anyhow::Result;
use std::io::Write;

use crate::state::TraceResult;

/// Export a trace result as pretty-printed JSON
pub fn export_json<W: Write>(result: &TraceResult, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, result)?;
    writeln!(writer)?;
    Ok(())
}
