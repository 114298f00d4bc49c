//! JSON output of the workitem outcomes.
//!
//! One file per run, holding an array with one entry per input workitem in
//! input order:
//!
//! ```text
//! output_dir/
//! └── workitems_output.json
//! ```

use crate::models::WorkItemOutcome;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Name of the outcomes file inside the output directory.
pub const OUTCOMES_FILE: &str = "workitems_output.json";

/// Write `outcomes` as pretty-printed JSON to `<output_dir>/workitems_output.json`.
///
/// Returns the path of the written file.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), outcomes = outcomes.len()))]
pub async fn write_outcomes(
    outcomes: &[WorkItemOutcome],
    output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(outcomes)?;

    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(error = %e, "Failed to create output dir");
        return Err(e.into());
    }

    let path = output_dir.join(OUTCOMES_FILE);
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote workitem outcomes");

    Ok(path)
}
