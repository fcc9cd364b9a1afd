use std::path::Path;

use oatlink_linker::LinkPlan;

use super::CliError;

/// Read and parse a JSON link plan.
pub fn load_plan(path: &Path) -> Result<LinkPlan, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Plan {
        path: path.to_path_buf(),
        source,
    })
}
