use std::io;
use std::path::PathBuf;

use oatlink_format::FormatError;
use oatlink_linker::LinkError;

/// Failures reported by CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("invalid plan {}: {source}", path.display())]
    Plan {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid image {}: {source}", path.display())]
    Image { path: PathBuf, source: FormatError },
    #[error("link failed: {0}")]
    Link(#[from] LinkError),
    #[error(transparent)]
    Format(#[from] FormatError),
}
