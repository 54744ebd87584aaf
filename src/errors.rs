use std::process::ExitStatus;
use thiserror::Error;

/// Fatal build failures. Every variant terminates the pipeline immediately:
/// there are no retries and no rollback of partially written staging files.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A required SDK/toolchain prerequisite is missing from the host.
    #[error("{0}")]
    Environment(String),

    /// A required configuration field is missing or malformed.
    #[error("Config error: {0}")]
    Config(String),

    /// An external toolchain process exited nonzero.
    #[error("{tool} failed ({status})")]
    ToolInvocation { tool: String, status: ExitStatus },

    /// An archive entry would resolve outside the extraction directory.
    #[error("archive entry '{0}' escapes the destination directory")]
    PathTraversal(String),

    /// A stage input produced by an earlier, externally-run stage is absent.
    #[error("{0}")]
    Precondition(String),
}
