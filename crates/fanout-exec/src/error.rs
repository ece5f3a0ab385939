use camino::Utf8PathBuf;
use std::io;

/// Why a tool could not be run to completion. Reported as an invocation error outcome.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("project root does not exist: {0}")]
    MissingRoot(Utf8PathBuf),

    #[error("failed to start `{program}` in {root}: {source}")]
    Spawn {
        program: String,
        root: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` started without a captured {stream} pipe")]
    Capture {
        program: String,
        stream: &'static str,
    },
}
