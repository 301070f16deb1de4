use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// Environment variable selecting where an instrumented program writes its trace
pub const TRACE_OUTPUT_ENV: &str = "GOCOVOUT";

/// Destination of trace events
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TraceSink {
    /// No trace is written
    #[default]
    Disabled,

    /// Standard output
    Stdout,

    /// A file, created or truncated on open
    File(PathBuf),
}

impl TraceSink {
    /// `""` disables tracing, `"-"` selects stdout, anything else is a path.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "" => Self::Disabled,
            "-" => Self::Stdout,
            path => Self::File(PathBuf::from(path)),
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(TRACE_OUTPUT_ENV).map_or(Self::Disabled, |value| Self::parse(&value))
    }

    /// Open the destination; `None` when tracing is disabled.
    pub fn open(&self) -> io::Result<Option<Box<dyn Write + Send>>> {
        Ok(match self {
            Self::Disabled => None,
            Self::Stdout => Some(Box::new(io::stdout())),
            Self::File(path) => {
                log::debug!("writing trace to {}", path.display());
                Some(Box::new(BufWriter::new(File::create(path)?)))
            }
        })
    }
}
