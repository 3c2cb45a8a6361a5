use std::{io, path::PathBuf};

/// Unrecoverable runtime failure.
///
/// Nothing inside the runtime catches these: every fallible operation hands
/// them straight back to the embedder, and a runtime that produced one must
/// not be used again.
#[derive(Debug, thiserror::Error)]
pub enum Fatal {
    #[error("{op}: expected {expected}, found {found}")]
    TypeMismatch {
        op: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("failed to find key='{0}' in environment")]
    Unbound(String),
    #[error("value stack underflow")]
    StackUnderflow,
    #[error("end of input: could not read()")]
    UnexpectedEof,
    #[error("expected data following a quote form")]
    DanglingQuote,
    #[error("expected a name after '{0}'")]
    EmptyDirective(char),
    #[error("object table exhausted: all {capacity} slots are live after collection")]
    Exhausted { capacity: usize },
    #[error("{op}: {message}")]
    InvalidArgument { op: &'static str, message: String },
    #[error("failed to open file '{}': {source}", path.display())]
    Load { path: PathBuf, source: io::Error },
    #[error("output error: {0}")]
    Output(#[from] io::Error),
}

pub type FatalResult<T = ()> = Result<T, Fatal>;
