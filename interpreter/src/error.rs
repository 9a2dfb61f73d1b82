use drawl_core::Token;
use thiserror::Error;

/// The single fatal error surface. Whatever goes wrong — an unclassifiable
/// character, a token the grammar did not expect, a degenerate loop step —
/// the caller sees one descriptive message and must treat the whole run as
/// failed, discarding partial output.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum Error {
    #[error("line {line}: {lexeme} {msg}")]
    Syntax {
        line: usize,
        lexeme: String,
        msg: String,
    },

    #[error("line {line}: {name} loop step must not be zero")]
    ZeroStep { line: usize, name: String },
}

impl Error {
    pub(crate) fn syntax(token: &Token, msg: &str) -> Self {
        Error::Syntax {
            line: token.line,
            lexeme: token.lexeme.clone(),
            msg: String::from(msg),
        }
    }

    pub(crate) fn zero_step(line: usize, name: &str) -> Self {
        Error::ZeroStep {
            line,
            name: String::from(name),
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Error::Syntax { line, .. } => *line,
            Error::ZeroStep { line, .. } => *line,
        }
    }
}
