use thiserror::Error;

/// Failure to evaluate a local override expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character '{0}' at {1}")]
    UnexpectedChar(char, usize),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unbalanced parenthesis at {0}")]
    Unbalanced(usize),

    #[error("malformed number '{0}'")]
    Number(String),

    #[error("unknown variable '${0}'")]
    UnknownVariable(String),

    #[error("variable '${0}' is defined recursively")]
    Recursive(String),

    #[error("result is not finite")]
    NotFinite,

    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("expression expands more than {0} variables")]
    TooComplex(usize),
}

pub type ExprResult<T> = Result<T, ExprError>;

/// Failure to load or apply a configuration document.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Invalid window '{0}', expected \"start,required\"")]
    InvalidWindow(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
