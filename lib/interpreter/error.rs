use thiserror::Error;

/// Everything that can stop a Breeze program at run time.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("undefined function: {0}")]
    UndefinedFunction(String),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("index {index} out of range for '{name}' of length {length}")]
    IndexOutOfRange {
        name: String,
        index: i32,
        length: usize,
    },
    #[error("invalid slice range [{start}:{end}] for '{name}'")]
    InvalidSliceRange { name: String, start: i32, end: i32 },
    #[error("function '{0}' is already defined")]
    FunctionRedefinition(String),
    #[error("unknown operator: {0}")]
    UnknownOperator(String),
    #[error("memory allocation failed")]
    AllocationFailure,
    #[error("wrong number of arguments for {name}: want={expected}, got={found}")]
    WrongArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("{0} outside of a loop")]
    ControlOutsideLoop(&'static str),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EvalResult<T> = Result<T, EvalError>;
