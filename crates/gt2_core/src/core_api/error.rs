use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorCode {
    Io,
    Parse,
    OutOfBounds,
    MalformedHex,
    UnknownField,
    InvalidIndex,
    InvalidValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreError {
    pub code: CoreErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn out_of_bounds(offset: usize, len: usize, buffer_len: usize) -> Self {
        Self::new(
            CoreErrorCode::OutOfBounds,
            format!(
                "access {offset}..{} exceeds buffer of {buffer_len} bytes",
                offset.saturating_add(len)
            ),
        )
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for CoreError {}
