use std::fmt;

#[derive(Debug)]
pub enum FolioError {
    /// A table that needs first-row introspection was given no records.
    EmptyInput(String),
    ColumnMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },
    LayoutOverflow(String),
    AssetMissing(String),
    InvalidConfiguration(String),
    Io(std::io::Error),
}

impl fmt::Display for FolioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolioError::EmptyInput(message) => write!(f, "empty input: {}", message),
            FolioError::ColumnMismatch {
                table,
                expected,
                actual,
            } => write!(
                f,
                "column mismatch in {} table: expected {} columns, got {}",
                table, expected, actual
            ),
            FolioError::LayoutOverflow(message) => {
                write!(f, "content cannot be placed within page bounds: {}", message)
            }
            FolioError::AssetMissing(message) => write!(f, "asset missing: {}", message),
            FolioError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            FolioError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for FolioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FolioError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FolioError {
    fn from(value: std::io::Error) -> Self {
        FolioError::Io(value)
    }
}
