use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShrinkageError {
    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Table '{table}', line {line}: cannot parse date '{value}'")]
    DateParse {
        table: String,
        line: u64,
        value: String,
    },

    #[error("Table '{table}', line {line}: cannot parse quantity '{value}' in column '{column}'")]
    QuantityParse {
        table: String,
        line: u64,
        column: String,
        value: String,
    },

    #[error("Table '{table}' contains key '{key}' more than once")]
    DuplicateKey { table: String, key: String },

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ShrinkageError>;
