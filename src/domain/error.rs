//! Domain error types.

/// Top-level error type for fxsim.
#[derive(Debug, thiserror::Error)]
pub enum FxsimError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("data store query error: {reason}")]
    DataQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("invalid strategy parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("no candles for {instrument} at {granularity}")]
    NoData {
        instrument: String,
        granularity: String,
    },

    #[error("insufficient candles for {instrument}: have {bars}, need {minimum}")]
    InsufficientData {
        instrument: String,
        bars: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&FxsimError> for std::process::ExitCode {
    fn from(err: &FxsimError) -> Self {
        let code: u8 = match err {
            FxsimError::Io(_) => 1,
            FxsimError::ConfigParse { .. }
            | FxsimError::ConfigMissing { .. }
            | FxsimError::ConfigInvalid { .. } => 2,
            FxsimError::Data { .. } | FxsimError::DataQuery { .. } => 3,
            FxsimError::UnknownStrategy { .. } | FxsimError::InvalidParameter { .. } => 4,
            FxsimError::NoData { .. } | FxsimError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
