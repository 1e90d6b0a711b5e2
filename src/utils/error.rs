use thiserror::Error;

/// Artifact could not be supplied. Fatal: no analytics view may run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Model artifact not found: {location}")]
    NotFound { location: String },

    #[error("Model artifact is corrupt ({location}): {reason}")]
    Corrupt { location: String, reason: String },

    #[error("Model artifact could not be read ({location}): {reason}")]
    Unavailable { location: String, reason: String },
}

impl LoadError {
    pub fn corrupt(location: &str, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            location: location.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    #[error("Unknown country '{country}': not part of the fitted vocabulary")]
    UnknownCountry { country: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Feature encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Shape mismatch: model expects {expected} features per row, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Model returned {actual} predictions for a batch of {expected} rows")]
    OutputLength { expected: usize, actual: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Invalid month {month}: must be between 1 and 12")]
    InvalidMonth { month: u32 },

    #[error("Empty year range: series would end at {end}, before the historical floor {floor}")]
    EmptyYearRange { floor: i32, end: i32 },

    #[error("Target year {year} is after the latest supported year {max}")]
    TargetYearTooLate { year: i32, max: i32 },
}

/// Recoverable failure surfaced at the analytics view boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid query: {0}")]
    Query(#[from] QueryError),

    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("Result unavailable: {reason}")]
    DegenerateResult { reason: String },
}

impl From<EncodingError> for AnalyticsError {
    fn from(err: EncodingError) -> Self {
        AnalyticsError::Inference(InferenceError::Encoding(err))
    }
}

impl AnalyticsError {
    pub fn is_unknown_country(&self) -> bool {
        matches!(
            self,
            AnalyticsError::Inference(InferenceError::Encoding(
                EncodingError::UnknownCountry { .. }
            ))
        )
    }
}

#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("Artifact error: {0}")]
    Load(#[from] LoadError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV output error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Artifact,
    Query,
    Inference,
    Configuration,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EstimatorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EstimatorError::Load(_) => ErrorCategory::Artifact,
            EstimatorError::Analytics(AnalyticsError::Query(_)) => ErrorCategory::Query,
            EstimatorError::Analytics(_) => ErrorCategory::Inference,
            EstimatorError::IoError(_)
            | EstimatorError::SerializationError(_)
            | EstimatorError::CsvError(_) => ErrorCategory::Output,
            EstimatorError::ConfigError { .. }
            | EstimatorError::InvalidConfigValueError { .. }
            | EstimatorError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Artifact => ErrorSeverity::Critical,
            ErrorCategory::Configuration | ErrorCategory::Output => ErrorSeverity::High,
            ErrorCategory::Query | ErrorCategory::Inference => ErrorSeverity::Medium,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EstimatorError::Load(LoadError::NotFound { .. }) => {
                "Check the artifact location, or generate one with `generate_artifact`"
            }
            EstimatorError::Load(LoadError::Corrupt { .. }) => {
                "Re-export the artifact with a matching format version"
            }
            EstimatorError::Load(LoadError::Unavailable { .. }) => {
                "Check file permissions or network access to the artifact location"
            }
            EstimatorError::Analytics(err) if err.is_unknown_country() => {
                "Run the `countries` command to list the supported countries"
            }
            EstimatorError::Analytics(AnalyticsError::Query(_)) => {
                "Check the requested month and year"
            }
            EstimatorError::Analytics(_) => "Try a different country or date",
            EstimatorError::IoError(_)
            | EstimatorError::SerializationError(_)
            | EstimatorError::CsvError(_) => "Check that stdout is writable",
            EstimatorError::ConfigError { .. }
            | EstimatorError::InvalidConfigValueError { .. }
            | EstimatorError::MissingConfigError { .. } => {
                "Fix the configuration file or command line flags"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EstimatorError::Load(err) => format!("The price model could not be loaded: {}", err),
            EstimatorError::Analytics(err) => format!("Calculation failed: {}", err),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EstimatorError>;
