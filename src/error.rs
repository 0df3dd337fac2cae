use thiserror::Error;
use tracing::{error, warn};

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: f64, height: f64 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("scale is not set")]
    ScaleNotSet,

    #[error("index {index} is out of range for {len} rows")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{kind} does not support {operation}()")]
    UnsupportedOperation {
        kind: &'static str,
        operation: &'static str,
    },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration problems reported through the non-throwing error channel.
///
/// Reporting never unwinds: the element that hit the problem skips its own
/// draw and the rest of the chart keeps rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ScaleNotSet,
    ContainerNotSet,
    InvalidZoomLevels,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ScaleNotSet => "scale_not_set",
            Self::ContainerNotSet => "container_not_set",
            Self::InvalidZoomLevels => "invalid_zoom_levels",
        }
    }
}

/// Programmer-misuse notices; the offending call is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    IgnoredInvalidValue,
    NotSuspended,
}

impl WarningCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IgnoredInvalidValue => "ignored_invalid_value",
            Self::NotSuspended => "not_suspended",
        }
    }
}

pub fn report_error(code: ErrorCode, source: &str) {
    error!(code = code.as_str(), source, "chart element reported an error");
}

pub fn report_warning(code: WarningCode, source: &str) {
    warn!(code = code.as_str(), source, "chart element reported a warning");
}
