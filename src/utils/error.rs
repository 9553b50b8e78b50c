use thiserror::Error;

/// 外部查詢 (directory / weather) 的失敗，在 resolver 邊界就轉換好
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("zipcode not found")]
    NotFound,

    #[error("{message}")]
    Transport { message: String },
}

impl LookupError {
    pub fn transport(message: impl Into<String>) -> Self {
        LookupError::Transport {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{message}")]
    MalformedInput { message: String },

    #[error("invalid zipcode")]
    InvalidFormat,

    #[error("zip code not found")]
    LocationNotFound,

    #[error("{message}")]
    UpstreamFailure { status: u16, message: String },

    #[error("{message}")]
    UpstreamMalformed { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

impl PipelineError {
    pub fn malformed_input(message: impl Into<String>) -> Self {
        PipelineError::MalformedInput {
            message: message.into(),
        }
    }

    /// 預設 500 的上游錯誤
    pub fn upstream(message: impl Into<String>) -> Self {
        PipelineError::UpstreamFailure {
            status: 500,
            message: message.into(),
        }
    }

    /// 對外回應使用的 HTTP 狀態碼
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::MalformedInput { .. } => 400,
            PipelineError::InvalidFormat => 422,
            PipelineError::LocationNotFound => 404,
            PipelineError::UpstreamFailure { status, .. } => *status,
            _ => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
