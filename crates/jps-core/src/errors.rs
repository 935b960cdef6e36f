use jps_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code. The guest cache logs this code when
/// it swallows a failure on the UI path, so codes must never be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Validation
    InvalidInput,
    NotFound,

    // Persisted data
    /// A stored record could not be decoded as any known shape
    InvalidRecord,
    /// Stored history matches neither the current nor the legacy layout
    UnknownFormat,

    // Storage/IO
    Storage,
    /// The backing store refused a write because it is full
    QuotaExceeded,
    Serialization,
    Io,

    // Session
    /// No timer runtime is available to schedule the save prompt
    SchedulerUnavailable,

    // Remote collaborators
    ExternalService,
    Unauthorised,

    // Configuration
    Config,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InvalidRecord => "ERR_INVALID_RECORD",
            ExErrorKind::UnknownFormat => "ERR_UNKNOWN_FORMAT",
            ExErrorKind::Storage => "ERR_STORAGE",
            ExErrorKind::QuotaExceeded => "ERR_QUOTA_EXCEEDED",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::SchedulerUnavailable => "ERR_SCHEDULER_UNAVAILABLE",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::Unauthorised => "ERR_UNAUTHORISED",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Classification fields for programmatic handling plus free-form context
/// (storage key, report id, correlation ids) for the logs.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    key: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            key: None,
            entity_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the storage key involved
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add entity (report) id context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {})", key)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(source) = &self.source {
            write!(f, " <- {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain failures of the guest cache, migration and configuration layers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JpsError {
    /// The backing store could not be reached or refused the operation
    #[error("Storage unavailable for key {key}: {reason}")]
    StoreUnavailable { key: String, reason: String },

    /// The backing store is full
    #[error("Storage quota exceeded while writing key {key}")]
    QuotaExceeded { key: String },

    /// A stored record is not valid JSON or has the wrong shape
    #[error("Corrupt record under key {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    /// Stored history is neither the current nor the legacy layout
    #[error("Unrecognised history format under key {key}")]
    UnrecognisedHistoryFormat { key: String },

    /// A record could not be encoded for storage
    #[error("Failed to serialize record for key {key}: {reason}")]
    EncodeFailed { key: String, reason: String },

    /// No cached report with this id
    #[error("Report not found: {report_id}")]
    ReportNotFound { report_id: String },

    /// The remote account store rejected a migrated report
    #[error("Migration rejected by remote store: {reason}")]
    MigrationRejected { reason: String },

    /// The caller is not signed in (or the token was refused)
    #[error("Not authorised: {reason}")]
    NotAuthorised { reason: String },

    /// Configuration failed to parse or validate
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Conversion from JpsError to ExError
impl From<JpsError> for ExError {
    fn from(err: JpsError) -> Self {
        match err {
            JpsError::StoreUnavailable { key, reason } => ExError::new(ExErrorKind::Storage)
                .with_key(key)
                .with_message(reason),

            JpsError::QuotaExceeded { key } => ExError::new(ExErrorKind::QuotaExceeded)
                .with_key(key)
                .with_message("Storage quota exceeded"),

            JpsError::CorruptRecord { key, reason } => ExError::new(ExErrorKind::InvalidRecord)
                .with_key(key)
                .with_message(reason),

            JpsError::UnrecognisedHistoryFormat { key } => {
                ExError::new(ExErrorKind::UnknownFormat)
                    .with_key(key)
                    .with_message("History matches neither the current nor the legacy format")
            }

            JpsError::EncodeFailed { key, reason } => ExError::new(ExErrorKind::Serialization)
                .with_key(key)
                .with_message(reason),

            JpsError::ReportNotFound { report_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(report_id)
                .with_message("Report not found"),

            JpsError::MigrationRejected { reason } => {
                ExError::new(ExErrorKind::ExternalService)
                    .with_op("migrate_guest_report")
                    .with_message(reason)
            }

            JpsError::NotAuthorised { reason } => {
                ExError::new(ExErrorKind::Unauthorised).with_message(reason)
            }

            JpsError::InvalidConfig { reason } => {
                ExError::new(ExErrorKind::Config).with_message(reason)
            }
        }
    }
}
