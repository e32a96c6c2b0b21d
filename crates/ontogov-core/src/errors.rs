use ontogov_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using the structured error facility
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable for programmatic handling
/// and test assertions. Ambiguous matches are never errors; they travel as
/// near-match annotations inside reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Validation
    InvalidInput,
    DuplicateIdentity,
    InvalidTypeDescriptor,
    UnknownBindingTarget,

    // Governance gates
    UnresolvedConflict,
    CriticalDrift,

    // Configuration
    InvalidConfig,

    // Integration
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::DuplicateIdentity => "ERR_DUPLICATE_IDENTITY",
            ExErrorKind::InvalidTypeDescriptor => "ERR_INVALID_TYPE_DESCRIPTOR",
            ExErrorKind::UnknownBindingTarget => "ERR_UNKNOWN_BINDING_TARGET",
            ExErrorKind::UnresolvedConflict => "ERR_UNRESOLVED_CONFLICT",
            ExErrorKind::CriticalDrift => "ERR_CRITICAL_DRIFT",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Validation kinds describe malformed caller input
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ExErrorKind::InvalidInput
                | ExErrorKind::DuplicateIdentity
                | ExErrorKind::InvalidTypeDescriptor
                | ExErrorKind::UnknownBindingTarget
        )
    }
}

/// Canonical structured error type
///
/// Carries a classification plus optional context (operation, snapshot,
/// identity path, candidate identities, correlation ids).
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    snapshot: Option<String>,
    path: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    candidates: Option<Vec<String>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            snapshot: None,
            path: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            candidates: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the name of the snapshot the failure was found in
    pub fn with_snapshot(mut self, snapshot: impl Into<String>) -> Self {
        self.snapshot = Some(snapshot.into());
        self
    }

    /// Add the identity path of the offending element
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
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

    /// Add candidate identity paths (open conflict paths, critical bindings, ...)
    pub fn with_candidates(mut self, ids: Vec<String>) -> Self {
        self.candidates = Some(ids);
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

    pub fn snapshot(&self) -> Option<&str> {
        self.snapshot.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
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

    pub fn candidates(&self) -> Option<&[String]> {
        self.candidates.as_deref()
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
        if let Some(snapshot) = &self.snapshot {
            write!(f, " (snapshot: {})", snapshot)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain failure cases raised by the governance components
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GovernanceError {
    /// A name that must be non-empty was empty
    #[error("Empty name for {element} in snapshot {snapshot}")]
    EmptyName { snapshot: String, element: String },

    /// Two elements share one identity inside the same scope
    #[error("Duplicate identity {path} in snapshot {snapshot}")]
    DuplicateIdentity { snapshot: String, path: String },

    /// A name whose identity path cannot be told apart from another element's
    #[error("Ambiguous identity {path} in snapshot {snapshot}: {reason}")]
    AmbiguousName {
        snapshot: String,
        path: String,
        reason: String,
    },

    /// A type descriptor could not be parsed
    #[error("Malformed type descriptor '{descriptor}' at {path}: {reason}")]
    InvalidTypeDescriptor {
        path: String,
        descriptor: String,
        reason: String,
    },

    /// A binding names an entity or property absent from the snapshot
    #[error("Binding {binding} references unknown {target}")]
    UnknownBindingTarget { binding: String, target: String },

    /// A merge outcome was finalized while conflicts remained open
    #[error("{} merge conflict(s) remain unresolved", .paths.len())]
    UnresolvedConflicts { paths: Vec<String> },

    /// A drift report contains CRITICAL issues
    #[error("Critical drift detected on {} binding(s)", .bindings.len())]
    CriticalDrift { bindings: Vec<String> },

    /// Configuration value outside its permitted range
    #[error("Invalid configuration {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<GovernanceError> for ExError {
    fn from(err: GovernanceError) -> Self {
        let message = err.to_string();
        match err {
            GovernanceError::EmptyName { snapshot, element } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_snapshot(snapshot)
                    .with_path(element)
                    .with_message(message)
            }
            GovernanceError::DuplicateIdentity { snapshot, path } => {
                ExError::new(ExErrorKind::DuplicateIdentity)
                    .with_snapshot(snapshot)
                    .with_path(path)
                    .with_message(message)
            }
            GovernanceError::AmbiguousName { snapshot, path, .. } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_snapshot(snapshot)
                    .with_path(path)
                    .with_message(message)
            }
            GovernanceError::InvalidTypeDescriptor { path, .. } => {
                ExError::new(ExErrorKind::InvalidTypeDescriptor)
                    .with_path(path)
                    .with_message(message)
            }
            GovernanceError::UnknownBindingTarget { binding, .. } => {
                ExError::new(ExErrorKind::UnknownBindingTarget)
                    .with_path(binding)
                    .with_message(message)
            }
            GovernanceError::UnresolvedConflicts { paths } => {
                ExError::new(ExErrorKind::UnresolvedConflict)
                    .with_op("finalize")
                    .with_message(message)
                    .with_candidates(paths)
            }
            GovernanceError::CriticalDrift { bindings } => ExError::new(ExErrorKind::CriticalDrift)
                .with_op("ensure_no_critical")
                .with_message(message)
                .with_candidates(bindings),
            GovernanceError::InvalidConfig { field, .. } => ExError::new(ExErrorKind::InvalidConfig)
                .with_path(field)
                .with_message(message),
            GovernanceError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to GovernanceError
impl From<serde_json::Error> for GovernanceError {
    fn from(err: serde_json::Error) -> Self {
        GovernanceError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        GovernanceError::from(err).into()
    }
}
