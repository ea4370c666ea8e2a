use {
    serde::{Deserialize, Serialize},
    std::fmt::{self, Display, Formatter},
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum Error {
    /// The relayer could not be reached, failed internally or asked us to
    /// slow down. `status` is `None` when no response was received at all.
    /// Safe to retry.
    #[error("relayer unavailable (status {status:?}): {body}")]
    Unavailable { status: Option<u16>, body: String },

    /// The relayer refused the request. Retrying the same request will not
    /// change the outcome.
    #[error("relayer rejected request: {0}")]
    Rejected(Rejection),

    #[error("unexpected relayer response: {source}: {body}")]
    InvalidResponse {
        source: serde_json::Error,
        body: String,
    },
}

impl Error {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// SRA v2 error codes are numeric, but relayers in the wild also answer with
/// symbolic names.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Number(u64),
    Name(String),
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(code) => write!(f, "{code}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub field: String,
    pub code: ErrorCode,
    #[serde(default)]
    pub reason: String,
}

/// A structured rejection as described by the SRA v2 error format.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    #[serde(skip)]
    pub status: u16,
    pub code: Option<ErrorCode>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub validation_errors: Vec<ValidationError>,
}

impl Rejection {
    /// Parses a rejection body, keeping unstructured bodies as the reason.
    pub fn parse(status: u16, body: &str) -> Self {
        match serde_json::from_str::<Rejection>(body) {
            Ok(rejection) => Self { status, ..rejection },
            Err(_) => Self {
                status,
                code: None,
                reason: body.to_owned(),
                validation_errors: Vec::new(),
            },
        }
    }
}

impl Display for Rejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "status {}", self.status)?;
        if let Some(code) = &self.code {
            write!(f, ", code {code}")?;
        }
        if !self.reason.is_empty() {
            write!(f, ", {}", self.reason)?;
        }
        for error in &self.validation_errors {
            write!(f, "; {}: {} ({})", error.field, error.reason, error.code)?;
        }
        Ok(())
    }
}
