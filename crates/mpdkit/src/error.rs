use thiserror::Error;

/// Why an element could not be mapped onto its typed node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseReason {
    MissingAttribute(String),
    MissingChild(String),
    TooManyChildren(String),
    InvalidValue {
        attribute: String,
        value: String,
        expected: String,
    },
    UnexpectedElement {
        expected: String,
        found: String,
    },
    Malformed(String),
}

impl std::fmt::Display for ParseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAttribute(name) => write!(f, "missing required attribute @{name}"),
            Self::MissingChild(name) => write!(f, "missing required child <{name}>"),
            Self::TooManyChildren(name) => write!(f, "too many <{name}> children"),
            Self::InvalidValue {
                attribute,
                value,
                expected,
            } => write!(f, "@{attribute}={value:?} is not a valid {expected}"),
            Self::UnexpectedElement { expected, found } => {
                write!(f, "expected <{expected}>, found <{found}>")
            }
            Self::Malformed(reason) => f.write_str(reason),
        }
    }
}

/// Why a well-formed document breaks a semantic rule of the MPD schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    DuplicateId { scope: String, id: String },
    ConflictingAddressing { found: Vec<&'static str> },
    DynamicOnly { attribute: String },
    Constraint(String),
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId { scope, id } => write!(f, "duplicate id {id:?} within {scope}"),
            Self::ConflictingAddressing { found } => {
                write!(f, "more than one addressing scheme declared: {}", found.join(", "))
            }
            Self::DynamicOnly { attribute } => {
                write!(f, "@{attribute} is only allowed in a dynamic presentation")
            }
            Self::Constraint(reason) => f.write_str(reason),
        }
    }
}

/// Coarse category of an [`MpdError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Invalid,
    Range,
    Fetch,
    Other,
}

#[derive(Error, Debug)]
pub enum MpdError {
    #[error("parse error in <{element}>: {reason}")]
    Parse {
        element: String,
        reason: ParseReason,
    },

    #[error("invalid MPD at <{element}>: {reason}")]
    Invalid {
        element: String,
        reason: InvalidReason,
    },

    #[error("{what} {value} is out of range (valid: {valid})")]
    Range {
        what: &'static str,
        value: String,
        valid: String,
    },

    #[error("failed to fetch {uri}: {reason}")]
    Fetch { uri: String, reason: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("no element matches selector {0:?}")]
    NotFound(String),

    #[error("can not resolve an absolute URL for {0:?}")]
    UnresolvableUrl(String),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[cfg(feature = "xml")]
    #[error("xml error: {0}")]
    Xml(String),
}

impl MpdError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Invalid { .. } => ErrorKind::Invalid,
            Self::Range { .. } => ErrorKind::Range,
            Self::Fetch { .. } | Self::Cancelled => ErrorKind::Fetch,
            _ => ErrorKind::Other,
        }
    }

    pub(crate) fn parse(element: impl Into<String>, reason: ParseReason) -> Self {
        Self::Parse {
            element: element.into(),
            reason,
        }
    }

    pub(crate) fn invalid(element: impl Into<String>, reason: InvalidReason) -> Self {
        Self::Invalid {
            element: element.into(),
            reason,
        }
    }

    pub(crate) fn range(what: &'static str, value: impl ToString, valid: impl Into<String>) -> Self {
        Self::Range {
            what,
            value: value.to_string(),
            valid: valid.into(),
        }
    }
}

#[cfg(feature = "xml")]
impl From<quick_xml::Error> for MpdError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

#[cfg(feature = "xml")]
impl From<quick_xml::events::attributes::AttrError> for MpdError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(e.to_string())
    }
}

pub type MpdResult<T> = Result<T, MpdError>;
