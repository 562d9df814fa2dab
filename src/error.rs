use crate::types::Index;

/// Errors from reading a .bvh file.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to read bvh file")]
    Io(#[from] std::io::Error),
    #[error("No HIERARCHY section with a ROOT joint was found")]
    MissingHierarchy,
    #[error("Line {line}: `{token}` is not a number")]
    InvalidNumber { line: usize, token: String },
    #[error("Line {line}: unknown channel `{name}`")]
    UnknownChannel { line: usize, name: String },
    #[error("Line {line}: CHANNELS declares {declared} channels but lists {listed}")]
    ChannelCountMismatch {
        line: usize,
        declared: usize,
        listed: usize,
    },
    #[error("Line {line}: OFFSET needs 3 components, found {found}")]
    BadOffset { line: usize, found: usize },
    #[error("Line {line}: `{content}` is not expected here")]
    UnexpectedLine { line: usize, content: String },
    #[error("Braces in HIERARCHY section are unbalanced")]
    UnbalancedBraces,
    #[error("MOTION section has no `Frame Time:` line")]
    MissingFrameTime,
    #[error("Unexpected end of file")]
    UnexpectedEof,
}

/// Errors from forward kinematics. Short frames are tolerated, so only a root
/// joint without a complete position triple and an empty frame are rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FkError {
    #[error("Root joint `{joint}` needs X, Y and Z position values, found {found}")]
    RootPositionIncomplete { joint: String, found: usize },
    #[error("Frame has no values")]
    EmptyFrame,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FacingError {
    #[error("Landmark {index} is required but only {len} positions were given")]
    MissingLandmark { index: Index, len: usize },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StandardizeError {
    #[error("Index {index} is out of range for {len} positions")]
    IndexOutOfRange { index: Index, len: usize },
    #[error("Frame has no root position")]
    EmptyFrame,
}

/// Crate level error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Fk(#[from] FkError),
    #[error(transparent)]
    Facing(#[from] FacingError),
    #[error(transparent)]
    Standardize(#[from] StandardizeError),
    #[error("I/O error on `{path}`")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in `{path}`")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode msgpack `{path}`")]
    Msgpack {
        path: String,
        #[source]
        source: rmp_serde::encode::Error,
    },
    #[error("Invalid config `{path}`")]
    Config {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
