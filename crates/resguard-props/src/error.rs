use thiserror::Error;

/// Failure to move a property tree across the wire boundary.
///
/// Every variant is fatal for the resource being processed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("unrecognized signature '{signature}' when unmarshaling resource property at .{path}")]
    UnknownSignature { signature: String, path: String },

    #[error("undefined {what} when unmarshaling resource property at .{path}")]
    UndefinedLeaf { what: &'static str, path: String },

    #[error("invalid asset encountered when unmarshaling resource property at .{path}")]
    InvalidAsset { path: String },

    #[error("invalid archive encountered when unmarshaling resource property at .{path}")]
    InvalidArchive { path: String },

    #[error("archive member '{member}' at .{path} is neither an asset nor an archive")]
    InvalidArchiveMember { member: String, path: String },

    #[error("unresolved output ({description}) at .{path}; properties must be concrete")]
    UnsupportedOutput { description: String, path: String },
}

/// Failure to write through a [`crate::SecretView`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("cannot write key '{key}' into a non-map value")]
    NotAMap { key: String },

    #[error("cannot write index {index} into a non-sequence value")]
    NotASequence { index: usize },

    #[error("index {index} out of bounds for sequence of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

pub(crate) fn join_path(path: &[String]) -> String {
    path.join(".")
}
