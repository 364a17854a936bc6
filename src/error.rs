use thiserror::Error;

/// Errors surfaced by the square-construction core.
///
/// Every variant carries enough positional context (a tx index, a blob
/// index, or both) for a caller to point back at the offending input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    #[error("invalid builder configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to decode tx {tx_index}: {source}")]
    Decode {
        tx_index: usize,
        #[source]
        source: DecodeError,
    },

    #[error("ordering violated at tx {tx_index}: {reason}")]
    Order { tx_index: usize, reason: &'static str },

    #[error("item does not fit in a {max_side}x{max_side} square")]
    Capacity { max_side: usize },

    #[error("revert failed: {0}")]
    Revert(#[from] RevertError),

    #[error("internal invariant violated: {0}")]
    Invariant(&'static str),

    #[error("bad blob version at pfb={pfb_index:?} blob={blob_index}: {reason}")]
    BadBlobVersion {
        pfb_index: Option<usize>,
        blob_index: usize,
        reason: &'static str,
    },

    #[error("corrupt share at index {share_index}: {reason}")]
    CorruptShare { share_index: usize, reason: &'static str },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_side must be a positive power of two, got {0}")]
    MaxSideNotPowerOfTwo(i64),
    #[error("subtree_root_threshold must be positive, got {0}")]
    NonPositiveThreshold(i64),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed protobuf-shaped wire bytes")]
    MalformedWire,
    #[error("unrecognized type id, expected {expected}")]
    WrongTypeId { expected: &'static str },
    #[error("blob-tx carries no attached blobs")]
    NoBlobs,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertError {
    #[error("no items of this category have been accepted")]
    NoItems,
    #[error("a revert has already occurred since the last accepted item of this category")]
    AlreadyReverted,
}

pub type Result<T> = std::result::Result<T, SquareError>;
