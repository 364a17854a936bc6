//! Original data square construction core for a blockchain
//! data-availability layer.
//!
//! Given a prioritized list of opaque transaction bytes, [`builder::Builder`]
//! deterministically packs them into a square grid of fixed-size
//! [`share::Share`]s whose side length is a power of two — the canonical
//! pre-erasure-coding payload of a block. Erasure coding, transaction
//! semantic validity, signature verification, the outer protocol,
//! networking, and persistence are all out of scope; this crate covers the
//! share codec, the builder/packer, the placement geometry, and inclusion
//! commitments.

pub mod blob;
pub mod builder;
pub mod commitment;
pub mod error;
pub mod geometry;
pub mod namespace;
pub mod parse;
pub mod share;
pub mod square;
pub mod varint;
pub mod wire;

pub use blob::{Blob, BlobElement};
pub use builder::{Builder, OrderedItem};
pub use error::{ConfigError, DecodeError, RevertError, SquareError};
pub use namespace::Namespace;
pub use share::Share;
pub use square::{Square, TxPosition};
pub use wire::{Classified, FibreClassifier, PfbDecoder};
