//! Protobuf-shaped wire forms for `BlobTx`, `IndexWrapper`, and `FibreTx`,
//! plus the magic-type-id detection logic that classifies an opaque
//! transaction into one of the three categories the builder accepts.
//!
//! These are hand-written `prost::Message` structs with explicit field
//! tags, not generated from a `.proto` file — the wire shape here is small
//! enough to hand-maintain, the same choice `sov_celestia_adapter::pfb`
//! makes for `BlobTx`/`Tx`/`MsgPayForBlobs`.

use prost::Message;

use crate::blob::Blob;
use crate::error::{DecodeError, SquareError};

pub const BLOB_TX_TYPE_ID: &str = "BLOB";
pub const INDEX_WRAPPER_TYPE_ID: &str = "INDX";
pub const FIBRE_TX_TYPE_ID: &str = "FIBR";

#[derive(Clone, PartialEq, Message)]
pub struct WireBlob {
    #[prost(bytes = "vec", tag = "1")]
    pub namespace: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
    #[prost(uint32, tag = "3")]
    pub share_version: u32,
    #[prost(bytes = "vec", tag = "4")]
    pub signer: Vec<u8>,
}

/// `BlobTx` wraps an encoded inner transaction with the blobs it pays for.
/// The raw blob bytes are not signed over directly; callers are expected
/// to validate them against the inner tx's own PFB-style declarations
/// using an injected decoder (see [`PfbDecoder`]) — this crate does not
/// do that validation itself, since tx semantic validity is out of scope.
#[derive(Clone, PartialEq, Message)]
pub struct BlobTx {
    #[prost(string, tag = "1")]
    pub type_id: String,
    #[prost(bytes = "vec", tag = "2")]
    pub tx: Vec<u8>,
    #[prost(message, repeated, tag = "3")]
    pub blobs: Vec<WireBlob>,
}

/// The persisted form of a `BlobTx`'s inner transaction, with share
/// indexes filled in by the builder at export time.
#[derive(Clone, PartialEq, Message)]
pub struct IndexWrapper {
    #[prost(string, tag = "1")]
    pub type_id: String,
    #[prost(bytes = "vec", tag = "2")]
    pub tx: Vec<u8>,
    #[prost(uint32, repeated, tag = "3")]
    pub share_indexes: Vec<u32>,
}

/// A system-blob ("fibre") transaction: exactly one share-version-2 blob.
#[derive(Clone, PartialEq, Message)]
pub struct FibreTx {
    #[prost(string, tag = "1")]
    pub type_id: String,
    #[prost(bytes = "vec", tag = "2")]
    pub tx: Vec<u8>,
    #[prost(message, optional, tag = "3")]
    pub blob: Option<WireBlob>,
}

/// `transaction bytes -> declared blob byte lengths`, injected by the
/// caller. Used only to validate a `BlobTx`'s attached blobs against the
/// inner transaction's own declarations; never invoked by the builder
/// itself (tx semantic validity is an external concern).
pub type PfbDecoder<'a> = dyn Fn(&[u8]) -> Result<Vec<u64>, SquareError> + 'a;

/// A caller-supplied predicate recognizing system-blob ("fibre")
/// transactions, consulted in addition to the `FIBR` magic type-id.
pub type FibreClassifier<'a> = dyn Fn(&[u8]) -> bool + 'a;

fn wire_blob_to_blob(w: WireBlob) -> Result<Blob, SquareError> {
    let mut ns_bytes = [0u8; crate::namespace::NAMESPACE_SIZE];
    if w.namespace.len() != ns_bytes.len() {
        return Err(SquareError::Decode {
            tx_index: 0,
            source: DecodeError::MalformedWire,
        });
    }
    ns_bytes.copy_from_slice(&w.namespace);
    let namespace = crate::namespace::Namespace::from_bytes(ns_bytes);

    let signer = if w.signer.is_empty() {
        None
    } else if w.signer.len() == crate::share::SIGNER_SIZE {
        let mut s = [0u8; crate::share::SIGNER_SIZE];
        s.copy_from_slice(&w.signer);
        Some(s)
    } else {
        return Err(SquareError::Decode {
            tx_index: 0,
            source: DecodeError::MalformedWire,
        });
    };

    Blob::new(namespace, w.data, w.share_version as u8, signer)
}

/// The three disjoint transaction categories the builder accepts.
pub enum Classified {
    Regular(Vec<u8>),
    BlobTx { inner_tx: Vec<u8>, blobs: Vec<Blob> },
    FibreTx { inner_tx: Vec<u8>, blob: Blob },
}

/// Classifies opaque transaction bytes by wire detection: attempt decode,
/// treat as the matching category iff decode succeeds *and* the type-id
/// field matches. Falls back to `Regular` otherwise.
///
/// `fibre_classifier`, if provided, is consulted before the `FIBR`
/// type-id check — callers that don't support the system-blob category
/// can pass `None` and it will never be classified as one.
pub fn classify(bytes: &[u8], fibre_classifier: Option<&FibreClassifier>) -> Classified {
    if fibre_classifier.map_or(false, |f| f(bytes)) {
        if let Ok(fibre) = FibreTx::decode(bytes) {
            if fibre.type_id == FIBRE_TX_TYPE_ID {
                if let Some(w) = fibre.blob {
                    if let Ok(blob) = wire_blob_to_blob(w) {
                        if blob.share_version() == 2 {
                            return Classified::FibreTx {
                                inner_tx: fibre.tx,
                                blob,
                            };
                        }
                    }
                }
            }
        }
    }

    if let Ok(blob_tx) = BlobTx::decode(bytes) {
        if blob_tx.type_id == BLOB_TX_TYPE_ID && !blob_tx.blobs.is_empty() {
            let blobs: Result<Vec<Blob>, SquareError> = blob_tx
                .blobs
                .into_iter()
                .map(wire_blob_to_blob)
                .collect();
            if let Ok(blobs) = blobs {
                return Classified::BlobTx {
                    inner_tx: blob_tx.tx,
                    blobs,
                };
            }
        }
    }

    Classified::Regular(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_tx_round_trips_through_classify() {
        let wire = BlobTx {
            type_id: BLOB_TX_TYPE_ID.to_string(),
            tx: vec![9, 9, 9],
            blobs: vec![WireBlob {
                namespace: crate::namespace::Namespace::new(0, [7; 28]).as_bytes().to_vec(),
                data: vec![1, 2, 3],
                share_version: 0,
                signer: vec![],
            }],
        };
        let encoded = wire.encode_to_vec();
        match classify(&encoded, None) {
            Classified::BlobTx { inner_tx, blobs } => {
                assert_eq!(inner_tx, vec![9, 9, 9]);
                assert_eq!(blobs.len(), 1);
                assert_eq!(blobs[0].data(), &[1, 2, 3]);
            }
            _ => panic!("expected BlobTx classification"),
        }
    }

    #[test]
    fn opaque_bytes_classify_as_regular() {
        let bytes = vec![0xDE, 0xAD, 0xBE, 0xEF];
        match classify(&bytes, None) {
            Classified::Regular(b) => assert_eq!(b, bytes),
            _ => panic!("expected Regular classification"),
        }
    }

    #[test]
    fn fibre_tx_requires_both_classifier_and_type_id() {
        let wire = FibreTx {
            type_id: FIBRE_TX_TYPE_ID.to_string(),
            tx: vec![1],
            blob: Some(WireBlob {
                namespace: crate::namespace::Namespace::new(0, [2; 28]).as_bytes().to_vec(),
                data: {
                    let mut d = vec![0u8; 36];
                    d[3] = 7;
                    d
                },
                share_version: 2,
                signer: vec![0u8; 20],
            }),
        };
        let encoded = wire.encode_to_vec();

        // Without a classifier, never recognized as a fibre tx.
        match classify(&encoded, None) {
            Classified::Regular(_) => {}
            _ => panic!("expected Regular without classifier"),
        }

        match classify(&encoded, Some(&|_: &[u8]| true)) {
            Classified::FibreTx { blob, .. } => assert_eq!(blob.share_version(), 2),
            _ => panic!("expected FibreTx with classifier"),
        }
    }
}
