//! Reconstructing transactions and blobs back out of an assembled square.
//!
//! Unlike a client that already has shares pre-grouped by namespace (the
//! RPC-consumer shape `NamespaceGroup` was built for), this operates on a
//! full, row-major [`Square`] straight off the wire: compact-share
//! transactions are recovered by walking the `Tx` namespace directly, and
//! blobs by walking every share whose namespace is not reserved.

use crate::error::{DecodeError, SquareError};
use crate::namespace::Namespace;
use crate::share::Share;
use crate::square::Square;

/// Walks a run of compact shares under one reserved namespace, splitting
/// them back into their length-prefixed transactions using each share's
/// `reserved_bytes` field to resynchronize the varint stream across share
/// boundaries.
pub fn parse_compact_txs(shares: &[Share]) -> Result<Vec<Vec<u8>>, SquareError> {
    let mut buffer = Vec::new();
    for (idx, share) in shares.iter().enumerate() {
        if !share.is_sequence_start() && idx == 0 {
            return Err(SquareError::CorruptShare {
                share_index: idx,
                reason: "first share of a compact run is not a sequence start",
            });
        }
        buffer.extend_from_slice(share.data());
    }
    if shares.is_empty() {
        return Ok(Vec::new());
    }
    let total_len = shares[0].sequence_length().ok_or(SquareError::CorruptShare {
        share_index: 0,
        reason: "compact run's first share carries no sequence_length",
    })? as usize;
    buffer.truncate(total_len.min(buffer.len()));
    if buffer.len() < total_len {
        return Err(SquareError::CorruptShare {
            share_index: 0,
            reason: "declared sequence_length exceeds the bytes actually present",
        });
    }

    let mut txs = Vec::new();
    let mut offset = 0usize;
    while offset < buffer.len() {
        let (len, consumed) = crate::varint::read_varint(&buffer[offset..])
            .map_err(|_| SquareError::CorruptShare {
                share_index: 0,
                reason: "malformed varint while resynchronizing compact shares",
            })?;
        offset += consumed;
        let end = offset + len as usize;
        if end > buffer.len() {
            return Err(SquareError::CorruptShare {
                share_index: 0,
                reason: "transaction length runs past the declared sequence",
            });
        }
        txs.push(buffer[offset..end].to_vec());
        offset = end;
    }
    Ok(txs)
}

/// A reconstructed blob's raw fields, as recovered from sparse shares —
/// deliberately untyped (no `share_version`/signer validation) since a
/// corrupt or adversarial square may not satisfy [`crate::blob::Blob::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBlob {
    pub namespace: Namespace,
    pub share_version: u8,
    pub signer: Option<[u8; crate::share::SIGNER_SIZE]>,
    pub data: Vec<u8>,
}

/// Reconstructs every blob present in `square`, in the order their first
/// share appears.
pub fn parse_blobs(square: &Square) -> Result<Vec<ParsedBlob>, SquareError> {
    let mut blobs = Vec::new();
    let mut iter = square.shares().iter().enumerate().peekable();

    while let Some((idx, share)) = iter.next() {
        let ns = share.namespace();
        if ns.is_reserved() {
            continue;
        }
        if !share.is_sequence_start() {
            // Namespace padding share, or a continuation we've already
            // consumed below — either way, not a new blob.
            continue;
        }
        let declared_len = share.sequence_length().ok_or(SquareError::CorruptShare {
            share_index: idx,
            reason: "sequence-start share carries no sequence_length",
        })? as usize;

        // A version-2 (fibre) blob's declared data lives in the share's
        // fixed `fibre_blob_version`/`fibre_commitment` fields, not in its
        // `data()` region (which is the share's zero-padded tail for v2).
        let data = if share.share_version() == 2 {
            let version = share.fibre_blob_version().ok_or(SquareError::CorruptShare {
                share_index: idx,
                reason: "share_version 2 share carries no fibre_blob_version field",
            })?;
            let commitment = share.fibre_commitment().ok_or(SquareError::CorruptShare {
                share_index: idx,
                reason: "share_version 2 share carries no fibre_commitment field",
            })?;
            let mut data = Vec::with_capacity(version.len() + commitment.len());
            data.extend_from_slice(&version);
            data.extend_from_slice(&commitment);
            if data.len() != declared_len {
                return Err(SquareError::CorruptShare {
                    share_index: idx,
                    reason: "share_version 2 sequence_length does not match fibre_blob_version || commitment",
                });
            }
            data
        } else {
            let mut data = share.data().to_vec();
            while data.len() < declared_len {
                match iter.peek() {
                    Some((_, next)) if next.namespace() == ns && !next.is_sequence_start() => {
                        let (_, next) = iter.next().unwrap();
                        data.extend_from_slice(next.data());
                    }
                    _ => break,
                }
            }
            if data.len() < declared_len {
                return Err(SquareError::CorruptShare {
                    share_index: idx,
                    reason: "blob sequence truncated before declared sequence_length",
                });
            }
            data.truncate(declared_len);
            data
        };

        blobs.push(ParsedBlob {
            namespace: ns,
            share_version: share.share_version(),
            signer: share.signer(),
            data,
        });
    }
    Ok(blobs)
}

/// Extracts and decodes the `Tx`-namespace region of `square` directly.
pub fn parse_txs(square: &Square) -> Result<Vec<Vec<u8>>, SquareError> {
    let tx_shares: Vec<Share> = square
        .shares()
        .iter()
        .filter(|s| s.namespace() == crate::namespace::TX_NAMESPACE)
        .cloned()
        .collect();
    if tx_shares.is_empty() {
        return Ok(Vec::new());
    }
    parse_compact_txs(&tx_shares)
}

/// Extracts and decodes the `PayForBlob`-namespace region (serialized
/// `IndexWrapper`s) of `square` directly.
pub fn parse_index_wrappers(square: &Square) -> Result<Vec<crate::wire::IndexWrapper>, SquareError> {
    use prost::Message;
    let pfb_shares: Vec<Share> = square
        .shares()
        .iter()
        .filter(|s| s.namespace() == crate::namespace::PAY_FOR_BLOB_NAMESPACE)
        .cloned()
        .collect();
    if pfb_shares.is_empty() {
        return Ok(Vec::new());
    }
    let encoded = parse_compact_txs(&pfb_shares)?;
    encoded
        .into_iter()
        .enumerate()
        .map(|(i, bytes)| {
            crate::wire::IndexWrapper::decode(bytes.as_slice()).map_err(|_| SquareError::Decode {
                tx_index: i,
                source: DecodeError::MalformedWire,
            })
        })
        .collect()
}
