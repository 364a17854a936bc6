//! Bit-level packing of payloads into fixed-width 512-byte shares, and the
//! two writers (`CompactShareWriter`, `SparseShareWriter`) that lazily
//! split a stream of transactions or blobs into shares.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::blob::Blob;
use crate::error::SquareError;
use crate::namespace::{Namespace, PRIMARY_RESERVED_PADDING, TAIL_PADDING_NAMESPACE};

pub const SHARE_SIZE: usize = 512;
pub const NAMESPACE_SIZE: usize = crate::namespace::NAMESPACE_SIZE;
pub const INFO_BYTE_SIZE: usize = 1;
pub const SEQUENCE_LEN_SIZE: usize = 4;
pub const COMPACT_RESERVED_BYTES_SIZE: usize = 4;
pub const SIGNER_SIZE: usize = 20;
pub const FIBRE_BLOB_VERSION_SIZE: usize = 4;
pub const FIBRE_COMMITMENT_SIZE: usize = 32;

const SPARSE_CONTINUATION_DATA_CAP: usize = SHARE_SIZE - NAMESPACE_SIZE - INFO_BYTE_SIZE;
const COMPACT_FIRST_DATA_CAP: usize =
    SHARE_SIZE - NAMESPACE_SIZE - INFO_BYTE_SIZE - SEQUENCE_LEN_SIZE - COMPACT_RESERVED_BYTES_SIZE;
const COMPACT_CONTINUATION_DATA_CAP: usize =
    SHARE_SIZE - NAMESPACE_SIZE - INFO_BYTE_SIZE - COMPACT_RESERVED_BYTES_SIZE;

/// An immutable 512-byte cell of the square.
///
/// Derives `borsh` (canonical binary encoding, matching
/// `sov_celestia_adapter::shares::Share`) alongside a hand-written `serde`
/// impl (arrays longer than 32 bytes need the `serde_bytes_array` shim
/// below; `borsh` has no such limit on `[u8; N]`).
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Share(#[serde(with = "serde_bytes_array")] [u8; SHARE_SIZE]);

mod serde_bytes_array {
    use super::SHARE_SIZE;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; SHARE_SIZE], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; SHARE_SIZE], D::Error> {
        let v: Vec<u8> = serde::Deserialize::deserialize(d)?;
        v.try_into()
            .map_err(|_| serde::de::Error::custom("share must be exactly 512 bytes"))
    }
}

impl std::fmt::Debug for Share {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Share")
            .field("namespace", &self.namespace())
            .field("is_sequence_start", &self.is_sequence_start())
            .field("share_version", &self.share_version())
            .finish()
    }
}

impl AsRef<[u8]> for Share {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Share {
    pub fn from_bytes(bytes: [u8; SHARE_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SHARE_SIZE] {
        &self.0
    }

    pub fn namespace(&self) -> Namespace {
        let mut out = [0u8; NAMESPACE_SIZE];
        out.copy_from_slice(&self.0[..NAMESPACE_SIZE]);
        Namespace::from_bytes(out)
    }

    fn info_byte(&self) -> u8 {
        self.0[NAMESPACE_SIZE]
    }

    pub fn is_sequence_start(&self) -> bool {
        self.info_byte() & 0x01 == 1
    }

    /// The 7-bit share-version carried in the info byte.
    pub fn share_version(&self) -> u8 {
        self.info_byte() >> 1
    }

    /// `Some(sequence_length)` for the first share of a sequence, `None`
    /// for continuation shares.
    pub fn sequence_length(&self) -> Option<u32> {
        if !self.is_sequence_start() {
            return None;
        }
        let start = NAMESPACE_SIZE + INFO_BYTE_SIZE;
        Some(u32::from_be_bytes(
            self.0[start..start + SEQUENCE_LEN_SIZE].try_into().unwrap(),
        ))
    }

    /// `Some(reserved_bytes)` for a compact share (reserved namespace),
    /// `None` for a sparse share.
    pub fn reserved_bytes(&self) -> Option<u32> {
        if !self.namespace().is_reserved() {
            return None;
        }
        let start = if self.is_sequence_start() {
            NAMESPACE_SIZE + INFO_BYTE_SIZE + SEQUENCE_LEN_SIZE
        } else {
            NAMESPACE_SIZE + INFO_BYTE_SIZE
        };
        Some(u32::from_be_bytes(
            self.0[start..start + COMPACT_RESERVED_BYTES_SIZE]
                .try_into()
                .unwrap(),
        ))
    }

    fn data_offset(&self) -> usize {
        let mut offset = NAMESPACE_SIZE + INFO_BYTE_SIZE;
        let is_start = self.is_sequence_start();
        let is_reserved = self.namespace().is_reserved();
        if is_start {
            offset += SEQUENCE_LEN_SIZE;
        }
        if is_reserved {
            offset += COMPACT_RESERVED_BYTES_SIZE;
        } else if is_start {
            // Sparse, first share: optional signer, then (for v2) the
            // fixed fibre_blob_version + commitment fields.
            let version = self.share_version();
            if version >= 1 {
                offset += SIGNER_SIZE;
            }
            if version == 2 {
                offset += FIBRE_BLOB_VERSION_SIZE + FIBRE_COMMITMENT_SIZE;
            }
        }
        offset
    }

    /// The raw (zero-padded-tail-included) data region of this share.
    pub fn data(&self) -> &[u8] {
        &self.0[self.data_offset()..]
    }

    pub fn signer(&self) -> Option<[u8; SIGNER_SIZE]> {
        if !self.is_sequence_start() || self.namespace().is_reserved() || self.share_version() == 0
        {
            return None;
        }
        let start = NAMESPACE_SIZE + INFO_BYTE_SIZE + SEQUENCE_LEN_SIZE;
        Some(self.0[start..start + SIGNER_SIZE].try_into().unwrap())
    }

    /// The fixed `fibre_blob_version` field of a version-2 sparse first
    /// share, if this share is one.
    pub fn fibre_blob_version(&self) -> Option<[u8; FIBRE_BLOB_VERSION_SIZE]> {
        if !self.is_sequence_start() || self.namespace().is_reserved() || self.share_version() != 2 {
            return None;
        }
        let start = NAMESPACE_SIZE + INFO_BYTE_SIZE + SEQUENCE_LEN_SIZE + SIGNER_SIZE;
        Some(self.0[start..start + FIBRE_BLOB_VERSION_SIZE].try_into().unwrap())
    }

    /// The fixed `fibre_commitment` field of a version-2 sparse first
    /// share, if this share is one.
    pub fn fibre_commitment(&self) -> Option<[u8; FIBRE_COMMITMENT_SIZE]> {
        if !self.is_sequence_start() || self.namespace().is_reserved() || self.share_version() != 2 {
            return None;
        }
        let start =
            NAMESPACE_SIZE + INFO_BYTE_SIZE + SEQUENCE_LEN_SIZE + SIGNER_SIZE + FIBRE_BLOB_VERSION_SIZE;
        Some(self.0[start..start + FIBRE_COMMITMENT_SIZE].try_into().unwrap())
    }
}

fn info_byte(version: u8, is_start: bool) -> u8 {
    debug_assert!(version < 128);
    (version << 1) | (is_start as u8)
}

fn assemble(
    namespace: Namespace,
    info: u8,
    sequence_length: Option<u32>,
    reserved_bytes: Option<u32>,
    fixed_fields: &[&[u8]],
    payload: &[u8],
) -> Share {
    let mut out = [0u8; SHARE_SIZE];
    let mut cursor = 0;
    out[cursor..cursor + NAMESPACE_SIZE].copy_from_slice(namespace.as_ref());
    cursor += NAMESPACE_SIZE;
    out[cursor] = info;
    cursor += INFO_BYTE_SIZE;
    if let Some(len) = sequence_length {
        out[cursor..cursor + SEQUENCE_LEN_SIZE].copy_from_slice(&len.to_be_bytes());
        cursor += SEQUENCE_LEN_SIZE;
    }
    if let Some(rb) = reserved_bytes {
        out[cursor..cursor + COMPACT_RESERVED_BYTES_SIZE].copy_from_slice(&rb.to_be_bytes());
        cursor += COMPACT_RESERVED_BYTES_SIZE;
    }
    for field in fixed_fields {
        out[cursor..cursor + field.len()].copy_from_slice(field);
        cursor += field.len();
    }
    let remaining_capacity = SHARE_SIZE - cursor;
    let n = payload.len().min(remaining_capacity);
    out[cursor..cursor + n].copy_from_slice(&payload[..n]);
    Share(out)
}

/// The data capacity of the first share of a sparse (blob) sequence, for a
/// given blob share-version.
pub fn sparse_first_capacity(share_version: u8) -> usize {
    let mut header = NAMESPACE_SIZE + INFO_BYTE_SIZE + SEQUENCE_LEN_SIZE;
    if share_version >= 1 {
        header += SIGNER_SIZE;
    }
    if share_version == 2 {
        header += FIBRE_BLOB_VERSION_SIZE + FIBRE_COMMITMENT_SIZE;
    }
    SHARE_SIZE - header
}

pub fn sparse_continuation_capacity() -> usize {
    SPARSE_CONTINUATION_DATA_CAP
}

/// Number of shares a blob of `data_len` bytes at `share_version` will
/// occupy, once split by the sparse writer.
pub fn blob_num_shares(data_len: usize, share_version: u8) -> u64 {
    let first_cap = sparse_first_capacity(share_version);
    if data_len <= first_cap {
        return 1;
    }
    let remaining = data_len - first_cap;
    let cont_cap = SPARSE_CONTINUATION_DATA_CAP;
    1 + crate::geometry::ceil_div(remaining as u64, cont_cap as u64)
}

/// Splits a single blob's bytes into raw shares (no padding between
/// blobs — that's `SparseShareWriter`'s job).
pub fn split_blob(blob: &Blob) -> Vec<Share> {
    let data = blob.data();
    let version = blob.share_version();
    let first_cap = sparse_first_capacity(version);
    let mut shares = Vec::with_capacity(blob_num_shares(data.len(), version) as usize);

    let signer_field: Option<[u8; SIGNER_SIZE]> = blob.signer();
    let mut fixed: Vec<&[u8]> = Vec::new();
    if let Some(ref s) = signer_field {
        fixed.push(s.as_slice());
    }
    let fibre_fields: Option<([u8; FIBRE_BLOB_VERSION_SIZE], [u8; FIBRE_COMMITMENT_SIZE])> =
        if version == 2 {
            let mut fv = [0u8; FIBRE_BLOB_VERSION_SIZE];
            fv.copy_from_slice(&data[0..FIBRE_BLOB_VERSION_SIZE]);
            let mut commitment = [0u8; FIBRE_COMMITMENT_SIZE];
            commitment.copy_from_slice(
                &data[FIBRE_BLOB_VERSION_SIZE..FIBRE_BLOB_VERSION_SIZE + FIBRE_COMMITMENT_SIZE],
            );
            Some((fv, commitment))
        } else {
            None
        };
    if let Some((ref fv, ref commitment)) = fibre_fields {
        fixed.push(fv.as_slice());
        fixed.push(commitment.as_slice());
    }

    let first_payload: &[u8] = if version == 2 { &[] } else { &data[..data.len().min(first_cap)] };
    shares.push(assemble(
        blob.namespace(),
        info_byte(version, true),
        Some(data.len() as u32),
        None,
        &fixed,
        first_payload,
    ));

    if version != 2 {
        let mut offset = first_cap.min(data.len());
        while offset < data.len() {
            let end = (offset + SPARSE_CONTINUATION_DATA_CAP).min(data.len());
            shares.push(assemble(
                blob.namespace(),
                info_byte(version, false),
                None,
                None,
                &[],
                &data[offset..end],
            ));
            offset = end;
        }
    }
    shares
}

pub fn tail_padding_share() -> Share {
    assemble(TAIL_PADDING_NAMESPACE, info_byte(0, true), Some(0), None, &[], &[])
}

pub fn reserved_padding_share() -> Share {
    assemble(
        PRIMARY_RESERVED_PADDING,
        info_byte(0, true),
        Some(0),
        None,
        &[],
        &[],
    )
}

pub fn namespace_padding_share(namespace: Namespace) -> Share {
    assemble(namespace, info_byte(0, false), None, None, &[], &[])
}

/// Lazily packs length-prefixed transactions under a single reserved
/// namespace. Each `write_tx` call appends a varint-prefixed transaction to
/// an internal buffer; shares are only materialized on `finish`.
#[derive(Debug, Clone)]
pub struct CompactShareWriter {
    namespace: Namespace,
    buffer: Vec<u8>,
    /// Offsets into `buffer` at which a new transaction's varint begins.
    boundaries: Vec<usize>,
}

impl CompactShareWriter {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            buffer: Vec::new(),
            boundaries: Vec::new(),
        }
    }

    /// Bytes and boundary-count checkpoint, for single-step undo.
    pub fn checkpoint(&self) -> (usize, usize) {
        (self.buffer.len(), self.boundaries.len())
    }

    pub fn restore(&mut self, checkpoint: (usize, usize)) {
        self.buffer.truncate(checkpoint.0);
        self.boundaries.truncate(checkpoint.1);
    }

    pub fn write_tx(&mut self, tx: &[u8]) {
        self.boundaries.push(self.buffer.len());
        crate::varint::encode_u64(tx.len() as u64, &mut self.buffer);
        self.buffer.extend_from_slice(tx);
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of shares this writer would produce if finalized now.
    pub fn count(&self) -> u64 {
        shares_for_compact_len(self.buffer.len())
    }

    /// Number of transactions written so far.
    pub fn num_txs(&self) -> usize {
        self.boundaries.len()
    }

    /// Offsets into the flat buffer at which each transaction's varint
    /// begins, in insertion order. Used to recover per-tx share ranges
    /// after the fact, without consuming the writer.
    pub fn tx_boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Consumes the writer, producing the final (zero-padded) shares.
    pub fn finish(self) -> Vec<Share> {
        if self.buffer.is_empty() {
            return Vec::new();
        }
        let total = self.buffer.len();
        let mut shares = Vec::with_capacity(self.count() as usize);
        let mut offset = 0usize;
        let mut first = true;
        while offset < total {
            let cap = if first {
                COMPACT_FIRST_DATA_CAP
            } else {
                COMPACT_CONTINUATION_DATA_CAP
            };
            let chunk_end = (offset + cap).min(total);
            let chunk = &self.buffer[offset..chunk_end];

            let next_boundary = self
                .boundaries
                .iter()
                .copied()
                .find(|&b| b >= offset && b < offset + cap);
            let reserved_bytes = match next_boundary {
                Some(b) => (b - offset) as u32,
                None => cap as u32,
            };

            let sequence_length = if first { Some(total as u32) } else { None };
            shares.push(assemble(
                self.namespace,
                info_byte(0, first),
                sequence_length,
                Some(reserved_bytes),
                &[],
                chunk,
            ));
            offset = chunk_end;
            first = false;
        }
        shares
    }
}

/// Index of the compact share that byte `offset` of the flat buffer falls
/// into, given the first/continuation capacity split used by
/// [`CompactShareWriter::finish`].
pub fn compact_share_index_for_offset(offset: usize) -> usize {
    if offset < COMPACT_FIRST_DATA_CAP {
        0
    } else {
        1 + (offset - COMPACT_FIRST_DATA_CAP) / COMPACT_CONTINUATION_DATA_CAP
    }
}

/// `(share_index, offset_within_that_share's_data_region)` for byte
/// `offset` of the flat compact buffer.
pub fn compact_share_position_for_offset(offset: usize) -> (usize, usize) {
    if offset < COMPACT_FIRST_DATA_CAP {
        (0, offset)
    } else {
        let rem = offset - COMPACT_FIRST_DATA_CAP;
        (
            1 + rem / COMPACT_CONTINUATION_DATA_CAP,
            rem % COMPACT_CONTINUATION_DATA_CAP,
        )
    }
}

fn shares_for_compact_len(len: usize) -> u64 {
    if len == 0 {
        return 0;
    }
    if len <= COMPACT_FIRST_DATA_CAP {
        return 1;
    }
    let remaining = len - COMPACT_FIRST_DATA_CAP;
    1 + crate::geometry::ceil_div(remaining as u64, COMPACT_CONTINUATION_DATA_CAP as u64)
}

/// Accumulates blobs (and namespace/reserved padding between them) in
/// sparse-share form.
#[derive(Debug, Clone, Default)]
pub struct SparseShareWriter {
    shares: Vec<Share>,
    last_namespace: Option<Namespace>,
}

impl SparseShareWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_blob(&mut self, blob: &Blob) {
        self.shares.extend(split_blob(blob));
        self.last_namespace = Some(blob.namespace());
    }

    /// Injects exactly `n` padding shares tagged with the last-written
    /// blob's namespace.
    pub fn write_namespace_padding(&mut self, n: u64) -> Result<(), SquareError> {
        let ns = self
            .last_namespace
            .ok_or(SquareError::Invariant("namespace padding with no prior blob"))?;
        for _ in 0..n {
            self.shares.push(namespace_padding_share(ns));
        }
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.shares.len()
    }

    pub fn finish(self) -> Vec<Share> {
        self.shares
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::Blob;

    #[test]
    fn compact_writer_single_small_tx_is_one_share() {
        let mut w = CompactShareWriter::new(crate::namespace::TX_NAMESPACE);
        w.write_tx(&[0x01]);
        assert_eq!(w.count(), 1);
        let shares = w.finish();
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].sequence_length(), Some(2)); // 1-byte varint + 1 byte payload
    }

    #[test]
    fn compact_writer_checkpoint_restore_is_exact() {
        let mut w = CompactShareWriter::new(crate::namespace::TX_NAMESPACE);
        let cp = w.checkpoint();
        w.write_tx(&[1, 2, 3]);
        assert_eq!(w.count(), 1);
        w.restore(cp);
        assert_eq!(w.count(), 0);
        assert!(w.is_empty());
    }

    #[test]
    fn sparse_writer_round_trips_a_small_v0_blob() {
        let blob = Blob::new_v0(
            crate::namespace::Namespace::new(0, [1; 28]),
            vec![0xFF],
        );
        let mut w = SparseShareWriter::new();
        w.write_blob(&blob);
        let shares = w.finish();
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].sequence_length(), Some(1));
        assert_eq!(&shares[0].data()[..1], &[0xFF]);
    }

    #[test]
    fn v2_fibre_blob_exposes_fixed_fields_not_data() {
        let commitment = [0xABu8; FIBRE_COMMITMENT_SIZE];
        let blob = Blob::new_fibre(
            crate::namespace::Namespace::new(0, [4; 28]),
            [9u8; SIGNER_SIZE],
            7,
            commitment,
        );
        let shares = split_blob(&blob);
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].fibre_blob_version().unwrap(), 7u32.to_be_bytes());
        assert_eq!(shares[0].fibre_commitment().unwrap(), commitment);
        // The data region (after the fixed fields) is the zero-padded tail.
        assert!(shares[0].data().iter().all(|&b| b == 0));
    }

    #[test]
    fn large_v0_blob_spans_multiple_shares() {
        let data = vec![0x42u8; 2000];
        let blob = Blob::new_v0(crate::namespace::Namespace::new(0, [3; 28]), data.clone());
        let mut w = SparseShareWriter::new();
        w.write_blob(&blob);
        let shares = w.finish();
        assert_eq!(shares.len() as u64, blob_num_shares(2000, 0));
        assert!(shares[0].is_sequence_start());
        assert!(shares[1..].iter().all(|s| !s.is_sequence_start()));
    }
}
