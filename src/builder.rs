//! The size-accounting packer: accepts transactions in presentation
//! order, keeps a conservative worst-case share budget per category, and
//! assembles the final square on [`Builder::export`].

use prost::Message;

use crate::blob::{Blob, BlobElement};
use crate::error::{ConfigError, RevertError, SquareError};
use crate::geometry;
use crate::namespace;
use crate::share::{self, CompactShareWriter, SparseShareWriter};
use crate::square::{Square, TxPosition};
use crate::wire::{self, PfbDecoder};

/// Synthetic maximum share index used when sizing an `IndexWrapper` before
/// blobs are actually placed, so the varint-encoded wire form is at its
/// longest possible length and `current_size` never under-counts.
///
/// A historical constant, not a tunable — the worst case for a
/// 128x128 square regardless of the builder's configured side.
const WORST_CASE_SHARE_INDEX: u32 = 128 * 128;

#[derive(Debug, Clone)]
struct IndexWrapperRecord {
    inner_tx: Vec<u8>,
    num_blobs: usize,
}

#[derive(Debug, Clone, Copy)]
struct RegularPending {
    checkpoint: (usize, usize),
    size_before: u64,
}

#[derive(Debug, Clone, Copy)]
struct PfbPending {
    sizer_checkpoint: (usize, usize),
    blob_elements_len_before: usize,
    index_wrappers_len_before: usize,
    size_before: u64,
}

#[derive(Debug, Clone, Copy)]
struct PffPending {
    checkpoint: (usize, usize),
    blob_elements_len_before: usize,
    size_before: u64,
}

/// The mutable work buffer transactions are packed into. `max_side` and
/// `subtree_root_threshold`, fixed at construction, are the whole of this
/// crate's config surface.
#[derive(Debug)]
pub struct Builder {
    max_side: u64,
    subtree_root_threshold: u64,
    current_size: u64,

    tx_writer: CompactShareWriter,
    tx_pending: Option<RegularPending>,
    tx_reverted: bool,

    /// Worst-case serialized `IndexWrapper` bytes, used only for sizing;
    /// discarded and rebuilt with real share indexes at export time.
    pfb_sizer: CompactShareWriter,
    index_wrappers: Vec<IndexWrapperRecord>,
    pfb_pending: Option<PfbPending>,
    pfb_reverted: bool,

    pff_writer: CompactShareWriter,
    pff_pending: Option<PffPending>,
    pff_reverted: bool,

    /// Both pfb-owned and system blobs, in insertion order.
    blob_elements: Vec<BlobElement>,

    exported: Option<Square>,
    tx_positions: Option<Vec<TxPosition>>,
    blob_positions: Option<std::collections::HashMap<(Option<usize>, usize), (u64, u64)>>,
}

impl Builder {
    pub fn new(max_side: i64, subtree_root_threshold: i64) -> Result<Self, SquareError> {
        geometry::validate_config(max_side, subtree_root_threshold)?;
        Ok(Self {
            max_side: max_side as u64,
            subtree_root_threshold: subtree_root_threshold as u64,
            current_size: 0,
            tx_writer: CompactShareWriter::new(namespace::TX_NAMESPACE),
            tx_pending: None,
            tx_reverted: false,
            pfb_sizer: CompactShareWriter::new(namespace::PAY_FOR_BLOB_NAMESPACE),
            index_wrappers: Vec::new(),
            pfb_pending: None,
            pfb_reverted: false,
            pff_writer: CompactShareWriter::new(namespace::PAY_FOR_FIBRE_NAMESPACE),
            pff_pending: None,
            pff_reverted: false,
            blob_elements: Vec::new(),
            exported: None,
            tx_positions: None,
            blob_positions: None,
        })
    }

    fn capacity(&self) -> u64 {
        self.max_side * self.max_side
    }

    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    pub fn num_txs(&self) -> usize {
        self.tx_writer.num_txs()
    }

    pub fn is_empty(&self) -> bool {
        self.current_size == 0
    }

    pub fn subtree_root_threshold(&self) -> u64 {
        self.subtree_root_threshold
    }

    pub fn append_tx(&mut self, tx: &[u8]) -> Result<bool, SquareError> {
        if self.exported.is_some() {
            return Ok(false);
        }
        let checkpoint = self.tx_writer.checkpoint();
        let before_count = self.tx_writer.count();
        self.tx_writer.write_tx(tx);
        let delta = self.tx_writer.count() - before_count;
        let tentative = self.current_size + delta;
        if tentative > self.capacity() {
            self.tx_writer.restore(checkpoint);
            tracing::debug!(len = tx.len(), "append_tx rejected: would exceed max_side^2");
            return Ok(false);
        }
        self.tx_pending = Some(RegularPending {
            checkpoint,
            size_before: self.current_size,
        });
        self.tx_reverted = false;
        self.current_size = tentative;
        tracing::debug!(len = tx.len(), new_size = tentative, "accepted regular tx");
        Ok(true)
    }

    pub fn revert_last_tx(&mut self) -> Result<(), SquareError> {
        let pending = self
            .tx_pending
            .ok_or(SquareError::Revert(RevertError::NoItems))?;
        if self.tx_reverted {
            return Err(SquareError::Revert(RevertError::AlreadyReverted));
        }
        self.tx_writer.restore(pending.checkpoint);
        self.current_size = pending.size_before;
        self.tx_reverted = true;
        Ok(())
    }

    /// Accepts a `BlobTx`: its inner transaction bytes plus the blobs it
    /// carries. `pfb_decoder`, if given, validates the blobs' lengths
    /// against the inner tx's own declarations; it is never invoked
    /// implicitly.
    pub fn append_blob_tx(
        &mut self,
        inner_tx: &[u8],
        blobs: Vec<Blob>,
        pfb_decoder: Option<&PfbDecoder>,
    ) -> Result<bool, SquareError> {
        if self.exported.is_some() {
            return Ok(false);
        }
        if blobs.is_empty() {
            return Err(SquareError::Decode {
                tx_index: self.index_wrappers.len(),
                source: crate::error::DecodeError::NoBlobs,
            });
        }
        let pfb_index = self.index_wrappers.len();
        if let Some(decoder) = pfb_decoder {
            let declared = decoder(inner_tx)?;
            if declared.len() != blobs.len() {
                return Err(SquareError::BadBlobVersion {
                    pfb_index: Some(pfb_index),
                    blob_index: 0,
                    reason: "pfb decoder declared a different number of blobs than attached",
                });
            }
            for (i, (declared_len, blob)) in declared.iter().zip(blobs.iter()).enumerate() {
                if *declared_len as usize != blob.data().len() {
                    return Err(SquareError::BadBlobVersion {
                        pfb_index: Some(pfb_index),
                        blob_index: i,
                        reason: "declared blob length does not match attached blob",
                    });
                }
            }
        }

        let sizer_checkpoint = self.pfb_sizer.checkpoint();
        let before_pfb_count = self.pfb_sizer.count();
        let worst_case = wire::IndexWrapper {
            type_id: wire::INDEX_WRAPPER_TYPE_ID.to_string(),
            tx: inner_tx.to_vec(),
            share_indexes: vec![WORST_CASE_SHARE_INDEX; blobs.len()],
        };
        self.pfb_sizer.write_tx(&worst_case.encode_to_vec());
        let pfb_delta = self.pfb_sizer.count() - before_pfb_count;

        let mut tentative_elements = Vec::with_capacity(blobs.len());
        let mut blob_delta = 0u64;
        for (i, blob) in blobs.into_iter().enumerate() {
            let element = BlobElement::new(blob, Some(pfb_index), i, self.subtree_root_threshold)?;
            blob_delta += element.num_shares + element.max_padding;
            tentative_elements.push(element);
        }

        let tentative = self.current_size + pfb_delta + blob_delta;
        if tentative > self.capacity() {
            self.pfb_sizer.restore(sizer_checkpoint);
            tracing::debug!(
                blobs = tentative_elements.len(),
                "append_blob_tx rejected: would exceed max_side^2"
            );
            return Ok(false);
        }

        self.pfb_pending = Some(PfbPending {
            sizer_checkpoint,
            blob_elements_len_before: self.blob_elements.len(),
            index_wrappers_len_before: self.index_wrappers.len(),
            size_before: self.current_size,
        });
        self.pfb_reverted = false;
        self.index_wrappers.push(IndexWrapperRecord {
            inner_tx: inner_tx.to_vec(),
            num_blobs: tentative_elements.len(),
        });
        self.blob_elements.extend(tentative_elements);
        self.current_size = tentative;
        tracing::debug!(pfb_index, new_size = tentative, "accepted blob tx");
        Ok(true)
    }

    pub fn revert_last_blob_tx(&mut self) -> Result<(), SquareError> {
        let pending = self
            .pfb_pending
            .ok_or(SquareError::Revert(RevertError::NoItems))?;
        if self.pfb_reverted {
            return Err(SquareError::Revert(RevertError::AlreadyReverted));
        }
        self.pfb_sizer.restore(pending.sizer_checkpoint);
        self.blob_elements.truncate(pending.blob_elements_len_before);
        self.index_wrappers.truncate(pending.index_wrappers_len_before);
        self.current_size = pending.size_before;
        self.pfb_reverted = true;
        Ok(())
    }

    /// Accepts a system-blob ("fibre") transaction: exactly one
    /// share-version-2 blob, recorded with the sentinel pfb/blob indexes.
    pub fn append_fibre_tx(&mut self, inner_tx: &[u8], blob: Blob) -> Result<bool, SquareError> {
        if self.exported.is_some() {
            return Ok(false);
        }
        if blob.share_version() != 2 {
            return Err(SquareError::BadBlobVersion {
                pfb_index: None,
                blob_index: self.blob_elements.len(),
                reason: "system-blob tx must carry a share_version 2 blob",
            });
        }

        let checkpoint = self.pff_writer.checkpoint();
        let before_count = self.pff_writer.count();
        self.pff_writer.write_tx(inner_tx);
        let pff_delta = self.pff_writer.count() - before_count;

        let element = BlobElement::new(blob, None, 0, self.subtree_root_threshold)?;
        let blob_delta = element.num_shares + element.max_padding;

        let tentative = self.current_size + pff_delta + blob_delta;
        if tentative > self.capacity() {
            self.pff_writer.restore(checkpoint);
            tracing::debug!("append_fibre_tx rejected: would exceed max_side^2");
            return Ok(false);
        }

        self.pff_pending = Some(PffPending {
            checkpoint,
            blob_elements_len_before: self.blob_elements.len(),
            size_before: self.current_size,
        });
        self.pff_reverted = false;
        self.blob_elements.push(element);
        self.current_size = tentative;
        tracing::debug!(new_size = tentative, "accepted fibre tx");
        Ok(true)
    }

    pub fn revert_last_fibre_tx(&mut self) -> Result<(), SquareError> {
        let pending = self
            .pff_pending
            .ok_or(SquareError::Revert(RevertError::NoItems))?;
        if self.pff_reverted {
            return Err(SquareError::Revert(RevertError::AlreadyReverted));
        }
        self.pff_writer.restore(pending.checkpoint);
        self.blob_elements.truncate(pending.blob_elements_len_before);
        self.current_size = pending.size_before;
        self.pff_reverted = true;
        Ok(())
    }

    /// Assembles the final square. Idempotent: the square is computed and
    /// cached on first call; later calls return a clone of the cached
    /// square without recomputation. No `append_*` succeeds after this.
    pub fn export(&mut self) -> Result<Square, SquareError> {
        if let Some(square) = &self.exported {
            return Ok(square.clone());
        }

        if self.current_size == 0 {
            let square = Square::new(vec![share::tail_padding_share()], 1);
            self.exported = Some(square.clone());
            self.tx_positions = Some(Vec::new());
            self.blob_positions = Some(std::collections::HashMap::new());
            return Ok(square);
        }

        let target_side = geometry::blob_min_square_size(self.current_size)?;
        if target_side > self.max_side {
            return Err(SquareError::Invariant(
                "computed target_side exceeds max_side",
            ));
        }

        let mut sorted: Vec<&BlobElement> = self.blob_elements.iter().collect();
        sorted.sort_by_key(|e| e.blob.namespace());

        let tx_count = self.tx_writer.count();
        let pfb_upper_bound = self.pfb_sizer.count();
        let pff_count = self.pff_writer.count();
        let seed = tx_count + pfb_upper_bound + pff_count;

        let mut sparse = SparseShareWriter::new();
        let mut cursor = seed;
        let mut non_reserved_start = seed;
        let mut end_of_previous = 0u64;
        let mut index_wrapper_share_indexes: Vec<Vec<u32>> = self
            .index_wrappers
            .iter()
            .map(|r| vec![0u32; r.num_blobs])
            .collect();
        let mut blob_positions = std::collections::HashMap::new();

        for (i, el) in sorted.iter().enumerate() {
            let width = geometry::subtree_width(el.num_shares, self.subtree_root_threshold)?;
            cursor = geometry::round_up_to_multiple_of(cursor, width);
            if i == 0 {
                non_reserved_start = cursor;
            } else {
                let padding = cursor - end_of_previous;
                if padding > el.max_padding {
                    return Err(SquareError::Invariant(
                        "realized inter-blob padding exceeds the blob's max_padding",
                    ));
                }
                sparse.write_namespace_padding(padding)?;
            }

            let key = match el.owning_pfb_index {
                Some(pfb_index) => {
                    index_wrapper_share_indexes[pfb_index][el.blob_index_within_pfb] =
                        cursor as u32;
                    (Some(pfb_index), el.blob_index_within_pfb)
                }
                None => (None, el.blob_index_within_pfb),
            };
            blob_positions.insert(key, (cursor, el.num_shares));

            sparse.write_blob(&el.blob);
            cursor += el.num_shares;
            end_of_previous = cursor;
        }

        let mut pfb_writer = CompactShareWriter::new(namespace::PAY_FOR_BLOB_NAMESPACE);
        for (rec, indices) in self.index_wrappers.iter().zip(index_wrapper_share_indexes.iter()) {
            let wire = wire::IndexWrapper {
                type_id: wire::INDEX_WRAPPER_TYPE_ID.to_string(),
                tx: rec.inner_tx.clone(),
                share_indexes: indices.clone(),
            };
            pfb_writer.write_tx(&wire.encode_to_vec());
        }
        let pfb_actual_count = pfb_writer.count();

        let reserved_padding_count = non_reserved_start
            .checked_sub(tx_count + pfb_actual_count + pff_count)
            .ok_or(SquareError::Invariant(
                "pfb upper-bound counter underestimated the true compact share count",
            ))?;

        let tx_boundaries = self.tx_writer.tx_boundaries().to_vec();
        let tx_buffer_len = self.tx_writer.buffer_len();
        let mut tx_positions = Vec::with_capacity(tx_boundaries.len());
        for (i, &start) in tx_boundaries.iter().enumerate() {
            let end = tx_boundaries.get(i + 1).copied().unwrap_or(tx_buffer_len);
            let (first_share, offset_within) = share::compact_share_position_for_offset(start);
            let (last_share, _) = share::compact_share_position_for_offset(end.saturating_sub(1));
            tx_positions.push(TxPosition {
                share_range: first_share..last_share + 1,
                start_offset: offset_within,
            });
        }

        let tx_shares = self.tx_writer.clone().finish();
        let pfb_shares = pfb_writer.finish();
        let pff_shares = self.pff_writer.clone().finish();
        let reserved_padding_shares: Vec<_> = (0..reserved_padding_count)
            .map(|_| share::reserved_padding_share())
            .collect();
        let blob_region = sparse.finish();

        let mut all = Vec::with_capacity((target_side * target_side) as usize);
        all.extend(tx_shares);
        all.extend(pfb_shares);
        all.extend(pff_shares);
        all.extend(reserved_padding_shares);
        all.extend(blob_region);

        let used = all.len() as u64;
        let total = target_side * target_side;
        if used > total {
            return Err(SquareError::Invariant(
                "assembled content exceeds the computed square size",
            ));
        }
        while (all.len() as u64) < total {
            all.push(share::tail_padding_share());
        }

        let square = Square::new(all, target_side);
        self.exported = Some(square.clone());
        self.tx_positions = Some(tx_positions);
        self.blob_positions = Some(blob_positions);
        tracing::debug!(side = target_side, used, "exported square");
        Ok(square)
    }

    pub fn find_tx_share_range(&mut self, tx_index: usize) -> Result<TxPosition, SquareError> {
        self.export()?;
        self.tx_positions
            .as_ref()
            .and_then(|p| p.get(tx_index))
            .cloned()
            .ok_or(SquareError::Order {
                tx_index,
                reason: "no regular tx at this index",
            })
    }

    /// `pfb_index` uses the sentinel [`crate::blob::SYSTEM_BLOB_SENTINEL`]
    /// (`-1`) for a system blob, matching `BlobElement`'s convention.
    pub fn find_blob_starting_index(
        &mut self,
        pfb_index: i64,
        blob_index: usize,
    ) -> Result<u64, SquareError> {
        self.export()?;
        let key = pfb_key(pfb_index, blob_index);
        self.blob_positions
            .as_ref()
            .and_then(|p| p.get(&key))
            .map(|(start, _)| *start)
            .ok_or(SquareError::Invariant("no blob at the given (pfb, blob) index"))
    }

    pub fn blob_share_length(
        &mut self,
        pfb_index: i64,
        blob_index: usize,
    ) -> Result<u64, SquareError> {
        self.export()?;
        let key = pfb_key(pfb_index, blob_index);
        self.blob_positions
            .as_ref()
            .and_then(|p| p.get(&key))
            .map(|(_, len)| *len)
            .ok_or(SquareError::Invariant("no blob at the given (pfb, blob) index"))
    }
}

fn pfb_key(pfb_index: i64, blob_index: usize) -> (Option<usize>, usize) {
    if pfb_index == crate::blob::SYSTEM_BLOB_SENTINEL {
        (None, blob_index)
    } else {
        (Some(pfb_index as usize), blob_index)
    }
}

/// One item of a pre-ordered construction list: either a regular tx, a
/// `BlobTx`'s contents, or a system-blob tx's contents.
pub enum OrderedItem {
    Regular(Vec<u8>),
    BlobTx { inner_tx: Vec<u8>, blobs: Vec<Blob> },
    FibreTx { inner_tx: Vec<u8>, blob: Blob },
}

fn item_rank(item: &OrderedItem) -> u8 {
    match item {
        OrderedItem::Regular(_) => 0,
        OrderedItem::BlobTx { .. } => 1,
        OrderedItem::FibreTx { .. } => 2,
    }
}

/// Builds a [`Builder`] from a pre-ordered list, failing if any append is
/// refused or if a regular tx follows a blob-tx/fibre-tx, or a blob-tx
/// follows a fibre-tx.
pub fn from_ordered(
    items: Vec<OrderedItem>,
    max_side: i64,
    subtree_root_threshold: i64,
    pfb_decoder: Option<&PfbDecoder>,
) -> Result<Builder, SquareError> {
    let mut builder = Builder::new(max_side, subtree_root_threshold)?;
    let mut last_rank = 0u8;
    for (i, item) in items.into_iter().enumerate() {
        let rank = item_rank(&item);
        if rank < last_rank {
            return Err(SquareError::Order {
                tx_index: i,
                reason: "categories must appear in order: regular, blob-tx, fibre-tx",
            });
        }
        last_rank = rank;
        let accepted = match item {
            OrderedItem::Regular(bytes) => builder.append_tx(&bytes)?,
            OrderedItem::BlobTx { inner_tx, blobs } => {
                builder.append_blob_tx(&inner_tx, blobs, pfb_decoder)?
            }
            OrderedItem::FibreTx { inner_tx, blob } => builder.append_fibre_tx(&inner_tx, blob)?,
        };
        if !accepted {
            return Err(SquareError::Capacity {
                max_side: max_side as usize,
            });
        }
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Namespace;

    #[test]
    fn empty_builder_exports_one_tail_padding_share() {
        let mut b = Builder::new(16, 64).unwrap();
        assert!(b.is_empty());
        let square = b.export().unwrap();
        assert_eq!(square.side(), 1);
        assert_eq!(square.shares().len(), 1);
        assert_eq!(square.shares()[0].namespace(), namespace::TAIL_PADDING_NAMESPACE);
    }

    #[test]
    fn one_small_regular_tx_fits_in_a_single_share_square() {
        let mut b = Builder::new(16, 64).unwrap();
        assert!(b.append_tx(&[0x01]).unwrap());
        let square = b.export().unwrap();
        assert_eq!(square.side(), 1);
        let range = b.find_tx_share_range(0).unwrap();
        assert_eq!(range.share_range, 0..1);
    }

    #[test]
    fn three_regular_txs_share_ranges_match_scenario() {
        let mut b = Builder::new(16, 64).unwrap();
        assert!(b.append_tx(&[0x01]).unwrap());
        assert!(b.append_tx(&vec![0x02; 600]).unwrap());
        assert!(b.append_tx(&vec![0x03; 1000]).unwrap());
        let _square = b.export().unwrap();
        let range = b.find_tx_share_range(2).unwrap();
        assert_eq!(range.share_range, 1..4);
    }

    #[test]
    fn single_tiny_blob_lands_at_index_one_in_a_side_four_square() {
        let mut b = Builder::new(4, 64).unwrap();
        let ns = Namespace::new(0, [1; 28]);
        assert!(b
            .append_blob_tx(b"inner", vec![Blob::new_v0(ns, vec![0xFF])], None)
            .unwrap());
        let square = b.export().unwrap();
        assert_eq!(square.side(), 4);
        let start = b.find_blob_starting_index(0, 0).unwrap();
        assert_eq!(start, 1);
    }

    #[test]
    fn revert_last_tx_restores_pre_append_state() {
        let mut b = Builder::new(16, 64).unwrap();
        assert!(b.append_tx(&[1, 2, 3]).unwrap());
        let size_after_first = b.current_size();
        assert!(b.append_tx(&[4, 5, 6, 7, 8]).unwrap());
        b.revert_last_tx().unwrap();
        assert_eq!(b.current_size(), size_after_first);
        assert!(b.revert_last_tx().is_err());
    }

    #[test]
    fn blobs_are_emitted_in_namespace_sorted_stable_order() {
        let mut b = Builder::new(16, 64).unwrap();
        let ns_a = Namespace::new(0, [1; 28]);
        let ns_b = Namespace::new(0, [2; 28]);
        assert!(b
            .append_blob_tx(b"t1", vec![Blob::new_v0(ns_b, vec![1u8; 20])], None)
            .unwrap());
        assert!(b
            .append_blob_tx(b"t2", vec![Blob::new_v0(ns_a, vec![2u8; 20])], None)
            .unwrap());
        let square = b.export().unwrap();
        let non_reserved: Vec<Namespace> = square
            .shares()
            .iter()
            .filter(|s| !s.namespace().is_reserved() && s.is_sequence_start())
            .map(|s| s.namespace())
            .collect();
        assert_eq!(non_reserved, vec![ns_a, ns_b]);
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let mut b = Builder::new(2, 64).unwrap();
        let mut accepted_count = 0;
        for i in 0..50u8 {
            if b.append_tx(&vec![i; 100]).unwrap() {
                accepted_count += 1;
            }
        }
        assert!(accepted_count < 50);
        assert!(b.current_size() <= 4);
    }

    #[test]
    fn append_blob_tx_is_all_or_nothing_and_reverts_atomically() {
        let ns_a = Namespace::new(0, [5; 28]);
        let ns_b = Namespace::new(0, [6; 28]);
        let mut b = Builder::new(16, 64).unwrap();
        let before = b.current_size();
        assert!(b
            .append_blob_tx(
                b"inner",
                vec![Blob::new_v0(ns_a, vec![1u8; 50]), Blob::new_v0(ns_b, vec![2u8; 50])],
                None,
            )
            .unwrap());
        assert_eq!(b.blob_elements.len(), 2);
        b.revert_last_blob_tx().unwrap();
        assert_eq!(b.current_size(), before);
        assert!(b.blob_elements.is_empty());
        assert!(b.revert_last_blob_tx().is_err());
    }

    #[test]
    fn from_ordered_rejects_regular_tx_after_blob_tx() {
        let ns = Namespace::new(0, [1; 28]);
        let items = vec![
            OrderedItem::BlobTx {
                inner_tx: b"inner".to_vec(),
                blobs: vec![Blob::new_v0(ns, vec![1u8; 10])],
            },
            OrderedItem::Regular(vec![0x01]),
        ];
        let err = from_ordered(items, 16, 64, None);
        assert!(matches!(err, Err(SquareError::Order { .. })));
    }

    #[test]
    fn from_ordered_accepts_the_canonical_category_order() {
        let ns = Namespace::new(0, [2; 28]);
        let items = vec![
            OrderedItem::Regular(vec![0x01]),
            OrderedItem::BlobTx {
                inner_tx: b"inner".to_vec(),
                blobs: vec![Blob::new_v0(ns, vec![2u8; 10])],
            },
            OrderedItem::FibreTx {
                inner_tx: b"fibre".to_vec(),
                blob: Blob::new_fibre(ns, [0u8; 20], 1, [9u8; 32]),
            },
        ];
        let mut builder = from_ordered(items, 16, 64, None).unwrap();
        assert_eq!(builder.num_txs(), 1);
        assert!(builder.export().is_ok());
    }
}
