//! The `Blob` payload type and the `BlobElement` bookkeeping record the
//! builder keeps for each accepted blob.

use crate::error::SquareError;
use crate::geometry;
use crate::namespace::Namespace;
use crate::share;

/// `(namespace, data, share_version, signer?)`.
///
/// Invariants: `share_version` is `0`, `1`, or `2`; a signer is present iff
/// `share_version != 0`; for `share_version == 2`, `data` is exactly
/// `fibre_blob_version(4) || commitment(32)` (36 bytes) rather than free
/// bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    namespace: Namespace,
    data: Vec<u8>,
    share_version: u8,
    signer: Option<[u8; share::SIGNER_SIZE]>,
}

impl Blob {
    pub fn new(
        namespace: Namespace,
        data: Vec<u8>,
        share_version: u8,
        signer: Option<[u8; share::SIGNER_SIZE]>,
    ) -> Result<Self, SquareError> {
        match (share_version, signer.is_some()) {
            (0, true) => {
                return Err(SquareError::BadBlobVersion {
                    pfb_index: None,
                    blob_index: 0,
                    reason: "share_version 0 must not carry a signer",
                })
            }
            (1, false) | (2, false) => {
                return Err(SquareError::BadBlobVersion {
                    pfb_index: None,
                    blob_index: 0,
                    reason: "share_version 1 or 2 requires a signer",
                })
            }
            (v, _) if v > 2 => {
                return Err(SquareError::BadBlobVersion {
                    pfb_index: None,
                    blob_index: 0,
                    reason: "share_version must be 0, 1, or 2",
                })
            }
            _ => {}
        }
        if share_version == 2
            && data.len() != share::FIBRE_BLOB_VERSION_SIZE + share::FIBRE_COMMITMENT_SIZE
        {
            return Err(SquareError::BadBlobVersion {
                pfb_index: None,
                blob_index: 0,
                reason: "share_version 2 blob data must be exactly fibre_blob_version || commitment",
            });
        }
        Ok(Self {
            namespace,
            data,
            share_version,
            signer,
        })
    }

    pub fn new_v0(namespace: Namespace, data: Vec<u8>) -> Self {
        Self {
            namespace,
            data,
            share_version: 0,
            signer: None,
        }
    }

    pub fn new_fibre(
        namespace: Namespace,
        signer: [u8; share::SIGNER_SIZE],
        fibre_blob_version: u32,
        commitment: [u8; share::FIBRE_COMMITMENT_SIZE],
    ) -> Self {
        let mut data = Vec::with_capacity(share::FIBRE_BLOB_VERSION_SIZE + share::FIBRE_COMMITMENT_SIZE);
        data.extend_from_slice(&fibre_blob_version.to_be_bytes());
        data.extend_from_slice(&commitment);
        Self {
            namespace,
            data,
            share_version: 2,
            signer: Some(signer),
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn share_version(&self) -> u8 {
        self.share_version
    }

    pub fn signer(&self) -> Option<[u8; share::SIGNER_SIZE]> {
        self.signer
    }

    pub fn num_shares(&self) -> u64 {
        share::blob_num_shares(self.data.len(), self.share_version)
    }
}

/// Sentinel position for a system blob, which has no owning `IndexWrapper`.
pub const SYSTEM_BLOB_SENTINEL: i64 = -1;

/// Bookkeeping the builder keeps per accepted blob: which `IndexWrapper`
/// (if any) owns it, its placement metadata, and its worst-case alignment
/// padding.
#[derive(Debug, Clone)]
pub struct BlobElement {
    pub blob: Blob,
    /// `None` for a system ("fibre") blob — sentinel `pfb_index = -1`.
    pub owning_pfb_index: Option<usize>,
    pub blob_index_within_pfb: usize,
    pub num_shares: u64,
    pub max_padding: u64,
}

impl BlobElement {
    pub fn new(
        blob: Blob,
        owning_pfb_index: Option<usize>,
        blob_index_within_pfb: usize,
        subtree_root_threshold: u64,
    ) -> Result<Self, SquareError> {
        let num_shares = blob.num_shares();
        let width = geometry::subtree_width(num_shares, subtree_root_threshold)?;
        let max_padding = width.saturating_sub(1);
        Ok(Self {
            blob,
            owning_pfb_index,
            blob_index_within_pfb,
            num_shares,
            max_padding,
        })
    }

    pub fn is_system_blob(&self) -> bool {
        self.owning_pfb_index.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Namespace;

    #[test]
    fn v0_blob_rejects_signer() {
        let err = Blob::new(Namespace::new(0, [1; 28]), vec![1], 0, Some([0; 20]));
        assert!(err.is_err());
    }

    #[test]
    fn v1_blob_requires_signer() {
        let err = Blob::new(Namespace::new(0, [1; 28]), vec![1], 1, None);
        assert!(err.is_err());
    }

    #[test]
    fn v2_blob_requires_exact_structural_data_len() {
        let err = Blob::new(Namespace::new(0, [1; 28]), vec![1, 2, 3], 2, Some([0; 20]));
        assert!(err.is_err());

        let ok = Blob::new_fibre(Namespace::new(0, [1; 28]), [0; 20], 7, [9; 32]);
        assert_eq!(ok.num_shares(), 1);
    }

    #[test]
    fn blob_element_padding_is_subtree_width_minus_one() {
        let blob = Blob::new_v0(Namespace::new(0, [1; 28]), vec![0u8; 3000]);
        let el = BlobElement::new(blob, Some(0), 0, 64).unwrap();
        assert_eq!(el.max_padding, geometry::subtree_width(el.num_shares, 64).unwrap() - 1);
    }
}
