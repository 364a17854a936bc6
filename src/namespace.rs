//! The 29-byte, total-ordered namespace tag and the small set of reserved
//! namespaces that order below any user namespace.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};

/// Byte width of a namespace: 1-byte version + 28-byte id.
pub const NAMESPACE_SIZE: usize = 29;

/// A 29-byte namespace tag. Ordering is byte-lexicographic over the full
/// 29 bytes (version, then id), which is also how the reserved namespaces
/// below are chosen to sort correctly relative to user namespaces.
///
/// Derives both `serde` (RPC/JSON) and `borsh` (canonical binary, the
/// encoding the wider corpus uses for on-chain/storage types — see
/// `sov_celestia_adapter::types::NamespaceId`) so this type is usable in
/// either context without a wrapper.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
    BorshSerialize, BorshDeserialize,
)]
pub struct Namespace(pub [u8; NAMESPACE_SIZE]);

impl Namespace {
    pub const fn new(version: u8, id: [u8; 28]) -> Self {
        let mut bytes = [0u8; NAMESPACE_SIZE];
        bytes[0] = version;
        let mut i = 0;
        while i < 28 {
            bytes[1 + i] = id[i];
            i += 1;
        }
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; NAMESPACE_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn version(&self) -> u8 {
        self.0[0]
    }

    pub fn id(&self) -> &[u8] {
        &self.0[1..]
    }

    pub fn as_bytes(&self) -> &[u8; NAMESPACE_SIZE] {
        &self.0
    }

    pub fn is_reserved(&self) -> bool {
        *self <= PAY_FOR_FIBRE_NAMESPACE || *self >= PRIMARY_RESERVED_PADDING
    }
}

impl AsRef<[u8]> for Namespace {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({})", hex::encode(self.0))
    }
}

/// Low-end reserved namespace: version `0x00`, so it sorts below every
/// user namespace (which may use any version byte).
const fn reserved_low(last_byte: u8) -> Namespace {
    let mut id = [0u8; 28];
    id[27] = last_byte;
    Namespace::new(0x00, id)
}

/// High-end reserved namespace: version `0xFF`, so it sorts above every
/// user namespace.
const fn reserved_high(last_byte: u8) -> Namespace {
    let mut id = [0u8; 28];
    id[27] = last_byte;
    Namespace::new(0xFF, id)
}

/// Reserved namespace for length-prefixed regular transactions.
pub const TX_NAMESPACE: Namespace = reserved_low(0x01);
/// Reserved namespace for serialized `IndexWrapper`s (blob-carrying txs).
pub const PAY_FOR_BLOB_NAMESPACE: Namespace = reserved_low(0x02);
/// Reserved namespace for serialized system-blob ("fibre") txs.
pub const PAY_FOR_FIBRE_NAMESPACE: Namespace = reserved_low(0x03);
/// Padding between the last reserved-namespace compact share and the first
/// non-reserved (user-namespace) share.
pub const PRIMARY_RESERVED_PADDING: Namespace = reserved_high(0xFC);
/// Padding from the end of the last blob to the end of the square.
pub const TAIL_PADDING_NAMESPACE: Namespace = reserved_high(0xFE);
/// The namespace parity (erasure-coded) shares are tagged with.
pub const PARITY_SHARE_NAMESPACE: Namespace = reserved_high(0xFF);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_namespaces_sort_in_protocol_order() {
        assert!(TX_NAMESPACE < PAY_FOR_BLOB_NAMESPACE);
        assert!(PAY_FOR_BLOB_NAMESPACE < PAY_FOR_FIBRE_NAMESPACE);
        assert!(PAY_FOR_FIBRE_NAMESPACE < PRIMARY_RESERVED_PADDING);
        assert!(PRIMARY_RESERVED_PADDING < TAIL_PADDING_NAMESPACE);
        assert!(TAIL_PADDING_NAMESPACE < PARITY_SHARE_NAMESPACE);
    }

    #[test]
    fn user_namespace_sorts_above_reserved_and_below_padding() {
        let user = Namespace::new(0, [0x10; 28]);
        assert!(PAY_FOR_FIBRE_NAMESPACE < user);
        assert!(user < PRIMARY_RESERVED_PADDING);
        assert!(!user.is_reserved());
        assert!(TX_NAMESPACE.is_reserved());
        assert!(PRIMARY_RESERVED_PADDING.is_reserved());
        assert!(TAIL_PADDING_NAMESPACE.is_reserved());
        assert!(PARITY_SHARE_NAMESPACE.is_reserved());
    }

    #[test]
    fn user_namespaces_with_low_bytes_are_not_misclassified_as_reserved() {
        // A user namespace whose first id byte happens to be small (but
        // whose full 29 bytes differ from any of the six reserved values)
        // must not be treated as reserved.
        let low_user = Namespace::new(0, {
            let mut id = [0u8; 28];
            id[27] = 0x04;
            id
        });
        assert!(!low_user.is_reserved());
        assert!(PAY_FOR_FIBRE_NAMESPACE < low_user);
    }

    #[test]
    fn ordering_is_byte_lexicographic() {
        let a = Namespace::new(0, {
            let mut b = [0u8; 28];
            b[0] = 1;
            b
        });
        let b = Namespace::new(0, {
            let mut b = [0u8; 28];
            b[0] = 2;
            b
        });
        assert!(a < b);
    }
}
