//! Items moving through the packing area.

use rand::Rng;
use serde::{Serialize, Serializer};
use std::fmt;

/// Products a cashier can scan.
pub const CATALOG: [&str; 10] = [
    "Milk", "Bread", "Eggs", "Cereal", "Apples", "Water", "Rice", "Beans", "Juice", "Cookies",
];

/// Lowest product code.
pub const MIN_CODE: u32 = 1000;
/// Highest product code.
pub const MAX_CODE: u32 = 9999;

/// Bounded, inline product name.
///
/// Holds at most [`ItemName::MAX_LEN`] bytes of UTF-8. Longer input is cut at
/// the last char boundary that fits. The name is `Copy`, so every slot and
/// every event owns an independent copy.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemName {
    bytes: [u8; ItemName::MAX_LEN],
    len: u8,
}

impl ItemName {
    /// Maximum length in bytes.
    pub const MAX_LEN: usize = 31;

    /// Creates a name, truncating to [`MAX_LEN`](Self::MAX_LEN) bytes.
    pub fn new(name: &str) -> Self {
        let mut end = name.len().min(Self::MAX_LEN);
        while !name.is_char_boundary(end) {
            end -= 1;
        }

        let mut bytes = [0u8; Self::MAX_LEN];
        bytes[..end].copy_from_slice(&name.as_bytes()[..end]);
        Self {
            bytes,
            len: end as u8,
        }
    }

    /// The name as text.
    pub fn as_str(&self) -> &str {
        // Built from a `&str` cut on a char boundary.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns `true` for the empty name.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl From<&str> for ItemName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Debug for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl Serialize for ItemName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A scanned product. Immutable and copied by value into and out of slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Item {
    /// Product name from the catalog.
    pub name: ItemName,
    /// Product code in `MIN_CODE..=MAX_CODE`.
    pub code: u32,
}

impl Item {
    /// Creates an item.
    pub fn new(name: impl Into<ItemName>, code: u32) -> Self {
        Self {
            name: name.into(),
            code,
        }
    }

    /// Scans a random catalog product with a random code.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let name = CATALOG[rng.gen_range(0..CATALOG.len())];
        Self::new(name, rng.gen_range(MIN_CODE..=MAX_CODE))
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.name, self.code)
    }
}
