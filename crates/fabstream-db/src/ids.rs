//! Handle types for the configuration and structural databases
//!
//! Every database in fabstream is an arena: records live in a dense `Vec`
//! and are addressed by a `u32` newtype. The four handle kinds are distinct
//! types so a block handle can never be used to index the module arena.
//! Validity is always checked against the owning arena (`valid_*_id`),
//! there is no sentinel "invalid" value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a configuration block in a [`BitstreamManager`]
///
/// [`BitstreamManager`]: crate::BitstreamManager
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConfigBlockId(pub u32);

/// Unique identifier for a configuration bit in a [`BitstreamManager`]
///
/// [`BitstreamManager`]: crate::BitstreamManager
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConfigBitId(pub u32);

/// Unique identifier for a structural module in a [`ModuleManager`]
///
/// [`ModuleManager`]: crate::ModuleManager
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub u32);

/// Unique identifier for an entry of a fabric bitstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FabricBitId(pub u32);

macro_rules! impl_arena_id {
    ($($ty:ident => $prefix:literal),* $(,)?) => {
        $(
            impl $ty {
                /// Position of the record in its arena
                pub fn index(self) -> usize {
                    self.0 as usize
                }

                /// Handle for the record at `index`
                ///
                /// Panics if the arena has grown past `u32::MAX` records.
                pub fn from_index(index: usize) -> Self {
                    Self(u32::try_from(index).expect("arena exceeds u32 handle range"))
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, concat!($prefix, "#{}"), self.0)
                }
            }
        )*
    };
}

impl_arena_id! {
    ConfigBlockId => "block",
    ConfigBitId => "bit",
    ModuleId => "module",
    FabricBitId => "fabric_bit",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_domain() {
        assert_eq!(ConfigBlockId(3).to_string(), "block#3");
        assert_eq!(ConfigBitId(0).to_string(), "bit#0");
        assert_eq!(ModuleId(12).to_string(), "module#12");
        assert_eq!(FabricBitId(7).to_string(), "fabric_bit#7");
    }

    #[test]
    fn test_index_round_trip() {
        assert_eq!(ModuleId::from_index(42).index(), 42);
        assert_eq!(ConfigBitId::from_index(u32::MAX as usize), ConfigBitId(u32::MAX));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    #[should_panic(expected = "arena exceeds u32 handle range")]
    fn test_index_past_handle_range() {
        ConfigBitId::from_index(u32::MAX as usize + 1);
    }
}
