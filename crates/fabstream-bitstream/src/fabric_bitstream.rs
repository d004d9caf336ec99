//! Fabric-dependent bitstream container
//!
//! A fabric bitstream does not own configuration values. It is an ordered
//! view over the bits of a [`BitstreamManager`](fabstream_db::BitstreamManager):
//! each entry points at one configuration bit and, for frame-based
//! configuration, carries the frame address and data input that write it.

use fabstream_db::{ConfigBitId, FabricBitId};
use serde::{Deserialize, Serialize};

/// One entry of a fabric bitstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabricBit {
    /// Configuration bit loaded by this entry
    pub config_bit: ConfigBitId,
    /// Frame address, outermost level first (empty when unaddressed)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<bool>,
    /// Data input written at `address`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub din: Option<bool>,
}

/// Configuration bits in the order the fabric loads them
///
/// Entry handles are positions: [`reverse`](Self::reverse) remaps every
/// handle, so handles should not be kept across it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabricBitstream {
    bits: Vec<FabricBit>,
}

impl FabricBitstream {
    /// Create an empty fabric bitstream
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty fabric bitstream with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: Vec::with_capacity(capacity),
        }
    }

    /// Append an entry for `config_bit`
    pub fn add_bit(&mut self, config_bit: ConfigBitId) -> FabricBitId {
        let id = FabricBitId::from_index(self.bits.len());
        self.bits.push(FabricBit {
            config_bit,
            address: Vec::new(),
            din: None,
        });
        id
    }

    /// Set the frame address of an entry
    ///
    /// Panics if `bit` is not a valid entry.
    pub fn set_bit_address(&mut self, bit: FabricBitId, address: Vec<bool>) {
        self.bits[bit.index()].address = address;
    }

    /// Set the data input of an entry
    ///
    /// Panics if `bit` is not a valid entry.
    pub fn set_bit_din(&mut self, bit: FabricBitId, din: bool) {
        self.bits[bit.index()].din = Some(din);
    }

    /// Reverse the loading order
    pub fn reverse(&mut self) {
        self.bits.reverse();
    }

    /// Check that `bit` refers to an entry of this bitstream
    pub fn valid_bit_id(&self, bit: FabricBitId) -> bool {
        bit.index() < self.bits.len()
    }

    /// Entry handles in loading order
    pub fn bits(&self) -> impl ExactSizeIterator<Item = FabricBitId> {
        (0..self.bits.len()).map(FabricBitId::from_index)
    }

    /// Entries in loading order
    pub fn entries(&self) -> &[FabricBit] {
        &self.bits
    }

    /// Referenced configuration bits in loading order
    pub fn config_bits(&self) -> impl ExactSizeIterator<Item = ConfigBitId> + '_ {
        self.bits.iter().map(|bit| bit.config_bit)
    }

    /// Configuration bit referenced by an entry
    pub fn config_bit(&self, bit: FabricBitId) -> ConfigBitId {
        self.bits[bit.index()].config_bit
    }

    /// Frame address of an entry
    pub fn bit_address(&self, bit: FabricBitId) -> &[bool] {
        &self.bits[bit.index()].address
    }

    /// Data input of an entry, if one was set
    pub fn bit_din(&self, bit: FabricBitId) -> Option<bool> {
        self.bits[bit.index()].din
    }

    /// Number of entries
    pub fn num_bits(&self) -> usize {
        self.bits.len()
    }

    /// Whether the bitstream has no entries
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Plain-text listing, one entry per line
    ///
    /// Each line holds the configuration bit index, then the address and
    /// data input when present: `17 0110 1`.
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        for bit in &self.bits {
            output.push_str(&bit.config_bit.0.to_string());
            if !bit.address.is_empty() {
                output.push(' ');
                output.extend(bit.address.iter().map(|&b| if b { '1' } else { '0' }));
            }
            if let Some(din) = bit.din {
                output.push_str(if din { " 1" } else { " 0" });
            }
            output.push('\n');
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_annotate() {
        let mut fabric = FabricBitstream::new();
        let first = fabric.add_bit(ConfigBitId(4));
        let second = fabric.add_bit(ConfigBitId(2));
        fabric.set_bit_address(second, vec![true, false]);
        fabric.set_bit_din(second, true);

        assert_eq!(fabric.num_bits(), 2);
        assert_eq!(fabric.config_bit(first), ConfigBitId(4));
        assert!(fabric.bit_address(first).is_empty());
        assert_eq!(fabric.bit_din(first), None);
        assert_eq!(fabric.bit_address(second), &[true, false]);
        assert_eq!(fabric.bit_din(second), Some(true));
    }

    #[test]
    fn test_reverse() {
        let mut fabric = FabricBitstream::with_capacity(3);
        for i in 0..3 {
            fabric.add_bit(ConfigBitId(i));
        }
        fabric.reverse();

        let order: Vec<_> = fabric.config_bits().collect();
        assert_eq!(order, vec![ConfigBitId(2), ConfigBitId(1), ConfigBitId(0)]);
        assert_eq!(fabric.config_bit(FabricBitId(0)), ConfigBitId(2));
    }

    #[test]
    fn test_empty() {
        let fabric = FabricBitstream::new();
        assert!(fabric.is_empty());
        assert_eq!(fabric.bits().count(), 0);
        assert!(!fabric.valid_bit_id(FabricBitId(0)));
        assert_eq!(fabric.to_text(), "");
    }

    #[test]
    fn test_text_listing() {
        let mut fabric = FabricBitstream::new();
        fabric.add_bit(ConfigBitId(0));
        let framed = fabric.add_bit(ConfigBitId(17));
        fabric.set_bit_address(framed, vec![false, true, true, false]);
        fabric.set_bit_din(framed, true);

        assert_eq!(fabric.to_text(), "0\n17 0110 1\n");
    }

    #[test]
    fn test_json_omits_unset_fields() {
        let mut fabric = FabricBitstream::new();
        fabric.add_bit(ConfigBitId(1));
        let json = serde_json::to_string(&fabric).unwrap();
        assert_eq!(json, r#"{"bits":[{"config_bit":1}]}"#);
    }
}
