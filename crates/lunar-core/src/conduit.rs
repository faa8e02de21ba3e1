use serde::{Deserialize, Serialize};

use crate::resource::Medium;

/// Transfer cap of a standard aluminum wire, per tick.
pub const WIRE_TRANSFER_LIMIT: u64 = 240;
/// Transfer cap of a heavy aluminum wire, per tick.
pub const HEAVY_WIRE_TRANSFER_LIMIT: u64 = 480;
/// Transfer cap of a fluid pipe, per tick.
pub const PIPE_TRANSFER_LIMIT: u64 = 1_000;

/// What a conduit segment (wire or pipe) can carry and how much per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeCapability {
    pub medium: Medium,
    /// Maximum amount moved through this segment per tick.
    pub cap: u64,
    /// Pipe colour. Pipes only join pipes of the same colour.
    pub channel: Option<u8>,
}

impl NodeCapability {
    pub fn wire(cap: u64) -> Self {
        Self {
            medium: Medium::Energy,
            cap,
            channel: None,
        }
    }

    pub fn pipe(cap: u64, channel: Option<u8>) -> Self {
        Self {
            medium: Medium::Fluid,
            cap,
            channel,
        }
    }

    pub fn standard_wire() -> Self {
        Self::wire(WIRE_TRANSFER_LIMIT)
    }

    pub fn heavy_wire() -> Self {
        Self::wire(HEAVY_WIRE_TRANSFER_LIMIT)
    }

    pub fn standard_pipe() -> Self {
        Self::pipe(PIPE_TRANSFER_LIMIT, None)
    }

    /// Two segments connect only when medium, cap and channel all match.
    pub fn is_compatible(&self, other: &NodeCapability) -> bool {
        self.medium == other.medium && self.cap == other.cap && self.channel == other.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_tier_wires_connect() {
        assert!(NodeCapability::standard_wire().is_compatible(&NodeCapability::standard_wire()));
    }

    #[test]
    fn wire_tiers_do_not_mix() {
        assert!(!NodeCapability::standard_wire().is_compatible(&NodeCapability::heavy_wire()));
    }

    #[test]
    fn pipes_and_wires_do_not_mix() {
        let wire = NodeCapability::wire(PIPE_TRANSFER_LIMIT);
        assert!(!wire.is_compatible(&NodeCapability::standard_pipe()));
    }

    #[test]
    fn pipe_colours_must_match() {
        let red = NodeCapability::pipe(100, Some(1));
        let blue = NodeCapability::pipe(100, Some(2));
        assert!(!red.is_compatible(&blue));
        assert!(red.is_compatible(&NodeCapability::pipe(100, Some(1))));
    }
}
