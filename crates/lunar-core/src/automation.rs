//! Per-face automation configuration for machines.
//!
//! Each face of a machine is configured with an [`AutomationType`] that says
//! which resource family may pass through it and in which direction. Conduits
//! only link to a machine face that carries their medium.

use serde::{Deserialize, Serialize};

use crate::position::Direction;
use crate::resource::Medium;

/// What may pass through one face of a machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutomationType {
    #[default]
    None,
    PowerInput,
    PowerOutput,
    PowerIo,
    FluidInput,
    FluidOutput,
    FluidIo,
    ItemInput,
    ItemOutput,
    ItemIo,
}

impl AutomationType {
    pub fn is_energy(self) -> bool {
        matches!(
            self,
            AutomationType::PowerInput | AutomationType::PowerOutput | AutomationType::PowerIo
        )
    }

    pub fn is_fluid(self) -> bool {
        matches!(
            self,
            AutomationType::FluidInput | AutomationType::FluidOutput | AutomationType::FluidIo
        )
    }

    pub fn is_item(self) -> bool {
        matches!(
            self,
            AutomationType::ItemInput | AutomationType::ItemOutput | AutomationType::ItemIo
        )
    }

    pub fn is_input(self) -> bool {
        matches!(
            self,
            AutomationType::PowerInput
                | AutomationType::PowerIo
                | AutomationType::FluidInput
                | AutomationType::FluidIo
                | AutomationType::ItemInput
                | AutomationType::ItemIo
        )
    }

    pub fn is_output(self) -> bool {
        matches!(
            self,
            AutomationType::PowerOutput
                | AutomationType::PowerIo
                | AutomationType::FluidOutput
                | AutomationType::FluidIo
                | AutomationType::ItemOutput
                | AutomationType::ItemIo
        )
    }

    /// Whether this face carries resources of the given conduit medium.
    pub fn carries(self, medium: Medium) -> bool {
        match medium {
            Medium::Energy => self.is_energy(),
            Medium::Fluid => self.is_fluid(),
        }
    }

    /// Whether a face configured as `self` satisfies a requirement of `other`:
    /// every family and direction flag set on `other` must also be set here.
    pub fn can_pass_as(self, other: AutomationType) -> bool {
        if other == self {
            return true;
        }
        if other.is_energy() && !self.is_energy() {
            return false;
        }
        if other.is_fluid() && !self.is_fluid() {
            return false;
        }
        if other.is_item() && !self.is_item() {
            return false;
        }
        if other.is_input() && !self.is_input() {
            return false;
        }
        if other.is_output() {
            return self.is_output();
        }
        true
    }
}

/// Automation configuration for all six faces, indexed by [`Direction`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceConfig([AutomationType; 6]);

impl FaceConfig {
    pub fn uniform(automation: AutomationType) -> Self {
        Self([automation; 6])
    }

    pub fn get(&self, face: Direction) -> AutomationType {
        self.0[face.ordinal()]
    }

    pub fn set(&mut self, face: Direction, automation: AutomationType) {
        self.0[face.ordinal()] = automation;
    }

    pub fn with(mut self, face: Direction, automation: AutomationType) -> Self {
        self.set(face, automation);
        self
    }

    /// True if any face accepts input of the given medium.
    pub fn accepts_input(&self, medium: Medium) -> bool {
        self.0.iter().any(|a| a.carries(medium) && a.is_input())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_passes_as_input_and_output() {
        assert!(AutomationType::PowerIo.can_pass_as(AutomationType::PowerInput));
        assert!(AutomationType::PowerIo.can_pass_as(AutomationType::PowerOutput));
        assert!(!AutomationType::PowerInput.can_pass_as(AutomationType::PowerIo));
    }

    #[test]
    fn families_do_not_cross() {
        assert!(!AutomationType::FluidInput.can_pass_as(AutomationType::PowerInput));
        assert!(!AutomationType::ItemIo.can_pass_as(AutomationType::FluidOutput));
        assert!(AutomationType::ItemIo.can_pass_as(AutomationType::None));
    }

    #[test]
    fn none_carries_nothing() {
        assert!(!AutomationType::None.carries(Medium::Energy));
        assert!(!AutomationType::None.carries(Medium::Fluid));
        assert!(!AutomationType::None.is_input());
    }

    #[test]
    fn face_config_lookup() {
        let faces = FaceConfig::default()
            .with(Direction::Down, AutomationType::PowerInput)
            .with(Direction::North, AutomationType::FluidOutput);
        assert_eq!(faces.get(Direction::Down), AutomationType::PowerInput);
        assert_eq!(faces.get(Direction::Up), AutomationType::None);
        assert!(faces.accepts_input(Medium::Energy));
        assert!(!faces.accepts_input(Medium::Fluid));
    }
}
