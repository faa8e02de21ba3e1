use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Block reasons
// ---------------------------------------------------------------------------

/// Why a machine cannot make progress this tick. Routine exhaustion, never
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockReason {
    NotEnoughEnergy,
    NotEnoughOxygen,
    NotEnoughResources,
    AreaTooLarge,
    AreaNotSealed,
    OutputFull,
    RedstoneDisabled,
}

/// A configuration the machine can never run with. Cleared only by
/// resetting the machine after fixing its setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum ConfigFault {
    #[error("machine has no recipes")]
    NoRecipes,
    #[error("recipe {recipe} has zero duration")]
    ZeroDuration { recipe: usize },
    #[error("recipe {recipe} produces nothing")]
    NoOutputs { recipe: usize },
    #[error("seal check interval is zero")]
    ZeroCheckInterval,
}

// ---------------------------------------------------------------------------
// Observable status
// ---------------------------------------------------------------------------

/// What a machine reports to UI and automation collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineStatus {
    #[default]
    Idle,
    Active,
    /// An oxygen sealer holding a breathable area.
    Sealed,
    Blocked(BlockReason),
    Failed(ConfigFault),
}

impl MachineStatus {
    pub fn is_working(self) -> bool {
        matches!(self, MachineStatus::Active | MachineStatus::Sealed)
    }

    pub fn block_reason(self) -> Option<BlockReason> {
        match self {
            MachineStatus::Blocked(reason) => Some(reason),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Redstone gating
// ---------------------------------------------------------------------------

/// How a machine reacts to a redstone signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RedstoneMode {
    /// Runs regardless of signal.
    #[default]
    Ignore,
    /// Runs only without a signal.
    Low,
    /// Runs only with a signal.
    High,
}

impl RedstoneMode {
    pub fn allows(self, powered: bool) -> bool {
        match self {
            RedstoneMode::Ignore => true,
            RedstoneMode::Low => !powered,
            RedstoneMode::High => powered,
        }
    }
}
