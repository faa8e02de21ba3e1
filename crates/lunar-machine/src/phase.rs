use lunar_core::fixed::{Fixed64, Ticks, ratio};
use serde::{Deserialize, Serialize};

use crate::status::{BlockReason, ConfigFault, MachineStatus, RedstoneMode};

/// A step of the working cycle a blocked machine can resume into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkPhase {
    #[default]
    Idle,
    Gathering,
    Processing,
    Emitting,
}

/// Where a machine is in its processing cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachinePhase {
    #[default]
    Idle,
    Gathering,
    Processing,
    Emitting,
    /// A precondition failed. Re-evaluated every tick; on success the
    /// machine continues from `resume`.
    Blocked { reason: BlockReason, resume: WorkPhase },
    /// Terminal until the machine is reset.
    Failed { fault: ConfigFault },
}

impl MachinePhase {
    /// The working step this phase stands for, if any.
    pub fn work_phase(self) -> Option<WorkPhase> {
        match self {
            MachinePhase::Idle => Some(WorkPhase::Idle),
            MachinePhase::Gathering => Some(WorkPhase::Gathering),
            MachinePhase::Processing => Some(WorkPhase::Processing),
            MachinePhase::Emitting => Some(WorkPhase::Emitting),
            MachinePhase::Blocked { resume, .. } => Some(resume),
            MachinePhase::Failed { .. } => None,
        }
    }

    pub fn is_blocked(self) -> bool {
        matches!(self, MachinePhase::Blocked { .. })
    }

    pub fn is_failed(self) -> bool {
        matches!(self, MachinePhase::Failed { .. })
    }
}

impl From<WorkPhase> for MachinePhase {
    fn from(phase: WorkPhase) -> Self {
        match phase {
            WorkPhase::Idle => MachinePhase::Idle,
            WorkPhase::Gathering => MachinePhase::Gathering,
            WorkPhase::Processing => MachinePhase::Processing,
            WorkPhase::Emitting => MachinePhase::Emitting,
        }
    }
}

/// Per-machine runtime state, kept apart from the machine's logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineProcessState<Op> {
    pub phase: MachinePhase,
    /// Processing ticks left in the current operation.
    pub remaining: Ticks,
    /// Processing ticks the current operation started with.
    pub total: Ticks,
    /// The operation selected in `Idle`, held until emitted.
    pub operation: Option<Op>,
    pub status: MachineStatus,
    pub redstone: RedstoneMode,
}

impl<Op> Default for MachineProcessState<Op> {
    fn default() -> Self {
        Self {
            phase: MachinePhase::Idle,
            remaining: 0,
            total: 0,
            operation: None,
            status: MachineStatus::Idle,
            redstone: RedstoneMode::Ignore,
        }
    }
}

impl<Op> MachineProcessState<Op> {
    pub fn with_redstone(mut self, redstone: RedstoneMode) -> Self {
        self.redstone = redstone;
        self
    }

    /// Fraction of the current operation's processing done, 0..1.
    /// Zero when no operation has started processing.
    pub fn progress(&self) -> Fixed64 {
        if self.total == 0 {
            return Fixed64::ZERO;
        }
        ratio(self.total - self.remaining, self.total)
    }

    /// Back to `Idle`, dropping any in-flight operation and clearing a
    /// `Failed` phase.
    pub fn reset(&mut self) {
        self.phase = MachinePhase::Idle;
        self.remaining = 0;
        self.total = 0;
        self.operation = None;
        self.status = MachineStatus::Idle;
    }
}
