//! Machine processing for the lunar core.
//!
//! [`MachineProcessController`] drives every processing machine through the
//! same per-tick cycle. Machines plug in through [`MachineLogic`] and keep
//! their runtime state in a [`MachineProcessState`].
//!
//! # Stock machines
//!
//! - [`RecipeMachine`]: item recipes with an energy draw per tick (electric
//!   furnace, electric compressor).
//! - [`OxygenSealer`]: keeps an enclosed area breathable using the shared
//!   [`lunar_sealing::SealedAreaCache`].

pub mod config;
pub mod controller;
pub mod inventory;
pub mod phase;
pub mod recipe;
pub mod sealer;
pub mod status;

pub use config::MachineEnergyConfig;
pub use controller::{MachineLogic, MachineProcessController, TickReport};
pub use inventory::{Inventory, InventorySlot, ItemAmount, ItemStack};
pub use phase::{MachinePhase, MachineProcessState, WorkPhase};
pub use recipe::{Recipe, RecipeMachine};
pub use sealer::{OxygenSealer, SealCycle, SealerConfig};
pub use status::{BlockReason, ConfigFault, MachineStatus, RedstoneMode};
