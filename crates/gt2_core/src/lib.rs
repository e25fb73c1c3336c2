//! Codec and patch engine for Gran Turismo 2 saves stored in memory-card
//! images (`.mcr`), emulator card images (`.gme`) and single-save exports
//! (`.psv`).

pub mod car;
pub mod checksum;
pub mod container;
pub mod core_api;
pub mod field;
pub mod image;
pub mod layout;
pub mod patch;
pub mod progress;
pub mod region;

pub use car::{CarEdit, RecordIndexPolicy};
pub use container::{ContainerKind, SaveSlot};
pub use patch::{AppliedSlot, PatchReport, SaveUpdates, SlotOutcome};
pub use region::Region;
