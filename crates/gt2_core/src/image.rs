use crate::container::{ContainerKind, SaveSlot, locate_slots};

/// A loaded card or export buffer together with the save slots found in it.
/// The slot list is fixed at load time; patches never move or add slots.
#[derive(Debug, Clone)]
pub struct MemoryCardImage {
    bytes: Vec<u8>,
    kind: ContainerKind,
    slots: Vec<SaveSlot>,
}

impl MemoryCardImage {
    pub fn load(bytes: Vec<u8>, kind: ContainerKind) -> Self {
        let slots = locate_slots(&bytes, kind);
        Self { bytes, kind, slots }
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn slots(&self) -> &[SaveSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&SaveSlot> {
        self.slots.get(index)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Slot `index` together with mutable access to the buffer.
    pub(crate) fn slot_and_bytes_mut(&mut self, index: usize) -> Option<(&SaveSlot, &mut [u8])> {
        let slot = self.slots.get(index)?;
        Some((slot, self.bytes.as_mut_slice()))
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
