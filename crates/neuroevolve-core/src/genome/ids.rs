//! Unique identifiers for neurons and connections.
//!
//! Both keys are minted by a [`slotmap::SlotMap`] arena rather than a bare atomic counter: a
//! slot key packs a generation counter with its index, so a stale `NeuronId` held after its
//! neuron was removed is detected rather than silently aliasing whatever was reinserted at that
//! slot. IDs are stable within one genotype's arena but are not meaningful across genotypes.

slotmap::new_key_type! {
    pub struct NeuronId;
    pub struct ConnectionId;
}
