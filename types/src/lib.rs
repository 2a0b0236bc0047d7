//! Shared types for the arcade round engines.
//!
//! Everything the execution layer, the simulator and an embedding app shell
//! need to agree on lives here: game identifiers, round status and outcomes,
//! the resolution record produced exactly once per round, and the JSON blobs
//! persisted in the local key-value store.

pub mod arcade;

pub use arcade::*;
