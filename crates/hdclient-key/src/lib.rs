//! Self-describing object key scheme.
//!
//! A `FragmentsLayout` pins everything needed to reconstruct an object:
//! its version, service namespace, size/split geometry, code parameters,
//! and the placement of every fragment. `keygen` builds one from a fresh
//! placement draw; `serialize`/`deserialize` round-trip it through the
//! flat ASCII key handed back to callers.

mod error;
mod layout;
mod scheme;

pub use error::KeySchemeDeserializeError;
pub use layout::{align, CodeKind, ChunkLocators, FragmentLocator, FragmentsLayout, DATA_ALIGN};
pub use scheme::{deserialize, keygen, n_chunks, serialize, split_size, PlacementSlots};
