//! Variant lookup by coordinate or rsid.

pub mod resolver;
pub mod store;
pub mod variant;

pub use resolver::Resolver;
pub use store::{InMemoryRsidIndex, InMemoryStore, PrimaryStore, SecondaryIndex, TabixVcfStore};
pub use variant::{GeneralizedVariant, Variant};
