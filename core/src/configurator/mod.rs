//! Variant configuration engine.
//!
//! - [`Configurator`] — Field/value state machine with subscribers
//! - [`VariantCatalog`] — Variant sets parsed from `EPIC_level_variant_sets`
//! - [`apply_variant`] — Pushes a variant's overrides into a [`SceneGraph`](crate::scene::SceneGraph)

mod engine;
mod variant;

pub use engine::{Configurator, ConfiguratorError, Field, FieldValue, SubscriptionId};
pub use variant::{
    LevelVariantSet, MaterialOverride, NodeOverride, Variant, VariantCatalog, VariantSet,
    apply_variant,
};
