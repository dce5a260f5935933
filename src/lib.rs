extern crate self as staple_assets;

pub mod identifier;
pub mod assets;
pub mod asset_macros;
pub mod resources;
pub mod memory_registry;
pub mod asset_types;
pub mod asset_database;
pub mod scaffold;

pub use assets::{AssetTag, AssetTags, GuidAsset, Handle, StapleAsset};
pub use identifier::AssetGuid;
pub use macro_rules_attribute::apply;
pub use resources::{create, ResourceRegistry};

/// Paths the asset macros expand to, so downstream crates only need this one.
#[doc(hidden)]
pub mod __private {
    pub use serde;
}
