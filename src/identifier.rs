use std::{borrow::Borrow, fmt::Display};

use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, ToSmolStr};

/// Opaque GUID naming a persisted asset.
///
/// The value is never parsed or validated here, the resource registry that
/// owns it decides what a well formed key looks like.
#[derive(Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetGuid(SmolStr);

impl AssetGuid {
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(SmolStr::new(value))
    }

    /// Mints a fresh random GUID for tooling that creates new assets.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_smolstr())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for AssetGuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AssetGuid").field(&self.0.as_str()).finish()
    }
}

impl Display for AssetGuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for AssetGuid {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for AssetGuid {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for AssetGuid {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for AssetGuid {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

impl From<SmolStr> for AssetGuid {
    fn from(value: SmolStr) -> Self {
        Self(value)
    }
}

impl From<&AssetGuid> for AssetGuid {
    fn from(value: &AssetGuid) -> Self {
        value.clone()
    }
}
