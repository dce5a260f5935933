use crate::{
    assets::{GuidAsset, Handle},
    identifier::AssetGuid,
};

/// The engine's resource registry, as seen by asset types.
///
/// Caching, lifetime and the error taxonomy all belong to the implementor.
pub trait ResourceRegistry {
    type Error: std::error::Error + 'static;

    fn load<T: GuidAsset>(&self, guid: &AssetGuid) -> Result<Handle<T>, Self::Error>;
}

impl<R: ResourceRegistry + ?Sized> ResourceRegistry for &R {
    type Error = R::Error;

    fn load<T: GuidAsset>(&self, guid: &AssetGuid) -> Result<Handle<T>, Self::Error> {
        (**self).load::<T>(guid)
    }
}

/// Loads `T` by GUID through `registry`.
///
/// This is the only sanctioned way to obtain a [`GuidAsset`]. Whatever the
/// registry returns, errors included, is handed back untouched.
pub fn create<T, R>(registry: &R, guid: impl Into<AssetGuid>) -> Result<Handle<T>, R::Error>
where
    T: GuidAsset,
    R: ResourceRegistry + ?Sized,
{
    registry.load::<T>(&guid.into())
}
