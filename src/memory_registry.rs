use std::{cell::RefCell, rc::Rc};

use bevy_utils::hashbrown::HashMap;
use downcast_rs::{impl_downcast, Downcast};
use log::{debug, trace};
use smol_str::{SmolStr, ToSmolStr};
use thiserror::Error;

use crate::{
    assets::{GuidAsset, Handle, StapleAsset},
    identifier::AssetGuid,
    resources::ResourceRegistry,
};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No resource registered under guid {0}")]
    NotFound(AssetGuid),
    #[error("Resource {guid} is a {found}, expected {expected}")]
    TypeMismatch {
        guid: AssetGuid,
        expected: SmolStr,
        found: SmolStr,
    },
    #[error("Failed to build {type_name} from resource {guid}")]
    Deserialize {
        guid: AssetGuid,
        type_name: SmolStr,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to store resource {guid}")]
    Serialize {
        guid: AssetGuid,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
struct Record {
    type_name: SmolStr,
    value: serde_json::Value,
}

trait CachedAsset: Downcast {
    fn type_name(&self) -> &str;
}
impl_downcast!(CachedAsset);

struct Cached<T: StapleAsset> {
    asset: Rc<RefCell<T>>,
    type_name: SmolStr,
}

impl<T: StapleAsset> CachedAsset for Cached<T> {
    fn type_name(&self) -> &str {
        &self.type_name
    }
}

/// Resource registry backed by in-memory JSON records.
///
/// Loaded instances are cached per GUID, so loading the same GUID twice hands
/// out the same instance until the cache is cleared or the record replaced.
#[derive(Default)]
pub struct MemoryRegistry {
    records: RefCell<HashMap<AssetGuid, Record>>,
    cache: RefCell<HashMap<AssetGuid, Box<dyn CachedAsset>>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw record for `guid`, replacing (and evicting) any previous one.
    pub fn insert(
        &self,
        guid: impl Into<AssetGuid>,
        type_name: impl AsRef<str>,
        value: serde_json::Value,
    ) {
        let guid = guid.into();
        self.cache.borrow_mut().remove(&guid);
        let record = Record {
            type_name: type_name.as_ref().to_smolstr(),
            value,
        };
        if self.records.borrow_mut().insert(guid.clone(), record).is_some() {
            debug!("replaced resource {guid}");
        }
    }

    pub fn insert_asset<T: StapleAsset>(
        &self,
        guid: impl Into<AssetGuid>,
        asset: &T,
    ) -> Result<(), RegistryError> {
        let guid = guid.into();
        let value = serde_json::to_value(asset).map_err(|source| RegistryError::Serialize {
            guid: guid.clone(),
            source,
        })?;
        self.insert(guid, tynm::type_name::<T>(), value);
        Ok(())
    }

    pub fn remove(&self, guid: &AssetGuid) -> bool {
        self.cache.borrow_mut().remove(guid);
        self.records.borrow_mut().remove(guid).is_some()
    }

    pub fn contains(&self, guid: &AssetGuid) -> bool {
        self.records.borrow().contains_key(guid)
    }

    pub fn type_name_of(&self, guid: &AssetGuid) -> Option<SmolStr> {
        self.records
            .borrow()
            .get(guid)
            .map(|record| record.type_name.clone())
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    pub fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn clear_cache(&self) {
        let mut cache = self.cache.borrow_mut();
        debug!("dropping {0} cached assets", cache.len());
        cache.clear();
    }

    fn cached<T: GuidAsset>(&self, guid: &AssetGuid) -> Result<Option<Handle<T>>, RegistryError> {
        let cache = self.cache.borrow();
        let Some(entry) = cache.get(guid) else {
            return Ok(None);
        };
        match entry.downcast_ref::<Cached<T>>() {
            Some(cached) => Ok(Some(Handle::from_rc(cached.asset.clone()))),
            None => Err(RegistryError::TypeMismatch {
                guid: guid.clone(),
                expected: tynm::type_name::<T>().into(),
                found: entry.type_name().into(),
            }),
        }
    }
}

impl ResourceRegistry for MemoryRegistry {
    type Error = RegistryError;

    fn load<T: GuidAsset>(&self, guid: &AssetGuid) -> Result<Handle<T>, Self::Error> {
        if let Some(handle) = self.cached::<T>(guid)? {
            trace!("cache hit for {guid}");
            return Ok(handle);
        }

        let type_name = tynm::type_name::<T>().to_smolstr();
        let record = self
            .records
            .borrow()
            .get(guid)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(guid.clone()))?;
        if record.type_name != type_name {
            return Err(RegistryError::TypeMismatch {
                guid: guid.clone(),
                expected: type_name,
                found: record.type_name,
            });
        }

        let mut asset: T =
            serde_json::from_value(record.value).map_err(|source| RegistryError::Deserialize {
                guid: guid.clone(),
                type_name: type_name.clone(),
                source,
            })?;
        asset.set_guid(guid.clone());

        let asset = Rc::new(RefCell::new(asset));
        self.cache.borrow_mut().insert(
            guid.clone(),
            Box::new(Cached {
                asset: asset.clone(),
                type_name: type_name.clone(),
            }),
        );
        debug!("loaded {type_name} {guid}");
        Ok(Handle::from_rc(asset))
    }
}
