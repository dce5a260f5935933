use std::any::TypeId;

use bevy_utils::hashbrown::HashMap;
use educe::Educe;
use log::debug;
use smol_str::{SmolStr, ToSmolStr};
use thiserror::Error;

use crate::assets::{AssetTag, AssetTags, GuidAsset, StapleAsset};

macro_rules! impl_register_assets {
    (
        $($t:ident),+
    ) => {
            __impl_register_assets_helper!($($t),+);
            impl<$($t: RegisterAssets),+> RegisterAssets for ($($t),+,) {
                fn register(types: &mut AssetTypes) -> Result<(), DiscoveryError> {
                    $(
                        <$t as RegisterAssets>::register(types)?;
                    )+
                    Ok(())
                }
            }
    };
}

macro_rules! __impl_register_assets_helper {
    ($t:ident) => {};
    ($t:ident, $($rest:ident),+) => {
        impl_register_assets!($($rest),+);
    }
}
impl_register_assets!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Asset type {0} is already registered")]
    AlreadyRegistered(SmolStr),
    #[error("Asset type {name} is missing {missing}")]
    MissingCapability { name: SmolStr, missing: AssetTags },
    #[error("No asset type named {0}")]
    Unknown(SmolStr),
    #[error("Asset type {0} cannot be instantiated")]
    NotInstantiable(SmolStr),
    #[error("Failed to instantiate asset type {name}")]
    Instantiate {
        name: SmolStr,
        #[source]
        source: serde_json::Error,
    },
}

type InstantiateFn = fn() -> serde_json::Result<serde_json::Value>;

fn instantiate_default<T: StapleAsset + Default>() -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(T::default())
}

/// What a type says about itself when it is handed to discovery.
#[derive(Educe, Clone)]
#[educe(Debug)]
pub struct AssetDeclaration {
    name: SmolStr,
    type_id: Option<TypeId>,
    tags: AssetTags,
    #[educe(Debug(ignore))]
    instantiate: Option<InstantiateFn>,
}

impl AssetDeclaration {
    /// A declaration with no backing Rust type, as produced by external tooling.
    pub fn new(name: impl AsRef<str>, tags: AssetTags) -> Self {
        Self {
            name: name.as_ref().to_smolstr(),
            type_id: None,
            tags,
            instantiate: None,
        }
    }

    /// Declares `T` with the tags it carries through [`StapleAsset::TAGS`].
    pub fn of<T: StapleAsset + Default>() -> Self {
        Self {
            name: tynm::type_name::<T>().into(),
            type_id: Some(TypeId::of::<T>()),
            tags: T::TAGS,
            instantiate: Some(instantiate_default::<T> as InstantiateFn),
        }
    }

    pub fn of_guid_asset<T: GuidAsset + Default>() -> Self {
        let mut declaration = Self::of::<T>();
        declaration.tags = declaration.tags.with(AssetTag::Guid);
        declaration
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    pub fn tags(&self) -> AssetTags {
        self.tags
    }

    pub fn is_loadable(&self) -> bool {
        self.tags.contains_all(AssetTags::LOADABLE)
    }
}

/// Tag filter used when scanning for asset types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AssetFilter {
    pub has: AssetTags,
    pub not: AssetTags,
}

impl AssetFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Types that can be created from a GUID.
    pub fn loadable() -> Self {
        Self {
            has: AssetTags::LOADABLE,
            not: AssetTags::NONE,
        }
    }

    pub fn push_has(&mut self, tag: AssetTag) {
        self.has = self.has.with(tag);
    }

    pub fn push_not(&mut self, tag: AssetTag) {
        self.not = self.not.with(tag);
    }

    pub fn matches(&self, tags: AssetTags) -> bool {
        tags.contains_all(self.has) && !tags.intersects(self.not)
    }
}

pub trait RegisterAssets {
    fn register(types: &mut AssetTypes) -> Result<(), DiscoveryError>;
}

impl<T: StapleAsset + Default> RegisterAssets for T {
    fn register(types: &mut AssetTypes) -> Result<(), DiscoveryError> {
        types.register(AssetDeclaration::of::<T>())
    }
}

/// Every asset type the engine knows about, indexed by name and type.
#[derive(Debug, Default)]
pub struct AssetTypes {
    declarations: Vec<AssetDeclaration>,
    by_name: HashMap<SmolStr, usize>,
    by_type: HashMap<TypeId, usize>,
}

impl AssetTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, declaration: AssetDeclaration) -> Result<(), DiscoveryError> {
        let tags = declaration.tags;
        if tags.is_empty() || (tags.contains(AssetTag::Guid) && !tags.contains(AssetTag::Staple))
        {
            return Err(DiscoveryError::MissingCapability {
                name: declaration.name,
                missing: tags.missing(AssetTags::STAPLE),
            });
        }

        let type_taken = declaration
            .type_id
            .is_some_and(|type_id| self.by_type.contains_key(&type_id));
        if type_taken || self.by_name.contains_key(&declaration.name) {
            return Err(DiscoveryError::AlreadyRegistered(declaration.name));
        }

        debug!("registered asset type {0} ({1})", declaration.name, tags);
        let index = self.declarations.len();
        self.by_name.insert(declaration.name.clone(), index);
        if let Some(type_id) = declaration.type_id {
            self.by_type.insert(type_id, index);
        }
        self.declarations.push(declaration);
        Ok(())
    }

    pub fn register_asset<T: StapleAsset + Default>(&mut self) -> Result<(), DiscoveryError> {
        self.register(AssetDeclaration::of::<T>())
    }

    pub fn register_all<R: RegisterAssets>(&mut self) -> Result<(), DiscoveryError> {
        R::register(self)
    }

    pub fn get(&self, name: &str) -> Option<&AssetDeclaration> {
        let index = *self.by_name.get(name)?;
        self.declarations.get(index)
    }

    pub fn declaration_of<T: 'static>(&self) -> Option<&AssetDeclaration> {
        let index = *self.by_type.get(&TypeId::of::<T>())?;
        self.declarations.get(index)
    }

    /// Declarations matching `filter`, sorted by name.
    pub fn discover(&self, filter: &AssetFilter) -> Vec<&AssetDeclaration> {
        let mut found: Vec<_> = self
            .declarations
            .iter()
            .filter(|declaration| filter.matches(declaration.tags))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    /// Looks `name` up and checks it can be created from a GUID.
    pub fn require_loadable(&self, name: &str) -> Result<&AssetDeclaration, DiscoveryError> {
        let declaration = self
            .get(name)
            .ok_or_else(|| DiscoveryError::Unknown(name.to_smolstr()))?;
        if !declaration.is_loadable() {
            return Err(DiscoveryError::MissingCapability {
                name: declaration.name.clone(),
                missing: declaration.tags.missing(AssetTags::LOADABLE),
            });
        }
        Ok(declaration)
    }

    /// Default serialized instance of `name`, as written for a freshly created asset.
    pub fn instantiate(&self, name: &str) -> Result<serde_json::Value, DiscoveryError> {
        let declaration = self
            .get(name)
            .ok_or_else(|| DiscoveryError::Unknown(name.to_smolstr()))?;
        let instantiate = declaration
            .instantiate
            .ok_or_else(|| DiscoveryError::NotInstantiable(declaration.name.clone()))?;
        instantiate().map_err(|source| DiscoveryError::Instantiate {
            name: declaration.name.clone(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}
