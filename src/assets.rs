use std::{
    cell::RefCell,
    fmt::{Debug, Display},
    rc::{Rc, Weak},
};

use serde::{de::DeserializeOwned, Serialize};

use crate::identifier::AssetGuid;

/// Capability tag a type declares to take part in asset discovery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetTag {
    Staple,
    Guid,
}

impl AssetTag {
    pub const ALL: [AssetTag; 2] = [AssetTag::Staple, AssetTag::Guid];

    const fn bit(self) -> u8 {
        match self {
            AssetTag::Staple => 1,
            AssetTag::Guid => 1 << 1,
        }
    }
}

impl Display for AssetTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetTag::Staple => f.write_str("StapleAsset"),
            AssetTag::Guid => f.write_str("GuidAsset"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AssetTags(u8);

impl AssetTags {
    pub const NONE: AssetTags = AssetTags(0);
    pub const STAPLE: AssetTags = AssetTags::NONE.with(AssetTag::Staple);
    pub const LOADABLE: AssetTags = AssetTags::STAPLE.with(AssetTag::Guid);

    pub const fn with(self, tag: AssetTag) -> Self {
        Self(self.0 | tag.bit())
    }

    pub const fn contains(&self, tag: AssetTag) -> bool {
        self.0 & tag.bit() != 0
    }

    pub const fn contains_all(&self, other: AssetTags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(&self, other: AssetTags) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = AssetTag> + '_ {
        AssetTag::ALL.into_iter().filter(|tag| self.contains(*tag))
    }

    /// Tags of `required` that are absent from `self`.
    pub fn missing(&self, required: AssetTags) -> AssetTags {
        AssetTags(required.0 & !self.0)
    }
}

impl FromIterator<AssetTag> for AssetTags {
    fn from_iter<I: IntoIterator<Item = AssetTag>>(iter: I) -> Self {
        iter.into_iter().fold(AssetTags::NONE, AssetTags::with)
    }
}

impl Debug for AssetTags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Display for AssetTags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("(none)");
        }
        for (index, tag) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(" + ")?;
            }
            Display::fmt(&tag, f)?;
        }
        Ok(())
    }
}

/// A type that participates in the asset system.
///
/// Assets are plain serde values so the resource registry can build them from
/// persisted data.
pub trait StapleAsset: Serialize + DeserializeOwned + 'static {
    const TAGS: AssetTags = AssetTags::STAPLE;
}

/// An asset that is identified, and retrievable, by GUID.
pub trait GuidAsset: StapleAsset {
    fn guid(&self) -> &AssetGuid;
    fn set_guid(&mut self, guid: AssetGuid);
}

/// Reference to an asset instance handed out by a resource registry.
pub enum Handle<A: StapleAsset> {
    Strong(Rc<RefCell<A>>),
    Weak(Weak<RefCell<A>>),
}

impl<A: StapleAsset> Handle<A> {
    pub fn new(asset: A) -> Self {
        Self::Strong(Rc::new(RefCell::new(asset)))
    }

    pub fn from_rc(asset: Rc<RefCell<A>>) -> Self {
        Self::Strong(asset)
    }

    pub fn is_strong(&self) -> bool {
        matches!(self, Self::Strong(_))
    }

    pub fn downgrade(&self) -> Self {
        match self {
            Self::Strong(asset) => Self::Weak(Rc::downgrade(asset)),
            Self::Weak(asset) => Self::Weak(asset.clone()),
        }
    }

    pub fn upgrade(&self) -> Option<Rc<RefCell<A>>> {
        match self {
            Self::Strong(asset) => Some(asset.clone()),
            Self::Weak(asset) => asset.upgrade(),
        }
    }

    /// Whether the asset behind this handle is still alive.
    pub fn is_alive(&self) -> bool {
        match self {
            Self::Strong(_) => true,
            Self::Weak(asset) => asset.strong_count() > 0,
        }
    }

    pub fn with<U>(&self, f: impl FnOnce(&A) -> U) -> Option<U> {
        let asset = self.upgrade()?;
        let asset = asset.borrow();
        Some(f(&asset))
    }

    pub fn with_mut<U>(&self, f: impl FnOnce(&mut A) -> U) -> Option<U> {
        let asset = self.upgrade()?;
        let mut asset = asset.borrow_mut();
        Some(f(&mut asset))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self.upgrade(), other.upgrade()) {
            (Some(first), Some(second)) => Rc::ptr_eq(&first, &second),
            _ => false,
        }
    }
}

impl<A: GuidAsset> Handle<A> {
    pub fn guid(&self) -> Option<AssetGuid> {
        self.with(|asset| asset.guid().clone())
    }
}

impl<A: StapleAsset> Clone for Handle<A> {
    fn clone(&self) -> Self {
        match self {
            Self::Strong(asset) => Self::Strong(asset.clone()),
            Self::Weak(asset) => Self::Weak(asset.clone()),
        }
    }
}

impl<A: StapleAsset> Debug for Handle<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Strong(_) => "Strong",
            Self::Weak(_) => "Weak",
        };
        f.debug_tuple(kind).field(&tynm::type_name::<A>()).finish()
    }
}
