/// Turns a named-field struct into a GUID asset.
///
/// Use it through the re-exported `apply` attribute:
///
/// ```
/// use staple_assets::{apply, GuidAsset};
///
/// #[apply(GuidAsset!)]
/// pub struct LevelScript {
///     pub waves: u32,
/// }
/// ```
///
/// The struct gets a private `guid` field, the serde and `Default` derives
/// the registry needs, both capability impls and an associated
/// `create(registry, guid)` factory. Serde is reached through this crate, so
/// callers do not need their own dependency on it.
#[macro_export]
macro_rules! GuidAsset {
    (
        $( #[$meta:meta] )*
    //  ^~~~attributes~~~~^
        $vis:vis struct $name:ident {
            $(
                $( #[$field_meta:meta] )*
    //          ^~~~field attributes~~~!^
                $field_vis:vis $field_name:ident : $field_ty:ty
    //          ^~~~~~~~~~~~~~~~~a single field~~~~~~~~~~~~~~~^
            ),*
        $(,)? }
    ) => {
        $( #[$meta] )*
        #[derive(
            Debug,
            Default,
            $crate::__private::serde::Serialize,
            $crate::__private::serde::Deserialize,
        )]
        #[serde(crate = "staple_assets::__private::serde")]
        $vis struct $name {
            $(
                $( #[$field_meta] )*
                $field_vis $field_name : $field_ty,
            )*
            #[serde(default)]
            guid: $crate::identifier::AssetGuid,
        }

        impl $crate::assets::StapleAsset for $name {
            const TAGS: $crate::assets::AssetTags = $crate::assets::AssetTags::LOADABLE;
        }

        impl $crate::assets::GuidAsset for $name {
            fn guid(&self) -> &$crate::identifier::AssetGuid {
                &self.guid
            }

            fn set_guid(&mut self, guid: $crate::identifier::AssetGuid) {
                self.guid = guid;
            }
        }

        impl $name {
            #[allow(dead_code)]
            pub fn create<R: $crate::resources::ResourceRegistry + ?Sized>(
                registry: &R,
                guid: impl Into<$crate::identifier::AssetGuid>,
            ) -> std::result::Result<$crate::assets::Handle<Self>, R::Error> {
                $crate::resources::create::<Self, R>(registry, guid)
            }
        }
    };
}

/// Same as [`GuidAsset!`] for assets that are not addressed by GUID.
///
/// ```
/// use staple_assets::{apply, StapleAsset};
///
/// #[apply(StapleAsset!)]
/// pub struct Settings {
///     pub volume: f32,
/// }
/// ```
#[macro_export]
macro_rules! StapleAsset {
    (
        $( #[$meta:meta] )*
        $vis:vis struct $name:ident {
            $(
                $( #[$field_meta:meta] )*
                $field_vis:vis $field_name:ident : $field_ty:ty
            ),*
        $(,)? }
    ) => {
        $( #[$meta] )*
        #[derive(
            Debug,
            Default,
            $crate::__private::serde::Serialize,
            $crate::__private::serde::Deserialize,
        )]
        #[serde(crate = "staple_assets::__private::serde")]
        $vis struct $name {
            $(
                $( #[$field_meta] )*
                $field_vis $field_name : $field_ty,
            )*
        }

        impl $crate::assets::StapleAsset for $name {}
    };
}

#[cfg(test)]
mod tests {
    use crate::apply;

    use crate::{assets::AssetTags, identifier::AssetGuid, GuidAsset, StapleAsset};

    #[apply(GuidAsset!)]
    #[derive(Clone, PartialEq)]
    pub struct Weather {
        /// Degrees.
        pub temperature: i32,
        #[serde(default)]
        pub(crate) rain: bool,
    }

    #[apply(StapleAsset!)]
    pub struct InputBindings {
        pub jump: String,
    }

    #[apply(GuidAsset!)]
    struct Empty {}

    #[test]
    fn guid_asset_declares_both_tags() {
        assert_eq!(<Weather as StapleAsset>::TAGS, AssetTags::LOADABLE);
        assert_eq!(<Empty as StapleAsset>::TAGS, AssetTags::LOADABLE);
        assert_eq!(<InputBindings as StapleAsset>::TAGS, AssetTags::STAPLE);
    }

    #[test]
    fn guid_accessors() {
        let mut weather = Weather::default();
        assert!(weather.guid().is_empty());

        weather.set_guid("storm".into());
        assert_eq!(weather.guid(), &AssetGuid::from("storm"));
    }

    #[test]
    fn guid_is_part_of_serialized_form() {
        let mut weather = Weather {
            temperature: 21,
            ..Default::default()
        };
        weather.set_guid("sunny".into());

        let json = serde_json::to_value(&weather).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "temperature": 21, "rain": false, "guid": "sunny" })
        );

        let without_guid: Weather = serde_json::from_str(r#"{ "temperature": -4 }"#).unwrap();
        assert_eq!(without_guid.temperature, -4);
        assert!(without_guid.guid().is_empty());
    }
}
