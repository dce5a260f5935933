use const_format::concatcp;
use once_cell::sync::Lazy;
use regex::Regex;
use smol_str::{SmolStr, ToSmolStr};
use thiserror::Error;

const CRATE_NAME: &str = "staple_assets";
const CRATE_IMPORT: &str = concatcp!("use ", CRATE_NAME, "::{apply, ");

const RESERVED: &[&str] = &[
    "_", "Self", "abstract", "as", "async", "await", "become", "box", "break", "const",
    "continue", "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for",
    "gen", "if", "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut",
    "override", "priv", "pub", "ref", "return", "self", "static", "struct", "super", "trait",
    "true", "try", "type", "typeof", "union", "unsafe", "unsized", "use", "virtual", "where",
    "while", "yield",
];

static TYPE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());
static ACRONYM_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").unwrap());
static WORD_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScaffoldError {
    #[error("{0:?} is not a valid type name")]
    InvalidName(SmolStr),
    #[error("{0:?} is a reserved word")]
    ReservedName(SmolStr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StubKind {
    /// Loadable by GUID, the usual asset script.
    #[default]
    Guid,
    Staple,
}

impl StubKind {
    fn macro_name(self) -> &'static str {
        match self {
            StubKind::Guid => "GuidAsset",
            StubKind::Staple => "StapleAsset",
        }
    }
}

fn validate(type_name: &str) -> Result<(), ScaffoldError> {
    if !TYPE_NAME.is_match(type_name) {
        return Err(ScaffoldError::InvalidName(type_name.to_smolstr()));
    }
    if RESERVED.contains(&type_name) {
        return Err(ScaffoldError::ReservedName(type_name.to_smolstr()));
    }
    Ok(())
}

/// Source of a new asset script named `type_name`.
///
/// The stub only imports from this crate, and compiles as is:
///
/// ```
/// use staple_assets::{apply, GuidAsset};
///
/// #[apply(GuidAsset!)]
/// pub struct LootTable {}
/// # fn main() {
/// #     let stub = staple_assets::scaffold::render_asset_stub("LootTable").unwrap();
/// #     assert_eq!(
/// #         stub,
/// #         "use staple_assets::{apply, GuidAsset};\n\n#[apply(GuidAsset!)]\npub struct LootTable {}\n"
/// #     );
/// # }
/// ```
pub fn render_stub(type_name: &str, kind: StubKind) -> Result<String, ScaffoldError> {
    validate(type_name)?;
    let macro_name = kind.macro_name();
    Ok(format!(
        "{CRATE_IMPORT}{macro_name}}};\n\n#[apply({macro_name}!)]\npub struct {type_name} {{}}\n"
    ))
}

pub fn render_asset_stub(type_name: &str) -> Result<String, ScaffoldError> {
    render_stub(type_name, StubKind::Guid)
}

/// File the rendered stub should be saved as, `LootTable` -> `loot_table.rs`.
pub fn stub_file_name(type_name: &str) -> Result<String, ScaffoldError> {
    validate(type_name)?;
    let name = ACRONYM_BOUNDARY.replace_all(type_name, "${1}_${2}");
    let name = WORD_BOUNDARY.replace_all(&name, "${1}_${2}");
    Ok(format!("{0}.rs", name.to_lowercase()))
}
