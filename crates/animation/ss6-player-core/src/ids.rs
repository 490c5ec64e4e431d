//! Identifiers handed out by data sources.

use serde::{Deserialize, Serialize};

/// Opaque handle to one animation (pack + animation) inside a data source.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AnimationId(pub u32);

/// Cell id as authored; negative means "no cell".
pub type CellId = i32;

/// Sentinel for "no cell resolved yet".
pub const NO_CELL: CellId = -1;

/// Split an instance reference of the form `"pack/anim"`.
#[inline]
pub fn split_ref_name(name: &str) -> Option<(&str, &str)> {
    let (pack, anim) = name.split_once('/')?;
    if pack.is_empty() || anim.is_empty() {
        return None;
    }
    Some((pack, anim))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_names_split_on_first_slash() {
        assert_eq!(split_ref_name("effects/spark"), Some(("effects", "spark")));
        assert_eq!(split_ref_name("a/b/c"), Some(("a", "b/c")));
        assert_eq!(split_ref_name("nopack"), None);
        assert_eq!(split_ref_name("/anim"), None);
    }
}
