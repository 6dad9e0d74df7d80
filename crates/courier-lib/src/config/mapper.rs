use serde::{Deserialize, Serialize};

/// Output policy of a [`Mapper`](crate::json::Mapper).
///
/// `Default` matches a bare engine: nulls are kept and output is compact.
/// The encoder's own defaults come from [`MapperConfig::codec_defaults`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct MapperConfig {
    /// Drop object fields whose value is `null`.
    pub omit_nulls: bool,
    /// Render multi-line output instead of compact JSON.
    pub pretty_print: bool,
    /// Spaces per object nesting level when pretty printing.
    pub indent_width: usize,
}

impl MapperConfig {
    /// Policy used by `JsonEncoder::new`: omit nulls, pretty print, two spaces.
    pub fn codec_defaults() -> Self {
        Self {
            omit_nulls: true,
            pretty_print: true,
            ..Self::default()
        }
    }
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            omit_nulls: false,
            pretty_print: false,
            indent_width: 2,
        }
    }
}
