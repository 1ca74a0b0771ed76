use serde::{Deserialize, Serialize};

/// Process-wide energy mode. Shapes generator verbosity only; the arbiter
/// never looks at it.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum OperatingMode {
    #[default]
    Normal = 0,
    Peak = 1,
}

impl OperatingMode {
    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Peak,
            _ => Self::Normal,
        }
    }
}
