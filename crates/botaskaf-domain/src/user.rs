//! User privilege levels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Account privilege level.
///
/// Variants are declared in ascending privilege, and the derived `Ord` is the
/// only ordering callers may rely on. The stored `i16` values keep gaps
/// between levels; nothing interprets the gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Invalid,
    Disabled,
    Registered,
    Manager,
    Administrator,
    SuperUser,
}

impl UserType {
    /// Convert from the stored column value. Unknown values map to `Invalid`.
    pub fn from_i16(v: i16) -> Self {
        match v {
            0 => Self::Disabled,
            16 => Self::Registered,
            32 => Self::Manager,
            64 => Self::Administrator,
            127 => Self::SuperUser,
            _ => Self::Invalid,
        }
    }

    /// Convert to the stored column value.
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Invalid => -1,
            Self::Disabled => 0,
            Self::Registered => 16,
            Self::Manager => 32,
            Self::Administrator => 64,
            Self::SuperUser => 127,
        }
    }

    pub fn is_admin(self) -> bool {
        self >= Self::Administrator
    }

    /// Disabled and invalid accounts cannot log in or act.
    pub fn can_log_in(self) -> bool {
        self > Self::Disabled
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Disabled => "disabled",
            Self::Registered => "registered",
            Self::Manager => "manager",
            Self::Administrator => "administrator",
            Self::SuperUser => "super_user",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
