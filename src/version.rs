//! Plugin identity

use std::fmt;

pub const PLUGIN_NAME: &str = "Mupen64Plus Serial Input Plugin";
pub const PLUGIN_VERSION: PackedVersion = PackedVersion(0x00002);
pub const INPUT_API_VERSION: PackedVersion = PackedVersion(0x20001);
pub const CONFIG_API_VERSION: PackedVersion = PackedVersion(0x20100);

/// `0xMMMMmmpp` packed version number as used by the emulator API
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PackedVersion(pub u32);

impl PackedVersion {
    pub fn major(self) -> u32 {
        (self.0 >> 16) & 0xffff
    }

    pub fn minor(self) -> u32 {
        (self.0 >> 8) & 0xff
    }

    pub fn patch(self) -> u32 {
        self.0 & 0xff
    }
}

impl fmt::Display for PackedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}
