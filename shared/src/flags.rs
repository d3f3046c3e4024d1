//! Decoding of `open(2)` flags into symbolic names
//!
//! The layout follows the asm-generic `fcntl.h` used by x86 and x86_64:
//! the access mode lives in the two lowest bits and the option bits start
//! at `O_CREAT` (`0o100`, bit 6). The table is a fixed contract with the
//! upstream instrumentation and must not be derived from the build host.

use bitflags::bitflags;
use serde::{Serialize, Serializer};
use std::fmt;

/// Mask selecting the access mode bits
pub const ACCESS_MODE_MASK: i32 = 0b11;

/// Raw bit position of the first option bit (`O_CREAT`)
pub const OPTION_SHIFT: u32 = 6;

/// Separator used when rendering decoded flags for display
pub const FLAG_SEPARATOR: &str = " | ";

bitflags! {
    /// Option bits of the raw flags value, declared in display order.
    ///
    /// Values are the asm-generic ones, bits 6 through 19.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OptionFlags: u32 {
        const O_CREAT     = 0o100;
        const O_EXCL      = 0o200;
        const O_NOCTTY    = 0o400;
        const O_TRUNC     = 0o1000;
        const O_APPEND    = 0o2000;
        const O_NONBLOCK  = 0o4000;
        const O_DSYNC     = 0o10000;
        const O_FASYNC    = 0o20000;
        const O_DIRECT    = 0o40000;
        const O_LARGEFILE = 0o100000;
        const O_DIRECTORY = 0o200000;
        const O_NOFOLLOW  = 0o400000;
        const O_NOATIME   = 0o1000000;
        const O_CLOEXEC   = 0o2000000;
    }
}

impl OptionFlags {
    /// Option bits of a raw flags value; access mode and unnamed bits are dropped
    pub fn from_raw(flags: i32) -> Self {
        Self::from_bits_truncate(flags as u32)
    }
}

/// Names of every option bit, in display order
pub fn option_flag_names() -> Vec<&'static str> {
    OptionFlags::all().iter_names().map(|(name, _)| name).collect()
}

/// Access mode encoded in the two lowest bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AccessMode {
    #[serde(rename = "O_RDONLY")]
    ReadOnly,
    #[serde(rename = "O_WRONLY")]
    WriteOnly,
    #[serde(rename = "O_RDWR")]
    ReadWrite,
}

impl AccessMode {
    /// Extract the access mode from a raw flags value.
    ///
    /// Returns `None` for the `0b11` pattern, which has no name.
    pub fn from_flags(flags: i32) -> Option<Self> {
        match flags & ACCESS_MODE_MASK {
            0 => Some(AccessMode::ReadOnly),
            1 => Some(AccessMode::WriteOnly),
            2 => Some(AccessMode::ReadWrite),
            _ => None,
        }
    }

    /// Symbolic name of the access mode
    pub fn name(self) -> &'static str {
        match self {
            AccessMode::ReadOnly => "O_RDONLY",
            AccessMode::WriteOnly => "O_WRONLY",
            AccessMode::ReadWrite => "O_RDWR",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered list of flag names produced by [`decode_flags`].
///
/// The access mode (if any) comes first, followed by option bits in
/// ascending bit order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedFlags {
    names: Vec<&'static str>,
}

impl DecodedFlags {
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| *n == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, &'static str> {
        self.names.iter()
    }

    pub fn into_vec(self) -> Vec<&'static str> {
        self.names
    }

    /// Names joined with [`FLAG_SEPARATOR`]; empty when no name was decoded
    pub fn joined(&self) -> String {
        self.names.join(FLAG_SEPARATOR)
    }
}

impl fmt::Display for DecodedFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl Serialize for DecodedFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.names.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a DecodedFlags {
    type Item = &'a &'static str;
    type IntoIter = std::slice::Iter<'a, &'static str>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

impl IntoIterator for DecodedFlags {
    type Item = &'static str;
    type IntoIter = std::vec::IntoIter<&'static str>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

/// Decode a raw `open(2)` flags value.
///
/// Total over `i32`: unnamed bits are ignored and the function never fails.
pub fn decode_flags(flags: i32) -> DecodedFlags {
    let options = OptionFlags::from_raw(flags);
    let mut names = Vec::with_capacity(1 + options.bits().count_ones() as usize);

    if let Some(mode) = AccessMode::from_flags(flags) {
        names.push(mode.name());
    }
    names.extend(options.iter_names().map(|(name, _)| name));

    DecodedFlags { names }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_modes() {
        assert_eq!(decode_flags(0).names(), ["O_RDONLY"]);
        assert_eq!(decode_flags(1).names(), ["O_WRONLY"]);
        assert_eq!(decode_flags(2).names(), ["O_RDWR"]);
        assert!(decode_flags(3).is_empty());
        assert_eq!(decode_flags(3).joined(), "");
    }

    #[test]
    fn test_first_option_bit() {
        assert_eq!(decode_flags(0b100_0000).names(), ["O_RDONLY", "O_CREAT"]);
    }

    #[test]
    fn test_table_order_preserved() {
        let decoded = decode_flags(0b1000_0000 | 0b100_0000);
        assert_eq!(decoded.joined(), "O_RDONLY | O_CREAT | O_EXCL");
        assert_eq!(decoded.to_string(), "O_RDONLY | O_CREAT | O_EXCL");
    }

    #[test]
    fn test_bits_between_access_mode_and_options_ignored() {
        // Bits 2..=5 are neither access mode nor option bits
        assert_eq!(decode_flags(0b11_1100).names(), ["O_RDONLY"]);
        assert_eq!(decode_flags(0b11_1101).names(), ["O_WRONLY"]);
    }

    #[test]
    fn test_high_bits_ignored() {
        for x in [0, 1, 2, 3, 0o100, 0o1101, 0o2_000_000, 0o4_000_000 - 1] {
            assert_eq!(decode_flags(x), decode_flags(x | (1 << 30)));
            assert_eq!(decode_flags(x), decode_flags(x | (1 << 20)));
        }
    }

    #[test]
    fn test_all_option_bits() {
        let all = (0..14).fold(0i32, |acc, bit| acc | (1 << (bit + OPTION_SHIFT)));
        assert_eq!(all as u32, OptionFlags::all().bits());

        let decoded = decode_flags(all | 2);
        assert_eq!(decoded.len(), 15);
        assert_eq!(decoded.names()[0], "O_RDWR");
        assert_eq!(decoded.names()[1..].to_vec(), option_flag_names());
    }

    #[test]
    fn test_negative_values() {
        // Every bit set: access mode 0b11 has no name, all options present
        let decoded = decode_flags(-1);
        assert_eq!(decoded.clone().into_vec(), option_flag_names());

        let decoded = decode_flags(i32::MIN);
        assert_eq!(decoded.names(), ["O_RDONLY"]);
    }

    #[test]
    fn test_no_duplicates() {
        let samples = [0, 1, 2, 3, -1, i32::MIN, i32::MAX, 0o1101, 0o2_101_102, 0x5555_5555];
        for value in samples {
            let decoded = decode_flags(value);
            let mut names = decoded.clone().into_vec();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), decoded.len(), "duplicate in {:#x}", value);
        }
    }

    #[test]
    fn test_idempotent() {
        for value in [0o1101, -42, 0x7fff_ffff] {
            assert_eq!(decode_flags(value), decode_flags(value));
        }
    }

    #[test]
    fn test_typical_open_calls() {
        // open(path, O_WRONLY | O_CREAT | O_TRUNC, 0644)
        assert_eq!(
            decode_flags(0o1101).joined(),
            "O_WRONLY | O_CREAT | O_TRUNC"
        );
        // openat(dirfd, path, O_RDONLY | O_CLOEXEC | O_DIRECTORY)
        assert_eq!(
            decode_flags(0o2_200_000).joined(),
            "O_RDONLY | O_DIRECTORY | O_CLOEXEC"
        );
    }

    #[test]
    fn test_option_table_layout() {
        let names = option_flag_names();
        assert_eq!(names.len(), 14);
        assert_eq!(names[0], "O_CREAT");
        assert_eq!(names[13], "O_CLOEXEC");
        assert_eq!(OptionFlags::O_CREAT.bits(), 1 << OPTION_SHIFT);
        assert_eq!(OptionFlags::O_CLOEXEC.bits(), 1 << (OPTION_SHIFT + 13));

        // Each option is a single bit, one above the previous
        let bits: Vec<u32> = OptionFlags::all()
            .iter()
            .map(|flag| flag.bits().trailing_zeros())
            .collect();
        assert_eq!(bits, (6..20).collect::<Vec<u32>>());
    }

    #[test]
    fn test_option_flags_from_raw_drops_access_mode() {
        assert_eq!(OptionFlags::from_raw(0o1101), OptionFlags::O_CREAT | OptionFlags::O_TRUNC);
        assert_eq!(OptionFlags::from_raw(3), OptionFlags::empty());
        assert_eq!(OptionFlags::from_raw(-1), OptionFlags::all());
    }

    #[test]
    fn test_access_mode_helpers() {
        assert_eq!(AccessMode::from_flags(0o1101), Some(AccessMode::WriteOnly));
        assert_eq!(AccessMode::from_flags(-1), None);
        assert_eq!(AccessMode::ReadWrite.to_string(), "O_RDWR");
    }

    #[test]
    fn test_serialize_as_list() {
        let json = serde_json::to_string(&decode_flags(0o300)).unwrap();
        assert_eq!(json, r#"["O_RDONLY","O_CREAT","O_EXCL"]"#);

        let json = serde_json::to_string(&AccessMode::ReadWrite).unwrap();
        assert_eq!(json, r#""O_RDWR""#);
    }

    #[cfg(all(target_os = "linux", any(target_arch = "x86", target_arch = "x86_64")))]
    #[test]
    fn test_table_matches_libc() {
        let expected = [
            (libc::O_WRONLY, "O_WRONLY"),
            (libc::O_RDWR, "O_RDWR"),
            (libc::O_CREAT, "O_CREAT"),
            (libc::O_EXCL, "O_EXCL"),
            (libc::O_NOCTTY, "O_NOCTTY"),
            (libc::O_TRUNC, "O_TRUNC"),
            (libc::O_APPEND, "O_APPEND"),
            (libc::O_NONBLOCK, "O_NONBLOCK"),
            (libc::O_DSYNC, "O_DSYNC"),
            (libc::O_DIRECT, "O_DIRECT"),
            (libc::O_DIRECTORY, "O_DIRECTORY"),
            (libc::O_NOFOLLOW, "O_NOFOLLOW"),
            (libc::O_NOATIME, "O_NOATIME"),
            (libc::O_CLOEXEC, "O_CLOEXEC"),
        ];

        for (value, name) in expected {
            assert!(
                decode_flags(value).contains(name),
                "{} ({:#o}) decoded as {}",
                name,
                value,
                decode_flags(value)
            );
        }
    }
}
