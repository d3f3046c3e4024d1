//! Table command implementation

use anyhow::Result;
use openflags_shared::flags::OptionFlags;

use crate::output;

/// (raw bit position, mask, name) for every option bit
pub fn rows() -> Vec<(u32, u32, &'static str)> {
    OptionFlags::all()
        .iter_names()
        .map(|(name, flag)| (flag.bits().trailing_zeros(), flag.bits(), name))
        .collect()
}

pub fn run() -> Result<()> {
    println!("{}", output::header(&format!("{:<4} {:<12} {}", "BIT", "MASK", "NAME")));
    for (bit, mask, name) in rows() {
        println!("{:<4} {:<12} {}", bit, format!("{:#o}", mask), name);
    }
    Ok(())
}
