//! Value conversions shared by the sandbox bindings.
//!
//! Strings cross the boundary as a packed `u64`: pointer in the high 32
//! bits, length in the low 32 bits. Handles are `u32`, with 0 meaning the
//! call failed. Status codes are 0 on success.

use crate::api::ApiError;

/// Pack a guest pointer and length into one `u64`
pub const fn pack(ptr: u32, len: u32) -> u64 {
    ((ptr as u64) << 32) | len as u64
}

/// Split a packed `u64` back into pointer and length
pub const fn unpack(packed: u64) -> (u32, u32) {
    ((packed >> 32) as u32, packed as u32)
}

/// Pack a string for a host call.
///
/// Guest pointers are 32 bits wide on `wasm32`; the truncation only matters
/// on native targets, where the result is never handed to a host.
pub fn pack_str(s: &str) -> u64 {
    pack(s.as_ptr() as usize as u32, s.len() as u32)
}

/// Handle returned by a call that creates something
pub fn handle(call: &'static str, raw: u32) -> Result<u32, ApiError> {
    if raw == 0 {
        Err(ApiError::InvalidHandle { call })
    } else {
        Ok(raw)
    }
}

/// Handle returned by a lookup; 0 means nothing has that name
pub fn lookup(what: &'static str, name: &str, raw: u32) -> Result<u32, ApiError> {
    if raw == 0 {
        Err(ApiError::NotFound {
            what,
            name: name.to_string(),
        })
    } else {
        Ok(raw)
    }
}

pub fn status(call: &'static str, status: u32) -> Result<(), ApiError> {
    if status == 0 {
        Ok(())
    } else {
        Err(ApiError::Status { call, status })
    }
}
