//! openflags gadget
//!
//! A WASM gadget that decorates `open(2)` events with the symbolic names of
//! their flags. The host API is modelled by [`api::Host`]; on `wasm32` the
//! `abi` module binds it to the sandbox imports and exports the gadget
//! entry points.

pub mod api;
pub mod ffi;
pub mod gadget;
pub mod logging;

#[cfg(target_arch = "wasm32")]
pub mod abi;

pub use api::{ApiError, Data, DataSource, Field, FieldKind, Host, LogLevel, LogSink, Subscriptions};
pub use gadget::{init_status, FlagsGadget, InitError};
pub use openflags_shared::flags::{decode_flags, DecodedFlags};
