//! The open-flags gadget.
//!
//! Attaches to the `open` data source published by the eBPF tracer, reads
//! the raw `flags` argument of every event and stores its decoded form in a
//! new `flags_decoded` string field.

use openflags_shared::flags::decode_flags;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::api::{ApiError, Data, DataSource, Field, FieldKind, Host, Subscriptions};

/// Data source created by the tracer program
pub const DATA_SOURCE: &str = "open";

/// Raw `open(2)` flags published by the tracer
pub const FLAGS_FIELD: &str = "flags";

/// Path argument published by the tracer; passed through untouched
pub const FILENAME_FIELD: &str = "filename";

/// Field added by this gadget
pub const DECODED_FIELD: &str = "flags_decoded";

pub const SUBSCRIPTION_PRIORITY: u32 = 0;

/// Failure while attaching to the host
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to get datasource '{name}': {source}")]
    DataSource { name: &'static str, source: ApiError },

    #[error("failed to get field '{name}': {source}")]
    Field { name: &'static str, source: ApiError },

    #[error("failed to add field '{name}': {source}")]
    AddField { name: &'static str, source: ApiError },

    #[error("failed to subscribe to datasource '{name}': {source}")]
    Subscribe { name: &'static str, source: ApiError },
}

/// Handles resolved during init and reused for every event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagsGadget {
    source: DataSource,
    flags: Field,
    decoded: Field,
}

impl FlagsGadget {
    /// Resolve the data source and fields, add the decoded field and
    /// subscribe to events. Failures are logged once and abort init.
    pub fn init<H: Host + 'static>(
        host: &H,
        subscriptions: &mut Subscriptions<H>,
    ) -> Result<Self, InitError> {
        let result = Self::attach(host, subscriptions);
        if let Err(e) = &result {
            error!("{}", e);
        }
        result
    }

    fn attach<H: Host + 'static>(
        host: &H,
        subscriptions: &mut Subscriptions<H>,
    ) -> Result<Self, InitError> {
        let source = host
            .get_data_source(DATA_SOURCE)
            .map_err(|source| InitError::DataSource {
                name: DATA_SOURCE,
                source,
            })?;

        let flags = host
            .get_field(source, FLAGS_FIELD)
            .map_err(|source| InitError::Field {
                name: FLAGS_FIELD,
                source,
            })?;

        let decoded = host
            .add_field(source, DECODED_FIELD, FieldKind::String)
            .map_err(|source| InitError::AddField {
                name: DECODED_FIELD,
                source,
            })?;

        let gadget = Self {
            source,
            flags,
            decoded,
        };

        let id = subscriptions
            .subscribe(
                host,
                source,
                SUBSCRIPTION_PRIORITY,
                move |host: &H, _source: DataSource, data: Data| {
                    gadget.decorate(host, data);
                },
            )
            .map_err(|source| InitError::Subscribe {
                name: DATA_SOURCE,
                source,
            })?;

        debug!(callback = id, "subscribed to datasource {}", DATA_SOURCE);
        Ok(gadget)
    }

    /// Decorate one event. A failed read leaves the decoded field unset.
    pub fn decorate<H: Host>(&self, host: &H, data: Data) {
        let raw = match host.field_int32(self.flags, data) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("failed to get flags: {}", e);
                return;
            }
        };

        let decoded = decode_flags(raw).joined();
        if let Err(e) = host.field_set_string(self.decoded, data, &decoded) {
            warn!("failed to set {}: {}", DECODED_FIELD, e);
        }
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn flags_field(&self) -> Field {
        self.flags
    }

    pub fn decoded_field(&self) -> Field {
        self.decoded
    }
}

/// Status code returned to the host from the init entry point
pub fn init_status(result: &Result<FlagsGadget, InitError>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
