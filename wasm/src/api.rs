//! Host API seam for gadgets.
//!
//! The host sandbox owns data sources, fields and event delivery. Gadget
//! logic only talks to it through the [`Host`] and [`LogSink`] traits so it
//! can run against the WASM imports or an in-memory host in tests.

use thiserror::Error;
use tracing::warn;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u32);

        impl $name {
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u32 {
                self.0
            }

            /// The host never hands out handle 0
            pub const fn is_valid(self) -> bool {
                self.0 != 0
            }
        }
    };
}

handle!(
    /// Handle to a named event stream
    DataSource
);
handle!(
    /// Handle to a field of a data source
    Field
);
handle!(
    /// Handle to a single event being delivered
    Data
);

/// Field kinds, numbered as the host expects them
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Invalid = 0,
    Bool = 1,
    Int8 = 2,
    Int16 = 3,
    Int32 = 4,
    Int64 = 5,
    Uint8 = 6,
    Uint16 = 7,
    Uint32 = 8,
    Uint64 = 9,
    Float32 = 10,
    Float64 = 11,
    String = 12,
    CString = 13,
    Bytes = 14,
}

/// Log levels, numbered as the host expects them
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => LogLevel::Error,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::TRACE => LogLevel::Trace,
        }
    }
}

/// Errors reported by host API calls
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{call} returned an invalid handle")]
    InvalidHandle { call: &'static str },

    #[error("{call} failed with status {status}")]
    Status { call: &'static str, status: u32 },

    #[error("{what} '{name}' not found")]
    NotFound { what: &'static str, name: String },

    #[error("reading field {field:?} failed")]
    ReadFailed { field: Field },
}

/// Calls a gadget can make into the host
pub trait Host {
    /// Look up a data source by name
    fn get_data_source(&self, name: &str) -> Result<DataSource, ApiError>;

    /// Look up an existing field of a data source
    fn get_field(&self, source: DataSource, name: &str) -> Result<Field, ApiError>;

    /// Add a new field to the data source schema
    fn add_field(&self, source: DataSource, name: &str, kind: FieldKind)
        -> Result<Field, ApiError>;

    /// Ask the host to deliver events of `source` to callback `callback_id`
    fn subscribe(&self, source: DataSource, priority: u32, callback_id: u64)
        -> Result<(), ApiError>;

    fn field_int32(&self, field: Field, data: Data) -> Result<i32, ApiError>;

    fn field_set_string(&self, field: Field, data: Data, value: &str) -> Result<(), ApiError>;
}

/// Destination for gadget diagnostics
pub trait LogSink: Send + Sync + 'static {
    fn log(&self, level: LogLevel, message: &str);
}

/// Per-event callback registered through [`Subscriptions`]
pub type Callback<H> = Box<dyn FnMut(&H, DataSource, Data)>;

/// Registry of per-event callbacks.
///
/// The host only knows callback ids; [`Subscriptions::dispatch`] maps a
/// delivered id back to the closure that was registered for it.
pub struct Subscriptions<H> {
    callbacks: Vec<Callback<H>>,
}

impl<H> Default for Subscriptions<H> {
    fn default() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }
}

impl<H: Host + 'static> Subscriptions<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for events of `source`, returning its id
    pub fn subscribe<F>(
        &mut self,
        host: &H,
        source: DataSource,
        priority: u32,
        callback: F,
    ) -> Result<u64, ApiError>
    where
        F: FnMut(&H, DataSource, Data) + 'static,
    {
        let id = self.callbacks.len() as u64;
        host.subscribe(source, priority, id)?;
        self.callbacks.push(Box::new(callback));
        Ok(id)
    }

    /// Route one delivered event to its callback.
    ///
    /// Returns `false` when no callback is registered under `id`.
    pub fn dispatch(&mut self, host: &H, id: u64, source: DataSource, data: Data) -> bool {
        let callback = usize::try_from(id)
            .ok()
            .and_then(|index| self.callbacks.get_mut(index));

        match callback {
            Some(callback) => {
                callback(host, source, data);
                true
            }
            None => {
                warn!("no callback registered with id {}", id);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct CountingHost {
        subscribed: RefCell<Vec<(DataSource, u32, u64)>>,
        reject: Cell<bool>,
    }

    impl Host for CountingHost {
        fn get_data_source(&self, name: &str) -> Result<DataSource, ApiError> {
            Err(ApiError::NotFound {
                what: "datasource",
                name: name.to_string(),
            })
        }

        fn get_field(&self, _source: DataSource, name: &str) -> Result<Field, ApiError> {
            Err(ApiError::NotFound {
                what: "field",
                name: name.to_string(),
            })
        }

        fn add_field(
            &self,
            _source: DataSource,
            _name: &str,
            _kind: FieldKind,
        ) -> Result<Field, ApiError> {
            Err(ApiError::InvalidHandle {
                call: "dataSourceAddField",
            })
        }

        fn subscribe(
            &self,
            source: DataSource,
            priority: u32,
            callback_id: u64,
        ) -> Result<(), ApiError> {
            if self.reject.get() {
                return Err(ApiError::Status {
                    call: "dataSourceSubscribe",
                    status: 1,
                });
            }
            self.subscribed
                .borrow_mut()
                .push((source, priority, callback_id));
            Ok(())
        }

        fn field_int32(&self, field: Field, _data: Data) -> Result<i32, ApiError> {
            Err(ApiError::ReadFailed { field })
        }

        fn field_set_string(&self, _field: Field, _data: Data, _value: &str) -> Result<(), ApiError> {
            Ok(())
        }
    }

    #[test]
    fn test_handle_validity() {
        assert!(!DataSource::from_raw(0).is_valid());
        assert!(Field::from_raw(7).is_valid());
        assert_eq!(Data::from_raw(42).raw(), 42);
    }

    #[test]
    fn test_subscribe_assigns_sequential_ids() {
        let host = CountingHost::default();
        let mut subs = Subscriptions::new();
        let source = DataSource::from_raw(1);

        let first = subs.subscribe(&host, source, 0, |_, _, _| {}).unwrap();
        let second = subs.subscribe(&host, source, 10, |_, _, _| {}).unwrap();

        assert_eq!((first, second), (0, 1));
        assert_eq!(subs.len(), 2);
        assert_eq!(
            *host.subscribed.borrow(),
            vec![(source, 0, 0), (source, 10, 1)]
        );
    }

    #[test]
    fn test_rejected_subscription_is_not_registered() {
        let host = CountingHost::default();
        host.reject.set(true);
        let mut subs = Subscriptions::new();

        let err = subs
            .subscribe(&host, DataSource::from_raw(1), 0, |_, _, _| {})
            .unwrap_err();

        assert_eq!(
            err,
            ApiError::Status {
                call: "dataSourceSubscribe",
                status: 1
            }
        );
        assert!(subs.is_empty());
    }

    #[test]
    fn test_dispatch_routes_by_id() {
        let host = CountingHost::default();
        let mut subs = Subscriptions::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        for tag in ["a", "b"] {
            let seen = seen.clone();
            subs.subscribe(&host, DataSource::from_raw(1), 0, move |_, _, data| {
                seen.borrow_mut().push((tag, data.raw()));
            })
            .unwrap();
        }

        assert!(subs.dispatch(&host, 1, DataSource::from_raw(1), Data::from_raw(5)));
        assert!(subs.dispatch(&host, 0, DataSource::from_raw(1), Data::from_raw(6)));
        assert!(!subs.dispatch(&host, 9, DataSource::from_raw(1), Data::from_raw(7)));

        assert_eq!(*seen.borrow(), vec![("b", 5), ("a", 6)]);
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(LogLevel::from(tracing::Level::ERROR), LogLevel::Error);
        assert_eq!(LogLevel::from(tracing::Level::TRACE) as u32, 4);
        assert!(LogLevel::Error < LogLevel::Warn);
    }
}
