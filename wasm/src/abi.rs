//! Bindings to the gadget host's WASM imports and the exports it calls.
//!
//! Value conventions live in [`crate::ffi`].

use std::cell::RefCell;

use crate::api::{ApiError, Data, DataSource, Field, FieldKind, Host, LogLevel, LogSink, Subscriptions};
use crate::ffi::{handle, lookup, pack_str, status};
use crate::gadget::{init_status, FlagsGadget};
use crate::logging;

/// Gadget API version implemented by these bindings
pub const API_VERSION: u64 = 1;

#[link(wasm_import_module = "env")]
extern "C" {
    #[link_name = "gadgetLog"]
    fn gadget_log(level: u32, message: u64);

    #[link_name = "getDataSource"]
    fn get_data_source(name: u64) -> u32;

    #[link_name = "dataSourceGetField"]
    fn data_source_get_field(source: u32, name: u64) -> u32;

    #[link_name = "dataSourceAddField"]
    fn data_source_add_field(source: u32, name: u64, kind: u32) -> u32;

    #[link_name = "dataSourceSubscribe"]
    fn data_source_subscribe(source: u32, priority: u32, callback_id: u64) -> u32;

    #[link_name = "fieldGetScalar"]
    fn field_get_scalar(field: u32, data: u32, kind: u32, err_ptr: u32) -> u64;

    #[link_name = "fieldSetBuffer"]
    fn field_set_buffer(field: u32, data: u32, kind: u32, buffer: u64) -> u32;
}

/// [`Host`] backed by the sandbox imports
#[derive(Debug, Default, Clone, Copy)]
pub struct WasmHost;

impl Host for WasmHost {
    fn get_data_source(&self, name: &str) -> Result<DataSource, ApiError> {
        let raw = unsafe { get_data_source(pack_str(name)) };
        lookup("datasource", name, raw).map(DataSource::from_raw)
    }

    fn get_field(&self, source: DataSource, name: &str) -> Result<Field, ApiError> {
        let raw = unsafe { data_source_get_field(source.raw(), pack_str(name)) };
        lookup("field", name, raw).map(Field::from_raw)
    }

    fn add_field(
        &self,
        source: DataSource,
        name: &str,
        kind: FieldKind,
    ) -> Result<Field, ApiError> {
        let raw = unsafe { data_source_add_field(source.raw(), pack_str(name), kind as u32) };
        handle("dataSourceAddField", raw).map(Field::from_raw)
    }

    fn subscribe(
        &self,
        source: DataSource,
        priority: u32,
        callback_id: u64,
    ) -> Result<(), ApiError> {
        let ret = unsafe { data_source_subscribe(source.raw(), priority, callback_id) };
        status("dataSourceSubscribe", ret)
    }

    fn field_int32(&self, field: Field, data: Data) -> Result<i32, ApiError> {
        let mut err: u32 = 0;
        let err_ptr = &mut err as *mut u32 as u32;
        let value =
            unsafe { field_get_scalar(field.raw(), data.raw(), FieldKind::Int32 as u32, err_ptr) };
        if err != 0 {
            return Err(ApiError::ReadFailed { field });
        }
        Ok(value as u32 as i32)
    }

    fn field_set_string(&self, field: Field, data: Data, value: &str) -> Result<(), ApiError> {
        let ret = unsafe {
            field_set_buffer(
                field.raw(),
                data.raw(),
                FieldKind::String as u32,
                pack_str(value),
            )
        };
        status("fieldSetBuffer", ret)
    }
}

impl LogSink for WasmHost {
    fn log(&self, level: LogLevel, message: &str) {
        unsafe { gadget_log(level as u32, pack_str(message)) }
    }
}

thread_local! {
    static SUBSCRIPTIONS: RefCell<Subscriptions<WasmHost>> = RefCell::new(Subscriptions::new());
}

#[no_mangle]
#[allow(non_snake_case)]
pub extern "C" fn gadgetAPIVersion() -> u64 {
    API_VERSION
}

#[no_mangle]
#[allow(non_snake_case)]
pub extern "C" fn gadgetInit() -> i32 {
    logging::install(WasmHost);

    let result =
        SUBSCRIPTIONS.with(|subs| FlagsGadget::init(&WasmHost, &mut subs.borrow_mut()));
    init_status(&result)
}

#[no_mangle]
#[allow(non_snake_case)]
pub extern "C" fn dataSourceCallback(callback_id: u64, source: u32, data: u32) {
    SUBSCRIPTIONS.with(|subs| {
        subs.borrow_mut().dispatch(
            &WasmHost,
            callback_id,
            DataSource::from_raw(source),
            Data::from_raw(data),
        );
    });
}
