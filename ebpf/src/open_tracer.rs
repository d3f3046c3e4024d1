#![no_std]
#![no_main]

use aya_ebpf::{
    helpers::{
        bpf_get_current_comm, bpf_get_current_pid_tgid, bpf_get_current_uid_gid,
        bpf_ktime_get_boot_ns, bpf_probe_read_user_str_bytes,
    },
    macros::{map, tracepoint},
    maps::{Array, PerCpuArray, PerfEventArray},
    programs::TracePointContext,
};

/// Size of the `filename` buffer, including the trailing NUL
pub const FILENAME_LEN: usize = 256;

/// Kernel task comm length
pub const TASK_COMM_LEN: usize = 16;

// Offsets into the syscalls tracepoint records, after the 8-byte common
// header and the 8-byte syscall number slot
const OPENAT_FILENAME_OFFSET: usize = 24;
const OPENAT_FLAGS_OFFSET: usize = 32;
const OPEN_FILENAME_OFFSET: usize = 16;
const OPEN_FLAGS_OFFSET: usize = 24;

/// One record of the `open` data source
#[repr(C)]
pub struct OpenEvent {
    pub timestamp_raw: u64,
    pub pid: u32,
    pub tid: u32,
    pub uid: u32,
    pub gid: u32,
    pub comm: [u8; TASK_COMM_LEN],
    pub filename: [u8; FILENAME_LEN],
    pub flags: i32,
}

#[map]
static EVENTS: PerfEventArray<OpenEvent> = PerfEventArray::new(0);

/// Per-CPU staging slot; the event is too large for the BPF stack
#[map]
static SCRATCH: PerCpuArray<OpenEvent> = PerCpuArray::with_max_entries(1, 0);

/// PID_FILTER[0] = target tgid (0 = trace all)
#[map]
static PID_FILTER: Array<u32> = Array::with_max_entries(1, 0);

#[inline(always)]
fn should_trace(tgid: u32) -> bool {
    match PID_FILTER.get(0) {
        Some(&target) => target == 0 || target == tgid,
        None => true,
    }
}

#[tracepoint(name = "sys_enter_openat", category = "syscalls")]
pub fn sys_enter_openat(ctx: TracePointContext) -> i64 {
    try_handle_open(&ctx, OPENAT_FILENAME_OFFSET, OPENAT_FLAGS_OFFSET).unwrap_or_default()
}

#[tracepoint(name = "sys_enter_open", category = "syscalls")]
pub fn sys_enter_open(ctx: TracePointContext) -> i64 {
    try_handle_open(&ctx, OPEN_FILENAME_OFFSET, OPEN_FLAGS_OFFSET).unwrap_or_default()
}

#[inline(always)]
fn try_handle_open(
    ctx: &TracePointContext,
    filename_offset: usize,
    flags_offset: usize,
) -> Result<i64, i64> {
    let pid_tgid = bpf_get_current_pid_tgid();
    let pid = (pid_tgid >> 32) as u32;
    if !should_trace(pid) {
        return Ok(0);
    }

    let filename: *const u8 = unsafe { ctx.read_at(filename_offset).map_err(|_| 1i64)? };
    // The syscall argument slot is 64 bits wide; flags is the low half
    let flags: u64 = unsafe { ctx.read_at(flags_offset).map_err(|_| 1i64)? };

    let event = match SCRATCH.get_ptr_mut(0) {
        Some(ptr) => unsafe { &mut *ptr },
        None => return Ok(0),
    };

    let uid_gid = bpf_get_current_uid_gid();

    event.timestamp_raw = unsafe { bpf_ktime_get_boot_ns() };
    event.pid = pid;
    event.tid = pid_tgid as u32;
    event.uid = uid_gid as u32;
    event.gid = (uid_gid >> 32) as u32;
    event.comm = bpf_get_current_comm().unwrap_or([0u8; TASK_COMM_LEN]);
    event.flags = flags as i32;

    // An unreadable path still reports the call, with an empty name
    if unsafe { bpf_probe_read_user_str_bytes(filename, &mut event.filename) }.is_err() {
        event.filename[0] = 0;
    }

    EVENTS.output(ctx, event, 0);

    Ok(0)
}

#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    unsafe { core::hint::unreachable_unchecked() }
}

#[link_section = "license"]
pub static LICENSE: [u8; 4] = *b"GPL\0";
