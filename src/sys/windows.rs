//! Windows implementation: `LockFileEx`/`UnlockFileEx` for advisory
//! locking. Windows has no random-access hint (`PrefetchVirtualMemory`
//! only covers prefetching), so the advise call is a successful no-op.

use std::fs::File;
use std::io;
use std::os::windows::io::AsRawHandle;

const LOCKFILE_FAIL_IMMEDIATELY: u32 = 0x0000_0001;
const LOCKFILE_EXCLUSIVE_LOCK: u32 = 0x0000_0002;
const ERROR_LOCK_VIOLATION: i32 = 33;

#[allow(non_snake_case)]
#[repr(C)]
struct OVERLAPPED {
    Internal: usize,
    InternalHigh: usize,
    Offset: u32,
    OffsetHigh: u32,
    hEvent: *mut core::ffi::c_void,
}

impl OVERLAPPED {
    fn zeroed() -> Self {
        Self {
            Internal: 0,
            InternalHigh: 0,
            Offset: 0,
            OffsetHigh: 0,
            hEvent: std::ptr::null_mut(),
        }
    }
}

extern "system" {
    fn LockFileEx(
        hFile: *mut core::ffi::c_void,
        dwFlags: u32,
        dwReserved: u32,
        nNumberOfBytesToLockLow: u32,
        nNumberOfBytesToLockHigh: u32,
        lpOverlapped: *mut OVERLAPPED,
    ) -> i32;

    fn UnlockFileEx(
        hFile: *mut core::ffi::c_void,
        dwReserved: u32,
        nNumberOfBytesToUnlockLow: u32,
        nNumberOfBytesToUnlockHigh: u32,
        lpOverlapped: *mut OVERLAPPED,
    ) -> i32;
}

/// Attempt a non-blocking whole-file advisory lock.
///
/// Returns `Ok(false)` when another handle holds a conflicting lock.
pub(crate) fn try_lock(file: &File, exclusive: bool) -> io::Result<bool> {
    let mut flags = LOCKFILE_FAIL_IMMEDIATELY;
    if exclusive {
        flags |= LOCKFILE_EXCLUSIVE_LOCK;
    }
    let mut overlapped = OVERLAPPED::zeroed();
    // SAFETY: the handle is valid for the lifetime of the borrowed File,
    // and the OVERLAPPED struct outlives the call.
    let rc = unsafe {
        LockFileEx(
            file.as_raw_handle().cast(),
            flags,
            0,
            u32::MAX,
            u32::MAX,
            &mut overlapped,
        )
    };
    if rc != 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(ERROR_LOCK_VIOLATION) {
        Ok(false)
    } else {
        Err(err)
    }
}

/// Release the advisory lock held through this handle.
pub(crate) fn unlock(file: &File) -> io::Result<()> {
    let mut overlapped = OVERLAPPED::zeroed();
    // SAFETY: see try_lock.
    let rc = unsafe {
        UnlockFileEx(
            file.as_raw_handle().cast(),
            0,
            u32::MAX,
            u32::MAX,
            &mut overlapped,
        )
    };
    if rc != 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// No random-access hint exists on Windows; report success.
pub(crate) fn advise_random(_ptr: *const u8, _len: usize) -> io::Result<()> {
    Ok(())
}
