//! Exported C functions
//!
//! Buffers arrive as `(pointer, length)` pairs, lengths in elements. A null
//! pointer is accepted only together with a zero length. Matrices passed
//! for writing must not overlap any other buffer of the same call.

use crate::error::{
    SGNS_ERROR_INTERNAL, SGNS_ERROR_INVALID_ARGUMENT, SGNS_SUCCESS, SgnsCError, clear_last_error, get_last_error,
    set_last_error,
};
use crate::runtime;
use sgns_kernels::{PairShape, WindowShape};
use std::any::Any;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_uint};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

/// ABI version for compatibility checking
pub const SGNS_ABI_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Boundary helpers
// ---------------------------------------------------------------------------

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run `f`, translating errors and panics into a status code.
fn guarded<F>(op: &str, f: F) -> c_int
where
    F: FnOnce() -> Result<(), SgnsCError>,
{
    clear_last_error();
    let err = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => return SGNS_SUCCESS,
        Ok(Err(e)) => e,
        Err(payload) => SgnsCError::Internal(format!("{op} panicked: {}", panic_message(payload.as_ref()))),
    };
    let code = err.code();
    set_last_error(err);
    code
}

fn check_pointer<T>(name: &str, ptr: *const T, len: usize) -> Result<(), SgnsCError> {
    if len == 0 {
        return Ok(());
    }
    if ptr.is_null() {
        return Err(SgnsCError::InvalidArgument(format!("{name} is null but {name}_len is {len}")));
    }
    if !ptr.is_aligned() {
        return Err(SgnsCError::InvalidArgument(format!("{name} is not aligned")));
    }
    if len.checked_mul(size_of::<T>()).is_none_or(|bytes| bytes > isize::MAX as usize) {
        return Err(SgnsCError::InvalidArgument(format!("{name}_len {len} is too large")));
    }
    Ok(())
}

/// # Safety
///
/// A non-null `ptr` must be valid for reads of `len` elements for `'a`.
unsafe fn input<'a, T>(name: &str, ptr: *const T, len: usize) -> Result<&'a [T], SgnsCError> {
    check_pointer(name, ptr, len)?;
    if len == 0 {
        return Ok(&[]);
    }
    // SAFETY: non-null, aligned, and valid for `len` reads per the caller.
    Ok(unsafe { std::slice::from_raw_parts(ptr, len) })
}

/// # Safety
///
/// A non-null `ptr` must be valid for reads and writes of `len` elements for
/// `'a`, and the region must not be accessed through any other reference.
unsafe fn output<'a, T>(name: &str, ptr: *mut T, len: usize) -> Result<&'a mut [T], SgnsCError> {
    check_pointer(name, ptr as *const T, len)?;
    if len == 0 {
        return Ok(&mut []);
    }
    // SAFETY: as above; exclusivity is checked by `check_disjoint`.
    Ok(unsafe { std::slice::from_raw_parts_mut(ptr, len) })
}

/// A buffer as `(name, address, bytes)`.
type Region<'a> = (&'a str, usize, usize);

fn region<T>(name: &str, ptr: *const T, len: usize) -> Region<'_> {
    (name, ptr as usize, len.saturating_mul(size_of::<T>()))
}

/// Reject a written buffer that overlaps any other buffer of the call.
fn check_disjoint(written: Region<'_>, others: &[Region<'_>]) -> Result<(), SgnsCError> {
    let (name, start, bytes) = written;
    if bytes == 0 {
        return Ok(());
    }
    let end = start.saturating_add(bytes);
    for &(other, o_start, o_bytes) in others {
        let o_end = o_start.saturating_add(o_bytes);
        if o_bytes > 0 && start < o_end && o_start < end {
            return Err(SgnsCError::InvalidArgument(format!("{name} overlaps {other}")));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Library lifecycle
// ---------------------------------------------------------------------------

/// Get ABI version for compatibility validation
#[unsafe(no_mangle)]
pub extern "C" fn sgns_abi_version() -> c_uint {
    SGNS_ABI_VERSION
}

/// Get library version string
///
/// The returned pointer is valid for the lifetime of the program.
#[unsafe(no_mangle)]
pub extern "C" fn sgns_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}

/// Initialize (or re-initialize) the global kernel
///
/// `num_threads == 0` uses the configured count (`SGNS_NUM_THREADS`, else
/// every logical CPU). Other `SGNS_*` overrides are read from the
/// environment. Calling again replaces the kernel.
///
/// # Returns
/// SGNS_SUCCESS on success, error code on failure
#[unsafe(no_mangle)]
pub extern "C" fn sgns_init(num_threads: c_int) -> c_int {
    guarded("sgns_init", || {
        let n = usize::try_from(num_threads)
            .map_err(|_| SgnsCError::InvalidArgument(format!("num_threads must be >= 0, got {num_threads}")))?;
        runtime::initialize(n)
    })
}

/// Release the global kernel and its worker threads
///
/// Safe to call repeatedly. A later kernel call initializes a new default
/// kernel.
#[unsafe(no_mangle)]
pub extern "C" fn sgns_cleanup() -> c_int {
    guarded("sgns_cleanup", runtime::cleanup)
}

/// Worker thread count of the global kernel, `0` before initialization
#[unsafe(no_mangle)]
pub extern "C" fn sgns_get_num_threads() -> c_int {
    clear_last_error();
    match runtime::num_threads() {
        Ok(n) => n.map_or(0, |n| c_int::try_from(n).unwrap_or(c_int::MAX)),
        Err(e) => {
            set_last_error(e);
            SGNS_ERROR_INTERNAL
        }
    }
}

// ---------------------------------------------------------------------------
// Kernels
// ---------------------------------------------------------------------------

/// Windowed skip-gram update, in place on `a` and `b`
///
/// # Safety
///
/// Every non-null pointer must be valid for `*_len` elements for the
/// duration of the call; `a` and `b` must also be writable and must not
/// overlap each other or `ids`.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sgns_windowed_update(
    nrows: usize,
    ncols: usize,
    skip: usize,
    ids: *const u32,
    ids_len: usize,
    a: *mut f32,
    a_len: usize,
    b: *mut f32,
    b_len: usize,
    lrate: f32,
) -> c_int {
    guarded("sgns_windowed_update", || {
        check_disjoint(region("a", a, a_len), &[region("b", b, b_len), region("ids", ids, ids_len)])?;
        check_disjoint(region("b", b, b_len), &[region("ids", ids, ids_len)])?;
        // SAFETY: caller contract above; overlap rejected.
        let (ids, a, b) = unsafe { (input("ids", ids, ids_len)?, output("a", a, a_len)?, output("b", b, b_len)?) };
        let kernel = runtime::kernel()?;
        kernel.windowed_update(WindowShape::new(nrows, ncols, skip), ids, a, b, lrate)?;
        Ok(())
    })
}

/// Batched pair update, in place on `a` and `b`
///
/// # Safety
///
/// Same as [`sgns_windowed_update`]; `a` and `b` must not overlap each
/// other or either id buffer.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sgns_batched_pair_update(
    nrows: usize,
    ncols: usize,
    nwa: usize,
    nwb: usize,
    context_ids: *const u32,
    context_ids_len: usize,
    paired_ids: *const u32,
    paired_ids_len: usize,
    a: *mut f32,
    a_len: usize,
    b: *mut f32,
    b_len: usize,
    lrate: f32,
) -> c_int {
    guarded("sgns_batched_pair_update", || {
        let ids = [region("context_ids", context_ids, context_ids_len), region("paired_ids", paired_ids, paired_ids_len)];
        check_disjoint(region("a", a, a_len), &[region("b", b, b_len), ids[0], ids[1]])?;
        check_disjoint(region("b", b, b_len), &ids)?;
        // SAFETY: caller contract above; overlap rejected.
        let (context, paired, a, b) = unsafe {
            (
                input("context_ids", context_ids, context_ids_len)?,
                input("paired_ids", paired_ids, paired_ids_len)?,
                output("a", a, a_len)?,
                output("b", b, b_len)?,
            )
        };
        let kernel = runtime::kernel()?;
        kernel.batched_pair_update(PairShape::new(nrows, ncols, nwa, nwb), context, paired, a, b, lrate)?;
        Ok(())
    })
}

/// Raw pair scores into `out_scores`; `a` and `b` are only read
///
/// # Safety
///
/// Every non-null pointer must be valid for `*_len` elements for the
/// duration of the call; `out_scores` must be writable and must not overlap
/// any input buffer.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sgns_forward_score(
    nrows: usize,
    ncols: usize,
    nwa: usize,
    nwb: usize,
    context_ids: *const u32,
    context_ids_len: usize,
    paired_ids: *const u32,
    paired_ids_len: usize,
    a: *const f32,
    a_len: usize,
    b: *const f32,
    b_len: usize,
    out_scores: *mut f32,
    out_scores_len: usize,
) -> c_int {
    guarded("sgns_forward_score", || {
        check_disjoint(
            region("out_scores", out_scores, out_scores_len),
            &[
                region("a", a, a_len),
                region("b", b, b_len),
                region("context_ids", context_ids, context_ids_len),
                region("paired_ids", paired_ids, paired_ids_len),
            ],
        )?;
        // SAFETY: caller contract above; overlap rejected.
        let (context, paired, a, b, out) = unsafe {
            (
                input("context_ids", context_ids, context_ids_len)?,
                input("paired_ids", paired_ids, paired_ids_len)?,
                input("a", a, a_len)?,
                input("b", b, b_len)?,
                output("out_scores", out_scores, out_scores_len)?,
            )
        };
        let kernel = runtime::kernel()?;
        kernel.forward_score(PairShape::new(nrows, ncols, nwa, nwb), context, paired, a, b, out)?;
        Ok(())
    })
}

/// Overwrite touched columns of `a` and `b` from per-pair gradients
///
/// # Safety
///
/// Every non-null pointer must be valid for `*_len` elements for the
/// duration of the call; `a` and `b` must be writable and must not overlap
/// each other or any other buffer.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sgns_backward_distribute(
    nrows: usize,
    ncols: usize,
    nwa: usize,
    nwb: usize,
    context_ids: *const u32,
    context_ids_len: usize,
    paired_ids: *const u32,
    paired_ids_len: usize,
    a: *mut f32,
    a_len: usize,
    b: *mut f32,
    b_len: usize,
    scores: *const f32,
    scores_len: usize,
    lrate: f32,
) -> c_int {
    guarded("sgns_backward_distribute", || {
        let read = [
            region("context_ids", context_ids, context_ids_len),
            region("paired_ids", paired_ids, paired_ids_len),
            region("scores", scores, scores_len),
        ];
        check_disjoint(region("a", a, a_len), &[region("b", b, b_len), read[0], read[1], read[2]])?;
        check_disjoint(region("b", b, b_len), &read)?;
        // SAFETY: caller contract above; overlap rejected.
        let (context, paired, a, b, scores) = unsafe {
            (
                input("context_ids", context_ids, context_ids_len)?,
                input("paired_ids", paired_ids, paired_ids_len)?,
                output("a", a, a_len)?,
                output("b", b, b_len)?,
                input("scores", scores, scores_len)?,
            )
        };
        let kernel = runtime::kernel()?;
        kernel.backward_distribute(PairShape::new(nrows, ncols, nwa, nwb), context, paired, a, b, scores, lrate)?;
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Error reporting
// ---------------------------------------------------------------------------

/// Last error message of the calling thread, or null
///
/// The pointer stays valid until the next call to this function on the same
/// thread.
#[unsafe(no_mangle)]
pub extern "C" fn sgns_get_last_error() -> *const c_char {
    thread_local! {
        static ERROR_MSG: RefCell<Option<CString>> = const { RefCell::new(None) };
    }

    match get_last_error() {
        Some(error) => {
            let cstring = CString::new(error.to_string().replace('\0', " ")).unwrap_or_default();
            ERROR_MSG.with(|msg| {
                let ptr = cstring.as_ptr();
                *msg.borrow_mut() = Some(cstring);
                ptr
            })
        }
        None => ptr::null(),
    }
}

/// Clear the calling thread's last error
#[unsafe(no_mangle)]
pub extern "C" fn sgns_clear_last_error() {
    clear_last_error();
}

/// Status code of the calling thread's last error, `SGNS_SUCCESS` if none
#[unsafe(no_mangle)]
pub extern "C" fn sgns_get_last_error_code() -> c_int {
    get_last_error().map_or(SGNS_SUCCESS, |e| e.code())
}
