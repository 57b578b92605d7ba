//! Lazily resolved pointers to the real libc implementations.
//!
//! Each hooked symbol is looked up once via `dlsym(RTLD_NEXT, ...)`,
//! skipping this library's own export of the same name, and cached. A
//! lookup that fails leaves its slot unset; the typed accessors report that
//! as `None` and the shim turns it into an ENOSYS failure instead of ever
//! calling through a null pointer.

use libc::{c_char, c_int, c_void, mode_t, size_t, ssize_t, FILE};
use std::sync::atomic::{AtomicPtr, Ordering};

pub(crate) type FopenFn = unsafe extern "C" fn(*const c_char, *const c_char) -> *mut FILE;
pub(crate) type OpenFn = unsafe extern "C" fn(*const c_char, c_int, mode_t) -> c_int;
pub(crate) type ReadFn = unsafe extern "C" fn(c_int, *mut c_void, size_t) -> ssize_t;
pub(crate) type FreadFn = unsafe extern "C" fn(*mut c_void, size_t, size_t, *mut FILE) -> size_t;
pub(crate) type FgetsFn = unsafe extern "C" fn(*mut c_char, c_int, *mut FILE) -> *mut c_char;

/// Storage for one real libc function.
struct RealSymbol {
    ptr: AtomicPtr<c_void>,
    name: &'static str,
}

impl RealSymbol {
    const fn new(name: &'static str) -> Self {
        Self {
            ptr: AtomicPtr::new(std::ptr::null_mut()),
            name,
        }
    }

    unsafe fn get(&self) -> *mut c_void {
        let p = self.ptr.load(Ordering::Acquire);
        if !p.is_null() {
            return p;
        }
        let f = libc::dlsym(libc::RTLD_NEXT, self.name.as_ptr() as *const c_char);
        self.ptr.store(f, Ordering::Release);
        f
    }
}

static REAL_FOPEN: RealSymbol = RealSymbol::new("fopen\0");
static REAL_FOPEN64: RealSymbol = RealSymbol::new("fopen64\0");
static REAL_OPEN: RealSymbol = RealSymbol::new("open\0");
static REAL_OPEN64: RealSymbol = RealSymbol::new("open64\0");
static REAL_READ: RealSymbol = RealSymbol::new("read\0");
static REAL_FREAD: RealSymbol = RealSymbol::new("fread\0");
static REAL_FGETS: RealSymbol = RealSymbol::new("fgets\0");

pub(crate) unsafe fn fopen() -> Option<FopenFn> {
    let p = REAL_FOPEN.get();
    if p.is_null() {
        None
    } else {
        Some(std::mem::transmute::<*mut c_void, FopenFn>(p))
    }
}

pub(crate) unsafe fn fopen64() -> Option<FopenFn> {
    let p = REAL_FOPEN64.get();
    if p.is_null() {
        None
    } else {
        Some(std::mem::transmute::<*mut c_void, FopenFn>(p))
    }
}

pub(crate) unsafe fn open() -> Option<OpenFn> {
    let p = REAL_OPEN.get();
    if p.is_null() {
        None
    } else {
        Some(std::mem::transmute::<*mut c_void, OpenFn>(p))
    }
}

pub(crate) unsafe fn open64() -> Option<OpenFn> {
    let p = REAL_OPEN64.get();
    if p.is_null() {
        None
    } else {
        Some(std::mem::transmute::<*mut c_void, OpenFn>(p))
    }
}

pub(crate) unsafe fn read() -> Option<ReadFn> {
    let p = REAL_READ.get();
    if p.is_null() {
        None
    } else {
        Some(std::mem::transmute::<*mut c_void, ReadFn>(p))
    }
}

pub(crate) unsafe fn fread() -> Option<FreadFn> {
    let p = REAL_FREAD.get();
    if p.is_null() {
        None
    } else {
        Some(std::mem::transmute::<*mut c_void, FreadFn>(p))
    }
}

pub(crate) unsafe fn fgets() -> Option<FgetsFn> {
    let p = REAL_FGETS.get();
    if p.is_null() {
        None
    } else {
        Some(std::mem::transmute::<*mut c_void, FgetsFn>(p))
    }
}
