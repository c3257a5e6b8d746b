//! POSIX shared-memory region wrapper.
//!
//! A thin safe wrapper around `shm_open`/`ftruncate`/`mmap` for the counter
//! store. The writer creates and owns the named segment (it is unlinked when
//! the writer's region drops); readers map an existing segment read-only.
//! The segment's lifetime follows the writer — a reader must tolerate the
//! region disappearing and sees errors on its next attach, not a crash of a
//! live mapping.

use std::ffi::CString;
use std::ptr;

use crate::common::ModelError;

/// Role of a mapping, deciding protection and unlink-on-drop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Role {
    /// Created the segment; maps read-write and unlinks on drop.
    Writer,
    /// Attached to an existing segment; maps read-only.
    Reader,
}

/// A mapped POSIX shared-memory segment.
#[derive(Debug)]
pub(crate) struct SharedRegion {
    ptr: *mut u8,
    len: usize,
    name: CString,
    role: Role,
}

impl SharedRegion {
    /// Creates (or truncates) the named segment, sizes it, and maps it
    /// read-write.
    ///
    /// # Errors
    ///
    /// [`ModelError::Config`] for an unusable name, [`ModelError::Shm`] when
    /// `shm_open`, `ftruncate`, or `mmap` fails.
    pub fn create(name: &str, len: usize) -> Result<Self, ModelError> {
        let cname = shm_name(name)?;

        // SAFETY: `cname` is a valid NUL-terminated string; the fd is closed
        // on every path below and the mapping outlives it.
        unsafe {
            let fd = libc::shm_open(
                cname.as_ptr(),
                libc::O_CREAT | libc::O_TRUNC | libc::O_RDWR,
                libc::S_IRUSR | libc::S_IWUSR,
            );
            if fd < 0 {
                return Err(ModelError::shm("shm_open", name));
            }
            if libc::ftruncate(fd, len as libc::off_t) < 0 {
                let err = ModelError::shm("ftruncate", name);
                let _ = libc::close(fd);
                let _ = libc::shm_unlink(cname.as_ptr());
                return Err(err);
            }
            let ptr = libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            );
            let _ = libc::close(fd);
            if ptr == libc::MAP_FAILED {
                let err = ModelError::shm("mmap", name);
                let _ = libc::shm_unlink(cname.as_ptr());
                return Err(err);
            }
            // ftruncate zero-fills, but make the contract explicit.
            ptr::write_bytes(ptr.cast::<u8>(), 0, len);

            Ok(Self {
                ptr: ptr.cast(),
                len,
                name: cname,
                role: Role::Writer,
            })
        }
    }

    /// Maps `len` bytes of an existing segment read-only.
    ///
    /// # Errors
    ///
    /// [`ModelError::Shm`] when the segment does not exist (distinguishable
    /// through [`ModelError::is_not_found`]) or mapping fails.
    pub fn open(name: &str, len: usize) -> Result<Self, ModelError> {
        let cname = shm_name(name)?;

        // SAFETY: as in `create`; the mapping is read-only.
        unsafe {
            let fd = libc::shm_open(cname.as_ptr(), libc::O_RDONLY, 0);
            if fd < 0 {
                return Err(ModelError::shm("shm_open", name));
            }
            let ptr = libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ,
                libc::MAP_SHARED,
                fd,
                0,
            );
            let _ = libc::close(fd);
            if ptr == libc::MAP_FAILED {
                return Err(ModelError::shm("mmap", name));
            }

            Ok(Self {
                ptr: ptr.cast(),
                len,
                name: cname,
                role: Role::Reader,
            })
        }
    }

    /// Whether this mapping created (and owns) the segment.
    pub fn is_writer(&self) -> bool {
        self.role == Role::Writer
    }

    /// Base pointer of the mapping.
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    /// Mutable base pointer; only meaningful for the writer mapping.
    pub fn as_mut_ptr(&self) -> *mut u8 {
        debug_assert!(self.is_writer(), "mutating a reader mapping");
        self.ptr
    }
}

impl Drop for SharedRegion {
    fn drop(&mut self) {
        // SAFETY: `ptr`/`len` describe a live mapping established in
        // `create`/`open`; the name was returned by `shm_name`.
        unsafe {
            let _ = libc::munmap(self.ptr.cast(), self.len);
            if self.role == Role::Writer {
                let _ = libc::shm_unlink(self.name.as_ptr());
            }
        }
    }
}

/// Normalizes a segment identifier into the `/name` form POSIX requires.
fn shm_name(name: &str) -> Result<CString, ModelError> {
    let slashed = if name.starts_with('/') {
        name.to_owned()
    } else {
        format!("/{name}")
    };
    if slashed.len() < 2 || slashed[1..].contains('/') {
        return Err(ModelError::Config(format!(
            "invalid shared memory identifier `{name}`"
        )));
    }
    CString::new(slashed)
        .map_err(|_| ModelError::Config(format!("invalid shared memory identifier `{name}`")))
}
