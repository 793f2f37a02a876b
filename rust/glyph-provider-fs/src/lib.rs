//! Sandboxed file-access host modules.
//!
//! All paths a script supplies are relative to a fixed base directory chosen
//! at construction; absolute paths and `..`-traversal above the base are
//! rejected *before* any filesystem call is issued. Modules:
//! - `resolve` — map a relative path to its sandboxed absolute form
//! - `open` — open an existing file read+write → file handle
//! - `close` — consume a file handle
//! - `lock` / `unlock` — advisory, non-blocking file locks
//! - `info` — size snapshot of an open file
//! - `read` — exact-length positional read
//! - `write` — positional write → bytes-written count
//!
//! Locks are cooperative: they exclude other callers of `lock` on the same
//! path, not arbitrary outside processes.
#![warn(clippy::all)]

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use glyph_core::values::{FileHandle, LockHandle};
use glyph_core::{CallError, Value};
use glyph_rt::ModuleFn;

// ---------------------------------------------------------------------------
// Sandbox
// ---------------------------------------------------------------------------

/// A fixed, canonicalized base directory all relative paths resolve under.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Establish the sandbox root. The directory must exist; it is
    /// canonicalized once so later escape checks are purely lexical.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self {
            root: root.as_ref().canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join `relative` under the root, folding `.` and `..` lexically.
    ///
    /// Fails with `PathEscapesSandbox` for absolute inputs and for any
    /// traversal that would pop above the root. No filesystem call is made,
    /// so unresolvable paths are rejected before they can be probed.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, CallError> {
        let requested = Path::new(relative.trim());
        let mut depth = 0usize;
        let mut resolved = self.root.clone();
        for component in requested.components() {
            match component {
                Component::Prefix(_) | Component::RootDir => {
                    return Err(CallError::PathEscapesSandbox(requested.to_path_buf()));
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(CallError::PathEscapesSandbox(requested.to_path_buf()));
                    }
                    depth -= 1;
                    resolved.pop();
                }
                Component::Normal(part) => {
                    depth += 1;
                    resolved.push(part);
                }
            }
        }
        Ok(resolved)
    }
}

// ---------------------------------------------------------------------------
// Marshalling helpers
// ---------------------------------------------------------------------------

fn take_path(frame: &mut glyph_core::Frame, slot: u32) -> Result<String, CallError> {
    match frame.take(slot) {
        None => Err(CallError::MissingArgument(slot)),
        Some(Value::Bytes(bytes)) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Some(other) => Err(CallError::mismatch(slot, "bytes", other.type_name())),
    }
}

fn take_file(frame: &mut glyph_core::Frame, slot: u32) -> Result<FileHandle, CallError> {
    match frame.take(slot) {
        None => Err(CallError::MissingArgument(slot)),
        Some(Value::File(handle)) => Ok(handle),
        Some(other) => Err(CallError::mismatch(slot, "file", other.type_name())),
    }
}

/// Optional uint slot; a mistyped value counts as omitted, matching the
/// best-effort policy for optional parameters.
fn optional_uint(frame: &mut glyph_core::Frame, slot: u32) -> Option<u64> {
    match frame.take(slot) {
        Some(Value::Uint(n)) => Some(n),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

/// Resolve a relative path (slot 0) to its absolute sandboxed form.
pub fn resolve(sandbox: Arc<Sandbox>) -> ModuleFn {
    Arc::new(move |mut frame| {
        let relative = take_path(&mut frame, 0)?;
        let path = sandbox.resolve(&relative)?;
        Ok(Value::Bytes(path.to_string_lossy().into_owned().into_bytes()))
    })
}

/// Open an existing file under the sandbox for reading and writing.
pub fn open(sandbox: Arc<Sandbox>) -> ModuleFn {
    Arc::new(move |mut frame| {
        let relative = take_path(&mut frame, 0)?;
        let path = sandbox.resolve(&relative)?;
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        Ok(Value::File(FileHandle::new(file, path)))
    })
}

/// Consume a file handle, closing the underlying file.
///
/// The handle must be unshared; a handle still aliased by another caller
/// fails `HandleInUse`.
pub fn close() -> ModuleFn {
    Arc::new(|mut frame| {
        let handle = take_file(&mut frame, 0)?;
        let file = handle.try_into_inner().map_err(|_| CallError::HandleInUse)?;
        drop(file);
        Ok(Value::Bool(true))
    })
}

/// Acquire a non-blocking advisory lock on a sandbox path.
///
/// The lock file is created if absent. A lock already held by another caller
/// fails `LockHeld` immediately; acquisition never waits.
pub fn lock(sandbox: Arc<Sandbox>) -> ModuleFn {
    Arc::new(move |mut frame| {
        let relative = take_path(&mut frame, 0)?;
        let path = sandbox.resolve(&relative)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        file.try_lock_exclusive().map_err(|err| {
            if err.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                CallError::LockHeld(path.clone())
            } else {
                CallError::Io(err)
            }
        })?;
        Ok(Value::Lock(LockHandle::new(file, path)))
    })
}

/// Release an advisory lock. The handle must be unshared.
pub fn unlock() -> ModuleFn {
    Arc::new(|mut frame| {
        let handle = match frame.take(0) {
            None => return Err(CallError::MissingArgument(0)),
            Some(Value::Lock(handle)) => handle,
            Some(other) => return Err(CallError::mismatch(0, "lock", other.type_name())),
        };
        let file = handle.try_into_inner().map_err(|_| CallError::HandleInUse)?;
        FileExt::unlock(&file)?;
        Ok(Value::Bool(true))
    })
}

/// Size snapshot of an open file, in bytes.
pub fn info() -> ModuleFn {
    Arc::new(|mut frame| {
        let handle = take_file(&mut frame, 0)?;
        let metadata = handle.file().metadata()?;
        Ok(Value::Uint(metadata.len()))
    })
}

/// Exact-length positional read.
///
/// Slot 0 is the handle, slot 1 the optional byte count (defaults to the full
/// current file size), slot 2 the optional offset (defaults to 0). Fewer
/// available bytes than requested fail `ShortRead`; the check runs against
/// the size snapshot before any buffer is allocated, so an oversized request
/// never allocates.
pub fn read() -> ModuleFn {
    Arc::new(|mut frame| {
        let handle = take_file(&mut frame, 0)?;
        let size = handle.file().metadata()?.len();
        let wanted = optional_uint(&mut frame, 1).unwrap_or(size);
        let offset = optional_uint(&mut frame, 2).unwrap_or(0);
        let available = size.saturating_sub(offset);
        if wanted > available {
            return Err(CallError::ShortRead {
                wanted,
                got: available,
            });
        }

        let mut file = handle.file();
        file.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; wanted as usize];
        let mut got = 0usize;
        while got < buffer.len() {
            match file.read(&mut buffer[got..])? {
                0 => break,
                n => got += n,
            }
        }
        if (got as u64) < wanted {
            return Err(CallError::ShortRead {
                wanted,
                got: got as u64,
            });
        }
        Ok(Value::Bytes(buffer))
    })
}

/// Positional write; returns the number of bytes written.
///
/// Slot 0 is the handle, slot 1 the bytes, slot 2 the optional offset
/// (defaults to 0).
pub fn write() -> ModuleFn {
    Arc::new(|mut frame| {
        let handle = take_file(&mut frame, 0)?;
        let data = match frame.take(1) {
            None => return Err(CallError::MissingArgument(1)),
            Some(Value::Bytes(bytes)) => bytes,
            Some(other) => return Err(CallError::mismatch(1, "bytes", other.type_name())),
        };
        let offset = optional_uint(&mut frame, 2).unwrap_or(0);

        let mut file = handle.file();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&data)?;
        Ok(Value::Uint(data.len() as u64))
    })
}
