//! Shared harness for the integration tests: an in-memory VFS plus a no-op
//! `ArchOps`, registered once per test binary.

#![allow(dead_code)]

use std::any::Any;
use std::sync::{Arc, Mutex, Once};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use filetable::{FsError, OpenFlags, VfsOps, Vnode};

/// In-memory file. Paths starting with `fail-close:` report an error on close.
pub struct RamVnode {
    data: Mutex<Vec<u8>>,
    seekable: bool,
    closes: AtomicUsize,
    fail_close: AtomicBool,
}

impl RamVnode {
    fn new(seekable: bool, fail_close: bool) -> Self {
        Self {
            data: Mutex::new(Vec::new()),
            seekable,
            closes: AtomicUsize::new(0),
            fail_close: AtomicBool::new(fail_close),
        }
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }
}

impl Vnode for RamVnode {
    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize, FsError> {
        let data = self.data.lock().unwrap();
        if offset >= data.len() {
            return Ok(0);
        }
        let n = buf.len().min(data.len() - offset);
        buf[..n].copy_from_slice(&data[offset..offset + n]);
        Ok(n)
    }

    fn write_at(&self, offset: usize, buf: &[u8]) -> Result<usize, FsError> {
        let mut data = self.data.lock().unwrap();
        let offset = if self.seekable { offset } else { data.len() };
        if data.len() < offset + buf.len() {
            data.resize(offset + buf.len(), 0);
        }
        data[offset..offset + buf.len()].copy_from_slice(buf);
        Ok(buf.len())
    }

    fn size(&self) -> Result<usize, FsError> {
        Ok(self.data.lock().unwrap().len())
    }

    fn is_seekable(&self) -> bool {
        self.seekable
    }

    fn close(&self) -> Result<(), FsError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            Err(FsError::IoError)
        } else {
            Ok(())
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Records every vnode it hands out so tests can inspect them by path.
pub struct RamVfs {
    opened: Mutex<Vec<(String, Arc<RamVnode>)>>,
}

impl RamVfs {
    const fn new() -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Every vnode opened under `path`, oldest first.
    pub fn opened(&self, path: &str) -> Vec<Arc<RamVnode>> {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, vnode)| Arc::clone(vnode))
            .collect()
    }
}

impl VfsOps for RamVfs {
    fn open(
        &self,
        path: &mut String,
        _flags: OpenFlags,
        _mode: u32,
    ) -> Result<Arc<dyn Vnode>, FsError> {
        if path.starts_with("missing") {
            return Err(FsError::NotFound);
        }
        let vnode = Arc::new(RamVnode::new(
            path.as_str() != "con:",
            path.starts_with("fail-close:"),
        ));
        self.opened
            .lock()
            .unwrap()
            .push((path.clone(), Arc::clone(&vnode)));
        let vnode: Arc<dyn Vnode> = vnode;
        Ok(vnode)
    }
}

struct NoIrqArch;

impl sync::ArchOps for NoIrqArch {
    unsafe fn read_and_disable_interrupts(&self) -> usize {
        0
    }

    unsafe fn restore_interrupts(&self, _flags: usize) {}

    fn sstatus_sie(&self) -> usize {
        0
    }
}

static ARCH: NoIrqArch = NoIrqArch;
static VFS: RamVfs = RamVfs::new();
static INIT: Once = Once::new();

/// Registers the harness collaborators and returns the VFS.
pub fn setup() -> &'static RamVfs {
    INIT.call_once(|| unsafe {
        sync::register_arch_ops(&ARCH);
        filetable::register_vfs_ops(&VFS);
    });
    &VFS
}

/// Downcasts a handle's vnode back to the harness type.
pub fn ram_vnode(vnode: &Arc<dyn Vnode>) -> &RamVnode {
    vnode
        .as_any()
        .downcast_ref::<RamVnode>()
        .expect("not a RamVnode")
}
