//! The block of memory we hold on to.

use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};

use crate::errors::*;

/// Granularity of our touch pass. This is the smallest page size on the
/// platforms we care about; touching more often than the real page size
/// is harmless.
pub const PAGE_SIZE: usize = 4096;

/// An owned, zero-filled block of memory, returned to the allocator when
/// dropped.
///
/// We ask for zeroed, byte-aligned memory, which the system allocator serves
/// with `calloc`. Large blocks then come straight from fresh anonymous
/// mappings, which only become resident once `touch` writes to them.
#[derive(Debug)]
pub struct PressureBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl PressureBuffer {
    /// Allocate `size` bytes. Running out of memory is reported as
    /// `ErrorKind::AllocationFailed`, never by aborting the process.
    pub fn allocate(size: usize) -> Result<PressureBuffer> {
        let failed = || Error::from(ErrorKind::AllocationFailed(size));
        if size == 0 {
            return Err(failed());
        }
        // Alignment 1 keeps `alloc_zeroed` on the `calloc` path.
        let layout = Layout::array::<u8>(size).map_err(|_| failed())?;
        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or_else(failed)?;
        Ok(PressureBuffer { ptr, layout })
    }

    /// Size of the block in bytes.
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    /// Write to the first byte of every page so the OS has to back the
    /// whole block with physical memory. Returns the number of pages
    /// touched.
    pub fn touch(&mut self) -> usize {
        let mut pages = 0;
        for offset in (0..self.len()).step_by(PAGE_SIZE) {
            // SAFETY: `offset < len`, and we own the whole block. The
            // volatile accesses keep the compiler from deciding that
            // nobody reads these bytes.
            unsafe {
                let byte = self.ptr.as_ptr().add(offset);
                ptr::write_volatile(byte, ptr::read_volatile(byte).wrapping_add(1));
            }
            pages += 1;
        }
        pages
    }

    /// Read back one byte. Only used to check that touching took effect.
    #[cfg(test)]
    fn byte(&self, offset: usize) -> u8 {
        assert!(offset < self.len());
        unsafe { ptr::read_volatile(self.ptr.as_ptr().add(offset)) }
    }
}

impl Drop for PressureBuffer {
    fn drop(&mut self) {
        // SAFETY: allocated in `allocate` with exactly this layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touches_one_byte_per_page() {
        let mut buf = PressureBuffer::allocate(3 * PAGE_SIZE + 10).unwrap();
        assert_eq!(buf.touch(), 4);
        assert_eq!(buf.byte(0), 1);
        assert_eq!(buf.byte(1), 0);
        assert_eq!(buf.byte(PAGE_SIZE), 1);
        assert_eq!(buf.byte(3 * PAGE_SIZE), 1);
        assert_eq!(buf.byte(3 * PAGE_SIZE + 9), 0);
    }

    #[test]
    fn repeated_touches_keep_counting() {
        let mut buf = PressureBuffer::allocate(PAGE_SIZE).unwrap();
        for _ in 0..300 {
            buf.touch();
        }
        assert_eq!(buf.byte(0), (300 % 256) as u8);
    }

    #[test]
    fn reports_its_size() {
        let buf = PressureBuffer::allocate(1024 * 1024).unwrap();
        assert_eq!(buf.len(), 1024 * 1024);
    }

    #[test]
    fn impossible_sizes_fail_cleanly() {
        for &size in &[0, usize::MAX - PAGE_SIZE] {
            match PressureBuffer::allocate(size) {
                Err(Error(ErrorKind::AllocationFailed(s), _)) => assert_eq!(s, size),
                other => panic!("expected AllocationFailed, got {:?}", other),
            }
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn allocating_does_not_commit_the_block() {
        use crate::usage::MemUsage;

        const SIZE: usize = 512 * 1024 * 1024;
        // `ru_maxrss` is in KiB on Linux.
        let before = MemUsage::current().unwrap().max_rss;
        let buf = PressureBuffer::allocate(SIZE).unwrap();
        let after = MemUsage::current().unwrap().max_rss;
        drop(buf);
        let grown = (after - before) as usize * 1024;
        assert!(grown < SIZE / 4, "resident set grew by {} bytes", grown);
    }
}
