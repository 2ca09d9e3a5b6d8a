//! Length-tagged views of the database file mapped into process memory.
//!
//! A region maps a prefix of the caller's open file, shared with the
//! backing file, and hands out only bounds-checked access to the mapped
//! bytes. Read-only enforcement is by construction: [`Region`] has no
//! write entry point at all; only [`RegionMut`] does.
//!
//! Exactly one region should be live per file handle at a time, and a
//! region in transition must not be touched from another thread; the
//! owning database object serializes map/unmap/write transitions.
//! Growth is modeled as unmap-then-remap-larger, never as an in-place
//! resize — this layer never changes the file's size.

use std::fs::File;

use memmap2::{Mmap, MmapMut, MmapOptions};

use crate::errors::{AccessError, MapError};
use crate::sys;

/// Validate `[offset, offset + len)` against the region length and
/// return it as a usize range.
#[allow(clippy::cast_possible_truncation)]
fn slice_range(offset: u64, len: u64, region_len: u64) -> Result<(usize, usize), AccessError> {
    let end = offset
        .checked_add(len)
        .ok_or(AccessError::SizeExceeded { offset, len, region_len })?;
    if end > region_len {
        return Err(AccessError::SizeExceeded { offset, len, region_len });
    }
    // Casts are safe: both bounds were validated against a length that
    // fits in addressable memory.
    Ok((offset as usize, end as usize))
}

/// Reject zero-size requests and requests past the end of the file.
/// Mapping past EOF would fault on access instead of failing cleanly.
fn check_map_size(file: &File, size: u64) -> Result<(), MapError> {
    if size == 0 {
        return Err(MapError::ZeroSize);
    }
    let file_len = file.metadata().map_err(MapError::Map)?.len();
    if size > file_len {
        return Err(MapError::BeyondEof {
            requested: size,
            file_len,
        });
    }
    Ok(())
}

/// Read-only mapped view of the first `len` bytes of the file.
///
/// Shared with the backing file: writes by other processes become
/// visible through this view. There is no way to write through it.
#[derive(Debug)]
pub struct Region {
    map: Option<Mmap>,
    len: u64,
}

/// Read-write mapped view of the first `len` bytes of the file.
///
/// Shared with the backing file; writes land in the file's pages and
/// are made durable with [`RegionMut::flush`].
#[derive(Debug)]
pub struct RegionMut {
    map: Option<MmapMut>,
    len: u64,
}

impl Region {
    /// Map `size` bytes of `file` read-only.
    ///
    /// After the map succeeds, the kernel is advised that access will
    /// be random. If the hint cannot be applied the mapping is unwound
    /// and the call fails; no mapping is left dangling.
    ///
    /// # Errors
    ///
    /// Returns `MapError::ZeroSize`, `MapError::BeyondEof`,
    /// `MapError::Map`, or `MapError::Advise`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn map(file: &File, size: u64) -> Result<Self, MapError> {
        check_map_size(file, size)?;
        // SAFETY: the file stays open for the duration of the call and
        // the length was validated against the file's real size.
        let map = unsafe { MmapOptions::new().len(size as usize).map(file) }
            .map_err(MapError::Map)?;
        // Dropping `map` on this error path unmaps before returning.
        sys::advise_random(map.as_ptr(), map.len()).map_err(MapError::Advise)?;
        log::debug!("mapped {size} bytes read-only");
        Ok(Self {
            map: Some(map),
            len: size,
        })
    }

    /// Length of the mapped view in bytes; zero once unmapped.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the mapped view is empty (true once unmapped).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the region still holds a live mapping.
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        self.map.is_some()
    }

    /// Borrow `[offset, offset + len)` of the mapped bytes.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::Unmapped` after [`Region::unmap`], or
    /// `AccessError::SizeExceeded` if the range does not fit.
    pub fn as_slice(&self, offset: u64, len: u64) -> Result<&[u8], AccessError> {
        let map = self.map.as_ref().ok_or(AccessError::Unmapped)?;
        let (start, end) = slice_range(offset, len, self.len)?;
        Ok(&map[start..end])
    }

    /// Copy `buf.len()` mapped bytes starting at `offset` into `buf`.
    ///
    /// # Errors
    ///
    /// Same as [`Region::as_slice`].
    pub fn read_into(&self, offset: u64, buf: &mut [u8]) -> Result<(), AccessError> {
        buf.copy_from_slice(self.as_slice(offset, buf.len() as u64)?);
        Ok(())
    }

    /// Release the mapping and clear the region's state.
    ///
    /// A no-op when nothing is mapped, so teardown and error paths can
    /// call it unconditionally. Afterwards every accessor reports
    /// [`AccessError::Unmapped`].
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` is part of the unmap contract.
    pub fn unmap(&mut self) -> Result<(), MapError> {
        if let Some(map) = self.map.take() {
            log::debug!("unmapping {} bytes (read-only)", self.len);
            drop(map);
            self.len = 0;
        }
        Ok(())
    }
}

impl RegionMut {
    /// Map `size` bytes of `file` read-write.
    ///
    /// The file must already be at least `size` bytes; this layer never
    /// extends it. The same mandatory random-access hint as
    /// [`Region::map`] applies.
    ///
    /// # Errors
    ///
    /// Returns `MapError::ZeroSize`, `MapError::BeyondEof`,
    /// `MapError::Map`, or `MapError::Advise`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn map(file: &File, size: u64) -> Result<Self, MapError> {
        check_map_size(file, size)?;
        // SAFETY: the file is open read-write and the length was
        // validated against the file's real size.
        let map = unsafe { MmapOptions::new().len(size as usize).map_mut(file) }
            .map_err(MapError::Map)?;
        sys::advise_random(map.as_ptr(), map.len()).map_err(MapError::Advise)?;
        log::debug!("mapped {size} bytes read-write");
        Ok(Self {
            map: Some(map),
            len: size,
        })
    }

    /// Length of the mapped view in bytes; zero once unmapped.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the mapped view is empty (true once unmapped).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the region still holds a live mapping.
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        self.map.is_some()
    }

    /// Copy `src` into the mapped bytes starting at `offset`.
    ///
    /// All-or-nothing: a source longer than the region, or a range that
    /// runs past its end, is rejected with nothing written — never
    /// silently truncated, since a partial page write would corrupt the
    /// format layered above. On success returns `src.len()`.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::Unmapped` after [`RegionMut::unmap`], or
    /// `AccessError::SizeExceeded` when the copy does not fit.
    pub fn write_into(&mut self, src: &[u8], offset: u64) -> Result<usize, AccessError> {
        let region_len = self.len;
        let map = self.map.as_mut().ok_or(AccessError::Unmapped)?;
        let len = src.len() as u64;
        if len > region_len {
            return Err(AccessError::SizeExceeded {
                offset,
                len,
                region_len,
            });
        }
        let (start, end) = slice_range(offset, len, region_len)?;
        map[start..end].copy_from_slice(src);
        Ok(src.len())
    }

    /// Borrow `[offset, offset + len)` of the mapped bytes.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::Unmapped` after [`RegionMut::unmap`], or
    /// `AccessError::SizeExceeded` if the range does not fit.
    pub fn as_slice(&self, offset: u64, len: u64) -> Result<&[u8], AccessError> {
        let map = self.map.as_ref().ok_or(AccessError::Unmapped)?;
        let (start, end) = slice_range(offset, len, self.len)?;
        Ok(&map[start..end])
    }

    /// Copy `buf.len()` mapped bytes starting at `offset` into `buf`.
    ///
    /// # Errors
    ///
    /// Same as [`RegionMut::as_slice`].
    pub fn read_into(&self, offset: u64, buf: &mut [u8]) -> Result<(), AccessError> {
        buf.copy_from_slice(self.as_slice(offset, buf.len() as u64)?);
        Ok(())
    }

    /// Synchronously flush dirty pages back to the file.
    ///
    /// A no-op once unmapped: there is nothing left to flush.
    ///
    /// # Errors
    ///
    /// Returns `MapError::Flush` if the flush syscall fails.
    pub fn flush(&self) -> Result<(), MapError> {
        match &self.map {
            Some(map) => map.flush().map_err(MapError::Flush),
            None => Ok(()),
        }
    }

    /// Release the mapping and clear the region's state.
    ///
    /// A no-op when nothing is mapped, so teardown and error paths can
    /// call it unconditionally. Afterwards every accessor reports
    /// [`AccessError::Unmapped`].
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` is part of the unmap contract.
    pub fn unmap(&mut self) -> Result<(), MapError> {
        if let Some(map) = self.map.take() {
            log::debug!("unmapping {} bytes (read-write)", self.len);
            drop(map);
            self.len = 0;
        }
        Ok(())
    }
}

/// Map `size` bytes of `file` read-only. See [`Region::map`].
///
/// # Errors
///
/// Returns errors from [`Region::map`].
pub fn map_readonly(file: &File, size: u64) -> Result<Region, MapError> {
    Region::map(file, size)
}

/// Map `size` bytes of `file` read-write. See [`RegionMut::map`].
///
/// # Errors
///
/// Returns errors from [`RegionMut::map`].
pub fn map_readwrite(file: &File, size: u64) -> Result<RegionMut, MapError> {
    RegionMut::map(file, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn backing_file(size: u64) -> (NamedTempFile, File) {
        let tmp = NamedTempFile::new().expect("tempfile");
        tmp.as_file().set_len(size).expect("set_len");
        let file = tmp.reopen().expect("reopen");
        (tmp, file)
    }

    #[test]
    fn zero_size_rejected() {
        let (_tmp, file) = backing_file(4096);
        assert!(matches!(Region::map(&file, 0), Err(MapError::ZeroSize)));
        assert!(matches!(RegionMut::map(&file, 0), Err(MapError::ZeroSize)));
    }

    #[test]
    fn mapping_past_eof_rejected() {
        let (_tmp, file) = backing_file(1024);
        match RegionMut::map(&file, 4096) {
            Err(MapError::BeyondEof {
                requested,
                file_len,
            }) => {
                assert_eq!(requested, 4096);
                assert_eq!(file_len, 1024);
            }
            other => panic!("expected BeyondEof, got {other:?}"),
        }
    }

    #[test]
    fn write_then_read_back() {
        let (_tmp, file) = backing_file(4096);
        let mut region = RegionMut::map(&file, 4096).expect("map rw");
        assert_eq!(region.len(), 4096);

        let n = region.write_into(b"page-data", 128).expect("write");
        assert_eq!(n, 9);

        let mut buf = [0u8; 9];
        region.read_into(128, &mut buf).expect("read");
        assert_eq!(&buf, b"page-data");

        // Neighboring bytes stay zero on a fresh file.
        assert_eq!(region.as_slice(127, 1).expect("before"), &[0]);
        assert_eq!(region.as_slice(137, 1).expect("after"), &[0]);
    }

    #[test]
    fn oversized_write_rejected_and_bytes_unchanged() {
        let (_tmp, file) = backing_file(64);
        let mut region = RegionMut::map(&file, 64).expect("map rw");
        region.write_into(b"seed", 0).expect("seed write");

        let big = vec![0xFF_u8; 65];
        let err = region.write_into(&big, 0).expect_err("must reject");
        assert!(matches!(err, AccessError::SizeExceeded { len: 65, region_len: 64, .. }));

        // Nothing was written, not even a truncated prefix.
        assert_eq!(region.as_slice(0, 4).expect("slice"), b"seed");
        assert_eq!(region.as_slice(4, 60).expect("tail"), &[0u8; 60][..]);
    }

    #[test]
    fn write_overrunning_end_rejected() {
        let (_tmp, file) = backing_file(64);
        let mut region = RegionMut::map(&file, 64).expect("map rw");

        // Fits the region's length but not at this offset.
        let err = region.write_into(&[1u8; 16], 60).expect_err("must reject");
        assert!(matches!(err, AccessError::SizeExceeded { offset: 60, len: 16, .. }));
        assert_eq!(region.as_slice(60, 4).expect("slice"), &[0u8; 4][..]);
    }

    #[test]
    fn empty_write_is_ok() {
        let (_tmp, file) = backing_file(64);
        let mut region = RegionMut::map(&file, 64).expect("map rw");
        assert_eq!(region.write_into(&[], 64).expect("empty at end"), 0);
        assert!(region.write_into(&[], 65).is_err());
    }

    #[test]
    fn unmap_is_idempotent_and_invalidates() {
        let (_tmp, file) = backing_file(4096);
        let mut region = RegionMut::map(&file, 4096).expect("map rw");

        region.unmap().expect("unmap");
        assert!(!region.is_mapped());
        assert_eq!(region.len(), 0);

        // Unmapping again is a documented no-op.
        region.unmap().expect("second unmap");

        // The stale handle rejects use instead of executing it.
        assert!(matches!(
            region.write_into(b"x", 0),
            Err(AccessError::Unmapped)
        ));
        assert!(matches!(region.as_slice(0, 1), Err(AccessError::Unmapped)));
        region.flush().expect("flush after unmap is a no-op");
    }

    #[test]
    fn readonly_sees_file_contents() {
        let (_tmp, file) = backing_file(4096);
        {
            let mut rw = RegionMut::map(&file, 4096).expect("map rw");
            rw.write_into(b"visible", 0).expect("write");
            rw.flush().expect("flush");
        }

        let mut ro = Region::map(&file, 4096).expect("map ro");
        assert_eq!(ro.as_slice(0, 7).expect("slice"), b"visible");
        assert!(matches!(
            ro.as_slice(4090, 7),
            Err(AccessError::SizeExceeded { .. })
        ));
        ro.unmap().expect("unmap");
        assert!(matches!(ro.read_into(0, &mut [0u8; 1]), Err(AccessError::Unmapped)));
    }
}
