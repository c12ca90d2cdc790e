//! Page-granular access to the backing file.
//!
//! Pages are loaded lazily into a fixed set of `TABLE_MAX_PAGES` slots and stay
//! resident until released. There is no eviction: the table never grows past
//! the slot count, so every page it can address fits in memory at once.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::{PAGE_SIZE, TABLE_MAX_PAGES};

pub type Page = [u8; PAGE_SIZE];

pub struct Pager {
    file: File,
    file_length: u64,
    pages: Vec<Option<Box<Page>>>,
}

impl Pager {
    /// Opens the backing file, creating it if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let open_error = |source: io::Error| Error::Open {
            path: path.to_path_buf(),
            source,
        };

        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true).truncate(false);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let file = options.open(path).map_err(open_error)?;
        let file_length = file.metadata().map_err(open_error)?.len();

        debug!(path = %path.display(), file_length, "opened pager");
        Ok(Self {
            file,
            file_length,
            pages: (0..TABLE_MAX_PAGES).map(|_| None).collect(),
        })
    }

    /// Length of the backing file when it was opened.
    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    pub fn is_resident(&self, page_num: usize) -> bool {
        self.pages.get(page_num).is_some_and(Option::is_some)
    }

    /// Returns the in-memory copy of `page_num`, reading it from disk on first use.
    ///
    /// Once a page is resident it is never re-read, so writes made through the
    /// returned buffer win over whatever is on disk until the page is flushed.
    pub fn get_page(&mut self, page_num: usize) -> Result<&mut Page> {
        if page_num >= TABLE_MAX_PAGES {
            return Err(Error::out_of_bounds(page_num));
        }
        let page = match self.pages[page_num].take() {
            Some(page) => page,
            None => self.load(page_num)?,
        };
        Ok(&mut **self.pages[page_num].insert(page))
    }

    fn load(&mut self, page_num: usize) -> Result<Box<Page>> {
        let mut page = Box::new([0u8; PAGE_SIZE]);

        // The last page on disk may be partial; anything past it stays zeroed.
        let pages_on_disk = self.file_length.div_ceil(PAGE_SIZE as u64);
        if (page_num as u64) < pages_on_disk {
            self.file
                .seek(SeekFrom::Start(page_offset(page_num)))
                .map_err(|source| Error::Seek { page_num, source })?;
            let bytes_read = read_up_to(&mut self.file, &mut page[..])
                .map_err(|source| Error::Read { page_num, source })?;
            debug!(page_num, bytes_read, "loaded page from disk");
        } else {
            debug!(page_num, "allocated fresh page");
        }
        Ok(page)
    }

    /// Writes the first `num_bytes` of a resident page back to its place in the file.
    /// `num_bytes` must not exceed `PAGE_SIZE`.
    pub fn flush(&mut self, page_num: usize, num_bytes: usize) -> Result<()> {
        debug_assert!(num_bytes <= PAGE_SIZE);
        if page_num >= TABLE_MAX_PAGES {
            return Err(Error::out_of_bounds(page_num));
        }
        let page = self.pages[page_num]
            .as_deref()
            .ok_or(Error::PageNotResident { page_num })?;

        self.file
            .seek(SeekFrom::Start(page_offset(page_num)))
            .map_err(|source| Error::Seek { page_num, source })?;
        self.file
            .write_all(&page[..num_bytes])
            .map_err(|source| Error::Write { page_num, source })?;
        debug!(page_num, num_bytes, "flushed page");
        Ok(())
    }

    /// Drops the in-memory copy of a page without writing it.
    pub fn release(&mut self, page_num: usize) {
        if let Some(slot) = self.pages.get_mut(page_num) {
            *slot = None;
        }
    }

    /// Syncs the file and releases every remaining page. Unflushed pages are lost.
    pub fn close(mut self) -> Result<()> {
        self.file.sync_all().map_err(|source| Error::Sync { source })?;
        self.pages.clear();
        Ok(())
    }
}

fn page_offset(page_num: usize) -> u64 {
    page_num as u64 * PAGE_SIZE as u64
}

// Fills as much of `buf` as the file has left. A short read at end of file is
// expected.
fn read_up_to(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
