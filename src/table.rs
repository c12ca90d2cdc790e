//! The single table and the mapping from row numbers to page coordinates.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::pager::Pager;
use crate::row::Row;
use crate::{PAGE_SIZE, ROW_SIZE, ROWS_PER_PAGE, TABLE_MAX_ROWS};

pub struct Table {
    pager: Pager,
    num_rows: usize,
}

impl Table {
    /// Opens the table stored at `path`, deriving the row count from the file length.
    ///
    /// A trailing partial row, left behind by something other than a clean close,
    /// is ignored and will be overwritten by the next insert.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let pager = Pager::open(path)?;
        let file_length = pager.file_length();
        let num_rows = rows_in_file(file_length);

        let tail = file_length % PAGE_SIZE as u64 % ROW_SIZE as u64;
        if tail != 0 {
            warn!(file_length, tail, "ignoring trailing partial row");
        }
        if num_rows > TABLE_MAX_ROWS {
            warn!(num_rows, "file holds more rows than the table can address");
        }

        let num_rows = num_rows.min(TABLE_MAX_ROWS);
        info!(num_rows, "opened table");
        Ok(Self { pager, num_rows })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub(crate) fn pager_mut(&mut self) -> &mut Pager {
        &mut self.pager
    }

    /// Page number and byte offset within that page for `row_num`.
    pub fn row_address(row_num: usize) -> (usize, usize) {
        let page_num = row_num / ROWS_PER_PAGE;
        let byte_offset = (row_num % ROWS_PER_PAGE) * ROW_SIZE;
        (page_num, byte_offset)
    }

    pub fn start(&mut self) -> Cursor<'_> {
        Cursor::start(self)
    }

    pub fn end(&mut self) -> Cursor<'_> {
        Cursor::end(self)
    }

    /// Appends `row`. Fails with [`Error::TableFull`] once every page is used,
    /// leaving the table untouched.
    pub fn insert(&mut self, row: &Row) -> Result<()> {
        if self.num_rows >= TABLE_MAX_ROWS {
            return Err(Error::TableFull);
        }
        let mut cursor = self.end();
        row.serialize(cursor.value()?);
        self.num_rows += 1;
        debug!(id = row.id, num_rows = self.num_rows, "inserted row");
        Ok(())
    }

    /// Every row in insertion order.
    pub fn select(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::with_capacity(self.num_rows);
        let mut cursor = self.start();
        while !cursor.end_of_table() {
            rows.push(Row::deserialize(cursor.value()?));
            cursor.advance();
        }
        Ok(rows)
    }

    /// Writes every loaded page back and closes the file.
    ///
    /// Full pages are written whole. The last page, if partly filled, is written
    /// only up to its last row so the file never gains unused trailing bytes.
    pub fn close(mut self) -> Result<()> {
        let num_full_pages = self.num_rows / ROWS_PER_PAGE;
        for page_num in 0..num_full_pages {
            if !self.pager.is_resident(page_num) {
                continue;
            }
            self.pager.flush(page_num, PAGE_SIZE)?;
            self.pager.release(page_num);
        }

        let num_additional_rows = self.num_rows % ROWS_PER_PAGE;
        if num_additional_rows > 0 && self.pager.is_resident(num_full_pages) {
            self.pager.flush(num_full_pages, num_additional_rows * ROW_SIZE)?;
            self.pager.release(num_full_pages);
        }

        self.pager.close()?;
        info!(num_rows = self.num_rows, "closed table");
        Ok(())
    }
}

// Full pages are written whole, so each one holds ROWS_PER_PAGE rows plus
// unused tail bytes. Only the final partial page is packed to the row.
fn rows_in_file(file_length: u64) -> usize {
    let full_pages = (file_length / PAGE_SIZE as u64) as usize;
    let tail = (file_length % PAGE_SIZE as u64) as usize;
    full_pages * ROWS_PER_PAGE + tail / ROW_SIZE
}
