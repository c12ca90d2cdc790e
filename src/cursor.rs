use crate::error::Result;
use crate::table::Table;
use crate::ROW_SIZE;

/// A position in a table's row sequence.
///
/// The cursor borrows the table mutably, so nothing else can change the row
/// count or release pages while it is alive.
pub struct Cursor<'a> {
    table: &'a mut Table,
    row_num: usize,
    end_of_table: bool,
}

impl<'a> Cursor<'a> {
    pub fn start(table: &'a mut Table) -> Self {
        let end_of_table = table.num_rows() == 0;
        Self {
            table,
            row_num: 0,
            end_of_table,
        }
    }

    /// Positioned one past the last row, where the next insert goes.
    pub fn end(table: &'a mut Table) -> Self {
        let row_num = table.num_rows();
        Self {
            table,
            row_num,
            end_of_table: true,
        }
    }

    pub fn row_num(&self) -> usize {
        self.row_num
    }

    pub fn end_of_table(&self) -> bool {
        self.end_of_table
    }

    pub fn advance(&mut self) {
        self.row_num += 1;
        if self.row_num >= self.table.num_rows() {
            self.end_of_table = true;
        }
    }

    /// The `ROW_SIZE` bytes backing the current row, loading its page if needed.
    pub fn value(&mut self) -> Result<&mut [u8]> {
        let (page_num, byte_offset) = Table::row_address(self.row_num);
        let page = self.table.pager_mut().get_page(page_num)?;
        Ok(&mut page[byte_offset..byte_offset + ROW_SIZE])
    }
}
