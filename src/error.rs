use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::TABLE_MAX_PAGES;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unable to open file {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("Tried to fetch page number out of bounds. {page_num} >= {max}")]
    PageOutOfBounds { page_num: usize, max: usize },

    #[error("Tried to flush page {page_num}, which is not loaded")]
    PageNotResident { page_num: usize },

    #[error("Error reading page {page_num}: {source}")]
    Read { page_num: usize, source: io::Error },

    #[error("Error seeking to page {page_num}: {source}")]
    Seek { page_num: usize, source: io::Error },

    #[error("Error writing page {page_num}: {source}")]
    Write { page_num: usize, source: io::Error },

    #[error("Error closing db file: {source}")]
    Sync { source: io::Error },

    #[error("Table full.")]
    TableFull,
}

impl Error {
    pub(crate) fn out_of_bounds(page_num: usize) -> Self {
        Error::PageOutOfBounds {
            page_num,
            max: TABLE_MAX_PAGES,
        }
    }

    /// Whether the session must end. Everything except a full table leaves the
    /// store in a state that can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::TableFull)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
