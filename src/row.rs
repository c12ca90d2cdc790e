use std::fmt;

use crate::{
    COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE, EMAIL_OFFSET, EMAIL_SIZE, ID_OFFSET, ID_SIZE,
    ROW_SIZE, USERNAME_OFFSET, USERNAME_SIZE,
};

/// A single fixed-width record.
///
/// Field lengths are checked by the statement layer before a row gets here;
/// the codec only truncates to column capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: u32,
    pub username: String,
    pub email: String,
}

impl Row {
    pub fn new(id: u32, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
        }
    }

    /// Writes the row into `dest`, which must be exactly `ROW_SIZE` bytes.
    pub fn serialize(&self, dest: &mut [u8]) {
        debug_assert_eq!(dest.len(), ROW_SIZE);
        dest[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());
        write_text(
            &mut dest[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE],
            &self.username,
            COLUMN_USERNAME_SIZE,
        );
        write_text(
            &mut dest[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE],
            &self.email,
            COLUMN_EMAIL_SIZE,
        );
    }

    pub fn encode(&self) -> [u8; ROW_SIZE] {
        let mut bytes = [0u8; ROW_SIZE];
        self.serialize(&mut bytes);
        bytes
    }

    /// Reads a row back out of `src`, which must be exactly `ROW_SIZE` bytes.
    pub fn deserialize(src: &[u8]) -> Self {
        debug_assert_eq!(src.len(), ROW_SIZE);
        let mut id = [0u8; ID_SIZE];
        id.copy_from_slice(&src[ID_OFFSET..ID_OFFSET + ID_SIZE]);
        Self {
            id: u32::from_le_bytes(id),
            username: read_text(&src[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]),
            email: read_text(&src[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]),
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

// The column is NUL padded past the text, so stale bytes from a previous row
// never leak into this one.
fn write_text(column: &mut [u8], text: &str, capacity: usize) {
    let bytes = text.as_bytes();
    let len = bytes.len().min(capacity);
    column[..len].copy_from_slice(&bytes[..len]);
    column[len..].fill(0);
}

fn read_text(column: &[u8]) -> String {
    let end = column.iter().position(|&b| b == 0).unwrap_or(column.len());
    String::from_utf8_lossy(&column[..end]).into_owned()
}
