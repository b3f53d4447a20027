//! Seekable byte source over a container
//!
//! [`StreamSource`] wraps any `Read + Seek` handle (a file or an in-memory
//! buffer) and only exposes bounds-checked random-access reads. The logical
//! cursor it carries is owned by the decode state built on top of it; plain
//! reads never move it.

use std::fs::File;
use std::io::{BufReader, Cursor, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Error, Result};

/// Random-access view of one container.
///
/// The underlying handle is released when [`close`](Self::close) is called
/// or when the source is dropped, whichever happens first.
#[derive(Debug)]
pub struct StreamSource<R: Read + Seek = BufReader<File>> {
    name: String,
    inner: Option<R>,
    len: u64,
    cursor: u64,
    bound: bool,
}

impl StreamSource<BufReader<File>> {
    /// Open a container on disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the path does not exist, or
    /// [`Error::Io`] for any other failure to open or measure the file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::NotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Io(e),
        })?;
        let len = file.metadata()?.len();
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        tracing::debug!("Opened {} ({} bytes)", path.display(), len);

        Ok(Self {
            name,
            inner: Some(BufReader::new(file)),
            len,
            cursor: 0,
            bound: false,
        })
    }
}

impl StreamSource<Cursor<Vec<u8>>> {
    /// Wrap an in-memory container.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        let len = data.len() as u64;
        Self {
            name: name.into(),
            inner: Some(Cursor::new(data)),
            len,
            cursor: 0,
            bound: false,
        }
    }
}

impl<R: Read + Seek> StreamSource<R> {
    /// Wrap an arbitrary seekable reader. The length is measured once here.
    pub fn from_reader(name: impl Into<String>, mut reader: R) -> Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        Ok(Self {
            name: name.into(),
            inner: Some(reader),
            len,
            cursor: 0,
            bound: false,
        })
    }

    /// Display name of the container (file name for disk sources).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total addressable size in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current logical cursor (start of the next packet once a decode state is bound).
    #[must_use]
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Whether a decode state has already been initialized on this source.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Read `length` bytes at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if the range ends past the container,
    /// [`Error::InvalidState`] after [`close`](Self::close), and
    /// [`Error::Io`] if the handle fails.
    pub fn read(&mut self, offset: u64, length: u32) -> Result<Vec<u8>> {
        self.check_range(offset, u64::from(length))?;
        let mut buf = vec![0u8; length as usize];
        self.read_into(offset, &mut buf)?;
        Ok(buf)
    }

    /// Fill `buf` from `offset`. Same bounds rules as [`read`](Self::read).
    pub fn read_into(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.check_range(offset, buf.len() as u64)?;

        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| Error::InvalidState(format!("{} is closed", self.name)))?;
        inner.seek(SeekFrom::Start(offset))?;
        inner.read_exact(buf)?;
        Ok(())
    }

    fn check_range(&self, offset: u64, length: u64) -> Result<()> {
        let in_bounds = offset
            .checked_add(length)
            .is_some_and(|end| end <= self.len);
        if !in_bounds {
            return Err(Error::OutOfRange {
                offset,
                length,
                size: self.len,
            });
        }
        Ok(())
    }

    /// Reset the cursor and release the decode binding so a new decode
    /// state can be initialized.
    pub fn rewind(&mut self) {
        self.cursor = 0;
        self.bound = false;
    }

    /// Release the underlying handle. Calling this more than once is a no-op.
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            tracing::trace!("Closed {}", self.name);
        }
    }

    /// Claim the source for a decode state, placing the cursor at `offset`.
    pub(crate) fn bind(&mut self, offset: u64) -> Result<()> {
        if self.is_closed() {
            return Err(Error::InvalidState(format!("{} is closed", self.name)));
        }
        if self.bound {
            return Err(Error::InvalidState(format!(
                "{} already has a decode state (cursor at {:#x}); rewind or reopen it first",
                self.name, self.cursor
            )));
        }
        self.bound = true;
        self.cursor = offset;
        Ok(())
    }

    pub(crate) fn set_cursor(&mut self, offset: u64) {
        self.cursor = offset;
    }
}
