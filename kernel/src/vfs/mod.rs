//! Virtual File System
//!
//! Одна точка монтирования в памяти, фиксированная таблица inode и общая
//! таблица дескрипторов. Удаления нет.
//! A single in-memory mount, a fixed inode table and a global descriptor
//! table. There is no delete.

mod inode;

pub use inode::{FileDescriptor, Inode, Mount};

use log::{debug, info};
use thiserror::Error;

use crate::config::{INODE_DATA_SIZE, INODE_NAME_MAX, MAX_FILES, MAX_INODES};

pub type Fd = usize;
pub type InodeId = usize;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VfsError {
    #[error("vfs is not initialized")]
    Uninitialized,
    #[error("file not found")]
    NotFound,
    #[error("no free inodes")]
    NoFreeInodes,
    #[error("no free file descriptors")]
    NoFreeDescriptors,
    #[error("invalid file descriptor")]
    InvalidDescriptor,
    #[error("invalid file name")]
    InvalidName,
    #[error("file already exists")]
    AlreadyExists,
}

pub struct Vfs {
    mount:       Mount,
    fds:         [FileDescriptor; MAX_FILES],
    initialized: bool,
}

impl Vfs {
    pub const fn new() -> Self {
        Self {
            mount: Mount::new(),
            fds: [FileDescriptor::FREE; MAX_FILES],
            initialized: false,
        }
    }

    /// Сбросить таблицы и разрешить операции / Reset the tables and allow operations
    pub fn init(&mut self) {
        self.mount = Mount::new();
        self.fds = [FileDescriptor::FREE; MAX_FILES];
        self.initialized = true;
        info!(
            "vfs: mounted {} on {} ({})",
            self.mount.device, self.mount.mount_point, self.mount.fs_type
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn ready(&self) -> Result<(), VfsError> {
        if self.initialized { Ok(()) } else { Err(VfsError::Uninitialized) }
    }

    pub fn create(&mut self, name: &[u8]) -> Result<InodeId, VfsError> {
        self.ready()?;
        let name = until_nul(name);
        if name.is_empty() {
            return Err(VfsError::InvalidName);
        }
        let stored = &name[..name.len().min(INODE_NAME_MAX)];
        if self.lookup(stored).is_some() {
            return Err(VfsError::AlreadyExists);
        }
        if self.mount.inodes_used >= MAX_INODES {
            debug!("vfs: no free inodes");
            return Err(VfsError::NoFreeInodes);
        }

        let id = self
            .mount
            .inodes
            .iter()
            .position(|i| !i.used)
            .ok_or(VfsError::NoFreeInodes)?;
        self.mount.inodes[id].claim(id, stored);
        self.mount.inodes_used += 1;
        self.mount.files += 1;

        debug!("vfs: created inode {}", id);
        Ok(id)
    }

    pub fn open(&mut self, name: &[u8]) -> Result<Fd, VfsError> {
        self.ready()?;
        let inode = self.lookup(until_nul(name)).ok_or(VfsError::NotFound)?;
        let fd = self
            .fds
            .iter()
            .position(|d| !d.used)
            .ok_or(VfsError::NoFreeDescriptors)?;

        self.fds[fd] = FileDescriptor { inode_id: Some(inode), used: true, offset: 0 };
        debug!("vfs: opened fd {} on inode {}", fd, inode);
        Ok(fd)
    }

    pub fn read(&mut self, fd: Fd, buf: &mut [u8]) -> Result<usize, VfsError> {
        self.ready()?;
        let (desc, inode) = self.resolve(fd)?;

        let start = desc.offset;
        let end = inode.size.min(INODE_DATA_SIZE);
        if start >= end {
            return Ok(0);
        }
        let n = buf.len().min(end - start);
        buf[..n].copy_from_slice(&inode.data[start..start + n]);
        self.fds[fd].offset += n;
        Ok(n)
    }

    pub fn write(&mut self, fd: Fd, bytes: &[u8]) -> Result<usize, VfsError> {
        self.ready()?;
        let (desc, _) = self.resolve(fd)?;
        let Some(id) = desc.inode_id else {
            return Err(VfsError::InvalidDescriptor);
        };

        let start = desc.offset.min(INODE_DATA_SIZE);
        let n = bytes.len().min(INODE_DATA_SIZE - start);
        let inode = &mut self.mount.inodes[id];
        inode.data[start..start + n].copy_from_slice(&bytes[..n]);

        let offset = start + n;
        self.fds[fd].offset = offset;
        if offset > inode.size {
            inode.size = offset;
        }
        Ok(n)
    }

    /// Закрыть дескриптор; повторное закрытие ничего не делает.
    /// Close a descriptor; closing twice does nothing.
    pub fn close(&mut self, fd: Fd) {
        if !self.initialized {
            return;
        }
        if let Some(desc) = self.fds.get_mut(fd) {
            if desc.used {
                *desc = FileDescriptor::FREE;
                debug!("vfs: closed fd {}", fd);
            }
        }
    }

    /// Имена файлов через пробел, только печатные байты; обрезается по `buf`.
    /// File names separated by spaces, printable bytes only; cut at `buf`.
    pub fn list(&self, buf: &mut [u8]) -> Result<usize, VfsError> {
        self.ready()?;
        let mut pos = 0;
        for inode in self.mount.inodes() {
            for &c in inode.name().iter().filter(|c| (0x20..=0x7E).contains(*c)) {
                if pos >= buf.len() {
                    break;
                }
                buf[pos] = c;
                pos += 1;
            }
            if pos < buf.len() {
                buf[pos] = b' ';
                pos += 1;
            }
        }
        Ok(pos)
    }

    pub fn mount(&self) -> &Mount {
        &self.mount
    }

    pub fn inode(&self, id: InodeId) -> Option<&Inode> {
        self.mount.inodes.get(id).filter(|i| i.used)
    }

    pub fn descriptor(&self, fd: Fd) -> Option<&FileDescriptor> {
        self.fds.get(fd).filter(|d| d.used)
    }

    pub fn open_descriptors(&self) -> usize {
        self.fds.iter().filter(|d| d.used).count()
    }

    fn lookup(&self, name: &[u8]) -> Option<InodeId> {
        self.mount.inodes().find(|i| i.name() == name).map(|i| i.id)
    }

    /// Дескриптор и его inode; inode должен быть занят.
    /// A descriptor and its inode; the inode must be in use.
    fn resolve(&self, fd: Fd) -> Result<(FileDescriptor, &Inode), VfsError> {
        let desc = *self.descriptor(fd).ok_or(VfsError::InvalidDescriptor)?;
        let inode = desc
            .inode_id
            .and_then(|id| self.inode(id))
            .ok_or(VfsError::InvalidDescriptor)?;
        Ok((desc, inode))
    }
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}
