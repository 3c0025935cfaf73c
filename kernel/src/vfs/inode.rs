//! Inode, дескриптор файла и точка монтирования.
//! Inode, file descriptor and mount point.

use crate::config::{INODE_DATA_SIZE, INODE_NAME_MAX, MAX_INODES};

#[derive(Debug, Clone, Copy)]
pub struct Inode {
    /// Совпадает с индексом слота / Equal to the slot index
    pub id:   usize,
    name:     [u8; INODE_NAME_MAX],
    name_len: usize,
    pub size: usize,
    pub used: bool,
    pub(super) data: [u8; INODE_DATA_SIZE],
}

impl Inode {
    pub(super) const EMPTY: Self = Self {
        id: 0,
        name: [0; INODE_NAME_MAX],
        name_len: 0,
        size: 0,
        used: false,
        data: [0; INODE_DATA_SIZE],
    };

    pub fn name(&self) -> &[u8] {
        &self.name[..self.name_len]
    }

    /// Содержимое файла до `size` / File contents up to `size`
    pub fn contents(&self) -> &[u8] {
        &self.data[..self.size]
    }

    /// Занять слот; имя обрезается до INODE_NAME_MAX байт.
    /// Claim the slot; the name is cut to INODE_NAME_MAX bytes.
    pub(super) fn claim(&mut self, id: usize, name: &[u8]) {
        let len = name.len().min(INODE_NAME_MAX);
        *self = Self::EMPTY;
        self.id = id;
        self.name[..len].copy_from_slice(&name[..len]);
        self.name_len = len;
        self.used = true;
    }
}

/// Дескриптор открытого файла / Open file descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileDescriptor {
    /// Индекс inode, не владение / Inode index, not ownership
    pub inode_id: Option<usize>,
    pub used:     bool,
    pub offset:   usize,
}

impl FileDescriptor {
    pub(super) const FREE: Self = Self { inode_id: None, used: false, offset: 0 };
}

/// Единственная точка монтирования / The single mount point
pub struct Mount {
    pub device:      &'static str,
    pub mount_point: &'static str,
    pub fs_type:     &'static str,
    pub inodes_used: usize,
    pub files:       usize,
    pub(super) inodes: [Inode; MAX_INODES],
}

impl Mount {
    pub(super) const fn new() -> Self {
        Self {
            device: "hda",
            mount_point: "/",
            fs_type: "ext2",
            inodes_used: 0,
            files: 0,
            inodes: [Inode::EMPTY; MAX_INODES],
        }
    }

    pub fn inodes(&self) -> impl Iterator<Item = &Inode> {
        self.inodes.iter().filter(|i| i.used)
    }
}
