use std::fmt;

pub const S_IFMT: u32 = 0o170000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFREG: u32 = 0o100000;
pub const S_IFLNK: u32 = 0o120000;
pub const S_IFIFO: u32 = 0o010000;
pub const S_IFCHR: u32 = 0o020000;
pub const S_IFBLK: u32 = 0o060000;

const PERMISSION_BITS: u32 = 0o7777;

/// Unix mode: file type bits plus the low 12 permission bits
/// (including setuid, setgid and sticky).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Mode(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileType {
    Regular,
    Directory,
    Symlink,
}

impl Mode {
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn dir(permissions: u32) -> Self {
        Self(S_IFDIR | (permissions & PERMISSION_BITS))
    }

    pub const fn file(permissions: u32) -> Self {
        Self(S_IFREG | (permissions & PERMISSION_BITS))
    }

    pub const fn symlink(permissions: u32) -> Self {
        Self(S_IFLNK | (permissions & PERMISSION_BITS))
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn permissions(self) -> u32 {
        self.0 & PERMISSION_BITS
    }

    /// Type of the entry; a mode without type bits is a regular file.
    pub fn file_type(self) -> Option<FileType> {
        match self.0 & S_IFMT {
            0 | S_IFREG => Some(FileType::Regular),
            S_IFDIR => Some(FileType::Directory),
            S_IFLNK => Some(FileType::Symlink),
            _ => None,
        }
    }

    pub fn is_dir(self) -> bool {
        self.file_type() == Some(FileType::Directory)
    }

    pub fn is_symlink(self) -> bool {
        self.file_type() == Some(FileType::Symlink)
    }

    pub fn is_regular(self) -> bool {
        self.file_type() == Some(FileType::Regular)
    }

    /// Replace the permission bits, keeping the file type. Zero keeps the
    /// current permissions.
    pub const fn with_permissions(self, permissions: u32) -> Self {
        if permissions == 0 {
            return self;
        }
        Self((self.0 & !PERMISSION_BITS) | (permissions & PERMISSION_BITS))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#o}", self.0)
    }
}

impl From<u32> for Mode {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}
