//! Virtual File System
//!
//! The shell never touches the host filesystem. Everything lives in an
//! in-memory tree behind the [`FileSystem`] trait; commands consume the
//! trait, the session owns the instance.

mod memfs;
mod path;

pub use memfs::InMemoryFs;
pub use path::{base_name, dir_name, normalize_path};

use std::collections::HashMap;
use std::time::SystemTime;
use thiserror::Error;

/// File system errors, named after the POSIX codes commands print.
#[derive(Error, Debug, Clone)]
pub enum FsError {
    #[error("ENOENT: no such file or directory, {op} '{path}'")]
    NotFound { path: String, op: String },

    #[error("EEXIST: file already exists, {op} '{path}'")]
    AlreadyExists { path: String, op: String },

    #[error("EISDIR: illegal operation on a directory, {op} '{path}'")]
    IsDirectory { path: String, op: String },

    #[error("ENOTDIR: not a directory, {op} '{path}'")]
    NotDirectory { path: String, op: String },

    #[error("ENOTEMPTY: directory not empty, {op} '{path}'")]
    NotEmpty { path: String, op: String },

    #[error("ELOOP: too many levels of symbolic links, {op} '{path}'")]
    SymlinkLoop { path: String, op: String },

    #[error("EINVAL: invalid argument, {op} '{path}'")]
    InvalidArgument { path: String, op: String },
}

impl FsError {
    pub fn not_found(path: &str, op: &str) -> Self {
        FsError::NotFound { path: path.to_string(), op: op.to_string() }
    }

    /// The short reason commands embed in their diagnostics, e.g.
    /// `cat: /x: No such file or directory`.
    pub fn reason(&self) -> &'static str {
        match self {
            FsError::NotFound { .. } => "No such file or directory",
            FsError::AlreadyExists { .. } => "File exists",
            FsError::IsDirectory { .. } => "Is a directory",
            FsError::NotDirectory { .. } => "Not a directory",
            FsError::NotEmpty { .. } => "Directory not empty",
            FsError::SymlinkLoop { .. } => "Too many levels of symbolic links",
            FsError::InvalidArgument { .. } => "Invalid argument",
        }
    }
}

/// Stat information for a single entry.
#[derive(Debug, Clone)]
pub struct FsStat {
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
    pub mode: u32,
    pub size: u64,
    pub mtime: SystemTime,
}

/// A directory entry with type flags, as returned by [`FileSystem::readdir`].
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
}

/// Options for [`FileSystem::rm`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RmOptions {
    pub recursive: bool,
    pub force: bool,
}

/// Initial file population for a new session: path -> contents.
pub type InitialFiles = HashMap<String, String>;

/// The operation surface commands are written against.
///
/// All paths handed to the trait are expected to be absolute; callers go
/// through [`FileSystem::resolve_path`] with the shell's cwd first.
pub trait FileSystem: Send + Sync {
    /// Read a file as text (lossy UTF-8).
    fn read_file(&self, path: &str) -> Result<String, FsError>;

    /// Read a file as raw bytes.
    fn read_file_bytes(&self, path: &str) -> Result<Vec<u8>, FsError>;

    /// Create or replace a file.
    fn write_file(&self, path: &str, content: &[u8]) -> Result<(), FsError>;

    /// Append to a file, creating it if absent.
    fn append_file(&self, path: &str, content: &[u8]) -> Result<(), FsError>;

    fn exists(&self, path: &str) -> bool;

    /// Stat following symlinks.
    fn stat(&self, path: &str) -> Result<FsStat, FsError>;

    /// Stat without following the final symlink.
    fn lstat(&self, path: &str) -> Result<FsStat, FsError>;

    fn mkdir(&self, path: &str, recursive: bool) -> Result<(), FsError>;

    /// Entries of a directory, sorted by name.
    fn readdir(&self, path: &str) -> Result<Vec<DirEntry>, FsError>;

    fn rm(&self, path: &str, opts: RmOptions) -> Result<(), FsError>;

    fn mv(&self, src: &str, dest: &str) -> Result<(), FsError>;

    fn chmod(&self, path: &str, mode: u32) -> Result<(), FsError>;

    fn symlink(&self, target: &str, link_path: &str) -> Result<(), FsError>;

    /// Hard link. Directories cannot be linked.
    fn link(&self, existing: &str, new_path: &str) -> Result<(), FsError>;

    fn readlink(&self, path: &str) -> Result<String, FsError>;

    /// Bump a file's mtime, creating an empty file if absent.
    fn touch(&self, path: &str) -> Result<(), FsError>;

    /// Resolve `path` against `base`, normalizing `.`/`..` and `//`.
    /// Purely lexical; never consults the tree.
    fn resolve_path(&self, base: &str, path: &str) -> String {
        path::resolve_path(base, path)
    }
}
