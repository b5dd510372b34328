//! In-memory filesystem backing the sandbox.
//!
//! A flat map of normalized absolute path -> node. Directories are explicit
//! entries; children are found by prefix scan, which the `BTreeMap` keeps
//! ordered for free.

use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;
use std::time::SystemTime;

use super::path::{dir_name, normalize_path};
use super::{DirEntry, FileSystem, FsError, FsStat, InitialFiles, RmOptions};

const MAX_SYMLINK_HOPS: usize = 40;

#[derive(Debug, Clone)]
enum Node {
    File { content: Vec<u8>, mode: u32, mtime: SystemTime },
    Directory { mode: u32, mtime: SystemTime },
    Symlink { target: String, mode: u32, mtime: SystemTime },
}

impl Node {
    fn file(content: Vec<u8>) -> Self {
        Node::File { content, mode: 0o644, mtime: SystemTime::now() }
    }

    fn dir() -> Self {
        Node::Directory { mode: 0o755, mtime: SystemTime::now() }
    }

    fn stat(&self) -> FsStat {
        match self {
            Node::File { content, mode, mtime } => FsStat {
                is_file: true,
                is_directory: false,
                is_symlink: false,
                mode: *mode,
                size: content.len() as u64,
                mtime: *mtime,
            },
            Node::Directory { mode, mtime } => FsStat {
                is_file: false,
                is_directory: true,
                is_symlink: false,
                mode: *mode,
                size: 0,
                mtime: *mtime,
            },
            Node::Symlink { target, mode, mtime } => FsStat {
                is_file: false,
                is_directory: false,
                is_symlink: true,
                mode: *mode,
                size: target.len() as u64,
                mtime: *mtime,
            },
        }
    }
}

type Tree = BTreeMap<String, Node>;

/// Resolve a symlink target relative to the directory holding the link.
fn link_target(link_path: &str, target: &str) -> String {
    if target.starts_with('/') {
        normalize_path(target)
    } else {
        normalize_path(&format!("{}/{}", dir_name(link_path), target))
    }
}

/// Walk every component of `path`, following symlinks, and return the
/// physical path. Components that do not exist pass through unchanged so
/// writes can create new entries below existing directories.
fn follow_symlinks(tree: &Tree, path: &str, op: &str, skip_last: bool) -> Result<String, FsError> {
    let normalized = normalize_path(path);
    if normalized == "/" {
        return Ok(normalized);
    }
    let parts: Vec<&str> = normalized[1..].split('/').collect();
    let last = parts.len() - 1;
    let mut resolved = String::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (i, part) in parts.iter().enumerate() {
        resolved = format!("{}/{}", resolved, part);
        if skip_last && i == last {
            break;
        }
        let mut hops = 0;
        while let Some(Node::Symlink { target, .. }) = tree.get(&resolved) {
            if hops >= MAX_SYMLINK_HOPS || !seen.insert(resolved.clone()) {
                return Err(FsError::SymlinkLoop { path: path.to_string(), op: op.to_string() });
            }
            resolved = link_target(&resolved, target);
            hops += 1;
        }
    }
    Ok(resolved)
}

/// Create any missing parent directories for `path`.
fn ensure_parents(tree: &mut Tree, path: &str) {
    let mut dir = dir_name(path);
    let mut missing = Vec::new();
    while dir != "/" && !tree.contains_key(&dir) {
        missing.push(dir.clone());
        dir = dir_name(&dir);
    }
    for d in missing.into_iter().rev() {
        tree.insert(d, Node::dir());
    }
}

/// The default [`FileSystem`] implementation.
pub struct InMemoryFs {
    tree: RwLock<Tree>,
}

impl InMemoryFs {
    pub fn new() -> Self {
        let mut tree = Tree::new();
        tree.insert("/".to_string(), Node::dir());
        Self { tree: RwLock::new(tree) }
    }

    /// Build a filesystem pre-populated with text files. Parent directories
    /// are created implicitly.
    pub fn with_files(files: &InitialFiles) -> Self {
        let fs = Self::new();
        {
            let mut tree = fs.tree.write().unwrap();
            for (path, content) in files {
                let normalized = normalize_path(path);
                ensure_parents(&mut tree, &normalized);
                if path.ends_with('/') {
                    tree.insert(normalized, Node::dir());
                } else {
                    tree.insert(normalized, Node::file(content.as_bytes().to_vec()));
                }
            }
        }
        fs
    }
}

impl Default for InMemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for InMemoryFs {
    fn read_file(&self, path: &str) -> Result<String, FsError> {
        let bytes = self.read_file_bytes(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn read_file_bytes(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let tree = self.tree.read().unwrap();
        let resolved = follow_symlinks(&tree, path, "open", false)?;
        match tree.get(&resolved) {
            Some(Node::File { content, .. }) => Ok(content.clone()),
            Some(Node::Directory { .. }) => {
                Err(FsError::IsDirectory { path: path.to_string(), op: "read".to_string() })
            }
            _ => Err(FsError::not_found(path, "open")),
        }
    }

    fn write_file(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        let mut tree = self.tree.write().unwrap();
        let resolved = follow_symlinks(&tree, path, "open", false)?;
        if matches!(tree.get(&resolved), Some(Node::Directory { .. })) {
            return Err(FsError::IsDirectory { path: path.to_string(), op: "write".to_string() });
        }
        let parent = dir_name(&resolved);
        if let Some(node) = tree.get(&parent) {
            if !matches!(node, Node::Directory { .. }) {
                return Err(FsError::NotDirectory { path: path.to_string(), op: "write".to_string() });
            }
        } else {
            return Err(FsError::not_found(path, "write"));
        }
        tree.insert(resolved, Node::file(content.to_vec()));
        Ok(())
    }

    fn append_file(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        let mut tree = self.tree.write().unwrap();
        let resolved = follow_symlinks(&tree, path, "open", false)?;
        match tree.get_mut(&resolved) {
            Some(Node::File { content: existing, mtime, .. }) => {
                existing.extend_from_slice(content);
                *mtime = SystemTime::now();
                Ok(())
            }
            Some(Node::Directory { .. }) => {
                Err(FsError::IsDirectory { path: path.to_string(), op: "append".to_string() })
            }
            _ => {
                let parent = dir_name(&resolved);
                match tree.get(&parent) {
                    Some(Node::Directory { .. }) => {
                        tree.insert(resolved, Node::file(content.to_vec()));
                        Ok(())
                    }
                    Some(_) => Err(FsError::NotDirectory {
                        path: path.to_string(),
                        op: "append".to_string(),
                    }),
                    None => Err(FsError::not_found(path, "append")),
                }
            }
        }
    }

    fn exists(&self, path: &str) -> bool {
        let tree = self.tree.read().unwrap();
        match follow_symlinks(&tree, path, "stat", false) {
            Ok(resolved) => tree.contains_key(&resolved),
            Err(_) => false,
        }
    }

    fn stat(&self, path: &str) -> Result<FsStat, FsError> {
        let tree = self.tree.read().unwrap();
        let resolved = follow_symlinks(&tree, path, "stat", false)?;
        tree.get(&resolved)
            .map(Node::stat)
            .ok_or_else(|| FsError::not_found(path, "stat"))
    }

    fn lstat(&self, path: &str) -> Result<FsStat, FsError> {
        let tree = self.tree.read().unwrap();
        let resolved = follow_symlinks(&tree, path, "lstat", true)?;
        tree.get(&resolved)
            .map(Node::stat)
            .ok_or_else(|| FsError::not_found(path, "lstat"))
    }

    fn mkdir(&self, path: &str, recursive: bool) -> Result<(), FsError> {
        let mut tree = self.tree.write().unwrap();
        let resolved = follow_symlinks(&tree, path, "mkdir", false)?;
        if tree.contains_key(&resolved) {
            if recursive && matches!(tree.get(&resolved), Some(Node::Directory { .. })) {
                return Ok(());
            }
            return Err(FsError::AlreadyExists { path: path.to_string(), op: "mkdir".to_string() });
        }
        let parent = dir_name(&resolved);
        match tree.get(&parent) {
            Some(Node::Directory { .. }) => {}
            Some(_) => {
                return Err(FsError::NotDirectory { path: path.to_string(), op: "mkdir".to_string() })
            }
            None if recursive => ensure_parents(&mut tree, &resolved),
            None => return Err(FsError::not_found(path, "mkdir")),
        }
        tree.insert(resolved, Node::dir());
        Ok(())
    }

    fn readdir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        let tree = self.tree.read().unwrap();
        let resolved = follow_symlinks(&tree, path, "scandir", false)?;
        match tree.get(&resolved) {
            Some(Node::Directory { .. }) => {}
            Some(_) => {
                return Err(FsError::NotDirectory {
                    path: path.to_string(),
                    op: "scandir".to_string(),
                })
            }
            None => return Err(FsError::not_found(path, "scandir")),
        }
        let prefix = if resolved == "/" { "/".to_string() } else { format!("{}/", resolved) };
        let mut entries = Vec::new();
        for (key, node) in tree.range(prefix.clone()..) {
            if !key.starts_with(&prefix) {
                break;
            }
            let rest = &key[prefix.len()..];
            if rest.is_empty() || rest.contains('/') {
                continue;
            }
            let stat = node.stat();
            entries.push(DirEntry {
                name: rest.to_string(),
                is_file: stat.is_file,
                is_directory: stat.is_directory,
                is_symlink: stat.is_symlink,
            });
        }
        Ok(entries)
    }

    fn rm(&self, path: &str, opts: RmOptions) -> Result<(), FsError> {
        let mut tree = self.tree.write().unwrap();
        let resolved = follow_symlinks(&tree, path, "unlink", true)?;
        match tree.get(&resolved) {
            Some(Node::Directory { .. }) => {
                if !opts.recursive {
                    return Err(FsError::IsDirectory {
                        path: path.to_string(),
                        op: "unlink".to_string(),
                    });
                }
                let prefix = format!("{}/", resolved);
                let mut doomed: Vec<String> = tree
                    .range(prefix.clone()..)
                    .map(|(k, _)| k.clone())
                    .take_while(|k| k.starts_with(&prefix))
                    .collect();
                doomed.push(resolved);
                for key in doomed {
                    tree.remove(&key);
                }
                Ok(())
            }
            Some(_) => {
                tree.remove(&resolved);
                Ok(())
            }
            None if opts.force => Ok(()),
            None => Err(FsError::not_found(path, "unlink")),
        }
    }

    fn mv(&self, src: &str, dest: &str) -> Result<(), FsError> {
        let mut tree = self.tree.write().unwrap();
        let src_resolved = follow_symlinks(&tree, src, "rename", true)?;
        let mut dest_resolved = follow_symlinks(&tree, dest, "rename", false)?;
        if !tree.contains_key(&src_resolved) {
            return Err(FsError::not_found(src, "rename"));
        }
        // Moving into an existing directory targets a child entry.
        if matches!(tree.get(&dest_resolved), Some(Node::Directory { .. })) {
            dest_resolved = format!(
                "{}/{}",
                dest_resolved.trim_end_matches('/'),
                super::path::base_name(&src_resolved)
            );
        }
        if src_resolved == dest_resolved {
            return Ok(());
        }
        let parent = dir_name(&dest_resolved);
        if !matches!(tree.get(&parent), Some(Node::Directory { .. })) {
            return Err(FsError::not_found(dest, "rename"));
        }
        let prefix = format!("{}/", src_resolved);
        let mut moved: Vec<(String, Node)> = vec![(
            src_resolved.clone(),
            tree.get(&src_resolved).cloned().expect("checked above"),
        )];
        moved.extend(
            tree.range(prefix.clone()..)
                .take_while(|(k, _)| k.starts_with(&prefix))
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        for (key, _) in &moved {
            tree.remove(key);
        }
        for (key, node) in moved {
            let suffix = &key[src_resolved.len()..];
            tree.insert(format!("{}{}", dest_resolved, suffix), node);
        }
        Ok(())
    }

    fn chmod(&self, path: &str, new_mode: u32) -> Result<(), FsError> {
        let mut tree = self.tree.write().unwrap();
        let resolved = follow_symlinks(&tree, path, "chmod", false)?;
        match tree.get_mut(&resolved) {
            Some(Node::File { mode, .. })
            | Some(Node::Directory { mode, .. })
            | Some(Node::Symlink { mode, .. }) => {
                *mode = new_mode & 0o7777;
                Ok(())
            }
            None => Err(FsError::not_found(path, "chmod")),
        }
    }

    fn symlink(&self, target: &str, link_path: &str) -> Result<(), FsError> {
        let mut tree = self.tree.write().unwrap();
        let normalized = normalize_path(link_path);
        if tree.contains_key(&normalized) {
            return Err(FsError::AlreadyExists {
                path: link_path.to_string(),
                op: "symlink".to_string(),
            });
        }
        ensure_parents(&mut tree, &normalized);
        tree.insert(
            normalized,
            Node::Symlink { target: target.to_string(), mode: 0o777, mtime: SystemTime::now() },
        );
        Ok(())
    }

    fn link(&self, existing: &str, new_path: &str) -> Result<(), FsError> {
        let mut tree = self.tree.write().unwrap();
        let src = follow_symlinks(&tree, existing, "link", false)?;
        let dest = normalize_path(new_path);
        match tree.get(&src).cloned() {
            Some(node @ Node::File { .. }) => {
                if tree.contains_key(&dest) {
                    return Err(FsError::AlreadyExists {
                        path: new_path.to_string(),
                        op: "link".to_string(),
                    });
                }
                ensure_parents(&mut tree, &dest);
                tree.insert(dest, node);
                Ok(())
            }
            Some(_) => {
                Err(FsError::InvalidArgument { path: existing.to_string(), op: "link".to_string() })
            }
            None => Err(FsError::not_found(existing, "link")),
        }
    }

    fn readlink(&self, path: &str) -> Result<String, FsError> {
        let tree = self.tree.read().unwrap();
        let resolved = follow_symlinks(&tree, path, "readlink", true)?;
        match tree.get(&resolved) {
            Some(Node::Symlink { target, .. }) => Ok(target.clone()),
            Some(_) => {
                Err(FsError::InvalidArgument { path: path.to_string(), op: "readlink".to_string() })
            }
            None => Err(FsError::not_found(path, "readlink")),
        }
    }

    fn touch(&self, path: &str) -> Result<(), FsError> {
        let mut tree = self.tree.write().unwrap();
        let resolved = follow_symlinks(&tree, path, "utimes", false)?;
        match tree.get_mut(&resolved) {
            Some(Node::File { mtime, .. })
            | Some(Node::Directory { mtime, .. })
            | Some(Node::Symlink { mtime, .. }) => {
                *mtime = SystemTime::now();
                Ok(())
            }
            None => {
                let parent = dir_name(&resolved);
                if !matches!(tree.get(&parent), Some(Node::Directory { .. })) {
                    return Err(FsError::not_found(path, "touch"));
                }
                tree.insert(resolved, Node::file(Vec::new()));
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fs() -> InMemoryFs {
        InMemoryFs::new()
    }

    #[test]
    fn test_write_then_read() {
        let fs = fs();
        fs.mkdir("/tmp", false).unwrap();
        fs.write_file("/tmp/a.txt", b"hello").unwrap();
        assert_eq!(fs.read_file("/tmp/a.txt").unwrap(), "hello");
    }

    #[test]
    fn test_read_missing_is_enoent() {
        let fs = fs();
        let err = fs.read_file("/missing").unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
    }

    #[test]
    fn test_append_creates_and_extends() {
        let fs = fs();
        fs.append_file("/log", b"a").unwrap();
        fs.append_file("/log", b"b").unwrap();
        assert_eq!(fs.read_file("/log").unwrap(), "ab");
    }

    #[test]
    fn test_mkdir_recursive() {
        let fs = fs();
        assert!(fs.mkdir("/a/b/c", false).is_err());
        fs.mkdir("/a/b/c", true).unwrap();
        assert!(fs.stat("/a/b").unwrap().is_directory);
    }

    #[test]
    fn test_readdir_sorted_immediate_children() {
        let fs = fs();
        fs.mkdir("/d", false).unwrap();
        fs.write_file("/d/b", b"").unwrap();
        fs.write_file("/d/a", b"").unwrap();
        fs.mkdir("/d/sub", false).unwrap();
        fs.write_file("/d/sub/deep", b"").unwrap();
        let names: Vec<String> = fs.readdir("/d").unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["a", "b", "sub"]);
    }

    #[test]
    fn test_rm_directory_needs_recursive() {
        let fs = fs();
        fs.mkdir("/d", false).unwrap();
        fs.write_file("/d/f", b"x").unwrap();
        assert!(fs.rm("/d", RmOptions::default()).is_err());
        fs.rm("/d", RmOptions { recursive: true, force: false }).unwrap();
        assert!(!fs.exists("/d"));
        assert!(!fs.exists("/d/f"));
    }

    #[test]
    fn test_rm_force_ignores_missing() {
        let fs = fs();
        assert!(fs.rm("/nope", RmOptions { recursive: false, force: true }).is_ok());
    }

    #[test]
    fn test_mv_file_and_into_directory() {
        let fs = fs();
        fs.write_file("/a", b"x").unwrap();
        fs.mv("/a", "/b").unwrap();
        assert_eq!(fs.read_file("/b").unwrap(), "x");

        fs.mkdir("/dir", false).unwrap();
        fs.mv("/b", "/dir").unwrap();
        assert_eq!(fs.read_file("/dir/b").unwrap(), "x");
    }

    #[test]
    fn test_mv_directory_moves_subtree() {
        let fs = fs();
        fs.mkdir("/src/inner", true).unwrap();
        fs.write_file("/src/inner/f", b"1").unwrap();
        fs.mv("/src", "/dst").unwrap();
        assert_eq!(fs.read_file("/dst/inner/f").unwrap(), "1");
        assert!(!fs.exists("/src"));
    }

    #[test]
    fn test_symlink_follow_and_readlink() {
        let fs = fs();
        fs.write_file("/target", b"data").unwrap();
        fs.symlink("/target", "/alias").unwrap();
        assert_eq!(fs.read_file("/alias").unwrap(), "data");
        assert_eq!(fs.readlink("/alias").unwrap(), "/target");
        assert!(fs.lstat("/alias").unwrap().is_symlink);
        assert!(fs.stat("/alias").unwrap().is_file);
    }

    #[test]
    fn test_symlink_relative_target() {
        let fs = fs();
        fs.mkdir("/d", false).unwrap();
        fs.write_file("/d/real", b"r").unwrap();
        fs.symlink("real", "/d/ln").unwrap();
        assert_eq!(fs.read_file("/d/ln").unwrap(), "r");
    }

    #[test]
    fn test_symlink_loop_detected() {
        let fs = fs();
        fs.symlink("/b", "/a").unwrap();
        fs.symlink("/a", "/b").unwrap();
        let err = fs.read_file("/a").unwrap_err();
        assert!(matches!(err, FsError::SymlinkLoop { .. }));
    }

    #[test]
    fn test_hard_link_copies_file() {
        let fs = fs();
        fs.write_file("/orig", b"x").unwrap();
        fs.link("/orig", "/hard").unwrap();
        assert_eq!(fs.read_file("/hard").unwrap(), "x");
        fs.mkdir("/d", false).unwrap();
        assert!(fs.link("/d", "/d2").is_err());
    }

    #[test]
    fn test_touch_creates_empty() {
        let fs = fs();
        fs.touch("/empty").unwrap();
        assert_eq!(fs.stat("/empty").unwrap().size, 0);
    }

    #[test]
    fn test_with_files_creates_parents() {
        let mut files = InitialFiles::new();
        files.insert("/home/user/readme.md".to_string(), "hi".to_string());
        let fs = InMemoryFs::with_files(&files);
        assert!(fs.stat("/home/user").unwrap().is_directory);
        assert_eq!(fs.read_file("/home/user/readme.md").unwrap(), "hi");
    }

    #[test]
    fn test_write_through_symlinked_dir() {
        let fs = fs();
        fs.mkdir("/real", false).unwrap();
        fs.symlink("/real", "/ln").unwrap();
        fs.write_file("/ln/f", b"z").unwrap();
        assert_eq!(fs.read_file("/real/f").unwrap(), "z");
    }
}
