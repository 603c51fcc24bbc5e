//! In-Memory Virtual File System
//!
//! A pure in-memory, synchronous, value-semantic virtual file system. `Vfs`
//! derives `Clone` so that pipeline-stage and subshell forks (§5 of the
//! sandbox contract) can cheaply copy-and-discard: clone before the forked
//! stage runs, keep the clone's writes only if it was the final stage.

use std::collections::{HashMap, HashSet};
use std::time::SystemTime;

use super::types::*;

#[derive(Debug, Clone)]
pub struct Vfs {
    data: HashMap<String, FsEntry>,
}

impl Vfs {
    pub fn new() -> Self {
        let mut data = HashMap::new();
        data.insert(
            "/".to_string(),
            FsEntry::Directory {
                mode: 0o755,
                mtime: SystemTime::now(),
            },
        );
        Self { data }
    }

    pub fn with_files(files: &InitialFiles) -> Self {
        let mut fs = Self::new();
        for (path, init) in files {
            let normalized = normalize_path(path);
            ensure_parent_dirs(&mut fs.data, &normalized);
            let content = to_buffer(&init.content, BufferEncoding::Utf8);
            fs.data.insert(
                normalized,
                FsEntry::File {
                    content: StoredContent::Eager(content),
                    mode: init.mode.unwrap_or(0o644),
                    mtime: init.mtime.unwrap_or_else(SystemTime::now),
                },
            );
        }
        fs
    }

    pub fn mkdir_sync(&mut self, path: &str) {
        let normalized = normalize_path(path);
        let parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty()).collect();
        let mut current = String::new();
        for part in parts {
            current = format!("{}/{}", current, part);
            if !self.data.contains_key(&current) {
                self.data.insert(
                    current.clone(),
                    FsEntry::Directory {
                        mode: 0o755,
                        mtime: SystemTime::now(),
                    },
                );
            }
        }
    }

    pub fn write_file_sync(&mut self, path: &str, content: &[u8]) {
        let normalized = normalize_path(path);
        ensure_parent_dirs(&mut self.data, &normalized);
        self.data.insert(
            normalized,
            FsEntry::File {
                content: StoredContent::Eager(content.to_vec()),
                mode: 0o644,
                mtime: SystemTime::now(),
            },
        );
    }

    /// Insert a file entry whose content is a lazy adapter rather than eager bytes.
    pub fn write_lazy_file(&mut self, path: &str, content: std::sync::Arc<dyn LazyContent>, mode: Option<u32>) {
        let normalized = normalize_path(path);
        ensure_parent_dirs(&mut self.data, &normalized);
        self.data.insert(
            normalized,
            FsEntry::File {
                content: StoredContent::Lazy(content),
                mode: mode.unwrap_or(0o644),
                mtime: SystemTime::now(),
            },
        );
    }

    /// Resolve every lazy file's content in place. Returns the first resolution error, if any.
    pub fn materialize(&mut self) -> Result<(), FsError> {
        let lazy_paths: Vec<String> = self
            .data
            .iter()
            .filter_map(|(path, entry)| match entry {
                FsEntry::File { content, .. } if content.is_lazy() => Some(path.clone()),
                _ => None,
            })
            .collect();
        for path in lazy_paths {
            if let Some(FsEntry::File { content, mode, mtime }) = self.data.get(&path) {
                let resolved = content.resolve()?;
                let mode = *mode;
                let mtime = *mtime;
                self.data.insert(
                    path,
                    FsEntry::File {
                        content: StoredContent::Eager(resolved),
                        mode,
                        mtime,
                    },
                );
            }
        }
        Ok(())
    }

    pub fn read_file(&self, path: &str) -> Result<String, FsError> {
        let buf = self.read_file_buffer(path)?;
        Ok(String::from_utf8_lossy(&buf).to_string())
    }

    pub fn read_file_buffer(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let resolved = resolve_path_with_symlinks(&self.data, path, "open")?;
        match self.data.get(&resolved) {
            Some(FsEntry::File { content, .. }) => content.resolve(),
            Some(FsEntry::Directory { .. }) => Err(FsError::IsDirectory {
                path: path.to_string(),
                operation: "read".to_string(),
            }),
            _ => Err(FsError::NotFound {
                path: path.to_string(),
                operation: "open".to_string(),
            }),
        }
    }

    pub fn write_file(&mut self, path: &str, content: &[u8]) -> Result<(), FsError> {
        let normalized = normalize_path(path);
        if let Some(FsEntry::Directory { .. }) = self.data.get(&normalized) {
            return Err(FsError::IsDirectory {
                path: path.to_string(),
                operation: "write".to_string(),
            });
        }
        ensure_parent_dirs(&mut self.data, &normalized);
        self.data.insert(
            normalized,
            FsEntry::File {
                content: StoredContent::Eager(content.to_vec()),
                mode: 0o644,
                mtime: SystemTime::now(),
            },
        );
        Ok(())
    }

    pub fn append_file(&mut self, path: &str, content: &[u8]) -> Result<(), FsError> {
        let normalized = normalize_path(path);

        if let Some(FsEntry::Directory { .. }) = self.data.get(&normalized) {
            return Err(FsError::IsDirectory {
                path: path.to_string(),
                operation: "write".to_string(),
            });
        }

        if let Some(FsEntry::File { content: existing, mode, .. }) = self.data.get(&normalized) {
            let mut combined = existing.resolve()?;
            let mode = *mode;
            combined.extend_from_slice(content);
            self.data.insert(
                normalized,
                FsEntry::File {
                    content: StoredContent::Eager(combined),
                    mode,
                    mtime: SystemTime::now(),
                },
            );
        } else {
            ensure_parent_dirs(&mut self.data, &normalized);
            self.data.insert(
                normalized,
                FsEntry::File {
                    content: StoredContent::Eager(content.to_vec()),
                    mode: 0o644,
                    mtime: SystemTime::now(),
                },
            );
        }
        Ok(())
    }

    pub fn exists(&self, path: &str) -> bool {
        match resolve_path_with_symlinks(&self.data, path, "access") {
            Ok(resolved) => self.data.contains_key(&resolved),
            Err(_) => false,
        }
    }

    pub fn stat(&self, path: &str) -> Result<FsStat, FsError> {
        let resolved = resolve_path_with_symlinks(&self.data, path, "stat")?;
        match self.data.get(&resolved) {
            Some(entry) => {
                let size = if let FsEntry::File { content, .. } = entry {
                    content.size_hint().unwrap_or(0) as u64
                } else {
                    0
                };
                Ok(FsStat {
                    is_file: entry.is_file(),
                    is_directory: entry.is_directory(),
                    is_symlink: false,
                    mode: entry.mode(),
                    size,
                    mtime: entry.mtime(),
                })
            }
            None => Err(FsError::NotFound {
                path: path.to_string(),
                operation: "stat".to_string(),
            }),
        }
    }

    pub fn lstat(&self, path: &str) -> Result<FsStat, FsError> {
        let resolved = resolve_intermediate_symlinks(&self.data, path, "lstat")?;
        match self.data.get(&resolved) {
            Some(FsEntry::Symlink { target, mode, mtime }) => Ok(FsStat {
                is_file: false,
                is_directory: false,
                is_symlink: true,
                mode: *mode,
                size: target.len() as u64,
                mtime: *mtime,
            }),
            Some(entry) => {
                let size = if let FsEntry::File { content, .. } = entry {
                    content.size_hint().unwrap_or(0) as u64
                } else {
                    0
                };
                Ok(FsStat {
                    is_file: entry.is_file(),
                    is_directory: entry.is_directory(),
                    is_symlink: false,
                    mode: entry.mode(),
                    size,
                    mtime: entry.mtime(),
                })
            }
            None => Err(FsError::NotFound {
                path: path.to_string(),
                operation: "lstat".to_string(),
            }),
        }
    }

    pub fn mkdir(&mut self, path: &str, options: &MkdirOptions) -> Result<(), FsError> {
        let normalized = normalize_path(path);

        if self.data.contains_key(&normalized) {
            if let Some(FsEntry::File { .. }) = self.data.get(&normalized) {
                return Err(FsError::AlreadyExists {
                    path: path.to_string(),
                    operation: "mkdir".to_string(),
                });
            }
            if !options.recursive {
                return Err(FsError::AlreadyExists {
                    path: path.to_string(),
                    operation: "mkdir".to_string(),
                });
            }
            return Ok(());
        }

        let parent = dirname(&normalized);
        if parent != "/" && !self.data.contains_key(&parent) {
            if options.recursive {
                let parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty()).collect();
                let mut current = String::new();
                for part in parts {
                    current = format!("{}/{}", current, part);
                    if !self.data.contains_key(&current) {
                        self.data.insert(
                            current.clone(),
                            FsEntry::Directory {
                                mode: 0o755,
                                mtime: SystemTime::now(),
                            },
                        );
                    }
                }
                return Ok(());
            } else {
                return Err(FsError::NotFound {
                    path: path.to_string(),
                    operation: "mkdir".to_string(),
                });
            }
        }

        self.data.insert(
            normalized,
            FsEntry::Directory {
                mode: 0o755,
                mtime: SystemTime::now(),
            },
        );
        Ok(())
    }

    pub fn readdir(&self, path: &str) -> Result<Vec<String>, FsError> {
        let entries = self.readdir_with_file_types(path)?;
        Ok(entries.into_iter().map(|e| e.name).collect())
    }

    pub fn readdir_with_file_types(&self, path: &str) -> Result<Vec<DirentEntry>, FsError> {
        let mut normalized = normalize_path(path);

        let mut seen = HashSet::new();
        loop {
            match self.data.get(&normalized) {
                Some(FsEntry::Symlink { target, .. }) => {
                    if seen.contains(&normalized) {
                        return Err(FsError::SymlinkLoop {
                            path: path.to_string(),
                            operation: "scandir".to_string(),
                        });
                    }
                    seen.insert(normalized.clone());
                    normalized = resolve_symlink_target(&normalized, target);
                }
                Some(FsEntry::Directory { .. }) => break,
                Some(_) => {
                    return Err(FsError::NotDirectory {
                        path: path.to_string(),
                        operation: "scandir".to_string(),
                    })
                }
                None => {
                    return Err(FsError::NotFound {
                        path: path.to_string(),
                        operation: "scandir".to_string(),
                    })
                }
            }
        }

        let prefix = if normalized == "/" {
            "/".to_string()
        } else {
            format!("{}/", normalized)
        };

        let mut entries_map: HashMap<String, DirentEntry> = HashMap::new();
        for (p, fs_entry) in self.data.iter() {
            if p == &normalized {
                continue;
            }
            if let Some(rest) = p.strip_prefix(&prefix) {
                let name = rest.split('/').next().unwrap_or("");
                if !name.is_empty() && !rest[name.len()..].contains('/') && !entries_map.contains_key(name) {
                    entries_map.insert(
                        name.to_string(),
                        DirentEntry {
                            name: name.to_string(),
                            is_file: fs_entry.is_file(),
                            is_directory: fs_entry.is_directory(),
                            is_symlink: fs_entry.is_symlink(),
                        },
                    );
                }
            }
        }

        let mut entries: Vec<DirentEntry> = entries_map.into_values().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    pub fn rm(&mut self, path: &str, options: &RmOptions) -> Result<(), FsError> {
        let normalized = normalize_path(path);

        if !self.data.contains_key(&normalized) {
            if options.force {
                return Ok(());
            }
            return Err(FsError::NotFound {
                path: path.to_string(),
                operation: "rm".to_string(),
            });
        }

        if let Some(FsEntry::Directory { .. }) = self.data.get(&normalized) {
            let prefix = if normalized == "/" {
                "/".to_string()
            } else {
                format!("{}/", normalized)
            };
            let children: Vec<String> = self.data.keys().filter(|k| k.starts_with(&prefix)).cloned().collect();

            if !children.is_empty() && !options.recursive {
                return Err(FsError::NotEmpty {
                    path: path.to_string(),
                    operation: "rm".to_string(),
                });
            }
            for child in children {
                self.data.remove(&child);
            }
        }

        self.data.remove(&normalized);
        Ok(())
    }

    pub fn cp(&mut self, src: &str, dest: &str, options: &CpOptions) -> Result<(), FsError> {
        let src_norm = normalize_path(src);
        let dest_norm = normalize_path(dest);

        let src_entry = self.data.get(&src_norm).cloned();
        match src_entry {
            None => Err(FsError::NotFound {
                path: src.to_string(),
                operation: "cp".to_string(),
            }),
            Some(FsEntry::File { content, mode, mtime }) => {
                ensure_parent_dirs(&mut self.data, &dest_norm);
                self.data.insert(dest_norm, FsEntry::File { content, mode, mtime });
                Ok(())
            }
            Some(FsEntry::Directory { .. }) => {
                if !options.recursive {
                    return Err(FsError::IsDirectory {
                        path: src.to_string(),
                        operation: "cp".to_string(),
                    });
                }
                let prefix = if src_norm == "/" {
                    "/".to_string()
                } else {
                    format!("{}/", src_norm)
                };
                let entries: Vec<(String, FsEntry)> = self
                    .data
                    .iter()
                    .filter(|(k, _)| k.starts_with(&prefix) || *k == &src_norm)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();

                for (k, v) in entries {
                    let relative = if k == src_norm { String::new() } else { k[src_norm.len()..].to_string() };
                    let new_path = format!("{}{}", dest_norm, relative);
                    ensure_parent_dirs(&mut self.data, &new_path);
                    self.data.insert(new_path, v);
                }
                Ok(())
            }
            Some(FsEntry::Symlink { target, mode, mtime }) => {
                ensure_parent_dirs(&mut self.data, &dest_norm);
                self.data.insert(dest_norm, FsEntry::Symlink { target, mode, mtime });
                Ok(())
            }
        }
    }

    pub fn mv(&mut self, src: &str, dest: &str) -> Result<(), FsError> {
        let src_norm = normalize_path(src);
        let dest_norm = normalize_path(dest);
        self.cp(src, dest, &CpOptions { recursive: true })?;
        if src_norm != dest_norm {
            self.rm(src, &RmOptions { recursive: true, force: false })?;
        }
        Ok(())
    }

    pub fn chmod(&mut self, path: &str, mode: u32) -> Result<(), FsError> {
        let normalized = normalize_path(path);
        match self.data.get_mut(&normalized) {
            Some(FsEntry::File { mode: m, .. }) => {
                *m = mode;
                Ok(())
            }
            Some(FsEntry::Directory { mode: m, .. }) => {
                *m = mode;
                Ok(())
            }
            Some(FsEntry::Symlink { mode: m, .. }) => {
                *m = mode;
                Ok(())
            }
            None => Err(FsError::NotFound {
                path: path.to_string(),
                operation: "chmod".to_string(),
            }),
        }
    }

    pub fn symlink(&mut self, target: &str, link_path: &str) -> Result<(), FsError> {
        let normalized = normalize_path(link_path);
        if self.data.contains_key(&normalized) {
            return Err(FsError::AlreadyExists {
                path: link_path.to_string(),
                operation: "symlink".to_string(),
            });
        }
        ensure_parent_dirs(&mut self.data, &normalized);
        self.data.insert(
            normalized,
            FsEntry::Symlink {
                target: target.to_string(),
                mode: 0o777,
                mtime: SystemTime::now(),
            },
        );
        Ok(())
    }

    pub fn link(&mut self, existing_path: &str, new_path: &str) -> Result<(), FsError> {
        let existing_norm = normalize_path(existing_path);
        let new_norm = normalize_path(new_path);

        let entry = self.data.get(&existing_norm).cloned();
        match entry {
            None => Err(FsError::NotFound {
                path: existing_path.to_string(),
                operation: "link".to_string(),
            }),
            Some(FsEntry::File { content, mode, mtime }) => {
                if self.data.contains_key(&new_norm) {
                    return Err(FsError::AlreadyExists {
                        path: new_path.to_string(),
                        operation: "link".to_string(),
                    });
                }
                ensure_parent_dirs(&mut self.data, &new_norm);
                self.data.insert(new_norm, FsEntry::File { content, mode, mtime });
                Ok(())
            }
            _ => Err(FsError::PermissionDenied {
                path: existing_path.to_string(),
                operation: "link".to_string(),
            }),
        }
    }

    pub fn readlink(&self, path: &str) -> Result<String, FsError> {
        let normalized = normalize_path(path);
        match self.data.get(&normalized) {
            Some(FsEntry::Symlink { target, .. }) => Ok(target.clone()),
            Some(_) => Err(FsError::InvalidArgument {
                path: path.to_string(),
                operation: "readlink".to_string(),
            }),
            None => Err(FsError::NotFound {
                path: path.to_string(),
                operation: "readlink".to_string(),
            }),
        }
    }

    pub fn realpath(&self, path: &str) -> Result<String, FsError> {
        let resolved = resolve_path_with_symlinks(&self.data, path, "realpath")?;
        if !self.data.contains_key(&resolved) {
            return Err(FsError::NotFound {
                path: path.to_string(),
                operation: "realpath".to_string(),
            });
        }
        Ok(resolved)
    }

    pub fn utimes(&mut self, path: &str, mtime: SystemTime) -> Result<(), FsError> {
        let resolved = resolve_path_with_symlinks(&self.data, path, "utimes")?;
        match self.data.get_mut(&resolved) {
            Some(FsEntry::File { mtime: m, .. }) => {
                *m = mtime;
                Ok(())
            }
            Some(FsEntry::Directory { mtime: m, .. }) => {
                *m = mtime;
                Ok(())
            }
            Some(FsEntry::Symlink { mtime: m, .. }) => {
                *m = mtime;
                Ok(())
            }
            None => Err(FsError::NotFound {
                path: path.to_string(),
                operation: "utimes".to_string(),
            }),
        }
    }

    pub fn resolve_path(&self, base: &str, path: &str) -> String {
        if path.starts_with('/') {
            normalize_path(path)
        } else if base == "/" {
            normalize_path(&format!("/{}", path))
        } else {
            normalize_path(&format!("{}/{}", base, path))
        }
    }

    pub fn get_all_paths(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Path utilities
// ============================================================================

pub fn normalize_path(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }
    let mut normalized = path.to_string();
    if normalized.ends_with('/') && normalized.len() > 1 {
        normalized.pop();
    }
    if !normalized.starts_with('/') {
        normalized = format!("/{}", normalized);
    }
    let parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty() && *p != ".").collect();
    let mut resolved: Vec<&str> = Vec::new();
    for part in parts {
        if part == ".." {
            resolved.pop();
        } else {
            resolved.push(part);
        }
    }
    if resolved.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", resolved.join("/"))
    }
}

fn dirname(path: &str) -> String {
    let normalized = normalize_path(path);
    if normalized == "/" {
        return "/".to_string();
    }
    match normalized.rfind('/') {
        Some(0) => "/".to_string(),
        Some(pos) => normalized[..pos].to_string(),
        None => "/".to_string(),
    }
}

fn ensure_parent_dirs(data: &mut HashMap<String, FsEntry>, path: &str) {
    let dir = dirname(path);
    if dir == "/" {
        return;
    }
    if !data.contains_key(&dir) {
        ensure_parent_dirs(data, &dir);
        data.insert(
            dir,
            FsEntry::Directory {
                mode: 0o755,
                mtime: SystemTime::now(),
            },
        );
    }
}

fn resolve_symlink_target(symlink_path: &str, target: &str) -> String {
    if target.starts_with('/') {
        normalize_path(target)
    } else {
        let dir = dirname(symlink_path);
        if dir == "/" {
            normalize_path(&format!("/{}", target))
        } else {
            normalize_path(&format!("{}/{}", dir, target))
        }
    }
}

fn resolve_path_with_symlinks(data: &HashMap<String, FsEntry>, path: &str, operation: &str) -> Result<String, FsError> {
    let normalized = normalize_path(path);
    if normalized == "/" {
        return Ok("/".to_string());
    }
    let parts: Vec<&str> = normalized[1..].split('/').collect();
    let mut resolved = String::new();
    let mut seen = HashSet::new();

    for part in parts {
        resolved = format!("{}/{}", resolved, part);
        let mut entry = data.get(&resolved);
        let mut loop_count = 0;
        const MAX_LOOPS: usize = 40;

        while let Some(FsEntry::Symlink { target, .. }) = entry {
            if loop_count >= MAX_LOOPS || seen.contains(&resolved) {
                return Err(FsError::SymlinkLoop {
                    path: path.to_string(),
                    operation: operation.to_string(),
                });
            }
            seen.insert(resolved.clone());
            resolved = resolve_symlink_target(&resolved, target);
            entry = data.get(&resolved);
            loop_count += 1;
        }
    }
    Ok(resolved)
}

fn resolve_intermediate_symlinks(data: &HashMap<String, FsEntry>, path: &str, operation: &str) -> Result<String, FsError> {
    let normalized = normalize_path(path);
    if normalized == "/" {
        return Ok("/".to_string());
    }
    let parts: Vec<&str> = normalized[1..].split('/').collect();
    if parts.len() <= 1 {
        return Ok(normalized);
    }

    let mut resolved = String::new();
    let mut seen = HashSet::new();

    for part in &parts[..parts.len() - 1] {
        resolved = format!("{}/{}", resolved, part);
        let mut entry = data.get(&resolved);
        let mut loop_count = 0;
        const MAX_LOOPS: usize = 40;

        while let Some(FsEntry::Symlink { target, .. }) = entry {
            if loop_count >= MAX_LOOPS || seen.contains(&resolved) {
                return Err(FsError::SymlinkLoop {
                    path: path.to_string(),
                    operation: operation.to_string(),
                });
            }
            seen.insert(resolved.clone());
            resolved = resolve_symlink_target(&resolved, target);
            entry = data.get(&resolved);
            loop_count += 1;
        }
    }

    Ok(format!("{}/{}", resolved, parts[parts.len() - 1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/foo/bar"), "/foo/bar");
        assert_eq!(normalize_path("/foo/bar/"), "/foo/bar");
        assert_eq!(normalize_path("foo/bar"), "/foo/bar");
        assert_eq!(normalize_path("/foo/./bar"), "/foo/bar");
        assert_eq!(normalize_path("/foo/../bar"), "/bar");
        assert_eq!(normalize_path("/foo/bar/.."), "/foo");
        assert_eq!(normalize_path("/../.."), "/");
    }

    #[test]
    fn test_dirname_fn() {
        assert_eq!(dirname("/"), "/");
        assert_eq!(dirname("/foo"), "/");
        assert_eq!(dirname("/foo/bar"), "/foo");
        assert_eq!(dirname("/foo/bar/baz"), "/foo/bar");
    }

    #[test]
    fn test_basic_file_ops() {
        let mut fs = Vfs::new();
        fs.write_file("/test.txt", b"hello").unwrap();
        assert!(fs.exists("/test.txt"));
        let content = fs.read_file("/test.txt").unwrap();
        assert_eq!(content, "hello");
    }

    #[test]
    fn test_mkdir_and_readdir() {
        let mut fs = Vfs::new();
        fs.mkdir("/foo", &MkdirOptions { recursive: false }).unwrap();
        fs.write_file("/foo/a.txt", b"a").unwrap();
        fs.write_file("/foo/b.txt", b"b").unwrap();
        let entries = fs.readdir("/foo").unwrap();
        assert_eq!(entries, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_mkdir_recursive() {
        let mut fs = Vfs::new();
        fs.mkdir("/a/b/c", &MkdirOptions { recursive: true }).unwrap();
        assert!(fs.exists("/a"));
        assert!(fs.exists("/a/b"));
        assert!(fs.exists("/a/b/c"));
    }

    #[test]
    fn test_rm_recursive() {
        let mut fs = Vfs::new();
        fs.mkdir("/dir", &MkdirOptions { recursive: false }).unwrap();
        fs.write_file("/dir/file.txt", b"data").unwrap();
        fs.rm("/dir", &RmOptions { recursive: true, force: false }).unwrap();
        assert!(!fs.exists("/dir"));
        assert!(!fs.exists("/dir/file.txt"));
    }

    #[test]
    fn test_symlink_and_readlink() {
        let mut fs = Vfs::new();
        fs.write_file("/target.txt", b"content").unwrap();
        fs.symlink("/target.txt", "/link.txt").unwrap();
        let target = fs.readlink("/link.txt").unwrap();
        assert_eq!(target, "/target.txt");
        let content = fs.read_file("/link.txt").unwrap();
        assert_eq!(content, "content");
    }

    #[test]
    fn test_stat_and_lstat() {
        let mut fs = Vfs::new();
        fs.write_file("/file.txt", b"hello").unwrap();
        fs.symlink("/file.txt", "/link.txt").unwrap();

        let stat = fs.stat("/link.txt").unwrap();
        assert!(stat.is_file);
        assert!(!stat.is_symlink);

        let lstat = fs.lstat("/link.txt").unwrap();
        assert!(lstat.is_symlink);
        assert!(!lstat.is_file);
    }

    #[test]
    fn test_append_file() {
        let mut fs = Vfs::new();
        fs.write_file("/f.txt", b"hello").unwrap();
        fs.append_file("/f.txt", b" world").unwrap();
        let content = fs.read_file("/f.txt").unwrap();
        assert_eq!(content, "hello world");
    }

    #[test]
    fn test_cp_and_mv() {
        let mut fs = Vfs::new();
        fs.write_file("/src.txt", b"data").unwrap();
        fs.cp("/src.txt", "/dst.txt", &CpOptions { recursive: false }).unwrap();
        assert!(fs.exists("/dst.txt"));
        assert!(fs.exists("/src.txt"));

        fs.mv("/dst.txt", "/moved.txt").unwrap();
        assert!(fs.exists("/moved.txt"));
        assert!(!fs.exists("/dst.txt"));
    }

    #[test]
    fn test_mv_same_path_is_noop_not_delete() {
        let mut fs = Vfs::new();
        fs.write_file("/a.txt", b"data").unwrap();
        fs.mv("/a.txt", "/a.txt").unwrap();
        assert!(fs.exists("/a.txt"));
        assert_eq!(fs.read_file("/a.txt").unwrap(), "data");
    }

    #[test]
    fn test_realpath() {
        let mut fs = Vfs::new();
        fs.mkdir("/a", &MkdirOptions { recursive: false }).unwrap();
        fs.write_file("/a/file.txt", b"x").unwrap();
        fs.symlink("/a", "/link").unwrap();
        let real = fs.realpath("/link/file.txt").unwrap();
        assert_eq!(real, "/a/file.txt");
    }

    #[test]
    fn test_rm_directory_not_empty() {
        let mut fs = Vfs::new();
        fs.mkdir("/dir", &MkdirOptions { recursive: false }).unwrap();
        fs.write_file("/dir/file.txt", b"data").unwrap();
        let result = fs.rm("/dir", &RmOptions { recursive: false, force: false });
        assert!(matches!(result, Err(FsError::NotEmpty { .. })));
    }

    #[test]
    fn test_cp_directory_recursive() {
        let mut fs = Vfs::new();
        fs.mkdir("/src/sub", &MkdirOptions { recursive: true }).unwrap();
        fs.write_file("/src/file.txt", b"data").unwrap();
        fs.write_file("/src/sub/nested.txt", b"nested").unwrap();

        fs.cp("/src", "/dst", &CpOptions { recursive: true }).unwrap();

        assert!(fs.exists("/dst"));
        assert!(fs.exists("/dst/file.txt"));
        assert!(fs.exists("/dst/sub/nested.txt"));
    }

    #[test]
    fn test_materialize_lazy_content() {
        #[derive(Debug)]
        struct Counter;
        impl LazyContent for Counter {
            fn resolve(&self) -> Result<Vec<u8>, FsError> {
                Ok(b"lazy".to_vec())
            }
        }
        let mut fs = Vfs::new();
        fs.write_lazy_file("/lazy.txt", std::sync::Arc::new(Counter), None);
        assert!(fs.read_file("/lazy.txt").unwrap() == "lazy");
        fs.materialize().unwrap();
        let stat = fs.stat("/lazy.txt").unwrap();
        assert_eq!(stat.size, 4);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut fs = Vfs::new();
        fs.write_file("/a.txt", b"1").unwrap();
        let mut fork = fs.clone();
        fork.write_file("/a.txt", b"2").unwrap();
        assert_eq!(fs.read_file("/a.txt").unwrap(), "1");
        assert_eq!(fork.read_file("/a.txt").unwrap(), "2");
    }
}
