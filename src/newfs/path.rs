//! Path parsing and resolution: `calc_lvl`, `get_fname`, and the
//! component-by-component `lookup` walk.

use crate::dentry::DentryId;
use crate::driver::BlockDriver;
use crate::error::Result;
use crate::fs::Filesystem;

/// Counts the path's component depth. The root itself is level 0; each
/// `/`-separated component below it adds one level.
pub fn calc_lvl(path: &str) -> usize {
    if path == "/" {
        return 0;
    }
    path.chars().filter(|&c| c == '/').count()
}

/// Returns the final path component (the substring after the last `/`).
pub fn get_fname(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// The outcome of resolving a path to a dentry.
pub struct Lookup {
    pub dentry: DentryId,
    pub found: bool,
    pub is_root: bool,
}

impl<D: BlockDriver> Filesystem<D> {
    /// Resolves `path` component by component from the root, loading any
    /// inode along the way that hasn't been read yet.
    ///
    /// A component is matched against a child's `fname` by full string
    /// equality, not by a length- or prefix-based comparison.
    pub fn lookup(&mut self, path: &str) -> Result<Lookup> {
        let total_lvl = calc_lvl(path);
        let root = self.root();

        if total_lvl == 0 {
            self.ensure_inode_loaded(root)?;
            return Ok(Lookup {
                dentry: root,
                found: true,
                is_root: true,
            });
        }

        let mut cursor = root;
        let mut result: Option<(DentryId, bool)> = None;
        let mut lvl = 0usize;

        for fname in path.split('/').filter(|s| !s.is_empty()) {
            lvl += 1;
            let inode_id = self.ensure_inode_loaded(cursor)?;

            if self.inode(inode_id).is_regular() && lvl < total_lvl {
                result = Some((self.inode(inode_id).dentry, false));
                break;
            }

            if self.inode(inode_id).is_dir() {
                let mut child_cursor = self.inode(inode_id).children;
                let mut hit = None;
                while let Some(c) = child_cursor {
                    if self.dentry(c).fname == fname {
                        hit = Some(c);
                        break;
                    }
                    child_cursor = self.dentry(c).sibling;
                }

                match hit {
                    None => {
                        result = Some((self.inode(inode_id).dentry, false));
                        break;
                    }
                    Some(c) => {
                        cursor = c;
                        if lvl == total_lvl {
                            result = Some((c, true));
                            break;
                        }
                    }
                }
            }
        }

        let (dentry, found) = result.unwrap_or((cursor, false));
        self.ensure_inode_loaded(dentry)?;

        Ok(Lookup {
            dentry,
            found,
            is_root: false,
        })
    }

    fn ensure_inode_loaded(&mut self, dentry: DentryId) -> Result<crate::inode::InodeId> {
        if let Some(inode) = self.dentry(dentry).inode {
            return Ok(inode);
        }
        let ino = self.dentry(dentry).ino;
        let inode = self.read_inode(dentry, ino)?;
        self.dentry_mut(dentry).inode = Some(inode);
        Ok(inode)
    }
}
