//! End-to-end scenarios against `FileDriver` over a real temporary file
//! standing in for the block device.

use newfs::layout;
use newfs::{Dentry, Error, FileType, Filesystem, MountOptions};
use std::fs::OpenOptions;
use std::path::PathBuf;

struct TempImage {
    path: PathBuf,
}

impl TempImage {
    fn new(name: &str, len: u64) -> Self {
        let path = std::env::temp_dir().join(format!(
            "newfs-integration-{}-{}-{}",
            std::process::id(),
            name,
            len
        ));
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&path)
            .unwrap();
        file.set_len(len).unwrap();
        drop(file);
        Self { path }
    }

    fn mount(&self) -> Filesystem<newfs::FileDriver> {
        Filesystem::mount(MountOptions {
            device: self.path.clone(),
        })
        .unwrap()
    }
}

impl Drop for TempImage {
    fn drop(&mut self) {
        std::fs::remove_file(&self.path).ok();
    }
}

#[test]
fn fresh_mount_lays_out_the_root_as_specified() {
    let image = TempImage::new("fresh", 4 * 1024 * 1024);
    let fs = image.mount();

    let root = fs.root();
    let root_inode_id = fs.dentry(root).inode.unwrap();
    let root_inode = fs.inode(root_inode_id);
    assert_eq!(root_inode.ino, 0);
    assert_eq!(root_inode.ftype, FileType::Directory);
    assert_eq!(root_inode.dir_cnt, 0);
    assert_eq!(root_inode.bno, [0, 1, 2, 3]);

    assert!(fs.inode_bitmap().is_set(0));
    for b in 0..4 {
        assert!(fs.data_bitmap().is_set(b));
    }
}

#[test]
fn mounting_twice_does_not_reinitialize() {
    let image = TempImage::new("remount", 4 * 1024 * 1024);
    {
        let _fs = image.mount();
    }
    let fs = image.mount();
    // Root inode is still ino 0 with no stray siblings accumulated.
    let root = fs.root();
    let root_inode_id = fs.dentry(root).inode.unwrap();
    assert_eq!(fs.inode(root_inode_id).ino, 0);
    assert_eq!(fs.inode_bitmap().count_set(), 1);
}

#[test]
fn create_child_directory_survives_a_remount() {
    let image = TempImage::new("child-dir", 4 * 1024 * 1024);
    {
        let mut fs = image.mount();
        let root = fs.root();
        let root_inode = fs.dentry(root).inode.unwrap();

        let foo = fs.push_dentry(Dentry::new("foo".to_owned(), FileType::Directory));
        let foo_inode = fs.alloc_inode(foo).unwrap();
        fs.alloc_dentry(root_inode, foo).unwrap();
        fs.sync_inode(root_inode).unwrap();
        fs.sync_inode(foo_inode).unwrap();
    }

    let mut fs = image.mount();
    let lookup = fs.lookup("/foo").unwrap();
    assert!(lookup.found);
    assert!(!lookup.is_root);
    let inode_id = fs.dentry(lookup.dentry).inode.unwrap();
    assert_eq!(fs.inode(inode_id).ino, 1);
    assert_eq!(fs.inode(inode_id).ftype, FileType::Directory);
}

#[test]
fn lookup_miss_returns_the_dentry_where_the_walk_stopped() {
    let image = TempImage::new("lookup-miss", 4 * 1024 * 1024);
    {
        let mut fs = image.mount();
        let root = fs.root();
        let root_inode = fs.dentry(root).inode.unwrap();
        let foo = fs.push_dentry(Dentry::new("foo".to_owned(), FileType::Directory));
        let foo_inode = fs.alloc_inode(foo).unwrap();
        fs.alloc_dentry(root_inode, foo).unwrap();
        fs.sync_inode(root_inode).unwrap();
        fs.sync_inode(foo_inode).unwrap();
    }

    let mut fs = image.mount();
    let lookup = fs.lookup("/bar").unwrap();
    assert!(!lookup.found);
    assert!(!lookup.is_root);
    assert_eq!(lookup.dentry, fs.root());
}

#[test]
fn traversing_through_a_regular_file_fails_to_find() {
    let image = TempImage::new("non-dir-traverse", 4 * 1024 * 1024);
    {
        let mut fs = image.mount();
        let root = fs.root();
        let root_inode = fs.dentry(root).inode.unwrap();
        let f = fs.push_dentry(Dentry::new("f".to_owned(), FileType::Regular));
        let f_inode = fs.alloc_inode(f).unwrap();
        fs.alloc_dentry(root_inode, f).unwrap();
        fs.sync_inode(root_inode).unwrap();
        fs.sync_inode(f_inode).unwrap();
    }

    let mut fs = image.mount();
    let lookup = fs.lookup("/f/x").unwrap();
    assert!(!lookup.found);
    assert!(!lookup.is_root);
}

#[test]
fn exhausting_inodes_reports_nospace_at_exactly_512() {
    let image = TempImage::new("capacity", 4 * 1024 * 1024);
    let mut fs = image.mount();

    let mut created = 1; // root already holds inode 0
    loop {
        let d = fs.push_dentry(Dentry::new(format!("f{created}"), FileType::Directory));
        match fs.alloc_inode(d) {
            Ok(_) => created += 1,
            Err(Error::NoSpace) => break,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }
    assert_eq!(created, layout::MAX_INO);
}

#[test]
fn regular_file_data_survives_sync_and_remount() {
    let image = TempImage::new("data-roundtrip", 4 * 1024 * 1024);
    let pattern: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    {
        let mut fs = image.mount();
        let root = fs.root();
        let root_inode = fs.dentry(root).inode.unwrap();

        let f = fs.push_dentry(Dentry::new("data".to_owned(), FileType::Regular));
        let f_inode = fs.alloc_inode(f).unwrap();
        fs.alloc_dentry(root_inode, f).unwrap();

        let block_size = fs.inode(f_inode).data.as_ref().unwrap()[0].len();
        {
            let data = fs.inode_mut(f_inode).data.as_mut().unwrap();
            for (k, block) in data.iter_mut().enumerate() {
                let start = k * block_size;
                block.copy_from_slice(&pattern[start..start + block_size]);
            }
        }
        fs.sync_inode(root_inode).unwrap();
        fs.sync_inode(f_inode).unwrap();
    }

    let mut fs = image.mount();
    let lookup = fs.lookup("/data").unwrap();
    assert!(lookup.found);
    let inode_id = fs.dentry(lookup.dentry).inode.unwrap();
    let data = fs.inode(inode_id).data.as_ref().unwrap();
    let block_size = data[0].len();
    let mut reconstructed = Vec::new();
    for block in data {
        reconstructed.extend_from_slice(block);
    }
    assert_eq!(&reconstructed[..], &pattern[..block_size * 4]);
}

#[test]
fn umount_twice_is_a_no_op() {
    let image = TempImage::new("idempotent-umount", 4 * 1024 * 1024);
    let mut fs = image.mount();
    fs.umount().unwrap();
    fs.umount().unwrap();
}
