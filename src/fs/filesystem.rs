//! 已挂载文件系统的核心结构

use crate::{
    balloc::ExtentAllocator,
    block::{BlockDev, BlockDevice},
    consts::*,
    dir::{
        build_directory_entry, load_directory, load_root_directory, resolve_path, store_directory,
        validate_name, DirectoryEntry, DirectoryTable, ResolvedPath,
    },
    error::{Error, ErrorKind, Result},
    superblock::VolumeHeader,
    types::Extent,
};
use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::marker::PhantomData;
use log::*;

use super::types::{FsConfig, SystemHal};

/// 已挂载的文件系统
///
/// 根目录和当前工作目录两张目录表在挂载时加载，卸载时释放，
/// 期间作为引用传给路径解析器。
///
/// # 示例
///
/// ```rust,ignore
/// use basicfs_core::{BitmapAllocator, BlockDev, FileSystem, FsConfig};
///
/// let bdev = BlockDev::new(MyBlockDevice::new())?;
/// let allocator = BitmapAllocator::new(bdev.total_blocks());
/// let mut fs = FileSystem::<_, _, MyHal>::format(bdev, allocator, FsConfig::default())?;
///
/// fs.make_dir("/home")?;
/// fs.set_cwd("/home")?;
/// fs.make_dir("user")?;
///
/// for entry in fs.read_dir("/home")? {
///     println!("{}", entry.name);
/// }
///
/// let (bdev, allocator) = fs.unmount()?;
/// ```
pub struct FileSystem<D: BlockDevice, A: ExtentAllocator, H: SystemHal> {
    bdev: BlockDev<D>,
    allocator: A,
    header: VolumeHeader,
    config: FsConfig,
    root: DirectoryTable,
    cwd: DirectoryTable,
    cwd_path: String,
    _hal: PhantomData<H>,
}

impl<D: BlockDevice, A: ExtentAllocator, H: SystemHal> FileSystem<D, A, H> {
    /// 格式化卷并挂载
    ///
    /// 打开设备，创建根目录，把它的位置写进卷头。
    /// `allocator` 应当是新建的，格式化后它记录着根目录占用的块。
    ///
    /// # 错误
    ///
    /// - `ErrorKind::InvalidInput` - 配置的槽位数为 0，或块大小不合适
    /// - `ErrorKind::NoSpace` - 无法为根目录分配连续块
    /// - `ErrorKind::Io` - 写入失败
    pub fn format(mut bdev: BlockDev<D>, mut allocator: A, config: FsConfig) -> Result<Self> {
        bdev.open()?;

        let root = build_directory_entry::<H, D, A>(
            &mut bdev,
            &mut allocator,
            config.root_entry_count,
            None,
        )?;
        let root_extent = root.extent.ok_or(Error::new(
            ErrorKind::Corrupted,
            "Root directory has no extent",
        ))?;

        let header = VolumeHeader::new(bdev.block_size(), bdev.total_blocks(), root_extent);
        header.store(&mut bdev)?;
        bdev.flush()?;

        info!(
            "[FS] formatted volume: {} blocks of {} bytes, root at block {}",
            header.total_blocks, header.block_size, root_extent.start
        );

        let root = load_root_directory(&mut bdev, &header)?;
        Ok(Self::assemble(bdev, allocator, header, root, config))
    }

    /// 挂载文件系统（默认配置）
    pub fn mount(bdev: BlockDev<D>, allocator: A) -> Result<Self> {
        Self::mount_with_config(bdev, allocator, FsConfig::default())
    }

    /// 挂载文件系统
    ///
    /// 打开设备，读取卷头，按其中记录的位置加载根目录；当前工作目录初始为根目录。
    ///
    /// 挂载时会遍历整棵目录树，把每个条目的 extent 通过
    /// [`ExtentAllocator::reserve_blocks`] 告知分配器。因此 `allocator`
    /// 必须是新建的，除卷头外没有任何已分配的块。
    ///
    /// # 错误
    ///
    /// - `ErrorKind::Corrupted` - 卷头或目录树无效，或两个条目的 extent 重叠
    ///   （包括传入的分配器已经记录了这些块）
    /// - `ErrorKind::Io` - 设备读取失败
    pub fn mount_with_config(
        mut bdev: BlockDev<D>,
        mut allocator: A,
        config: FsConfig,
    ) -> Result<Self> {
        bdev.open()?;

        let header = VolumeHeader::load(&mut bdev)?;
        let root = load_root_directory(&mut bdev, &header)?;
        let reserved = reserve_tree(&mut bdev, &mut allocator, &root)?;

        debug!(
            "[FS] mounted, root has {} entries, {} extents in use",
            root.len(),
            reserved
        );

        Ok(Self::assemble(bdev, allocator, header, root, config))
    }

    fn assemble(
        bdev: BlockDev<D>,
        allocator: A,
        header: VolumeHeader,
        root: DirectoryTable,
        config: FsConfig,
    ) -> Self {
        let cwd = root.clone();
        Self {
            bdev,
            allocator,
            header,
            config,
            root,
            cwd,
            cwd_path: PATH_SEPARATOR.to_string(),
            _hal: PhantomData,
        }
    }

    /// 卸载文件系统
    ///
    /// 刷新并关闭设备，释放根目录和当前工作目录，归还块设备和分配器。
    pub fn unmount(mut self) -> Result<(BlockDev<D>, A)> {
        self.bdev.close()?;
        debug!("[FS] unmounted");
        Ok((self.bdev, self.allocator))
    }

    /// 获取卷头
    pub fn header(&self) -> &VolumeHeader {
        &self.header
    }

    /// 获取配置
    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    /// 根目录表
    pub fn root(&self) -> &DirectoryTable {
        &self.root
    }

    /// 当前工作目录表
    pub fn cwd(&self) -> &DirectoryTable {
        &self.cwd
    }

    /// 当前工作目录的绝对路径
    pub fn cwd_path(&self) -> &str {
        &self.cwd_path
    }

    /// 获取块设备引用
    pub fn block_device(&self) -> &BlockDev<D> {
        &self.bdev
    }

    /// 获取分配器引用
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// 解析路径
    ///
    /// 参见 [`crate::dir::PathResolver::resolve`]。
    pub fn resolve(&mut self, path: &str) -> Result<ResolvedPath<'_>> {
        resolve_path(&mut self.bdev, path, &self.root, &self.cwd)
    }

    /// 路径是否指向目录，解析失败视为否
    pub fn is_dir(&mut self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(r) => r.is_root_itself() || r.entry().map_or(false, DirectoryEntry::is_dir),
            Err(_) => false,
        }
    }

    /// 路径是否指向普通文件，解析失败视为否
    pub fn is_file(&mut self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(r) => r.entry().map_or(false, DirectoryEntry::is_file),
            Err(_) => false,
        }
    }

    /// 列出目录中所有已使用的条目（包括 `.` 和 `..`）
    ///
    /// # 错误
    ///
    /// - `ErrorKind::NotFound` - 目录不存在
    /// - `ErrorKind::NotADirectory` - 路径指向文件
    pub fn read_dir(&mut self, path: &str) -> Result<Vec<DirectoryEntry>> {
        let resolved = resolve_path(&mut self.bdev, path, &self.root, &self.cwd)?;
        if resolved.is_root_itself() {
            return Ok(resolved.parent.iter_used().map(|(_, e)| e.clone()).collect());
        }

        let entry = resolved.entry().ok_or(Error::new(
            ErrorKind::NotFound,
            "Directory not found",
        ))?;
        let table = load_directory(&mut self.bdev, entry)?;
        Ok(table.iter_used().map(|(_, e)| e.clone()).collect())
    }

    /// 创建目录
    ///
    /// 父目录必须存在，最后一个组件必须不存在。
    ///
    /// # 错误
    ///
    /// - `ErrorKind::AlreadyExists` - 目标已存在（包括 `/`）
    /// - `ErrorKind::InvalidInput` - 名称不合法
    /// - `ErrorKind::NoSpace` - 父目录已满或无法分配连续块
    /// - `ErrorKind::NotFound` / `ErrorKind::NotADirectory` - 父路径无效
    /// - `ErrorKind::Io` - 写入失败
    pub fn make_dir(&mut self, path: &str) -> Result<()> {
        let (mut parent, name) = {
            let ResolvedPath {
                parent,
                index,
                last_element,
            } = resolve_path(&mut self.bdev, path, &self.root, &self.cwd)?;

            let name = last_element.ok_or(Error::new(
                ErrorKind::AlreadyExists,
                "Root directory already exists",
            ))?;
            if index.is_some() {
                return Err(Error::new(ErrorKind::AlreadyExists, "Entry already exists"));
            }
            validate_name(&name)?;

            (parent.into_owned(), name)
        };

        // 先确认父目录有空槽，避免白白分配
        if parent.find_free_slot().is_none() {
            return Err(Error::new(ErrorKind::NoSpace, "Directory table is full"));
        }

        let parent_me = parent.self_entry().cloned().ok_or(Error::new(
            ErrorKind::Corrupted,
            "Parent directory has no self entry",
        ))?;

        let me = build_directory_entry::<H, D, A>(
            &mut self.bdev,
            &mut self.allocator,
            self.config.dir_entry_count,
            Some(&parent_me),
        )?;
        let extent = me.extent.ok_or(Error::new(
            ErrorKind::Corrupted,
            "New directory has no extent",
        ))?;

        let linked = match parent.insert_entry(me.renamed(&name)) {
            Ok(_) => self.persist(parent),
            Err(e) => Err(e),
        };

        if let Err(e) = linked {
            warn!("[FS] mkdir '{}' failed to link into parent: {}", path, e);
            self.allocator.release_blocks(extent)?;
            return Err(e);
        }

        debug!("[FS] mkdir '{}' at block {}", path, extent.start);
        Ok(())
    }

    /// 删除空目录
    ///
    /// # 错误
    ///
    /// - `ErrorKind::InvalidInput` - 目标是 `/`、`.` 或 `..`
    /// - `ErrorKind::NotFound` - 目标不存在
    /// - `ErrorKind::NotADirectory` - 目标不是目录
    /// - `ErrorKind::Busy` - 目标是当前工作目录
    /// - `ErrorKind::NotEmpty` - 目录非空
    pub fn remove_dir(&mut self, path: &str) -> Result<()> {
        let (mut parent, index, extent) = {
            let ResolvedPath {
                parent,
                index,
                last_element,
            } = resolve_path(&mut self.bdev, path, &self.root, &self.cwd)?;

            let name = last_element.ok_or(Error::new(
                ErrorKind::InvalidInput,
                "Cannot remove the root directory",
            ))?;
            if name == DOT || name == DOTDOT {
                return Err(Error::new(ErrorKind::InvalidInput, "Cannot remove . or .."));
            }

            let index = index.ok_or(Error::new(ErrorKind::NotFound, "Directory not found"))?;
            let entry = parent.entry(index).ok_or(Error::new(
                ErrorKind::NotFound,
                "Directory not found",
            ))?;
            if !entry.is_dir() {
                return Err(Error::new(ErrorKind::NotADirectory, "Not a directory"));
            }

            let extent = entry.extent.ok_or(Error::new(
                ErrorKind::Corrupted,
                "Directory entry has no extent",
            ))?;
            if Some(extent) == self.root.extent() {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    "Cannot remove the root directory",
                ));
            }
            if Some(extent) == self.cwd.extent() {
                return Err(Error::new(ErrorKind::Busy, "Directory is the working directory"));
            }

            let child = load_directory(&mut self.bdev, entry)?;
            if !child.has_only_links() {
                return Err(Error::new(ErrorKind::NotEmpty, "Directory not empty"));
            }

            (parent.into_owned(), index, extent)
        };

        parent.delete_entry(index)?;
        self.persist(parent)?;
        self.allocator.release_blocks(extent)?;

        debug!("[FS] rmdir '{}' released blocks {}..{}", path, extent.start, extent.end());
        Ok(())
    }

    /// 在目录中记录一个文件条目
    ///
    /// 条目名称取路径的最后一个组件。文件内容由上层负责，
    /// 这里只保存元数据和它独占的 extent。
    ///
    /// # 错误
    ///
    /// - `ErrorKind::InvalidInput` - 条目是目录（应使用 [`Self::make_dir`]）或名称不合法
    /// - `ErrorKind::AlreadyExists` - 同名条目已存在
    /// - `ErrorKind::NoSpace` - 父目录已满
    pub fn create_entry(&mut self, path: &str, entry: DirectoryEntry) -> Result<()> {
        if entry.is_dir() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Directories must be created with make_dir",
            ));
        }

        let mut parent = {
            let resolved = resolve_path(&mut self.bdev, path, &self.root, &self.cwd)?;
            let name = resolved.last_element.clone().ok_or(Error::new(
                ErrorKind::AlreadyExists,
                "Root directory already exists",
            ))?;
            let mut parent = resolved.parent.into_owned();
            parent.insert_entry(entry.renamed(&name))?;
            parent
        };

        self.persist(parent)?;
        debug!("[FS] created entry '{}'", path);
        Ok(())
    }

    /// 删除文件条目并归还它的 extent
    ///
    /// # 错误
    ///
    /// - `ErrorKind::NotFound` - 条目不存在
    /// - `ErrorKind::InvalidInput` - 目标是目录（应使用 [`Self::remove_dir`]）
    pub fn remove_entry(&mut self, path: &str) -> Result<()> {
        let (mut parent, index, extent) = {
            let resolved = resolve_path(&mut self.bdev, path, &self.root, &self.cwd)?;
            let index = resolved
                .index
                .filter(|_| resolved.last_element.is_some())
                .ok_or(Error::new(ErrorKind::NotFound, "Entry not found"))?;
            let entry = resolved.parent.entry(index).ok_or(Error::new(
                ErrorKind::NotFound,
                "Entry not found",
            ))?;
            if entry.is_dir() {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    "Directories must be removed with remove_dir",
                ));
            }
            let extent = entry.extent;
            (resolved.parent.into_owned(), index, extent)
        };

        parent.delete_entry(index)?;
        self.persist(parent)?;
        if let Some(extent) = extent {
            self.allocator.release_blocks(extent)?;
        }

        debug!("[FS] removed entry '{}'", path);
        Ok(())
    }

    /// 切换当前工作目录
    ///
    /// # 错误
    ///
    /// - `ErrorKind::NotFound` - 目标不存在
    /// - `ErrorKind::NotADirectory` - 目标不是目录
    pub fn set_cwd(&mut self, path: &str) -> Result<()> {
        let new_cwd = {
            let resolved = resolve_path(&mut self.bdev, path, &self.root, &self.cwd)?;
            if resolved.is_root_itself() {
                resolved.parent.into_owned()
            } else {
                let entry = resolved.entry().ok_or(Error::new(
                    ErrorKind::NotFound,
                    "Directory not found",
                ))?;
                load_directory(&mut self.bdev, entry)?
            }
        };

        self.cwd_path = join_path(&self.cwd_path, path);
        self.cwd = new_cwd;

        debug!("[FS] cwd is now '{}'", self.cwd_path);
        Ok(())
    }

    /// 把修改后的目录表写回磁盘，并同步常驻的根目录/工作目录
    fn persist(&mut self, table: DirectoryTable) -> Result<()> {
        store_directory(&mut self.bdev, &table)?;

        let extent = table.extent();
        if extent == self.cwd.extent() {
            self.cwd = table.clone();
        }
        if extent == self.root.extent() {
            self.root = table;
        }
        Ok(())
    }
}

/// 遍历目录树，把所有条目占用的 extent 登记到分配器
///
/// 返回登记的 extent 数。指回祖先的目录会与已登记的块重叠，
/// 因此遍历总会结束。
fn reserve_tree<D: BlockDevice, A: ExtentAllocator>(
    bdev: &mut BlockDev<D>,
    allocator: &mut A,
    root: &DirectoryTable,
) -> Result<usize> {
    let root_extent = root.extent().ok_or(Error::new(
        ErrorKind::Corrupted,
        "Root directory has no self entry",
    ))?;
    reserve_on_mount(allocator, root_extent)?;

    let mut reserved = 1;
    let mut pending: Vec<DirectoryEntry> = Vec::new();
    reserved += reserve_children(allocator, root, &mut pending)?;

    while let Some(entry) = pending.pop() {
        let table = load_directory(bdev, &entry)?;
        if table.extent() != entry.extent {
            warn!("[FS] directory '{}' does not point at its own table", entry.name);
            return Err(Error::new(
                ErrorKind::Corrupted,
                "Directory entry and table disagree on location",
            ));
        }
        reserved += reserve_children(allocator, &table, &mut pending)?;
    }

    Ok(reserved)
}

/// 登记目录表中除 `.` 和 `..` 外所有条目的 extent，子目录放入 `pending`
fn reserve_children<A: ExtentAllocator>(
    allocator: &mut A,
    table: &DirectoryTable,
    pending: &mut Vec<DirectoryEntry>,
) -> Result<usize> {
    let mut reserved = 0;
    for (index, entry) in table.iter_used() {
        if index == SELF_SLOT || index == PARENT_SLOT {
            continue;
        }
        if let Some(extent) = entry.extent {
            reserve_on_mount(allocator, extent)?;
            reserved += 1;
        }
        if entry.is_dir() {
            pending.push(entry.clone());
        }
    }
    Ok(reserved)
}

/// 磁盘上的 extent 越界也属于卷损坏
fn reserve_on_mount<A: ExtentAllocator>(allocator: &mut A, extent: Extent) -> Result<()> {
    allocator.reserve_blocks(extent).map_err(|e| match e.kind() {
        ErrorKind::InvalidInput => Error::new(ErrorKind::Corrupted, e.message()),
        _ => e,
    })
}

/// 计算切换目录后的绝对路径
///
/// `.` 被忽略，`..` 回到上一级（根目录的上一级仍是根目录）。
fn join_path(cwd: &str, path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if !path.starts_with(PATH_SEPARATOR) {
        parts.extend(cwd.split(PATH_SEPARATOR).filter(|s| !s.is_empty()));
    }

    for component in path.split(PATH_SEPARATOR).filter(|s| !s.is_empty()) {
        match component {
            DOT => {}
            DOTDOT => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }

    let mut out = String::new();
    for part in &parts {
        out.push(PATH_SEPARATOR);
        out.push_str(part);
    }
    if out.is_empty() {
        out.push(PATH_SEPARATOR);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        balloc::BitmapAllocator,
        testing::{MockDevice, TestHal, TEST_NOW},
    };

    type TestFs = FileSystem<MockDevice, BitmapAllocator, TestHal>;

    fn small_config() -> FsConfig {
        FsConfig {
            root_entry_count: 10,
            dir_entry_count: 4,
        }
    }

    fn new_fs(blocks: u64) -> TestFs {
        let bdev = BlockDev::new(MockDevice::new(blocks)).unwrap();
        let alloc = BitmapAllocator::new(blocks);
        TestFs::format(bdev, alloc, small_config()).unwrap()
    }

    /// 卸载后丢弃分配器，用新建的分配器重新挂载
    fn remount(fs: TestFs) -> TestFs {
        let (bdev, _) = fs.unmount().unwrap();
        let blocks = bdev.total_blocks();
        TestFs::mount_with_config(bdev, BitmapAllocator::new(blocks), small_config()).unwrap()
    }

    #[test]
    fn test_format_and_mount() {
        let fs = new_fs(64);
        assert_eq!(fs.header().root, Extent::new(1, 3));
        assert_eq!(fs.root().len(), 12);
        assert_eq!(fs.root(), fs.cwd());
        assert_eq!(fs.cwd_path(), "/");

        let fs = remount(fs);
        assert_eq!(fs.root().find_entry("."), Some(0));
        assert_eq!(fs.root().find_entry("nonexistent"), None);
    }

    #[test]
    fn test_device_opened_and_closed() {
        let fs = new_fs(64);
        let (mut bdev, _) = fs.unmount().unwrap();
        assert_eq!(bdev.device_mut().opens, 1);
        assert_eq!(bdev.device_mut().closes, 1);

        let fs = TestFs::mount(bdev, BitmapAllocator::new(64)).unwrap();
        let (mut bdev, _) = fs.unmount().unwrap();
        assert_eq!(bdev.device_mut().opens, 2);
        assert_eq!(bdev.device_mut().closes, 2);
    }

    #[test]
    fn test_mount_rebuilds_allocation_state() {
        let mut fs = new_fs(64);
        fs.make_dir("/a").unwrap();
        fs.make_dir("/a/b").unwrap();
        let file = DirectoryEntry::new_file("f", 10, Some(Extent::new(40, 2)), TEST_NOW);
        fs.create_entry("/a/f", file).unwrap();

        let root_extent = fs.header().root;
        let (bdev, _) = fs.unmount().unwrap();

        let mut fs = TestFs::mount(bdev, BitmapAllocator::new(64)).unwrap();
        // 块 0、根目录 3 块、a 和 b 各 1 块、文件 2 块
        assert_eq!(fs.allocator().free_blocks(), 64 - 1 - 3 - 1 - 1 - 2);
        assert!(fs.allocator().is_allocated(root_extent.start));
        assert!(fs.allocator().is_allocated(41));

        fs.make_dir("/c").unwrap();
        let c = fs.read_dir("/c").unwrap();
        let names: Vec<&str> = c.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, [".", ".."]);
        assert_ne!(c[0].extent, Some(root_extent));
        assert!(fs.is_dir("/a/b"));
        assert!(!fs.is_dir("/c/c"));
    }

    #[test]
    fn test_mount_with_used_allocator_is_rejected() {
        let fs = new_fs(64);
        let (bdev, alloc) = fs.unmount().unwrap();
        let err = TestFs::mount(bdev, alloc).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_mount_rejects_overlapping_extents() {
        let mut fs = new_fs(64);
        // 文件与根目录共用块
        let file = DirectoryEntry::new_file("f", 10, Some(Extent::new(2, 1)), TEST_NOW);
        fs.create_entry("/f", file).unwrap();

        let (bdev, _) = fs.unmount().unwrap();
        let err = TestFs::mount(bdev, BitmapAllocator::new(64)).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_mount_unformatted() {
        let bdev = BlockDev::new(MockDevice::new(64)).unwrap();
        let err = TestFs::mount(bdev, BitmapAllocator::new(64)).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_make_dir_nested() {
        let mut fs = new_fs(128);
        fs.make_dir("/a").unwrap();
        fs.make_dir("/a/b").unwrap();
        fs.make_dir("a/b/c").unwrap();

        assert!(fs.is_dir("/a"));
        assert!(fs.is_dir("/a/b/c"));
        assert!(fs.is_dir("/"));
        assert!(!fs.is_dir("/a/x"));
        assert!(fs.root().find_entry("a").is_some());

        let names: Vec<String> = fs.read_dir("/a").unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, [".", "..", "b"]);

        // 子目录的 .. 指向父目录
        let a = fs.read_dir("/a").unwrap();
        let b = fs.read_dir("/a/b").unwrap();
        assert_eq!(b[1].extent, a[0].extent);
        assert_eq!(b[1].created_at, TEST_NOW);
    }

    #[test]
    fn test_make_dir_errors() {
        let mut fs = new_fs(128);
        fs.make_dir("/a").unwrap();

        assert_eq!(fs.make_dir("/a").unwrap_err().kind(), ErrorKind::AlreadyExists);
        assert_eq!(fs.make_dir("/").unwrap_err().kind(), ErrorKind::AlreadyExists);
        assert_eq!(fs.make_dir("/-1").unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(fs.make_dir("/x/y").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(fs.make_dir("").unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_make_dir_full_parent() {
        let mut fs = new_fs(128);
        // 子目录只有 4 个槽位：., .., 和两个空槽
        fs.make_dir("/d").unwrap();
        fs.make_dir("/d/1").unwrap();
        fs.make_dir("/d/2").unwrap();

        let free = fs.allocator().free_blocks();
        assert_eq!(fs.make_dir("/d/3").unwrap_err().kind(), ErrorKind::NoSpace);
        assert_eq!(fs.allocator().free_blocks(), free);
    }

    #[test]
    fn test_make_dir_out_of_blocks() {
        // 根目录占满了除卷头外的所有块
        let mut fs = new_fs(4);
        let err = fs.make_dir("/a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoSpace);
        assert_eq!(fs.root().find_entry("a"), None);
    }

    #[test]
    fn test_file_component_is_not_a_directory() {
        let mut fs = new_fs(128);
        let file = DirectoryEntry::new_file("ignored", 3, None, TEST_NOW);
        fs.create_entry("/a", file).unwrap();

        assert!(fs.is_file("/a"));
        assert!(!fs.is_dir("/a"));
        assert_eq!(fs.resolve("a/b").unwrap_err().kind(), ErrorKind::NotADirectory);
        assert_eq!(fs.make_dir("/a/b").unwrap_err().kind(), ErrorKind::NotADirectory);
        assert_eq!(fs.set_cwd("/a").unwrap_err().kind(), ErrorKind::NotADirectory);
        assert_eq!(fs.read_dir("/a").unwrap_err().kind(), ErrorKind::NotADirectory);
        assert_eq!(fs.remove_dir("/a").unwrap_err().kind(), ErrorKind::NotADirectory);
    }

    #[test]
    fn test_missing_middle_component() {
        let mut fs = new_fs(128);
        fs.make_dir("/a").unwrap();
        assert_eq!(fs.resolve("a/b/c").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_set_cwd_and_relative_paths() {
        let mut fs = new_fs(128);
        fs.make_dir("/home").unwrap();
        fs.set_cwd("/home").unwrap();
        assert_eq!(fs.cwd_path(), "/home");

        fs.make_dir("user").unwrap();
        assert!(fs.is_dir("/home/user"));
        // 工作目录表同步了新条目
        assert!(fs.cwd().find_entry("user").is_some());

        fs.set_cwd("user/..").unwrap();
        assert_eq!(fs.cwd_path(), "/home");

        fs.set_cwd("..").unwrap();
        assert_eq!(fs.cwd_path(), "/");
        assert_eq!(fs.cwd(), fs.root());

        fs.set_cwd("/").unwrap();
        assert_eq!(fs.cwd_path(), "/");
        assert_eq!(fs.set_cwd("/nope").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_root_singleton_tracks_changes_through_cwd() {
        let mut fs = new_fs(128);
        // cwd 就是根目录时，两张常驻表都要更新
        fs.make_dir("x").unwrap();
        assert!(fs.root().find_entry("x").is_some());
        assert!(fs.cwd().find_entry("x").is_some());
    }

    #[test]
    fn test_remove_dir() {
        let mut fs = new_fs(128);
        let free = fs.allocator().free_blocks();
        fs.make_dir("/a").unwrap();
        fs.make_dir("/a/b").unwrap();

        assert_eq!(fs.remove_dir("/a").unwrap_err().kind(), ErrorKind::NotEmpty);
        assert_eq!(fs.remove_dir("/a/zz").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(fs.remove_dir("/").unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(fs.remove_dir("/a/..").unwrap_err().kind(), ErrorKind::InvalidInput);

        fs.set_cwd("/a/b").unwrap();
        assert_eq!(fs.remove_dir("/a/b").unwrap_err().kind(), ErrorKind::Busy);
        fs.set_cwd("/").unwrap();

        assert_eq!(fs.read_dir("/a").unwrap().len(), 3);
        fs.remove_dir("/a/b").unwrap();
        fs.remove_dir("/a").unwrap();

        assert!(!fs.is_dir("/a"));
        assert_eq!(fs.allocator().free_blocks(), free);

        // 删除后的槽位被复用
        assert_eq!(fs.root().find_free_slot(), Some(2));
        fs.make_dir("/c").unwrap();
        assert_eq!(fs.root().find_entry("c"), Some(2));
    }

    #[test]
    fn test_create_and_remove_entry() {
        let mut fs = new_fs(128);
        let free = fs.allocator().free_blocks();

        // 文件内容的块由上层分配；重新挂载后分配器才知道它们已被占用
        let file = DirectoryEntry::new_file("f", 700, Some(Extent::new(100, 2)), TEST_NOW);
        fs.create_entry("/f", file).unwrap();
        let mut fs = remount(fs);
        assert_eq!(fs.allocator().free_blocks(), free - 2);

        assert_eq!(
            fs.create_entry("/f", DirectoryEntry::new_file("f", 0, None, TEST_NOW))
                .unwrap_err()
                .kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(fs.remove_entry("/").unwrap_err().kind(), ErrorKind::NotFound);

        fs.make_dir("/d").unwrap();
        assert_eq!(fs.remove_entry("/d").unwrap_err().kind(), ErrorKind::InvalidInput);
        fs.remove_dir("/d").unwrap();

        fs.remove_entry("/f").unwrap();
        assert!(!fs.is_file("/f"));
        assert_eq!(fs.allocator().free_blocks(), free);
        assert_eq!(fs.remove_entry("/f").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_changes_survive_remount() {
        let mut fs = new_fs(128);
        fs.make_dir("/etc").unwrap();
        fs.make_dir("/etc/conf").unwrap();

        let before = fs.read_dir("/etc").unwrap();
        let free = fs.allocator().free_blocks();

        let mut fs = remount(fs);
        assert_eq!(fs.read_dir("/etc").unwrap(), before);
        assert_eq!(fs.allocator().free_blocks(), free);
        assert!(fs.is_dir("/etc/conf/"));
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/", "a"), "/a");
        assert_eq!(join_path("/a", "b/c"), "/a/b/c");
        assert_eq!(join_path("/a/b", ".."), "/a");
        assert_eq!(join_path("/a/b", "/x/./y/"), "/x/y");
        assert_eq!(join_path("/", "../.."), "/");
    }
}
