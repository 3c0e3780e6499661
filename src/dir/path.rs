//! 路径解析
//!
//! 把以 `/` 分隔的路径逐级解析为 (父目录表, 槽位索引, 最后一个组件名)。
//!
//! ## 目录表的所有权
//!
//! 解析从根目录或当前工作目录开始，这两张表由调用者长期持有，
//! 解析过程只借用它们。每向下一级都会加载一张新表并丢弃上一张
//! 自己加载的表，因此任意时刻最多只有一张临时表存活；
//! 出错返回时临时表随之释放。

use crate::{
    block::{BlockDev, BlockDevice},
    consts::PATH_SEPARATOR,
    error::{Error, ErrorKind, Result},
};
use alloc::{borrow::Cow, string::{String, ToString}};
use log::*;

use super::{loader::load_directory, table::DirectoryTable};

/// 路径解析结果
#[derive(Debug, Clone)]
pub struct ResolvedPath<'a> {
    /// 最后一个组件所在的目录表
    ///
    /// 借用的是根目录或当前工作目录，自有的是解析中加载的表。
    pub parent: Cow<'a, DirectoryTable>,
    /// 最后一个组件在 `parent` 中的槽位
    ///
    /// `None` 且 `last_element` 也为 `None` 表示路径就是 `/`（目录表自身）；
    /// `None` 且 `last_element` 为 `Some` 表示最后一个组件不存在。
    pub index: Option<usize>,
    /// 最后一个组件的名称，路径为 `/` 时为 `None`
    pub last_element: Option<String>,
}

impl ResolvedPath<'_> {
    /// 路径是否指向起始目录表自身（即 `/`）
    pub fn is_root_itself(&self) -> bool {
        self.index.is_none() && self.last_element.is_none()
    }

    /// 最后一个组件是否存在
    pub fn exists(&self) -> bool {
        self.is_root_itself() || self.index.is_some()
    }

    /// 最后一个组件的条目
    pub fn entry(&self) -> Option<&super::DirectoryEntry> {
        self.index.and_then(|i| self.parent.entry(i))
    }

    /// `parent` 是否是解析过程中加载的表
    pub fn parent_is_loaded(&self) -> bool {
        matches!(self.parent, Cow::Owned(_))
    }
}

/// 路径解析器
///
/// 用于根据路径字符串找到目录项
pub struct PathResolver<'a, D: BlockDevice> {
    bdev: &'a mut BlockDev<D>,
}

impl<'a, D: BlockDevice> PathResolver<'a, D> {
    /// 创建新的路径解析器
    pub fn new(bdev: &'a mut BlockDev<D>) -> Self {
        Self { bdev }
    }

    /// 解析路径
    ///
    /// # 参数
    ///
    /// * `path` - 绝对路径（以 `/` 开头）或相对于 `cwd` 的路径
    /// * `root` - 根目录表
    /// * `cwd` - 当前工作目录表
    ///
    /// # 返回
    ///
    /// 最后一个组件不存在也算成功（`index` 为 `None`），
    /// 由调用者决定这是错误还是可以创建。
    ///
    /// # 错误
    ///
    /// - `ErrorKind::InvalidInput` - 路径为空，或只由分隔符组成但不是 `/`
    /// - `ErrorKind::NotFound` - 中间组件不存在
    /// - `ErrorKind::NotADirectory` - 中间组件不是目录
    /// - `ErrorKind::Io` / `ErrorKind::Corrupted` - 加载中间目录失败
    ///
    /// # 示例
    ///
    /// ```ignore
    /// let mut resolver = PathResolver::new(&mut bdev);
    /// let resolved = resolver.resolve("/home/user", &root, &cwd)?;
    /// ```
    pub fn resolve<'t>(
        &mut self,
        path: &str,
        root: &'t DirectoryTable,
        cwd: &'t DirectoryTable,
    ) -> Result<ResolvedPath<'t>> {
        let start = if path.starts_with(PATH_SEPARATOR) { root } else { cwd };

        let mut components = path.split(PATH_SEPARATOR).filter(|s| !s.is_empty()).peekable();

        if components.peek().is_none() {
            if path.len() == 1 && path.starts_with(PATH_SEPARATOR) {
                return Ok(ResolvedPath {
                    parent: Cow::Borrowed(start),
                    index: None,
                    last_element: None,
                });
            }
            return Err(Error::new(ErrorKind::InvalidInput, "Empty path"));
        }

        let mut current: Cow<'t, DirectoryTable> = Cow::Borrowed(start);

        while let Some(component) = components.next() {
            let index = current.find_entry(component);

            if components.peek().is_none() {
                trace!("[PATH] '{}' -> last '{}' index={:?}", path, component, index);
                return Ok(ResolvedPath {
                    parent: current,
                    index,
                    last_element: Some(component.to_string()),
                });
            }

            let entry = index.and_then(|i| current.entry(i)).ok_or(Error::new(
                ErrorKind::NotFound,
                "Path component not found",
            ))?;

            if !entry.is_dir() {
                return Err(Error::new(
                    ErrorKind::NotADirectory,
                    "Path component is not a directory",
                ));
            }

            trace!("[PATH] '{}' descending into '{}'", path, component);
            let next = load_directory(self.bdev, entry)?;

            // 旧的临时表在这里释放；借用的根目录/工作目录不受影响
            current = Cow::Owned(next);
        }

        // split 至少产生一个组件，循环总会在最后一个组件处返回
        Err(Error::new(ErrorKind::InvalidInput, "Empty path"))
    }
}

/// 便捷函数：解析路径
///
/// # 参数
///
/// * `bdev` - 块设备引用
/// * `path` - 路径字符串
/// * `root` - 根目录表
/// * `cwd` - 当前工作目录表
pub fn resolve_path<'t, D: BlockDevice>(
    bdev: &mut BlockDev<D>,
    path: &str,
    root: &'t DirectoryTable,
    cwd: &'t DirectoryTable,
) -> Result<ResolvedPath<'t>> {
    PathResolver::new(bdev).resolve(path, root, cwd)
}
