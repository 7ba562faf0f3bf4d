use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow, bail};
use indicatif::ProgressBar;
use log::{debug, info, warn};
use regex::Regex;
use walkdir::WalkDir;

use crate::backend::{FeatureExtractor, ImageLoader};
use crate::config::DuplicatePolicy;
use crate::descriptor::OrbDescriptor;

/// 一个已知 logo 及其描述符集合，描述符集合一定非空
#[derive(Debug, Clone, PartialEq)]
pub struct LogoRecord<D = OrbDescriptor> {
    pub brand_name: String,
    pub descriptors: Vec<D>,
}

/// 插入 logo 后实际发生的事情
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    Added(String),
    /// 覆盖了同名的旧记录，位置保持不变
    Replaced(String),
    /// 与已有品牌重名，使用新名字保存
    Renamed { from: String, to: String },
}

/// 参考 logo 库，按插入顺序保存，插入顺序决定了评分时的平局顺序
#[derive(Debug, Clone)]
pub struct ReferenceLibrary<D = OrbDescriptor> {
    logos: Vec<LogoRecord<D>>,
    index: HashMap<String, usize>,
}

impl<D> Default for ReferenceLibrary<D> {
    fn default() -> Self {
        Self { logos: vec![], index: HashMap::new() }
    }
}

impl<D> ReferenceLibrary<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个 logo
    ///
    /// 描述符为空，或者按 `policy` 拒绝重名时返回错误
    pub fn insert(
        &mut self,
        brand_name: impl Into<String>,
        descriptors: Vec<D>,
        policy: DuplicatePolicy,
    ) -> Result<Insertion> {
        let brand_name = brand_name.into();
        if descriptors.is_empty() {
            bail!("{} 没有任何特征点", brand_name);
        }

        let Some(&pos) = self.index.get(&brand_name) else {
            self.push(LogoRecord { brand_name: brand_name.clone(), descriptors });
            return Ok(Insertion::Added(brand_name));
        };

        match policy {
            DuplicatePolicy::Overwrite => {
                self.logos[pos].descriptors = descriptors;
                Ok(Insertion::Replaced(brand_name))
            }
            DuplicatePolicy::Reject => Err(anyhow!("品牌 {} 已存在", brand_name)),
            DuplicatePolicy::Suffix => {
                let renamed = (2..)
                    .map(|i| format!("{}_{}", brand_name, i))
                    .find(|name| !self.index.contains_key(name))
                    .ok_or_else(|| anyhow!("无法为 {} 生成新的品牌名", brand_name))?;
                self.push(LogoRecord { brand_name: renamed.clone(), descriptors });
                Ok(Insertion::Renamed { from: brand_name, to: renamed })
            }
        }
    }

    fn push(&mut self, record: LogoRecord<D>) {
        self.index.insert(record.brand_name.clone(), self.logos.len());
        self.logos.push(record);
    }

    pub fn get(&self, brand_name: &str) -> Option<&LogoRecord<D>> {
        self.index.get(brand_name).map(|&pos| &self.logos[pos])
    }

    /// 按插入顺序遍历所有 logo
    pub fn iter(&self) -> std::slice::Iter<'_, LogoRecord<D>> {
        self.logos.iter()
    }

    pub fn len(&self) -> usize {
        self.logos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logos.is_empty()
    }

    /// 所有 logo 的描述符总数
    pub fn total_descriptors(&self) -> usize {
        self.logos.iter().map(|logo| logo.descriptors.len()).sum()
    }
}

impl<'a, D> IntoIterator for &'a ReferenceLibrary<D> {
    type Item = &'a LogoRecord<D>;
    type IntoIter = std::slice::Iter<'a, LogoRecord<D>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// 从文件名中取出品牌名，即第一个 `.` 之前的部分
pub fn brand_name_of(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    let brand = name.split('.').next().unwrap_or_default();
    (!brand.is_empty()).then(|| brand.to_string())
}

/// 从目录构建参考 logo 库
pub struct LibraryBuilder {
    suffix: Option<String>,
    policy: DuplicatePolicy,
    pb: ProgressBar,
}

impl Default for LibraryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryBuilder {
    pub fn new() -> Self {
        Self { suffix: None, policy: DuplicatePolicy::default(), pb: ProgressBar::hidden() }
    }

    /// 扫描的文件后缀名，多个后缀用逗号分隔，不区分大小写
    pub fn suffix(mut self, suffix: Option<String>) -> Self {
        self.suffix = suffix;
        self
    }

    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn progress(mut self, pb: ProgressBar) -> Self {
        self.pb = pb;
        self
    }

    /// 扫描 folder 下的图片并提取特征
    ///
    /// 单个文件解码失败或没有特征点时只会跳过该文件，只有目录本身无法读取时才返回错误
    pub fn build<L, E>(
        &self,
        folder: impl AsRef<Path>,
        loader: &L,
        extractor: &mut E,
    ) -> Result<ReferenceLibrary<E::Descriptor>>
    where
        L: ImageLoader,
        E: FeatureExtractor<Image = L::Image>,
    {
        let suffix = self.suffix.as_deref().unwrap_or(loader.default_suffix());
        let re_suf = suffix_regex(suffix)?;
        let files = scan_directory(folder.as_ref(), &re_suf)?;
        debug!("在 {} 中找到 {} 个文件", folder.as_ref().display(), files.len());

        self.pb.set_length(files.len() as u64);
        let mut library = ReferenceLibrary::new();
        for path in files {
            self.pb.inc(1);
            let Some(brand) = brand_name_of(&path) else {
                warn!("无法从文件名得到品牌名: {}", path.display());
                continue;
            };
            self.pb.set_message(brand.clone());

            let image = match loader.load_image(&path) {
                Ok(image) => image,
                Err(e) => {
                    warn!("加载 {} 失败: {}", path.display(), e);
                    continue;
                }
            };

            let descriptors = match extractor.extract_descriptors(&image) {
                Ok(descriptors) => descriptors,
                Err(e) => {
                    warn!("{} 提取特征失败: {}", brand, e);
                    continue;
                }
            };
            let count = descriptors.len();

            match library.insert(brand.clone(), descriptors, self.policy) {
                Ok(Insertion::Added(brand)) => info!("{} 提取了 {} 个特征点", brand, count),
                Ok(Insertion::Replaced(brand)) => {
                    warn!("品牌 {} 重复，使用 {} 覆盖旧记录", brand, path.display())
                }
                Ok(Insertion::Renamed { from, to }) => {
                    warn!("品牌 {} 重复，{} 保存为 {}", from, path.display(), to)
                }
                Err(e) => warn!("跳过 {}: {}", path.display(), e),
            }
        }
        self.pb.finish_and_clear();

        if library.is_empty() {
            warn!("没有加载到任何 logo，所有帧都不会有检测结果");
        }
        Ok(library)
    }
}

/// 使用默认设置从目录构建参考 logo 库
pub fn build_library<L, E>(
    folder: impl AsRef<Path>,
    loader: &L,
    extractor: &mut E,
) -> Result<ReferenceLibrary<E::Descriptor>>
where
    L: ImageLoader,
    E: FeatureExtractor<Image = L::Image>,
{
    LibraryBuilder::new().build(folder, loader, extractor)
}

fn suffix_regex(suffix: &str) -> Result<Regex> {
    let alternatives = suffix
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| regex::escape(s.trim_start_matches('.')))
        .collect::<Vec<_>>();
    if alternatives.is_empty() {
        bail!("无效的后缀名: {:?}", suffix);
    }
    Ok(Regex::new(&format!("(?i)^({})$", alternatives.join("|")))?)
}

/// 列出目录下（不递归）后缀匹配的文件，按文件名排序
fn scan_directory(folder: &Path, re_suf: &Regex) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        bail!("{} 不是一个目录", folder.display());
    }
    let mut files = vec![];
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matched = entry
            .path()
            .extension()
            .map(|s| re_suf.is_match(&s.to_string_lossy()))
            .unwrap_or(false);
        if matched {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
