//! 外部能力：图片解码与特征提取
//!
//! 匹配核心只依赖这里的两个 trait，测试时可以直接注入合成的描述符

use std::path::Path;

use anyhow::Result;

pub mod npy;
#[cfg(feature = "opencv")]
pub mod opencv;

pub use npy::{NpyExtractor, NpyLoader};

/// 从文件解码图片
pub trait ImageLoader {
    type Image;

    /// 解码失败（文件损坏、无法读取等）时返回错误
    fn load_image(&self, path: &Path) -> Result<Self::Image>;

    /// 未指定后缀名时扫描的默认后缀，逗号分隔
    fn default_suffix(&self) -> &'static str;
}

/// 从图片中提取特征描述符
pub trait FeatureExtractor {
    type Image;
    type Descriptor;

    /// 对合法的图片，可能返回空集合
    fn extract_descriptors(&mut self, image: &Self::Image) -> Result<Vec<Self::Descriptor>>;
}
