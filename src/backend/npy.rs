use std::path::Path;

use anyhow::{Result, bail};
use ndarray::Array2;
use ndarray_npy::read_npy;

use super::{FeatureExtractor, ImageLoader};
use crate::descriptor::OrbDescriptor;
use crate::hamming::as_descriptors;

/// 读取预先提取好的描述符文件
///
/// 每个 `.npy` 文件是一个形状为 (n, 32) 的 u8 数组，每行是一个 ORB 描述符
#[derive(Debug, Clone, Copy, Default)]
pub struct NpyLoader;

impl ImageLoader for NpyLoader {
    type Image = Array2<u8>;

    fn load_image(&self, path: &Path) -> Result<Array2<u8>> {
        Ok(read_npy(path)?)
    }

    fn default_suffix(&self) -> &'static str {
        "npy"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NpyExtractor;

impl FeatureExtractor for NpyExtractor {
    type Image = Array2<u8>;
    type Descriptor = OrbDescriptor;

    fn extract_descriptors(&mut self, image: &Array2<u8>) -> Result<Vec<OrbDescriptor>> {
        let (rows, cols) = image.dim();
        if rows > 0 && cols != 32 {
            bail!("描述符长度应为 32 字节，实际为 {}", cols);
        }
        let descriptors = match image.as_slice() {
            Some(data) => as_descriptors::<32>(data),
            None => image
                .rows()
                .into_iter()
                .map(|row| {
                    let mut d = [0u8; 32];
                    d.iter_mut().zip(row.iter()).for_each(|(dst, src)| *dst = *src);
                    d
                })
                .collect(),
        };
        Ok(descriptors)
    }
}
