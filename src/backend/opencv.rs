use std::path::Path;

use anyhow::{Result, anyhow, bail};
use opencv::core::{KeyPoint, Mat, Ptr, Vector, no_array};
use opencv::features2d::{ORB, ORB_ScoreType};
use opencv::imgcodecs;
use opencv::prelude::*;

use super::{FeatureExtractor, ImageLoader};
use crate::config::OrbOptions;
use crate::descriptor::OrbDescriptor;
use crate::hamming::as_descriptors;

/// 使用 OpenCV 解码彩色图片
#[derive(Debug, Clone, Copy, Default)]
pub struct OpencvLoader;

impl ImageLoader for OpencvLoader {
    type Image = Mat;

    fn load_image(&self, path: &Path) -> Result<Mat> {
        let filename = path.to_str().ok_or_else(|| anyhow!("无效的路径: {}", path.display()))?;
        let image = imgcodecs::imread(filename, imgcodecs::IMREAD_COLOR)?;
        // imread 读取失败时不会报错，而是返回空矩阵
        if image.empty() {
            bail!("无法解码图片: {}", path.display());
        }
        Ok(image)
    }

    fn default_suffix(&self) -> &'static str {
        "png,jpg"
    }
}

/// OpenCV ORB 特征提取器
pub struct OrbExtractor {
    orb: Ptr<ORB>,
}

impl OrbExtractor {
    pub fn create(opts: &OrbOptions) -> Result<Self> {
        let orb = ORB::create(
            opts.orb_nfeatures as i32,
            opts.orb_scale_factor,
            opts.orb_nlevels as i32,
            31,
            0,
            2,
            ORB_ScoreType::HARRIS_SCORE,
            31,
            opts.orb_fast_threshold as i32,
        )?;
        Ok(Self { orb })
    }

    pub fn detect_and_compute(&mut self, image: &Mat) -> Result<(Vector<KeyPoint>, Vec<OrbDescriptor>)> {
        let mut keypoints = Vector::<KeyPoint>::new();
        let mut descriptors = Mat::default();
        self.orb.detect_and_compute(image, &no_array(), &mut keypoints, &mut descriptors, false)?;
        if descriptors.empty() {
            return Ok((keypoints, vec![]));
        }
        if descriptors.cols() != 32 {
            bail!("ORB 描述符长度应为 32 字节，实际为 {}", descriptors.cols());
        }
        let descriptors = as_descriptors::<32>(descriptors.data_bytes()?);
        Ok((keypoints, descriptors))
    }
}

impl FeatureExtractor for OrbExtractor {
    type Image = Mat;
    type Descriptor = OrbDescriptor;

    fn extract_descriptors(&mut self, image: &Mat) -> Result<Vec<OrbDescriptor>> {
        let (_, descriptors) = self.detect_and_compute(image)?;
        Ok(descriptors)
    }
}
