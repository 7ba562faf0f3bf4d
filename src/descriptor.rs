use crate::hamming::{hamming, knn_hamming};

/// ORB 输出的 256 位二进制描述符
pub type OrbDescriptor = [u8; 32];

/// 一个可以计算距离的定长特征描述符
pub trait Descriptor: Sized {
    /// 两个描述符之间的距离，越小越相似
    fn distance(&self, other: &Self) -> f32;

    /// 在 candidates 中寻找距离最近的两个描述符，返回 `(索引, 距离)`，按距离升序排列
    ///
    /// 距离相同时先出现的排在前面；candidates 不足两个时返回的数量也相应减少
    fn knn2(&self, candidates: &[Self]) -> Vec<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        let mut second: Option<(usize, f32)> = None;
        for (i, candidate) in candidates.iter().enumerate() {
            let d = self.distance(candidate);
            match best {
                Some((_, bd)) if d >= bd => {
                    if second.is_none_or(|(_, sd)| d < sd) {
                        second = Some((i, d));
                    }
                }
                _ => {
                    second = best;
                    best = Some((i, d));
                }
            }
        }
        best.into_iter().chain(second).collect()
    }
}

impl<const N: usize> Descriptor for [u8; N] {
    #[inline]
    fn distance(&self, other: &Self) -> f32 {
        hamming::<N>(self, other) as f32
    }

    fn knn2(&self, candidates: &[Self]) -> Vec<(usize, f32)> {
        let (ids, dis) = knn_hamming::<N>(self, candidates, 2);
        ids.into_iter().zip(dis.into_iter().map(|d| d as f32)).collect()
    }
}

/// 浮点描述符（如 SIFT），使用欧氏距离
impl<const N: usize> Descriptor for [f32; N] {
    fn distance(&self, other: &Self) -> f32 {
        self.iter().zip(other.iter()).map(|(a, b)| (a - b) * (a - b)).sum::<f32>().sqrt()
    }
}
