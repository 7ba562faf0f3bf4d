use serde::Serialize;

use crate::config::MatchOptions;
use crate::descriptor::Descriptor;

/// 参考描述符与帧描述符之间的一组对应关系
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Correspondence {
    /// 参考描述符在 logo 描述符集合中的索引
    pub reference: usize,
    /// 最近邻在帧描述符集合中的索引
    pub frame: usize,
    pub distance: f32,
}

/// 基于 KNN 比率测试的描述符匹配器
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioMatcher {
    /// 最近邻距离必须小于 ratio * 次近邻距离
    pub ratio: f32,
    /// 最近邻距离的绝对上限
    pub max_distance: f32,
}

impl Default for RatioMatcher {
    fn default() -> Self {
        Self::from(&MatchOptions::default())
    }
}

impl From<&MatchOptions> for RatioMatcher {
    fn from(opts: &MatchOptions) -> Self {
        Self { ratio: opts.ratio, max_distance: opts.max_distance }
    }
}

impl RatioMatcher {
    /// 对 reference 中每个描述符在 frame 中寻找两个最近邻，返回通过测试的对应关系
    ///
    /// frame 中少于两个描述符时，比率测试无法进行，结果为空
    pub fn match_descriptors<D: Descriptor>(
        &self,
        reference: &[D],
        frame: &[D],
    ) -> Vec<Correspondence> {
        if frame.len() < 2 {
            return vec![];
        }
        reference
            .iter()
            .enumerate()
            .filter_map(|(i, r)| match r.knn2(frame)[..] {
                [(best, d1), (_, d2)] if self.accept(d1, d2) => {
                    Some(Correspondence { reference: i, frame: best, distance: d1 })
                }
                _ => None,
            })
            .collect()
    }

    /// 只统计通过测试的对应关系数量
    pub fn count_good<D: Descriptor>(&self, reference: &[D], frame: &[D]) -> usize {
        self.match_descriptors(reference, frame).len()
    }

    #[inline]
    fn accept(&self, d1: f32, d2: f32) -> bool {
        d1 < self.ratio * d2 && d1 < self.max_distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::OrbDescriptor;

    /// 前 n 位为 1 的描述符，与全 0 描述符的距离恰好为 n
    fn with_bits(n: usize) -> OrbDescriptor {
        let mut d = [0u8; 32];
        for bit in 0..n {
            d[bit / 8] |= 1 << (bit % 8);
        }
        d
    }

    #[test]
    fn test_frame_too_small() {
        let matcher = RatioMatcher::default();
        let reference = vec![with_bits(0); 10];
        assert!(matcher.match_descriptors(&reference, &[]).is_empty());
        assert!(matcher.match_descriptors(&reference, &[with_bits(0)]).is_empty());
    }

    #[test]
    fn test_empty_reference() {
        let matcher = RatioMatcher::default();
        let frame = vec![with_bits(0), with_bits(100)];
        assert!(matcher.match_descriptors::<OrbDescriptor>(&[], &frame).is_empty());
    }

    #[test]
    fn test_accepts_distinct_match() {
        let matcher = RatioMatcher::default();
        let frame = vec![with_bits(200), with_bits(39)];
        let good = matcher.match_descriptors(&[with_bits(0)], &frame);
        assert_eq!(good, vec![Correspondence { reference: 0, frame: 1, distance: 39.0 }]);
    }

    #[test]
    fn test_distance_ceiling() {
        let matcher = RatioMatcher::default();
        let frame = vec![with_bits(40), with_bits(200)];
        assert!(matcher.match_descriptors(&[with_bits(0)], &frame).is_empty());
    }

    #[test]
    fn test_ratio_test() {
        let matcher = RatioMatcher::default();
        // 10 < 0.7 * 14 不成立
        let frame = vec![with_bits(10), with_bits(14)];
        assert!(matcher.match_descriptors(&[with_bits(0)], &frame).is_empty());
        // 10 < 0.7 * 15 成立
        let frame = vec![with_bits(10), with_bits(15)];
        assert_eq!(matcher.count_good(&[with_bits(0)], &frame), 1);
    }

    #[test]
    fn test_exact_duplicates_are_ambiguous() {
        let matcher = RatioMatcher::default();
        let frame = vec![with_bits(0), with_bits(0)];
        assert!(matcher.match_descriptors(&[with_bits(0)], &frame).is_empty());
    }

    #[test]
    fn test_bounded_and_deterministic() {
        let matcher = RatioMatcher::default();
        let reference = (0..64).map(with_bits).collect::<Vec<_>>();
        let frame = (0..256).step_by(3).map(with_bits).collect::<Vec<_>>();
        let first = matcher.match_descriptors(&reference, &frame);
        let second = matcher.match_descriptors(&reference, &frame);
        assert!(first.len() <= reference.len());
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_thresholds() {
        let matcher = RatioMatcher { ratio: 0.9, max_distance: 100.0 };
        let frame = vec![with_bits(50), with_bits(60)];
        assert_eq!(matcher.count_good(&[with_bits(0)], &frame), 1);
    }
}
