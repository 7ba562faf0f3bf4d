use serde::Serialize;

use crate::config::MatchOptions;
use crate::descriptor::Descriptor;
use crate::library::ReferenceLibrary;
use crate::matcher::RatioMatcher;

/// 单个 logo 在一帧上的得分
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoScore {
    pub brand_name: String,
    pub good_matches: usize,
    pub confidence: u8,
}

/// 一帧的检测结果，没有检测到 logo 时 brand_name 为空且 confidence 为 0
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrameMatchResult {
    pub brand_name: Option<String>,
    pub confidence: u8,
}

impl FrameMatchResult {
    pub fn is_detected(&self) -> bool {
        self.brand_name.is_some()
    }
}

/// 把匹配数量归一化为 0 ~ 100 的置信度，向下取整
pub fn confidence(good_matches: usize, divisor: u32) -> u8 {
    let divisor = divisor.max(1) as usize;
    (good_matches.saturating_mul(100) / divisor).min(100) as u8
}

/// 计算每个 logo 的得分，顺序与库中的顺序一致
pub fn score_logos<D: Descriptor>(
    frame: &[D],
    library: &ReferenceLibrary<D>,
    opts: &MatchOptions,
) -> Vec<LogoScore> {
    let matcher = RatioMatcher::from(opts);
    library
        .iter()
        .map(|logo| {
            let good_matches = matcher.count_good(&logo.descriptors, frame);
            LogoScore {
                brand_name: logo.brand_name.clone(),
                good_matches,
                confidence: confidence(good_matches, opts.confidence_divisor),
            }
        })
        .collect()
}

/// 从所有得分中选出最佳候选
///
/// 匹配数量必须达到 `candidate_floor` 才能成为候选，只有严格更多的匹配才会替换当前候选，
/// 因此平局时先出现的 logo 胜出。最佳候选的置信度还需要达到 `report_floor` 才会被报告
pub fn select_best<'a>(
    scores: impl IntoIterator<Item = &'a LogoScore>,
    opts: &MatchOptions,
) -> FrameMatchResult {
    let best = scores.into_iter().fold(None::<&LogoScore>, |best, score| {
        if score.good_matches < opts.candidate_floor {
            return best;
        }
        match best {
            Some(b) if score.good_matches <= b.good_matches => Some(b),
            _ => Some(score),
        }
    });
    match best {
        Some(b) if b.confidence >= opts.report_floor => {
            FrameMatchResult { brand_name: Some(b.brand_name.clone()), confidence: b.confidence }
        }
        _ => FrameMatchResult::default(),
    }
}

/// 在参考库中寻找与这一帧最匹配的 logo
pub fn score_frame<D: Descriptor>(
    frame: &[D],
    library: &ReferenceLibrary<D>,
    opts: &MatchOptions,
) -> FrameMatchResult {
    select_best(&score_logos(frame, library, opts), opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;
    use crate::descriptor::OrbDescriptor;
    use rstest::rstest;

    /// 编号为 i 的伪随机描述符，不同编号之间的距离在 128 左右，远大于距离上限
    fn descriptor(i: usize) -> OrbDescriptor {
        let mut d = [0u8; 32];
        for (k, chunk) in d.chunks_exact_mut(8).enumerate() {
            chunk.copy_from_slice(&splitmix64((i * 4 + k) as u64).to_le_bytes());
        }
        d
    }

    fn splitmix64(x: u64) -> u64 {
        let mut z = x.wrapping_add(0x9e3779b97f4a7c15);
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }

    fn descriptors(range: std::ops::Range<usize>) -> Vec<OrbDescriptor> {
        range.map(descriptor).collect()
    }

    fn library(logos: &[(&str, std::ops::Range<usize>)]) -> ReferenceLibrary {
        let mut library = ReferenceLibrary::new();
        for (brand, range) in logos {
            library.insert(*brand, descriptors(range.clone()), DuplicatePolicy::Overwrite).unwrap();
        }
        library
    }

    fn score(brand: &str, good_matches: usize) -> LogoScore {
        LogoScore {
            brand_name: brand.to_string(),
            good_matches,
            confidence: confidence(good_matches, 50),
        }
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 2)]
    #[case(20, 40)]
    #[case(25, 50)]
    #[case(29, 58)]
    #[case(49, 98)]
    #[case(50, 100)]
    #[case(75, 100)]
    #[case(usize::MAX, 100)]
    fn test_confidence(#[case] good_matches: usize, #[case] expected: u8) {
        assert_eq!(confidence(good_matches, 50), expected);
    }

    #[test]
    fn test_candidate_floor() {
        let opts = MatchOptions::default();
        assert_eq!(select_best(&[score("acme", 29)], &opts), FrameMatchResult::default());
        assert_eq!(select_best(&[score("acme", 20)], &opts), FrameMatchResult::default());
        assert_eq!(
            select_best(&[score("acme", 30)], &opts),
            FrameMatchResult { brand_name: Some("acme".to_string()), confidence: 60 }
        );
    }

    #[test]
    fn test_report_floor_is_independent() {
        // 候选门槛很低时，置信度门槛仍然生效
        let opts = MatchOptions { candidate_floor: 10, ..Default::default() };
        assert_eq!(select_best(&[score("acme", 19)], &opts), FrameMatchResult::default());
        assert_eq!(
            select_best(&[score("acme", 20)], &opts),
            FrameMatchResult { brand_name: Some("acme".to_string()), confidence: 40 }
        );
    }

    #[test]
    fn test_strictly_greater_wins() {
        let opts = MatchOptions::default();
        let scores = [score("acme", 35), score("globex", 40), score("initech", 38)];
        assert_eq!(
            select_best(&scores, &opts),
            FrameMatchResult { brand_name: Some("globex".to_string()), confidence: 80 }
        );
    }

    #[test]
    fn test_tie_keeps_first() {
        let opts = MatchOptions::default();
        let scores = [score("acme", 29), score("globex", 45), score("initech", 45)];
        assert_eq!(select_best(&scores, &opts).brand_name.as_deref(), Some("globex"));
    }

    #[test]
    fn test_score_frame_picks_best_logo() {
        let library = library(&[("acme", 0..40), ("globex", 100..135)]);
        let mut frame = descriptors(0..40);
        frame.extend(descriptors(100..135));

        let scores = score_logos(&frame, &library, &MatchOptions::default());
        assert_eq!(scores.iter().map(|s| s.good_matches).collect::<Vec<_>>(), [40, 35]);
        assert_eq!(
            score_frame(&frame, &library, &MatchOptions::default()),
            FrameMatchResult { brand_name: Some("acme".to_string()), confidence: 80 }
        );
    }

    #[test]
    fn test_score_frame_partial_overlap() {
        let library = library(&[("acme", 0..60), ("globex", 100..160)]);
        let mut frame = descriptors(0..25);
        frame.extend(descriptors(100..135));
        frame.extend(descriptors(500..600));

        let scores = score_logos(&frame, &library, &MatchOptions::default());
        assert_eq!(scores.iter().map(|s| s.good_matches).collect::<Vec<_>>(), [25, 35]);
        assert_eq!(
            score_frame(&frame, &library, &MatchOptions::default()),
            FrameMatchResult { brand_name: Some("globex".to_string()), confidence: 70 }
        );
    }

    #[test]
    fn test_score_frame_below_floor() {
        let library = library(&[("acme", 0..29)]);
        let mut frame = descriptors(0..29);
        frame.push([0xff; 32]);
        assert_eq!(score_logos(&frame, &library, &MatchOptions::default())[0].good_matches, 29);
        assert!(!score_frame(&frame, &library, &MatchOptions::default()).is_detected());
    }

    #[test]
    fn test_score_frame_empty_library() {
        let library = ReferenceLibrary::<OrbDescriptor>::new();
        let frame = descriptors(0..100);
        assert_eq!(score_frame(&frame, &library, &MatchOptions::default()), FrameMatchResult::default());
    }

    #[test]
    fn test_score_frame_degenerate_frame() {
        let library = library(&[("acme", 0..60)]);
        let opts = MatchOptions::default();
        assert_eq!(score_frame(&[], &library, &opts), FrameMatchResult::default());
        assert_eq!(score_frame(&[descriptor(0)], &library, &opts), FrameMatchResult::default());
    }

    #[test]
    fn test_result_json() -> anyhow::Result<()> {
        let result = FrameMatchResult { brand_name: Some("acme".to_string()), confidence: 80 };
        assert_eq!(serde_json::to_string(&result)?, r#"{"brand_name":"acme","confidence":80}"#);
        let none = serde_json::to_string(&FrameMatchResult::default())?;
        assert_eq!(none, r#"{"brand_name":null,"confidence":0}"#);
        Ok(())
    }
}
