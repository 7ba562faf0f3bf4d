use std::sync::LazyLock;

use prometheus::*;

static METRIC_FRAME_COUNT: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!("logo_frame_count", "count of the scored frames").unwrap()
});

static METRIC_DETECTION_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!("logo_detection_count", "count of the reported detections", &["brand"])
        .unwrap()
});

static METRIC_SCORE_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!("logo_score_duration", "duration of the per-frame scoring in seconds")
        .unwrap()
});

static METRIC_BEST_CONFIDENCE: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "logo_best_confidence",
        "confidence of the reported detection",
        (5..=100).step_by(5).map(|x| x as f64).collect()
    )
    .unwrap()
});

/// 记录一帧的评分结果
pub fn observe_frame(brand: Option<&str>, confidence: u8, duration: f32) {
    METRIC_FRAME_COUNT.inc();
    METRIC_SCORE_DURATION.observe(duration as f64);
    if let Some(brand) = brand {
        METRIC_DETECTION_COUNT.with_label_values(&[brand]).inc();
        METRIC_BEST_CONFIDENCE.observe(confidence as f64);
    }
}

/// 以文本格式导出所有指标
pub fn gather_text() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    Ok(encoder.encode_to_string(&gather())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_and_gather() -> anyhow::Result<()> {
        observe_frame(Some("acme"), 80, 0.01);
        observe_frame(None, 0, 0.02);
        let text = gather_text()?;
        assert!(text.contains("logo_frame_count"));
        assert!(text.contains(r#"logo_detection_count{brand="acme"}"#));
        Ok(())
    }
}
