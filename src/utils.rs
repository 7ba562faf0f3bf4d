use std::collections::HashMap;
use std::time::{Duration, Instant};

use indicatif::ProgressStyle;

pub fn pb_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .expect("invalid progress template")
        .progress_chars("#>-")
}

/// 按名字累计各个阶段的耗时
#[derive(Debug, Default)]
pub struct TimeMeasure(pub HashMap<String, Duration>);

impl TimeMeasure {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn measure<F, R>(&mut self, key: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let r = f();
        *self.0.entry(key.to_owned()).or_default() += start.elapsed();
        r
    }

    pub fn get(&self, key: &str) -> Duration {
        self.0.get(key).copied().unwrap_or_default()
    }
}
