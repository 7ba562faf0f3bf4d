use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use serde::Serialize;

use super::{BackendTask, OutputFormat, SubCommandExtend, run_with_backend};
use crate::backend::{FeatureExtractor, ImageLoader};
use crate::config::{LibraryOptions, MatchOptions, Opts, OrbOptions};
use crate::descriptor::OrbDescriptor;
use crate::metrics;
use crate::scorer::{FrameMatchResult, LogoScore, score_logos, select_best};
use crate::utils::TimeMeasure;

#[derive(Parser, Debug, Clone)]
pub struct DetectCommand {
    #[command(flatten)]
    pub library: LibraryOptions,
    #[command(flatten)]
    pub orb: OrbOptions,
    #[command(flatten)]
    pub matching: MatchOptions,
    /// 需要检测的帧，与 logo 使用相同的后端解码
    #[arg(required = true)]
    pub frames: Vec<PathBuf>,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t)]
    pub output_format: OutputFormat,
    /// 同时输出每个 logo 的匹配数量和置信度
    #[arg(long)]
    pub verbose_scores: bool,
    /// 结束后将统计指标输出到 stderr
    #[arg(long)]
    pub metrics: bool,
}

#[derive(Serialize, Debug)]
struct FrameReport {
    frame: String,
    #[serde(flatten)]
    result: FrameMatchResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    scores: Option<Vec<LogoScore>>,
}

impl SubCommandExtend for DetectCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        run_with_backend(self, self.library.backend, &self.orb)?;
        if self.metrics {
            eprint!("{}", metrics::gather_text()?);
        }
        Ok(())
    }
}

impl BackendTask for DetectCommand {
    fn run_with<L, E>(&self, loader: &L, extractor: &mut E) -> Result<()>
    where
        L: ImageLoader,
        E: FeatureExtractor<Image = L::Image, Descriptor = OrbDescriptor>,
    {
        let library = self.library.builder().build(&self.library.logos, loader, extractor)?;
        info!("共加载 {} 个 logo", library.len());

        let mut reports = vec![];
        for frame in &self.frames {
            let mut tm = TimeMeasure::new();
            let image = tm
                .measure("load", || loader.load_image(frame))
                .with_context(|| format!("无法加载帧 {}", frame.display()))?;
            let descriptors = tm
                .measure("extract", || extractor.extract_descriptors(&image))
                .with_context(|| format!("无法提取帧 {} 的特征", frame.display()))?;

            let start = Instant::now();
            let scores = score_logos(&descriptors, &library, &self.matching);
            let result = select_best(&scores, &self.matching);
            let elapsed = start.elapsed().as_secs_f32();
            metrics::observe_frame(result.brand_name.as_deref(), result.confidence, elapsed);

            debug!(
                "{}: {} 个特征点，加载 {:?}，提取 {:?}，评分 {:.2}ms",
                frame.display(),
                descriptors.len(),
                tm.get("load"),
                tm.get("extract"),
                elapsed * 1000.
            );

            reports.push(FrameReport {
                frame: frame.display().to_string(),
                result,
                scores: self.verbose_scores.then_some(scores),
            });
        }

        print_reports(&reports, self.output_format)
    }
}

fn print_reports(reports: &[FrameReport], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(reports)?)
        }
        OutputFormat::Table => {
            for report in reports {
                let brand = report.result.brand_name.as_deref().unwrap_or("-");
                println!("{}\t{}\t{}", report.frame, brand, report.result.confidence);
                for score in report.scores.iter().flatten() {
                    println!("\t{}\t{}\t{}", score.brand_name, score.good_matches, score.confidence);
                }
            }
        }
    }
    Ok(())
}
