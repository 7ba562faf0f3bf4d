use anyhow::{Result, bail};
use clap::Parser;
use log::{debug, info};
use opencv::core::{Mat, Point, Scalar};
use opencv::prelude::*;
use opencv::{highgui, imgproc, videoio};

use super::SubCommandExtend;
use crate::backend::opencv::{OpencvLoader, OrbExtractor};
use crate::backend::FeatureExtractor;
use crate::config::{LibraryOptions, MatchOptions, Opts, OrbOptions};
use crate::descriptor::OrbDescriptor;
use crate::library::ReferenceLibrary;
use crate::metrics;
use crate::scorer::score_frame;
use crate::utils::TimeMeasure;

const WINDOW_NAME: &str = "Brand Logo Detection";

#[derive(Parser, Debug, Clone)]
pub struct WebcamCommand {
    #[command(flatten)]
    pub library: LibraryOptions,
    #[command(flatten)]
    pub orb: OrbOptions,
    #[command(flatten)]
    pub matching: MatchOptions,
    /// 摄像头设备编号
    #[arg(short, long, default_value_t = 0)]
    pub device: i32,
}

impl SubCommandExtend for WebcamCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        let mut orb = OrbExtractor::create(&self.orb)?;
        let library = self.library.builder().build(&self.library.logos, &OpencvLoader, &mut orb)?;
        info!("共加载 {} 个 logo，开始摄像头检测", library.len());
        detect_loop(&library, &mut orb, &self.matching, self.device)
    }
}

/// 逐帧读取摄像头画面并标注检测结果，按 q 退出
pub fn detect_loop(
    library: &ReferenceLibrary<OrbDescriptor>,
    orb: &mut OrbExtractor,
    opts: &MatchOptions,
    device: i32,
) -> Result<()> {
    let mut cap = videoio::VideoCapture::new(device, videoio::CAP_ANY)?;
    if !cap.is_opened()? {
        bail!("无法打开摄像头 {}", device);
    }
    info!("摄像头已启动，按 q 退出");

    let mut frame = Mat::default();
    loop {
        if !cap.read(&mut frame)? {
            bail!("无法读取摄像头画面");
        }

        let mut tm = TimeMeasure::new();
        let descriptors = tm.measure("extract", || orb.extract_descriptors(&frame))?;
        let result = tm.measure("score", || score_frame(&descriptors, library, opts));
        let elapsed = tm.get("score").as_secs_f32();
        metrics::observe_frame(result.brand_name.as_deref(), result.confidence, elapsed);
        debug!("提取 {:?}，评分 {:?}", tm.get("extract"), tm.get("score"));

        if let Some(brand) = &result.brand_name {
            imgproc::put_text(
                &mut frame,
                &format!("Brand: {} ({}%)", brand, result.confidence),
                Point::new(30, 40),
                imgproc::FONT_HERSHEY_SIMPLEX,
                1.0,
                Scalar::new(0., 255., 0., 0.),
                3,
                imgproc::LINE_8,
                false,
            )?;
        }

        highgui::imshow(WINDOW_NAME, &frame)?;
        if highgui::wait_key(1)? & 0xFF == 'q' as i32 {
            break;
        }
    }

    cap.release()?;
    highgui::destroy_all_windows()?;
    Ok(())
}
