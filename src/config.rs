use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::*;

/// 比率测试阈值：最近邻距离必须明显小于次近邻距离
pub const RATIO_THRESHOLD: f32 = 0.70;
/// 最近邻距离的绝对上限
pub const MAX_DISTANCE: f32 = 40.0;
/// 置信度归一化除数，达到这个匹配数量时置信度为 100
pub const CONFIDENCE_DIVISOR: u32 = 50;
/// 成为候选 logo 所需的最少匹配数量
pub const CANDIDATE_FLOOR: usize = 30;
/// 报告检测结果所需的最低置信度
pub const REPORT_FLOOR: u8 = 40;

#[derive(Parser, Debug, Clone)]
#[command(name = "logomatch", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 加载 logo 目录并列出提取到的特征点数量
    Library(LibraryCommand),
    /// 对若干帧进行 logo 检测
    Detect(DetectCommand),
    /// 从摄像头实时检测 logo
    #[cfg(feature = "opencv")]
    Webcam(WebcamCommand),
}

#[derive(Parser, Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    /// KNN 比率测试阈值
    #[arg(long, value_name = "RATIO", default_value_t = RATIO_THRESHOLD)]
    pub ratio: f32,
    /// 最近邻允许的最大距离
    #[arg(long, value_name = "N", default_value_t = MAX_DISTANCE)]
    pub max_distance: f32,
    /// 置信度归一化除数
    #[arg(long, value_name = "N", default_value_t = CONFIDENCE_DIVISOR, value_parser = clap::value_parser!(u32).range(1..))]
    pub confidence_divisor: u32,
    /// 成为候选 logo 所需的最少匹配数量
    #[arg(long, value_name = "N", default_value_t = CANDIDATE_FLOOR)]
    pub candidate_floor: usize,
    /// 报告检测结果所需的最低置信度（0 ~ 100）
    #[arg(long, value_name = "PERCENT", default_value_t = REPORT_FLOOR, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub report_floor: u8,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            ratio: RATIO_THRESHOLD,
            max_distance: MAX_DISTANCE,
            confidence_divisor: CONFIDENCE_DIVISOR,
            candidate_floor: CANDIDATE_FLOOR,
            report_floor: REPORT_FLOOR,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct OrbOptions {
    /// ORB 特征点最大保留数量
    #[arg(short = 'n', value_name = "N", long, default_value_t = 4000)]
    pub orb_nfeatures: u32,
    /// ORB 特征金字塔缩放因子
    #[arg(long, value_name = "SCALE", default_value_t = 1.1)]
    pub orb_scale_factor: f32,
    /// ORB 特征金字塔层数
    #[arg(long, value_name = "N", default_value_t = 12)]
    pub orb_nlevels: u32,
    /// ORB FAST 角点检测器阈值
    #[arg(long, value_name = "THRESHOLD", default_value_t = 20)]
    pub orb_fast_threshold: u32,
}

impl Default for OrbOptions {
    fn default() -> Self {
        Self { orb_nfeatures: 4000, orb_scale_factor: 1.1, orb_nlevels: 12, orb_fast_threshold: 20 }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct LibraryOptions {
    /// logo 图片所在目录，文件名（第一个 `.` 之前的部分）即品牌名
    #[arg(short, long, value_name = "DIR", default_value = "logos")]
    pub logos: PathBuf,
    /// 扫描的文件后缀名，多个后缀用逗号分隔，默认由后端决定
    #[arg(short, long)]
    pub suffix: Option<String>,
    /// 图片解码与特征提取后端
    #[arg(short, long, value_enum, default_value_t)]
    pub backend: Backend,
    /// 多个文件对应同一个品牌名时的处理方式
    #[arg(long, value_enum, default_value_t)]
    pub on_duplicate: DuplicatePolicy,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// `.npy` 描述符文件，形状为 (n, 32) 的 u8 数组
    Npy,
    /// OpenCV 解码图片并提取 ORB 特征
    #[cfg(feature = "opencv")]
    Opencv,
}

impl Default for Backend {
    fn default() -> Self {
        #[cfg(feature = "opencv")]
        return Self::Opencv;
        #[cfg(not(feature = "opencv"))]
        return Self::Npy;
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// 警告并用后加载的 logo 覆盖先前的记录
    #[default]
    Overwrite,
    /// 警告并保留先加载的记录
    Reject,
    /// 为后加载的 logo 添加数字后缀，如 `brand_2`
    Suffix,
}
