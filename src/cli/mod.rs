mod detect;
mod library;
#[cfg(feature = "opencv")]
mod webcam;

pub use detect::*;
pub use library::*;
#[cfg(feature = "opencv")]
pub use webcam::*;

use anyhow::Result;
use clap::ValueEnum;
use indicatif::ProgressBar;

use crate::backend::{FeatureExtractor, ImageLoader, NpyExtractor, NpyLoader};
use crate::config::{Backend, LibraryOptions, Opts, OrbOptions};
use crate::descriptor::OrbDescriptor;
use crate::library::LibraryBuilder;
use crate::utils::pb_style;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> Result<()>;
}

/// 需要图片解码与特征提取能力的任务，由 [`run_with_backend`] 注入具体后端
pub trait BackendTask {
    fn run_with<L, E>(&self, loader: &L, extractor: &mut E) -> Result<()>
    where
        L: ImageLoader,
        E: FeatureExtractor<Image = L::Image, Descriptor = OrbDescriptor>;
}

#[cfg_attr(not(feature = "opencv"), allow(unused_variables))]
pub fn run_with_backend(task: &impl BackendTask, backend: Backend, orb: &OrbOptions) -> Result<()> {
    match backend {
        Backend::Npy => task.run_with(&NpyLoader, &mut NpyExtractor),
        #[cfg(feature = "opencv")]
        Backend::Opencv => {
            use crate::backend::opencv::{OpencvLoader, OrbExtractor};
            task.run_with(&OpencvLoader, &mut OrbExtractor::create(orb)?)
        }
    }
}

impl LibraryOptions {
    pub fn builder(&self) -> LibraryBuilder {
        LibraryBuilder::new()
            .suffix(self.suffix.clone())
            .duplicate_policy(self.on_duplicate)
            .progress(ProgressBar::no_length().with_style(pb_style()))
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}
