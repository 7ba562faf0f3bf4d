use anyhow::Result;
use clap::Parser;
use log::info;
use serde_json::json;

use super::{BackendTask, OutputFormat, SubCommandExtend, run_with_backend};
use crate::backend::{FeatureExtractor, ImageLoader};
use crate::config::{LibraryOptions, Opts, OrbOptions};
use crate::descriptor::OrbDescriptor;

#[derive(Parser, Debug, Clone)]
pub struct LibraryCommand {
    #[command(flatten)]
    pub library: LibraryOptions,
    #[command(flatten)]
    pub orb: OrbOptions,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for LibraryCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        run_with_backend(self, self.library.backend, &self.orb)
    }
}

impl BackendTask for LibraryCommand {
    fn run_with<L, E>(&self, loader: &L, extractor: &mut E) -> Result<()>
    where
        L: ImageLoader,
        E: FeatureExtractor<Image = L::Image, Descriptor = OrbDescriptor>,
    {
        let library = self.library.builder().build(&self.library.logos, loader, extractor)?;
        info!("共加载 {} 个 logo，{} 个特征点", library.len(), library.total_descriptors());

        match self.output_format {
            OutputFormat::Json => {
                let logos = library
                    .iter()
                    .map(|logo| {
                        json!({ "brand_name": logo.brand_name, "descriptors": logo.descriptors.len() })
                    })
                    .collect::<Vec<_>>();
                println!("{}", serde_json::to_string_pretty(&logos)?);
            }
            OutputFormat::Table => {
                for logo in &library {
                    println!("{}\t{}", logo.brand_name, logo.descriptors.len());
                }
            }
        }
        Ok(())
    }
}
