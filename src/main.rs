use anyhow::Result;
use clap::Parser;

use logomatch::Opts;
use logomatch::cli::SubCommandExtend;
use logomatch::config::SubCommand;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();

    match &opts.subcmd {
        SubCommand::Library(config) => config.run(&opts),
        SubCommand::Detect(config) => config.run(&opts),
        #[cfg(feature = "opencv")]
        SubCommand::Webcam(config) => config.run(&opts),
    }
}
