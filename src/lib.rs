pub mod backend;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod hamming;
pub mod library;
pub mod matcher;
mod metrics;
pub mod scorer;
pub mod utils;

pub use config::{MatchOptions, Opts};
pub use descriptor::{Descriptor, OrbDescriptor};
pub use library::{LibraryBuilder, LogoRecord, ReferenceLibrary, build_library};
pub use matcher::{Correspondence, RatioMatcher};
pub use scorer::{FrameMatchResult, LogoScore, score_frame};
