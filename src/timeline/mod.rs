//! Timeline construction: segment synthesis, assembly and the build pipeline.

pub mod assembler;
pub mod builder;
pub mod synthesizer;
pub mod types;

pub use assembler::assemble;
pub use builder::TimelineBuilder;
pub use synthesizer::SegmentSynthesizer;
pub use types::{MarkKind, Timeline, TimingMark};
