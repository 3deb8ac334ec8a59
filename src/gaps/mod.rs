mod loader;
mod pipeline;
mod registry;
mod resolver;
mod rewrite;
mod synth;

pub use loader::{load_paths, parse_path_line, path_gaps, read_paths, ScaffoldPath};
pub use pipeline::fill_gaps;
pub use registry::{GapConstraint, GapRegistry, GapResolution};
pub use resolver::{GapOutcome, GapResolver, GapStats, ResolverParams};
pub use rewrite::{rewrite_path, write_paths, SeenContigs};
pub use synth::{ContigSynthesizer, NewContigRecord, PendingGraphEdits};
