pub mod extraction;
pub mod loaders;
pub mod unit;
pub mod verdict;

pub use extraction::{BackFields, ExtractionResult, FrontFields, Gender, SideHint};
pub use loaders::load_uploads_from_dir;
pub use unit::{BatchReport, BatchSummary, LogicalUnit, RawUpload, UnitImage, UnitOutcome, UnitSpec};
pub use verdict::{ImageCandidate, RecommendedSide, ValidationVerdict};
