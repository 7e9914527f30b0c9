pub mod batch_matcher;
pub mod failure_writer;
pub mod field_validator;
pub mod recognition_gateway;
pub mod rules;
pub mod side_classifier;

pub use batch_matcher::{BatchMatcher, MatchSelection};
pub use failure_writer::FailureWriter;
pub use field_validator::FieldValidator;
pub use recognition_gateway::RecognitionGateway;
pub use rules::BackRuleTable;
pub use side_classifier::SideClassifier;
