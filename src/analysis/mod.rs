//! Detection and decision engine
//!
//! heuristic -> (gated) classifier -> policy -> dispatcher, one item at a time.

pub mod classifier;
pub mod dispatcher;
pub mod heuristic;
pub mod policy;
pub mod record;

pub use classifier::{BlackFrameClassifier, ClassifyError, ImageCrateDecoder, ThumbnailDecoder};
pub use dispatcher::dispatch;
pub use heuristic::is_suspicious;
pub use policy::{decide, should_classify, Outcome};
pub use record::{ActionResult, BlackCheck, ClassificationResult, DecisionRecord};
