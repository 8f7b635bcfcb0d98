pub mod error;
pub mod metric;
pub mod observation;

pub use error::PipelineError;
pub use metric::{MetricPoint, ShapeError, metric_path, sanitize, shape};
pub use observation::SpotPriceObservation;
