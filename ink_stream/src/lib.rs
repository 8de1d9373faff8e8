//! Incremental stroke pipeline
//!
//! Live pointer samples, including predicted samples and later corrections,
//! flow through a chain of stages that each keep their own state and report
//! what changed:
//!
//! ```text
//! events -> paths -> polylines -> simplify -> smooth -> curves -> styles
//! ```
//!
//! The final state of every stage does not depend on how the samples were
//! split into batches.

pub mod attributes;
pub mod bezier_stream;
pub mod config;
pub mod error;
pub mod event;
pub mod event_stream;
pub mod filters;
pub mod index_range;
pub mod path_stream;
pub mod pipeline;
pub mod polyline;
pub mod polyline_stream;
pub mod replay;
pub mod simple_event;
pub mod smoothers;
pub mod stream;
pub mod svg;
pub mod touch_path;

pub use attributes::{AttributesStream, StyledOutput};
pub use bezier_stream::{BezierStream, Curve, CurveOutput};
pub use config::{PipelineConfig, SimplifyConfig, SmootherKind, SmoothingConfig};
pub use error::{Error, Result};
pub use event::{DrawEvent, Phase, ToolEvent, ToolStyle, TouchEvent, TouchProperties, TouchType};
pub use event_stream::TouchEventStream;
pub use filters::{DouglasPeucker, NaiveSavitzkyGolay, SavitzkyGolay, SimplifyMethod};
pub use index_range::IndexRange;
pub use path_stream::{PathOutput, TouchPathStream};
pub use pipeline::Pipeline;
pub use polyline::{Polyline, PolylinePoint};
pub use polyline_stream::{PolylineOutput, PolylineStream};
pub use replay::{ReplayCase, ReplayReport, ReplayRunner};
pub use simple_event::{to_touch_events, SimpleEvent};
pub use smoothers::{AntigrainSmoother, CurveElement, LineSmoother, Smoother};
pub use stream::{Consumer, Consumers, Delta, Output, Stream};
pub use touch_path::{PathPoint, TouchPath};
