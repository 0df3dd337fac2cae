pub mod bounds;
pub mod consistency;
pub mod data;
pub mod element;
pub mod invalidation;
pub mod scale;
pub mod signal;
pub mod time_scale;

pub use bounds::{Bounds, Orientation, Padding, SizeSpec};
pub use consistency::{ConsistencyState, ConsistencyStates, Signal, Signals};
pub use data::{DataSource, Row, TableDataSource};
pub use element::{Boundable, Drawable, ElementState};
pub use invalidation::{Invalidatable, InvalidationState, resume_all, suspend_all};
pub use scale::{LinearScale, OrdinalScale, Scale, ScaleKind};
pub use signal::{ListenerId, SignalEvent, SignalListener, SignalQueue};
pub use time_scale::{DateTimeScale, TimeTick, TimeUnit};
