pub mod logger;
pub mod operations;
pub mod scene;
pub mod session;
pub mod timeline;

pub use logger::{DomainLogger, DynLogger, FileLogger};
pub use operations::{
    Agent, DurationMeasurer, HumanStrategy, Measurement, Operation, OperationStrategy,
    OperationSynthesizer, RobotStrategy,
};
pub use scene::{
    apply_layout, CompositeHandle, ItemPose, Layout, ObjectHandle, OperationHandle, Pose,
    SimulationBackend, Vec3,
};
pub use session::{AssignmentSequence, Identifiers, SessionParameters, SessionPhase, SessionState};
pub use timeline::{AssemblyPlan, CompositeSchedule, Interval, TimelineAssembler};
