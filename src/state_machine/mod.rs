mod run;
mod state;

pub use run::{FailureKind, Route, Run, RunReport, RunStatus, StageOutcome};
pub use state::{Stage, StateMachine, Transition};
