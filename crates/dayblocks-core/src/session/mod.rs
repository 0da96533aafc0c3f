mod model;
mod tracker;

pub use model::{Session, SessionId};
pub use tracker::{PendingEnd, ProvisionalSession, SessionTracker};
