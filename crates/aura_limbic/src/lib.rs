//! The limbic core: fast, non-verbal regulation of the agent's emotional
//! state. Two mechanisms mutate the per-user emotion vector:
//!
//! - [`drift::DriftEngine`] — autonomous, time-gated relaxation toward the
//!   baseline with stochastic noise (runs before every turn, catches up
//!   elapsed wall-clock time);
//! - [`reactive::ReactiveUpdater`] — conversation-driven deltas scored by
//!   the completion service (runs after each user message).

pub mod drift;
pub mod reactive;

pub use drift::{DriftConfig, DriftEngine, DriftParams, DriftState};
pub use reactive::{ReactiveUpdater, UpdateError};
