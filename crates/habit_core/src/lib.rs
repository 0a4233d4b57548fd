pub mod analytics;
pub mod date_index;
pub mod error;
pub mod history;
pub mod month_window;
pub mod persist;
pub mod registry;
pub mod report;
pub mod session;
pub mod undo;

pub use crate::analytics::{AnalyticsEngine, StatsSnapshot};
pub use crate::error::{HabitError, Result};
pub use crate::month_window::MonthSlice;
pub use crate::persist::{PersistedState, StoredState};
pub use crate::session::Session;
