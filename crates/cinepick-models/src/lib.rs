pub mod movie;
pub mod detail;
pub mod progress;
pub mod run;

pub use movie::{DescriptionState, MovieRecord, LETTERBOXD_BASE_URL};
pub use movie::{DESCRIPTION_ERROR, NO_DESCRIPTION, PLACEHOLDER_DESCRIPTION};
pub use detail::DetailResult;
pub use progress::ProgressState;
pub use run::{RunKind, RunOutcome};
