mod misc;
mod recorder;

pub use misc::*;
pub use recorder::{CONFIG_FILE, DOE_FILE, DOE_INITIAL_FILE};
pub(crate) use recorder::{write_config, write_doe};
