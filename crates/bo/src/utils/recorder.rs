use crate::config::BoConfig;
use crate::errors::Result;

use log::debug;
use ndarray::{concatenate, Array2, Axis};
use ndarray_npy::write_npy;
use std::path::Path;

/// Json filename for configuration
pub const CONFIG_FILE: &str = "seqbo_config.json";
/// Numpy filename for the dataset after the initial design evaluation
pub const DOE_INITIAL_FILE: &str = "seqbo_initial_doe.npy";
/// Numpy filename for the dataset after the last evaluation
pub const DOE_FILE: &str = "seqbo_doe.npy";

pub(crate) fn write_config(outdir: &str, config: &BoConfig) -> Result<()> {
    std::fs::create_dir_all(outdir)?;
    let filepath = Path::new(outdir).join(CONFIG_FILE);
    let json = serde_json::to_string(config)?;
    std::fs::write(filepath, json)?;
    Ok(())
}

/// Save `[x | y]` as a numpy array in `outdir/filename`
pub(crate) fn write_doe(outdir: &str, filename: &str, x: &Array2<f64>, y: &Array2<f64>) -> Result<()> {
    std::fs::create_dir_all(outdir)?;
    let filepath = Path::new(outdir).join(filename);
    debug!("Save doe {:?} in {:?}", x.dim(), filepath);
    let doe = concatenate![Axis(1), x.view(), y.view()];
    write_npy(filepath, &doe)?;
    Ok(())
}
