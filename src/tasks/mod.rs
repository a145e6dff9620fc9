pub mod capture_timer;
pub mod simulate;
pub mod viewer;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::config::Configuration;
use crate::frame::{self, Frame};

/// Picture woven before the first capture.
pub(crate) fn initial_source(cfg: &Configuration) -> Frame {
    let Some(path) = cfg.placeholder_path.as_ref() else {
        return frame::placeholder();
    };
    match Frame::open(path) {
        Ok(frame) => {
            info!(path = %path.display(), "loaded placeholder image");
            frame
        }
        Err(err) => {
            warn!(error = %err, "falling back to the striped placeholder");
            frame::placeholder()
        }
    }
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
