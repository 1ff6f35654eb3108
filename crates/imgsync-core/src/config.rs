//! Run mode: the per-run switches the reconciler reads

use imgsync_common::{ImgsyncError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_TARGET_WIDTH: u32 = 1200;
pub const DEFAULT_TARGET_HEIGHT: u32 = 800;
pub const DEFAULT_DRY_RUN: bool = true;
pub const DEFAULT_TEST_MODE: bool = false;
pub const DEFAULT_TEST_ROWS: usize = 5;
pub const DEFAULT_DEBUG_SAVE: bool = false;
pub const DEFAULT_DEBUG_DIR: &str = "debug_images";

/// Fixed for the duration of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMode {
    pub dry_run: bool,
    pub test_mode: bool,
    pub test_row_limit: usize,
    pub target_width: u32,
    pub target_height: u32,
    pub debug_save: bool,
    pub debug_dir: PathBuf,
}

impl Default for RunMode {
    fn default() -> Self {
        Self {
            dry_run: DEFAULT_DRY_RUN,
            test_mode: DEFAULT_TEST_MODE,
            test_row_limit: DEFAULT_TEST_ROWS,
            target_width: DEFAULT_TARGET_WIDTH,
            target_height: DEFAULT_TARGET_HEIGHT,
            debug_save: DEFAULT_DEBUG_SAVE,
            debug_dir: PathBuf::from(DEFAULT_DEBUG_DIR),
        }
    }
}

impl RunMode {
    /// Number of leading rows to process, if bounded
    pub fn row_limit(&self) -> Option<usize> {
        self.test_mode.then_some(self.test_row_limit)
    }

    /// A real run over the whole table
    pub fn is_production(&self) -> bool {
        !self.dry_run && !self.test_mode
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(ImgsyncError::config(format!(
                "target size must be positive, got {}x{}",
                self.target_width, self.target_height
            )));
        }
        if self.test_mode && self.test_row_limit == 0 {
            return Err(ImgsyncError::config("test row count must be positive"));
        }
        if self.debug_save && self.debug_dir.as_os_str().is_empty() {
            return Err(ImgsyncError::config("debug directory must not be empty"));
        }
        Ok(())
    }
}
