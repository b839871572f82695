//! Engine configuration that downstream crates can serialize/deserialize.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelConfig {
    /// Records of one group kept in memory by the replay cache before the
    /// rest spills to a scratch file.
    pub cache_limit: usize,

    /// Directory for scratch files. `None` means the system temp dir.
    pub tmp_dir: Option<PathBuf>,

    /// The sort utility. Always run with `LC_ALL=C`.
    pub sort_program: String,

    /// Passed to the sort utility as `--buffer-size`.
    pub sort_buffer_size: Option<String>,

    /// Capacity of buffered readers over inputs and scratch files.
    pub read_buffer_bytes: usize,

    /// Compression of cache spill files: `none`, `zstd` or `lz4`.
    pub spill_codec: String,
}

impl Default for RelConfig {
    fn default() -> Self {
        Self {
            cache_limit: 10_000,
            tmp_dir: None,
            sort_program: "sort".to_string(),
            sort_buffer_size: None,
            read_buffer_bytes: 64 * 1024,
            spill_codec: "none".to_string(),
        }
    }
}

impl RelConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `RELTOOLS_CACHE_LIMIT`: in-memory records per cached group
    /// - `RELTOOLS_TMP_DIR`: scratch directory
    /// - `RELTOOLS_SORT`: sort program
    /// - `RELTOOLS_SORT_BUFFER_SIZE`: sort `--buffer-size`
    /// - `RELTOOLS_READ_BUFFER_BYTES`: reader buffer capacity
    /// - `RELTOOLS_SPILL_CODEC`: spill compression (`none`, `zstd`, `lz4`)
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("RELTOOLS_CACHE_LIMIT") {
            if let Ok(v) = s.parse::<usize>() {
                if v > 0 {
                    cfg.cache_limit = v;
                }
            }
        }

        if let Ok(s) = std::env::var("RELTOOLS_TMP_DIR") {
            if !s.is_empty() {
                cfg.tmp_dir = Some(PathBuf::from(s));
            }
        }

        if let Ok(s) = std::env::var("RELTOOLS_SORT") {
            if !s.is_empty() {
                cfg.sort_program = s;
            }
        }

        if let Ok(s) = std::env::var("RELTOOLS_SORT_BUFFER_SIZE") {
            if !s.is_empty() {
                cfg.sort_buffer_size = Some(s);
            }
        }

        if let Ok(s) = std::env::var("RELTOOLS_READ_BUFFER_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                if v > 0 {
                    cfg.read_buffer_bytes = v;
                }
            }
        }

        if let Ok(s) = std::env::var("RELTOOLS_SPILL_CODEC") {
            if !s.is_empty() {
                cfg.spill_codec = s;
            }
        }

        cfg
    }

    /// Scratch directory actually in effect.
    pub fn scratch_dir(&self) -> PathBuf {
        self.tmp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// One-line JSON rendering for diagnostics.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
