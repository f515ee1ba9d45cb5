//! Demo-binary configuration: the environment/config values consumed by
//! the core, collected into one `clap`-derived struct rather than read
//! from the environment directly — the library crates
//! themselves take plain constructor arguments (paths, `usize`s), matching
//! how every teacher crate except `cuenv-cache`'s `cache_root()` resolution
//! takes explicit config rather than reaching into the environment itself.

use clap::Args;
use std::path::PathBuf;

/// Flags shared by every subcommand: where persisted state lives, and the
/// knobs that shape cache-key computation and worker concurrency.
///
/// `template_dir` has no field here: `kiln-server`
/// renders its HTML directly rather than through a templating engine (see
/// its own module docs), so there is no template root to configure.
#[derive(Args, Debug, Clone)]
pub struct OrchestratorConfig {
    /// Root of the demo target tree: each target id names a subdirectory
    /// under this path whose files are hashed as its sources.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Directory run-info and reports are written under.
    #[arg(long, global = true, default_value = ".kiln/info")]
    pub info_dir: PathBuf,

    /// Directory the build invalidator's persisted store lives in. Left
    /// unset, the invalidator falls back to its own environment-resolved
    /// default (`kiln-invalidator`'s `discover_root`), the one place in
    /// this core that mirrors `cuenv-cache`'s env-first resolution rather
    /// than requiring an explicit caller value.
    #[arg(long, global = true)]
    pub build_invalidator_dir: Option<PathBuf>,

    /// Directory of static assets `kiln-server`'s `/assets/` route serves.
    #[arg(long, global = true, default_value = ".kiln/assets")]
    pub assets_dir: PathBuf,

    /// Client IPs allowed to reach the reporting server, or `ALL`.
    #[arg(long, global = true, value_delimiter = ',', default_value = "127.0.0.1")]
    pub allowed_clients: Vec<String>,

    /// Worker-pool concurrency.
    #[arg(long, global = true, default_value_t = 4)]
    pub num_workers: usize,

    /// Target-count hint for partitioning versioned target sets; unset
    /// means one partition per target.
    #[arg(long, global = true)]
    pub partition_size_hint: Option<usize>,

    /// Fold dependency hashes into each target's cache key transitively,
    /// rather than keying each target on its own sources only.
    #[arg(long, global = true)]
    pub invalidate_dependents: bool,

    /// Path to a file whose bytes are folded into every cache key as
    /// opaque extra data (e.g. a compiler version stamp). Unset means no
    /// extra data.
    #[arg(long, global = true)]
    pub extra_data: Option<PathBuf>,
}
