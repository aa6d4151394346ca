//! Run configuration loaded from environment variables.
//!
//! Command-line flags override these values; anything not given on the
//! command line falls back to the environment, then to the defaults below.
//!
//! | Variable                       | Default | Description                                 |
//! |--------------------------------|---------|---------------------------------------------|
//! | `CONNECTOME_LOG`               | `info`  | tracing filter (read by the binary)         |
//! | `CONNECTOME_SEED`              | `888`   | base seed of the trial streams              |
//! | `CONNECTOME_N_INIT`            | `100`   | trajectories per source                     |
//! | `CONNECTOME_PARALLEL`          | off     | run trials / tree levels on the rayon pool  |
//! | `CONNECTOME_COLLECT_PATHS`     | `none`  | `none` \| `successful` \| `all`             |
//! | `CONNECTOME_MIN_SPLIT_SAMPLES` | `5`     | nodes at or below this size are not split   |
//! | `CONNECTOME_MAX_DEPTH`         | unset   | cap on tree depth                           |

use connectome_cluster::DivisiveConfig;
use connectome_traverse::DispatchConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub dispatch: DispatchConfig,
    pub divisive: DivisiveConfig,
    /// Trajectories per source node.
    pub n_init:   usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            dispatch: DispatchConfig::from_env(),
            divisive: DivisiveConfig::from_env(),
            n_init:   env_parse("CONNECTOME_N_INIT", 100),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            divisive: DivisiveConfig::default(),
            n_init:   100,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
