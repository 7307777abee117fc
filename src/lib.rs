pub mod config;
pub mod corpus;
pub mod db;
pub mod error;
pub mod hospital;
pub mod models;
pub mod note;
pub mod stash;
pub mod write;

pub use corpus::Corpus;
pub use error::MimicError;
pub use hospital::HospitalAdmission;

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber writing to stderr. `RUST_LOG`
/// wins over `verbose` and the default filter.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "mimic=debug,mimic_lib=debug,warn"
    } else {
        config::default_log_filter()
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with_writer(std::io::stderr)
        .try_init();
}
