use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{Directive, LevelFilter};

/// Install the global fmt subscriber. Called once by the binary; the library
/// itself only emits events.
///
/// `RUST_LOG` takes precedence over the default `octopus_consumption=info`.
pub fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(default_directive())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn default_directive() -> Directive {
    "octopus_consumption=info"
        .parse()
        .unwrap_or_else(|_| LevelFilter::INFO.into())
}
