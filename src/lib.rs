pub mod batch;
pub mod commands;
pub mod config;
pub mod pipeline;

pub use batch::BatchExecutor;
pub use commands::RequestError;
pub use config::ReaderConfig;
pub use pipeline::MapReader;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "map_reader_lib=debug,map_vision=debug,map_capture=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
