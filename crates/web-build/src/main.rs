use std::sync::Arc;

use tracing::{error, info};
use web_build::{BuildOptions, Bundler, Mode, configurations, init_logging, run_batch, run_watch};

#[tokio::main]
async fn main() {
    init_logging();

    let mode = Mode::from_args(std::env::args().skip(1));
    let options = BuildOptions::default();
    let configs = configurations(&options, mode);

    info!(name: "build", "Output directory: {}", options.output_dir().display());

    match mode {
        Mode::Batch => {
            if let Err(err) = run_batch(&Bundler, &configs).await {
                error!(name: "build", "{}", err);
                std::process::exit(1);
            }
        }
        Mode::Watch => {
            if let Err(err) = run_watch(Arc::new(Bundler), configs.to_vec()).await {
                error!(name: "watch", "{}", err);
                std::process::exit(1);
            }
        }
    }
}
