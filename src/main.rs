use forest_gen::cli::CliOptions;
use forest_gen::demo;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let options = CliOptions::from_env_args()?;
    log::info!(
        "forest-gen starting: mode {:?}, config {}",
        options.mode,
        options.config_path.display()
    );

    demo::run(&options)
}
