use anyhow::Context;
use log::info;

use atelier::{
    config::{ConfiguratorConfig, RuntimeFlags},
    ConfiguratorApp,
};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let flags = RuntimeFlags::from_args(std::env::args().skip(1));
    let config = match &flags.config_path {
        Some(path) => ConfiguratorConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ConfiguratorConfig::default(),
    };
    if flags.debug {
        info!("Debug mode enabled");
    }

    ConfiguratorApp::new(config, &flags)?.run()
}
