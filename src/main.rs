use log::debug;

use crate::shell::Shell;
use crate::utils::config::Config;
use crate::utils::log::init_logger;
use crate::utils::theme::load_theme;

mod shell;
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::new();
    init_logger(&config)?;
    debug!("config loaded from {}", config.config_dir.display());
    let theme = load_theme(&config.theme);

    let mut shell = Shell::new(&config, theme)?;
    shell.run()
}
