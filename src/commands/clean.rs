use capref::build::{Builder, base_path_from_config};
use capref::config::{RootConfig, resolve_config_path};

use crate::CleanArgs;

pub fn run(args: &CleanArgs) -> Result<(), anyhow::Error> {
    let config_path = resolve_config_path(args.config_file.as_deref())?;
    let config = RootConfig::load_from_file(&config_path)?;
    let base_path = base_path_from_config(&config_path);

    let site_path = Builder::new(config, base_path).output_dir();
    if !site_path.exists() {
        tracing::info!(path = %site_path.display(), "nothing to clean");
        return Ok(());
    }

    if args.dry_run {
        println!("Would delete {}", site_path.display());
    } else {
        std::fs::remove_dir_all(&site_path)?;
        println!("Deleted {}", site_path.display());
    }

    Ok(())
}
