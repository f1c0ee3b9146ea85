use capref::build::{Builder, base_path_from_config};
use capref::config::{RootConfig, resolve_config_path};

use crate::BuildArgs;

pub fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let config_path = resolve_config_path(args.config_file.as_deref())?;
    let config = RootConfig::load_from_file(&config_path)?;

    // Relative paths in the config are relative to the config file
    let base_path = base_path_from_config(&config_path);

    let builder = Builder::new(config, base_path);
    let result = builder.build()?;

    println!(
        "Built site to {} ({} documents, {} static files, {} reference targets)",
        result.output_dir.display(),
        result.documents,
        result.static_files,
        result.reference_targets
    );

    Ok(())
}
