use crate::BuildConfig;
use loadout_core::assembler::{BuildOptions, DescriptorAssembler};
use loadout_core::resolve::ManifestResolver;
use loadout_core::serialize::JsonDescriptorSerializer;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub fn run(
    config_path: &Path,
    skip_class_check: bool,
    scan_timeout: Option<u64>,
    class_report: Option<PathBuf>,
) -> loadout_core::Result<()> {
    let config = BuildConfig::load(config_path)?;
    let resolver = ManifestResolver::from_path(&config.artifact_manifest)?;
    let serializer = JsonDescriptorSerializer;

    let mut options = BuildOptions {
        check_class_collisions: !skip_class_check,
        class_report_path: class_report,
        ..BuildOptions::default()
    };
    if let Some(seconds) = scan_timeout {
        options.scan_timeout = Duration::from_secs(seconds);
    }

    let mut assembler = DescriptorAssembler::new(&resolver, &serializer).with_options(options);
    let path = assembler.build(&config.component, &config.output_dir)?;
    info!(component = %config.component.name, "descriptor build finished");
    println!("{}", path.display());
    Ok(())
}
