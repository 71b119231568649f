use crate::BuildConfig;
use loadout_core::assembler::{BuildOptions, DescriptorAssembler};
use loadout_core::resolve::ManifestResolver;
use loadout_core::serialize::NullDescriptorSerializer;
use std::path::Path;

pub fn run(config_path: &Path, skip_class_check: bool) -> loadout_core::Result<()> {
    let config = BuildConfig::load(config_path)?;
    let resolver = ManifestResolver::from_path(&config.artifact_manifest)?;
    let serializer = NullDescriptorSerializer;

    let options = BuildOptions {
        check_class_collisions: !skip_class_check,
        ..BuildOptions::default()
    };
    let mut assembler = DescriptorAssembler::new(&resolver, &serializer).with_options(options);
    assembler.build(&config.component, &config.output_dir)?;
    println!("{} {} is consistent", config.component.name, config.component.version);
    Ok(())
}
