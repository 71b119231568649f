use crate::BuildConfig;

pub fn run() -> loadout_core::Result<()> {
    let schema = schemars::schema_for!(BuildConfig);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
