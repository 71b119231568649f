use clap::Parser;
use loadout_cli::Cli;

fn main() {
    let cli = Cli::parse();
    let _guard = loadout_core::logging::init_logging("cli", false);

    if let Err(err) = loadout_cli::run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
