mod cli;
mod commands;
mod logging;

use cli::{BssParams, DumpParams, LinkParams, build_cli};

fn main() {
    let matches = build_cli().get_matches();
    let Some((name, m)) = matches.subcommand() else {
        unreachable!("clap should have caught this")
    };
    logging::init(m.get_count("verbose"));

    match name {
        "link" => {
            let params = LinkParams::from_matches(m);
            commands::link::run(params.into());
        }
        "bss" => {
            let params = BssParams::from_matches(m);
            commands::bss::run(params.into());
        }
        "dump" => {
            let params = DumpParams::from_matches(m);
            commands::dump::run(params.into());
        }
        _ => unreachable!("clap should have caught this"),
    }
}
