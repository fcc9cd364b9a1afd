pub mod bss;
pub mod dump;
mod error;
pub mod link;
mod plan_loader;

#[cfg(test)]
mod dump_tests;
#[cfg(test)]
mod link_tests;
#[cfg(test)]
mod test_utils;

pub use error::CliError;

/// Print the command output, or the error and exit with status 1.
fn finish(result: Result<String, CliError>) {
    match result {
        Ok(out) => print!("{out}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
