use std::path::PathBuf;

use oatlink_core::Colors;
use oatlink_format::{Image, dump};

use super::{CliError, finish};

pub struct DumpArgs {
    pub image_path: PathBuf,
    pub color: bool,
}

pub fn run(args: DumpArgs) {
    finish(execute(&args));
}

pub fn execute(args: &DumpArgs) -> Result<String, CliError> {
    let image = Image::from_path(&args.image_path).map_err(|source| CliError::Image {
        path: args.image_path.clone(),
        source,
    })?;
    Ok(dump(&image, Colors::new(args.color)))
}
