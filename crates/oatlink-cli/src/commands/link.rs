use std::path::PathBuf;

use oatlink_core::{Colors, PointerSize};
use oatlink_linker::{IsaKind, link, render_report};
use tracing::info;

use super::plan_loader::load_plan;
use super::{CliError, finish};

pub struct LinkArgs {
    pub plan_path: PathBuf,
    pub output: Option<PathBuf>,
    pub isa: Option<IsaKind>,
    pub alignment: Option<u32>,
    pub pointer_size: Option<PointerSize>,
    pub report: bool,
    pub color: bool,
}

pub fn run(args: LinkArgs) {
    finish(execute(&args));
}

/// Link the plan, write the image if asked, and return the report text.
///
/// Without an output file the report is always produced.
pub fn execute(args: &LinkArgs) -> Result<String, CliError> {
    let mut plan = load_plan(&args.plan_path)?;
    if let Some(isa) = args.isa {
        plan.isa = isa;
    }
    if let Some(pointer_size) = args.pointer_size {
        plan.pointer_size = pointer_size;
    }
    let mut config = plan.config();
    if let Some(alignment) = args.alignment {
        config = config.code_alignment(alignment);
    }

    let linked = link(&plan, plan.synthetic_isa(), config)?;
    info!(
        methods = linked.methods.len(),
        thunks = linked.thunks.len(),
        size = linked.code.len(),
        "linked"
    );

    if let Some(path) = &args.output {
        let image = linked.to_image();
        std::fs::write(path, &image).map_err(|source| CliError::Write {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), size = image.len(), "wrote image");
    }

    if args.report || args.output.is_none() {
        Ok(render_report(&linked, Colors::new(args.color)))
    } else {
        Ok(String::new())
    }
}
