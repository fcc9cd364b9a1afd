use std::fmt::Write as _;
use std::path::PathBuf;

use oatlink_core::{Colors, PointerSize};
use oatlink_format::{MethodBssMappingView, dump_bss_mapping, encode_bss_mapping};
use oatlink_linker::bss::MethodBssLayout;

use super::plan_loader::load_plan;
use super::{CliError, finish};

pub struct BssArgs {
    pub plan_path: PathBuf,
    pub pointer_size: Option<PointerSize>,
    pub color: bool,
}

pub fn run(args: BssArgs) {
    finish(execute(&args));
}

/// Lay out the plan's bss slots and list the encoded mapping of every dex file.
pub fn execute(args: &BssArgs) -> Result<String, CliError> {
    let plan = load_plan(&args.plan_path)?;
    let pointer_size = args.pointer_size.unwrap_or(plan.pointer_size);
    let layout = MethodBssLayout::new(plan.bss_targets(), pointer_size)?;

    let c = Colors::new(args.color);
    let mut out = String::new();
    for (dex_file, entries) in &layout.mappings {
        let bytes = encode_bss_mapping(entries);
        let view = MethodBssMappingView::from_bytes(&bytes)?;
        writeln!(out, "{}{dex_file}:{}", c.dim, c.reset).unwrap();
        out.push_str(&dump_bss_mapping(&view, c));
    }
    writeln!(
        out,
        "{} slots, {} bytes",
        layout.slots.len(),
        layout.size
    )
    .unwrap();
    Ok(out)
}
