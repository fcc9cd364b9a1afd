//! Dispatch logic: extract params from ArgMatches and convert to command args.

use std::path::PathBuf;

use clap::ArgMatches;
use oatlink_core::PointerSize;
use oatlink_linker::IsaKind;

use super::ColorChoice;
use crate::commands::bss::BssArgs;
use crate::commands::dump::DumpArgs;
use crate::commands::link::LinkArgs;

pub struct LinkParams {
    pub plan_path: PathBuf,
    pub output: Option<PathBuf>,
    pub isa: Option<IsaKind>,
    pub alignment: Option<u32>,
    pub pointer_size: Option<PointerSize>,
    pub report: bool,
    pub color: ColorChoice,
}

impl LinkParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            plan_path: plan_path(m),
            output: m.get_one::<PathBuf>("output").cloned(),
            isa: m
                .get_one::<String>("isa")
                .and_then(|s| s.parse::<IsaKind>().ok()),
            alignment: m.get_one::<u32>("alignment").copied(),
            pointer_size: parse_pointer_size(m),
            report: m.get_flag("report"),
            color: parse_color(m),
        }
    }
}

impl From<LinkParams> for LinkArgs {
    fn from(p: LinkParams) -> Self {
        Self {
            plan_path: p.plan_path,
            output: p.output,
            isa: p.isa,
            alignment: p.alignment,
            pointer_size: p.pointer_size,
            report: p.report,
            color: p.color.should_colorize(),
        }
    }
}

pub struct BssParams {
    pub plan_path: PathBuf,
    pub pointer_size: Option<PointerSize>,
    pub color: ColorChoice,
}

impl BssParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            plan_path: plan_path(m),
            pointer_size: parse_pointer_size(m),
            color: parse_color(m),
        }
    }
}

impl From<BssParams> for BssArgs {
    fn from(p: BssParams) -> Self {
        Self {
            plan_path: p.plan_path,
            pointer_size: p.pointer_size,
            color: p.color.should_colorize(),
        }
    }
}

pub struct DumpParams {
    pub image_path: PathBuf,
    pub color: ColorChoice,
}

impl DumpParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            image_path: m
                .get_one::<PathBuf>("image_path")
                .cloned()
                .unwrap_or_default(),
            color: parse_color(m),
        }
    }
}

impl From<DumpParams> for DumpArgs {
    fn from(p: DumpParams) -> Self {
        Self {
            image_path: p.image_path,
            color: p.color.should_colorize(),
        }
    }
}

fn plan_path(m: &ArgMatches) -> PathBuf {
    // Required by clap.
    m.get_one::<PathBuf>("plan_path").cloned().unwrap_or_default()
}

fn parse_pointer_size(m: &ArgMatches) -> Option<PointerSize> {
    m.get_one::<String>("pointer_size")
        .and_then(|s| s.parse::<u32>().ok())
        .and_then(|bytes| PointerSize::try_from(bytes).ok())
}

fn parse_color(m: &ArgMatches) -> ColorChoice {
    match m.get_one::<String>("color").map(|s| s.as_str()) {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}
