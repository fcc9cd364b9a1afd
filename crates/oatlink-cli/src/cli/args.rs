//! Shared argument builders for CLI commands.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Link plan (positional).
pub fn plan_path_arg() -> Arg {
    Arg::new("plan_path")
        .value_name("PLAN")
        .value_parser(value_parser!(PathBuf))
        .required(true)
        .help("Link plan (JSON)")
}

/// Linked image (positional).
pub fn image_path_arg() -> Arg {
    Arg::new("image_path")
        .value_name("IMAGE")
        .value_parser(value_parser!(PathBuf))
        .required(true)
        .help("Linked image file")
}

/// Output file (-o/--output).
pub fn output_file_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Write the linked image to FILE")
}

/// Target override (--isa).
pub fn isa_arg() -> Arg {
    Arg::new("isa")
        .long("isa")
        .value_name("ISA")
        .value_parser(["thumb2", "arm64"])
        .help("Target instruction set (overrides the plan)")
}

/// Code alignment override (--alignment).
pub fn alignment_arg() -> Arg {
    Arg::new("alignment")
        .long("alignment")
        .value_name("BYTES")
        .value_parser(value_parser!(u32))
        .help("Code alignment in bytes (power of two)")
}

/// Pointer size override (--pointer-size).
pub fn pointer_size_arg() -> Arg {
    Arg::new("pointer_size")
        .long("pointer-size")
        .value_name("BYTES")
        .value_parser(["4", "8"])
        .help("Pointer size of the target (overrides the plan)")
}

/// Print placements after linking (--report).
pub fn report_arg() -> Arg {
    Arg::new("report")
        .long("report")
        .action(ArgAction::SetTrue)
        .help("Print method and thunk placements")
}

/// Color output control (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .global(true)
        .help("Colorize output")
}

/// Log verbosity (-v, -vv).
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::Count)
        .global(true)
        .help("Log patcher decisions to stderr (-vv for every patch)")
}
