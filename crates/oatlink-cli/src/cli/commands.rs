//! Command builders for the CLI.

use clap::Command;

use super::args::*;

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("oatlink")
        .about("Link compiled method batches with shared call and read barrier thunks")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(verbose_arg())
        .arg(color_arg())
        .subcommand(link_command())
        .subcommand(bss_command())
        .subcommand(dump_command())
}

/// Link a plan into an image.
pub fn link_command() -> Command {
    Command::new("link")
        .about("Link a plan and write the image")
        .override_usage(
            "\
  oatlink link <PLAN> [-o <FILE>] [--report]
  oatlink link <PLAN> --isa <ISA> [--alignment <BYTES>]",
        )
        .after_help(
            r#"EXAMPLES:
  oatlink link plan.json                  # placement report only
  oatlink link plan.json -o app.oat       # write the image
  oatlink link plan.json -o app.oat --report
  oatlink link plan.json --isa thumb2     # link for another target"#,
        )
        .arg(plan_path_arg())
        .arg(output_file_arg())
        .arg(isa_arg())
        .arg(alignment_arg())
        .arg(pointer_size_arg())
        .arg(report_arg())
}

/// Show the method bss mapping of a plan.
pub fn bss_command() -> Command {
    Command::new("bss")
        .about("Show the compressed method bss mapping of a plan")
        .after_help(
            r#"EXAMPLES:
  oatlink bss plan.json
  oatlink bss plan.json --pointer-size 4"#,
        )
        .arg(plan_path_arg())
        .arg(pointer_size_arg())
}

/// Show a linked image.
pub fn dump_command() -> Command {
    Command::new("dump")
        .about("Show a linked image")
        .after_help(
            r#"EXAMPLES:
  oatlink dump app.oat
  oatlink dump app.oat --color never"#,
        )
        .arg(image_path_arg())
}
