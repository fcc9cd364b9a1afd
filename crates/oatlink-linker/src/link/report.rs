//! Human-readable placement report for linked code.

use std::fmt::Write as _;

use oatlink_core::Colors;

use super::driver::LinkedCode;

/// Render method placements, thunk copies, bss slots and size counters.
pub fn render_report(linked: &LinkedCode, colors: Colors) -> String {
    let c = colors;
    let mut out = String::new();

    writeln!(out, "{}[methods]{}", c.blue, c.reset).unwrap();
    for (method, p) in &linked.methods {
        writeln!(
            out,
            "{method} header {}{:#x}{} code {}{:#x}{} end {}{:#x}{}",
            c.dim,
            p.header_offset,
            c.reset,
            c.green,
            p.code_offset,
            c.reset,
            c.dim,
            p.end_offset,
            c.reset,
        )
        .unwrap();
    }
    out.push('\n');

    writeln!(out, "{}[thunks]{}", c.blue, c.reset).unwrap();
    for t in &linked.thunks {
        writeln!(
            out,
            "{}{:#x}{} {} size {}",
            c.green, t.offset, c.reset, t.key, t.size
        )
        .unwrap();
    }
    out.push('\n');

    writeln!(out, "{}[bss]{}", c.blue, c.reset).unwrap();
    for (method, slot) in &linked.bss_slots {
        writeln!(out, "{method} @ {}{slot:#x}{}", c.green, c.reset).unwrap();
    }
    out.push('\n');

    let s = &linked.stats;
    writeln!(out, "{}[stats]{}", c.blue, c.reset).unwrap();
    writeln!(out, "code_size      {}", linked.code.len()).unwrap();
    writeln!(out, "alignment      {}", s.code_alignment_bytes).unwrap();
    writeln!(out, "call_thunks    {}", s.call_thunk_bytes).unwrap();
    writeln!(out, "misc_thunks    {}", s.misc_thunk_bytes).unwrap();
    out
}
