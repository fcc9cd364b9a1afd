//! Human-readable image dump for debugging.

use std::fmt::Write as _;

use oatlink_core::Colors;

use crate::bss_mapping::MethodBssMappingView;
use crate::image::Image;

const CODE_ROW: usize = 16;

/// Generate a human-readable dump of a linked image.
pub fn dump(image: &Image, colors: Colors) -> String {
    let mut out = String::new();
    dump_header(&mut out, image, colors);
    dump_code(&mut out, image, colors);
    out.push_str(&section_bss_mapping(image, colors));
    out
}

/// Dump a method bss mapping table, one entry per line.
pub fn dump_bss_mapping(view: &MethodBssMappingView<'_>, colors: Colors) -> String {
    let c = colors;
    let mut out = String::new();
    let w = width_for_count(view.len());

    for (i, entry) in view.iter().enumerate() {
        let covered = entry
            .covered_indices()
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(
            out,
            "E{i:0w$} {}#{}{} mask {}{:#06x}{} @ {}{:#x}{}  [{covered}]",
            c.blue,
            entry.method_index,
            c.reset,
            c.dim,
            entry.index_mask,
            c.reset,
            c.green,
            entry.bss_offset,
            c.reset,
        )
        .unwrap();
    }
    out
}

fn dump_header(out: &mut String, image: &Image, c: Colors) {
    let h = image.header();
    writeln!(out, "{}[header]{}", c.blue, c.reset).unwrap();
    writeln!(out, "version      {}", h.version).unwrap();
    writeln!(out, "checksum     {}{:#010x}{}", c.green, h.checksum, c.reset).unwrap();
    writeln!(out, "total_size   {}", h.total_size).unwrap();
    writeln!(out, "pointer_size {}", h.pointer_size).unwrap();
    out.push('\n');
}

fn dump_code(out: &mut String, image: &Image, c: Colors) {
    let h = image.header();
    writeln!(
        out,
        "{}[code]{} {}offset {:#x} size {}{}",
        c.blue, c.reset, c.dim, h.code_offset, h.code_size, c.reset
    )
    .unwrap();
    for (row, chunk) in image.code().chunks(CODE_ROW).enumerate() {
        let hex = chunk
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "{}{:06x}{} {hex}", c.green, row * CODE_ROW, c.reset).unwrap();
    }
    out.push('\n');
}

fn section_bss_mapping(image: &Image, c: Colors) -> String {
    let mut out = String::new();
    writeln!(out, "{}[bss_mapping]{}", c.blue, c.reset).unwrap();
    // Validated when the image was loaded.
    let Ok(tables) = image.bss_mappings() else {
        return out;
    };
    for (dex_file, view) in tables {
        writeln!(out, "{}{dex_file}:{}", c.dim, c.reset).unwrap();
        out.push_str(&dump_bss_mapping(&view, c));
    }
    out
}

fn width_for_count(count: usize) -> usize {
    if count <= 1 {
        1
    } else {
        ((count - 1) as f64).log10() as usize + 1
    }
}
