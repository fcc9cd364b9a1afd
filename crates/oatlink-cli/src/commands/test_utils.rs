//! Fixtures for command tests.

use std::path::PathBuf;

use indoc::indoc;
use tempfile::TempDir;

/// Two arm64 methods: a call, a GC root barrier (r2), and a bss entry load.
pub const SAMPLE_PLAN: &str = indoc! {r#"
    {
      "methods": [
        {
          "method": { "dex_file": 0, "method_index": 1 },
          "code_size": 32,
          "patches": [
            { "literal_offset": 8, "kind": "call_relative",
              "target": { "dex_file": 0, "method_index": 2 } },
            { "literal_offset": 16, "kind": "baker_read_barrier_branch",
              "custom_value": 16138 },
            { "literal_offset": 24, "kind": "method_bss_entry",
              "target": { "dex_file": 1, "method_index": 7 } }
          ]
        },
        {
          "method": { "dex_file": 0, "method_index": 2 },
          "code": [1, 2, 3, 4]
        }
      ]
    }
"#};

/// Bss entry loads only, spread over two dex files.
pub const BSS_PLAN: &str = indoc! {r#"
    {
      "pointer_size": 4,
      "methods": [
        {
          "method": { "dex_file": 0, "method_index": 0 },
          "code_size": 16,
          "patches": [
            { "literal_offset": 0, "kind": "method_bss_entry",
              "target": { "dex_file": 0, "method_index": 17 } },
            { "literal_offset": 4, "kind": "method_bss_entry",
              "target": { "dex_file": 2, "method_index": 3 } },
            { "literal_offset": 8, "kind": "method_bss_entry",
              "target": { "dex_file": 0, "method_index": 1 } },
            { "literal_offset": 12, "kind": "method_bss_entry",
              "target": { "dex_file": 0, "method_index": 5 } }
          ]
        }
      ]
    }
"#};

pub fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
