use oatlink_format::Image;
use tempfile::TempDir;

use super::link::{LinkArgs, execute};
use super::test_utils::{SAMPLE_PLAN, write_file};

fn args(plan_path: std::path::PathBuf) -> LinkArgs {
    LinkArgs {
        plan_path,
        output: None,
        isa: None,
        alignment: None,
        pointer_size: None,
        report: false,
        color: false,
    }
}

#[test]
fn report_without_output() {
    let dir = TempDir::new().unwrap();
    let plan = write_file(&dir, "plan.json", SAMPLE_PLAN);

    let out = execute(&args(plan)).unwrap();
    insta::assert_snapshot!(out, @r"
    [methods]
    dex0#1 header 0x8 code 0x20 end 0x40
    dex0#2 header 0x48 code 0x60 end 0x64

    [thunks]
    0x70 baker_root(root=r2) size 40

    [bss]
    dex1#7 @ 0x0

    [stats]
    code_size      152
    alignment      28
    call_thunks    0
    misc_thunks    40
    ");
}

#[test]
fn writes_loadable_image() {
    let dir = TempDir::new().unwrap();
    let plan = write_file(&dir, "plan.json", SAMPLE_PLAN);
    let output = dir.path().join("app.oat");

    let mut link_args = args(plan);
    link_args.output = Some(output.clone());
    let out = execute(&link_args).unwrap();
    assert!(out.is_empty());

    let image = Image::from_path(&output).unwrap();
    assert_eq!(image.header().code_size, 152);
    assert_eq!(image.bytes().len(), 224);
    let code = image.code();
    // Call at 0x28 to m2 at 0x60, barrier at 0x30 to the thunk at 0x70.
    assert_eq!(code[40..44], 56u32.to_le_bytes());
    assert_eq!(code[48..52], 64u32.to_le_bytes());
}

#[test]
fn report_alongside_output() {
    let dir = TempDir::new().unwrap();
    let plan = write_file(&dir, "plan.json", SAMPLE_PLAN);

    let mut link_args = args(plan);
    link_args.output = Some(dir.path().join("app.oat"));
    link_args.report = true;
    let out = execute(&link_args).unwrap();
    assert!(out.starts_with("[methods]\n"));
}

#[test]
fn thumb2_override_changes_layout() {
    let dir = TempDir::new().unwrap();
    let plan = write_file(&dir, "plan.json", SAMPLE_PLAN);

    let mut link_args = args(plan);
    link_args.isa = Some(oatlink_linker::IsaKind::Thumb2);
    let out = execute(&link_args).unwrap();
    // 8-byte alignment, 24-byte header: code starts right after it.
    assert!(out.contains("dex0#1 header 0x0 code 0x18 end 0x38\n"));
    // Entry points carry the Thumb bit, code offsets do not.
    assert!(out.contains("dex0#2 header 0x38 code 0x50 end 0x54\n"));
}

#[test]
fn bad_alignment_fails_the_link() {
    let dir = TempDir::new().unwrap();
    let plan = write_file(&dir, "plan.json", SAMPLE_PLAN);

    let mut link_args = args(plan);
    link_args.alignment = Some(3);
    let err = execute(&link_args).unwrap_err();
    assert_eq!(
        err.to_string(),
        "link failed: code alignment 3 is not a power of two"
    );
}

#[test]
fn unknown_target_fails_the_link() {
    let dir = TempDir::new().unwrap();
    let plan = write_file(
        &dir,
        "plan.json",
        r#"{ "methods": [ { "method": { "dex_file": 0, "method_index": 0 }, "code_size": 8,
             "patches": [ { "literal_offset": 0, "kind": "call_relative",
                            "target": { "dex_file": 0, "method_index": 9 } } ] } ] }"#,
    );

    let err = execute(&args(plan)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "link failed: call at 0x20 targets dex0#9, which was never placed"
    );
}

#[test]
fn missing_plan_is_reported() {
    let dir = TempDir::new().unwrap();
    let err = execute(&args(dir.path().join("absent.json"))).unwrap_err();
    assert!(err.to_string().starts_with("cannot read "));
}

#[test]
fn malformed_plan_is_reported() {
    let dir = TempDir::new().unwrap();
    let plan = write_file(&dir, "plan.json", "{ \"methods\": 1 }");
    let err = execute(&args(plan)).unwrap_err();
    assert!(err.to_string().starts_with("invalid plan "));
}

#[test]
fn plan_past_offset_space_fails_the_link() {
    let dir = TempDir::new().unwrap();
    let plan = write_file(
        &dir,
        "plan.json",
        r#"{ "base_offset": 4294967040,
             "methods": [ { "method": { "dex_file": 0, "method_index": 0 }, "code_size": 512 } ] }"#,
    );

    let err = execute(&args(plan)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "link failed: method dex0#0 placed after 0xffffff00 runs past the 32-bit offset space"
    );
}
