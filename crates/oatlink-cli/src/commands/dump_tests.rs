use tempfile::TempDir;

use super::dump::{DumpArgs, execute};
use super::link::{self, LinkArgs};
use super::test_utils::{SAMPLE_PLAN, write_file};

#[test]
fn dumps_linked_image() {
    let dir = TempDir::new().unwrap();
    let plan = write_file(&dir, "plan.json", SAMPLE_PLAN);
    let image = dir.path().join("app.oat");
    link::execute(&LinkArgs {
        plan_path: plan,
        output: Some(image.clone()),
        isa: None,
        alignment: None,
        pointer_size: None,
        report: false,
        color: false,
    })
    .unwrap();

    let out = execute(&DumpArgs {
        image_path: image,
        color: false,
    })
    .unwrap();
    assert!(out.contains("total_size   224\n"));
    assert!(out.contains("pointer_size 8\n"));
    assert!(out.contains("[code] offset 0x20 size 152\n"));
    assert!(out.ends_with("[bss_mapping]\ndex1:\nE0 #7 mask 0x0000 @ 0x0  [7]\n"));
}

#[test]
fn rejects_non_image() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "junk.oat", "abc");
    let err = execute(&DumpArgs {
        image_path: path,
        color: false,
    })
    .unwrap_err();
    assert!(err.to_string().ends_with("file too small: 3 bytes (minimum 32)"));
}
