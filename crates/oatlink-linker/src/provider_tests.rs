use std::collections::BTreeMap;

use indexmap::IndexMap;
use oatlink_core::{DexFileId, MethodRef};

use crate::MethodOffsetProvider;

fn lookup(provider: &impl MethodOffsetProvider, idx: u32) -> Option<u32> {
    provider.find_method_offset(MethodRef::new(DexFileId(0), idx))
}

#[test]
fn map_providers() {
    let mut tree = BTreeMap::new();
    tree.insert(MethodRef::new(DexFileId(0), 1), 0x40);
    assert_eq!(lookup(&tree, 1), Some(0x40));
    assert_eq!(lookup(&tree, 2), None);

    let mut ordered = IndexMap::new();
    ordered.insert(MethodRef::new(DexFileId(0), 2), 0x80);
    assert_eq!(lookup(&ordered, 2), Some(0x80));
    assert_eq!(lookup(&&ordered, 2), Some(0x80));
}
