use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use oatlink_core::MethodRef;

/// Resolves methods placed outside the current batch.
///
/// Offsets are entry points, i.e. code offsets plus the configured code delta.
pub trait MethodOffsetProvider {
    fn find_method_offset(&self, method: MethodRef) -> Option<u32>;
}

impl MethodOffsetProvider for BTreeMap<MethodRef, u32> {
    fn find_method_offset(&self, method: MethodRef) -> Option<u32> {
        self.get(&method).copied()
    }
}

impl MethodOffsetProvider for HashMap<MethodRef, u32> {
    fn find_method_offset(&self, method: MethodRef) -> Option<u32> {
        self.get(&method).copied()
    }
}

impl MethodOffsetProvider for IndexMap<MethodRef, u32> {
    fn find_method_offset(&self, method: MethodRef) -> Option<u32> {
        self.get(&method).copied()
    }
}

impl<P: MethodOffsetProvider + ?Sized> MethodOffsetProvider for &P {
    fn find_method_offset(&self, method: MethodRef) -> Option<u32> {
        (**self).find_method_offset(method)
    }
}
