use std::cmp::Ordering;

use oatlink_core::invariants::wrong_variant;

/// Semantic kind of a thunk. The declaration order is the key order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThunkType {
    /// Trampoline for calls beyond direct branch range.
    MethodCall,
    /// Baker read barrier, field or array element load at a known offset.
    BakerReadBarrierField,
    /// Baker read barrier, array load with the index in a register.
    BakerReadBarrierArray,
    /// Baker read barrier, GC root load.
    BakerReadBarrierRoot,
}

/// The two parameter words every key reduces to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RawThunkParams {
    pub first: u32,
    pub second: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct BakerReadBarrierFieldParams {
    /// Holder object, read for the lock word.
    pub holder_reg: u32,
    /// Base register of the load; differs from the holder for large offsets.
    pub base_reg: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct BakerReadBarrierArrayParams {
    /// Reference to the start of the array data.
    pub base_reg: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct BakerReadBarrierRootParams {
    /// Register holding the GC root.
    pub root_reg: u32,
}

/// Identifies one distinct thunk. Patches with equal keys share a thunk.
///
/// Keys order by type, then by the raw parameter words.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThunkKey {
    MethodCall,
    BakerReadBarrierField(BakerReadBarrierFieldParams),
    BakerReadBarrierArray(BakerReadBarrierArrayParams),
    BakerReadBarrierRoot(BakerReadBarrierRootParams),
}

impl ThunkKey {
    /// Build a key from its type and raw parameter words.
    ///
    /// Words a type does not use must be zero.
    pub fn new(thunk_type: ThunkType, raw: RawThunkParams) -> Self {
        match thunk_type {
            ThunkType::MethodCall => {
                debug_assert_eq!(raw, RawThunkParams::default(), "method call key takes no params");
                ThunkKey::MethodCall
            }
            ThunkType::BakerReadBarrierField => {
                ThunkKey::BakerReadBarrierField(BakerReadBarrierFieldParams {
                    holder_reg: raw.first,
                    base_reg: raw.second,
                })
            }
            ThunkType::BakerReadBarrierArray => {
                debug_assert_eq!(raw.second, 0, "array key uses one param");
                ThunkKey::BakerReadBarrierArray(BakerReadBarrierArrayParams { base_reg: raw.first })
            }
            ThunkType::BakerReadBarrierRoot => {
                debug_assert_eq!(raw.second, 0, "root key uses one param");
                ThunkKey::BakerReadBarrierRoot(BakerReadBarrierRootParams { root_reg: raw.first })
            }
        }
    }

    pub fn thunk_type(&self) -> ThunkType {
        match self {
            ThunkKey::MethodCall => ThunkType::MethodCall,
            ThunkKey::BakerReadBarrierField(_) => ThunkType::BakerReadBarrierField,
            ThunkKey::BakerReadBarrierArray(_) => ThunkType::BakerReadBarrierArray,
            ThunkKey::BakerReadBarrierRoot(_) => ThunkType::BakerReadBarrierRoot,
        }
    }

    pub fn raw_params(&self) -> RawThunkParams {
        let (first, second) = match *self {
            ThunkKey::MethodCall => (0, 0),
            ThunkKey::BakerReadBarrierField(p) => (p.holder_reg, p.base_reg),
            ThunkKey::BakerReadBarrierArray(p) => (p.base_reg, 0),
            ThunkKey::BakerReadBarrierRoot(p) => (p.root_reg, 0),
        };
        RawThunkParams { first, second }
    }

    pub fn field_params(&self) -> BakerReadBarrierFieldParams {
        match self {
            ThunkKey::BakerReadBarrierField(p) => *p,
            other => wrong_variant("thunk key", "BakerReadBarrierField", other),
        }
    }

    pub fn array_params(&self) -> BakerReadBarrierArrayParams {
        match self {
            ThunkKey::BakerReadBarrierArray(p) => *p,
            other => wrong_variant("thunk key", "BakerReadBarrierArray", other),
        }
    }

    pub fn root_params(&self) -> BakerReadBarrierRootParams {
        match self {
            ThunkKey::BakerReadBarrierRoot(p) => *p,
            other => wrong_variant("thunk key", "BakerReadBarrierRoot", other),
        }
    }

    fn sort_key(&self) -> (ThunkType, u32, u32) {
        let raw = self.raw_params();
        (self.thunk_type(), raw.first, raw.second)
    }
}

impl Ord for ThunkKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for ThunkKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for ThunkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThunkKey::MethodCall => write!(f, "method_call"),
            ThunkKey::BakerReadBarrierField(p) => {
                write!(f, "baker_field(holder=r{}, base=r{})", p.holder_reg, p.base_reg)
            }
            ThunkKey::BakerReadBarrierArray(p) => write!(f, "baker_array(base=r{})", p.base_reg),
            ThunkKey::BakerReadBarrierRoot(p) => write!(f, "baker_root(root=r{})", p.root_reg),
        }
    }
}
