//! Thunk identity and per-thunk placement state.

mod data;
mod key;


pub use data::{ThunkData, ThunkId};
pub use key::{
    BakerReadBarrierArrayParams, BakerReadBarrierFieldParams, BakerReadBarrierRootParams,
    RawThunkParams, ThunkKey, ThunkType,
};
