//! Identity-keyed deep copy.
//!
//! A [`CopyContext`] lives for exactly one copy operation. It maps original
//! node ids to the ids handed out to their copies, and original shared
//! payloads (`Arc`s) to their copies, so anything reached twice during one
//! copy is copied once and shared again inside the result.

use crate::node::NodeId;
use kurbo::{Affine, BezPath, Point, Rect};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-operation identity map.
#[derive(Default)]
pub struct CopyContext {
    nodes: HashMap<NodeId, NodeId>,
    shared: HashMap<usize, Arc<dyn Any + Send + Sync>>,
}

impl CopyContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id for the copy of `original`, allocated on first sight.
    pub fn remap(&mut self, original: NodeId) -> NodeId {
        *self.nodes.entry(original).or_insert_with(NodeId::new)
    }

    /// Copy a shared payload once per operation.
    pub fn shared<T>(&mut self, original: &Arc<T>) -> Arc<T>
    where
        T: DeepCopy + Send + Sync + 'static,
    {
        let key = Arc::as_ptr(original) as *const () as usize;
        if let Some(seen) = self.shared.get(&key) {
            if let Ok(copy) = Arc::clone(seen).downcast::<T>() {
                return copy;
            }
        }
        let copy = Arc::new(original.as_ref().deep_copy_with(self));
        self.shared.insert(key, Arc::clone(&copy) as Arc<dyn Any + Send + Sync>);
        copy
    }

    /// Number of distinct nodes copied so far.
    pub fn copied_nodes(&self) -> usize {
        self.nodes.len()
    }
}

/// Deep copy that never aliases the original.
pub trait DeepCopy: Sized {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self;

    fn deep_copy(&self) -> Self {
        let mut cx = CopyContext::new();
        self.deep_copy_with(&mut cx)
    }
}

/// Types with no interior identity copy by `Clone`.
macro_rules! shallow_copy {
    ($($ty:ty),* $(,)?) => {
        $(
            impl DeepCopy for $ty {
                fn deep_copy_with(&self, _cx: &mut CopyContext) -> Self {
                    self.clone()
                }
            }
        )*
    };
}

shallow_copy!(f64, u32, bool, String, Point, Rect, Affine, BezPath);

impl<T: DeepCopy> DeepCopy for Vec<T> {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        self.iter().map(|item| item.deep_copy_with(cx)).collect()
    }
}

impl<T: DeepCopy> DeepCopy for Option<T> {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        self.as_ref().map(|item| item.deep_copy_with(cx))
    }
}

impl<T: DeepCopy> DeepCopy for Box<T> {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        Box::new(self.as_ref().deep_copy_with(cx))
    }
}
