//! Groups and placed copies.

use super::{Build, HasCore, Node};
use crate::duplicate::{CopyContext, DeepCopy};
use crate::emit::EmitContext;
use crate::error::Result;
use crate::units::{finite, non_negative};

/// Ordered container; children paint back to front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    children: Vec<Node>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn emit_children(&self, ctx: &mut EmitContext<'_>) -> Result<()> {
        for child in &self.children {
            child.emit(ctx)?;
        }
        Ok(())
    }
}

impl Build for Group {
    fn children_vec(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    fn child_nodes(&self) -> &[Node] {
        &self.children
    }
}

impl DeepCopy for Group {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        Group {
            children: self.children.deep_copy_with(cx),
        }
    }
}

/// An owned copy of another node, taken when the `use` was created.
#[derive(Debug, Clone, PartialEq)]
pub struct Use {
    element: Box<Node>,
}

impl Use {
    /// Copy `referent` and apply the position and size overrides.
    ///
    /// Groups and shapes are translated by `(x, y)`; nested scenes also take
    /// the width and height; images take all four as their placement.
    pub fn new(referent: &Node, x: f64, y: f64, width: Option<f64>, height: Option<f64>) -> Result<Self> {
        let x = finite("use x", x)?;
        let y = finite("use y", y)?;
        let width = width.map(|w| non_negative("use width", w)).transpose()?;
        let height = height.map(|h| non_negative("use height", h)).transpose()?;

        let mut element = referent.deep_copy();
        element.place(x, y, width, height)?;
        log::trace!("use of {} {} as {}", referent.kind_name(), referent.id(), element.id());
        Ok(Use {
            element: Box::new(element),
        })
    }

    pub fn element(&self) -> &Node {
        &self.element
    }

    pub(crate) fn element_mut(&mut self) -> &mut Node {
        &mut self.element
    }
}

impl DeepCopy for Use {
    fn deep_copy_with(&self, cx: &mut CopyContext) -> Self {
        Use {
            element: self.element.deep_copy_with(cx),
        }
    }
}
