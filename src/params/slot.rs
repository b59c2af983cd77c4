//! Write targets a parameter can be bound to

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use log::{trace, warn};

use super::value::ParamValue;
use crate::gfx::{
    color::Color,
    resources::material::MaterialId,
    scene::SceneGraph,
};

/// Something a parameter value can be pushed into
///
/// Slots refer to their target weakly. Once the target is gone `set` returns
/// `false` and the write is dropped.
pub trait Slot {
    fn set(&self, value: &ParamValue) -> bool;
    fn get(&self) -> Option<ParamValue>;
}

/// A shader uniform cell, read by the renderer every frame
#[derive(Debug, Default)]
pub struct Uniform {
    value: RefCell<ParamValue>,
}

impl Uniform {
    pub fn new(value: impl Into<ParamValue>) -> Rc<Self> {
        Rc::new(Self {
            value: RefCell::new(value.into()),
        })
    }

    pub fn value(&self) -> ParamValue {
        self.value.borrow().clone()
    }

    /// Numeric value, `0.0` for non-numeric contents
    pub fn as_f32(&self) -> f32 {
        match &*self.value.borrow() {
            ParamValue::Number(n) => *n,
            ParamValue::Bool(b) => f32::from(u8::from(*b)),
            ParamValue::Text(_) => 0.0,
        }
    }

    pub fn set(&self, value: impl Into<ParamValue>) {
        *self.value.borrow_mut() = value.into();
    }
}

impl Slot for Weak<Uniform> {
    fn set(&self, value: &ParamValue) -> bool {
        match self.upgrade() {
            Some(uniform) => {
                *uniform.value.borrow_mut() = value.clone();
                true
            }
            None => {
                trace!("Dropping write of {} to a released uniform", value);
                false
            }
        }
    }

    fn get(&self) -> Option<ParamValue> {
        self.upgrade().map(|uniform| uniform.value())
    }
}

/// Material property a [`MaterialSlot`] writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialField {
    Color,
    Metalness,
    Roughness,
}

/// Binds a parameter straight to one material of a shared scene graph
pub struct MaterialSlot {
    graph: Weak<RefCell<SceneGraph>>,
    material: MaterialId,
    field: MaterialField,
}

impl MaterialSlot {
    pub fn new(graph: &Rc<RefCell<SceneGraph>>, material: MaterialId, field: MaterialField) -> Self {
        Self {
            graph: Rc::downgrade(graph),
            material,
            field,
        }
    }
}

impl Slot for MaterialSlot {
    fn set(&self, value: &ParamValue) -> bool {
        let Some(graph) = self.graph.upgrade() else {
            trace!("Dropping write of {} to a released scene graph", value);
            return false;
        };
        let mut graph = graph.borrow_mut();
        let Some(material) = graph.material_mut(self.material) else {
            trace!("Dropping write of {} to missing material {}", value, self.material);
            return false;
        };

        match (self.field, value) {
            (MaterialField::Color, ParamValue::Text(hex)) => match hex.parse::<Color>() {
                Ok(color) => material.set_color(color),
                Err(e) => warn!("{}", e),
            },
            (MaterialField::Metalness, ParamValue::Number(v)) => material.set_metallic(*v),
            (MaterialField::Roughness, ParamValue::Number(v)) => material.set_roughness(*v),
            (field, value) => warn!(
                "Cannot write a {} value to material {:?}",
                value.type_name(),
                field
            ),
        }
        true
    }

    fn get(&self) -> Option<ParamValue> {
        let graph = self.graph.upgrade()?;
        let graph = graph.borrow();
        let material = graph.material(self.material)?;
        Some(match self.field {
            MaterialField::Color => ParamValue::Text(material.color().to_css()),
            MaterialField::Metalness => ParamValue::Number(material.metallic),
            MaterialField::Roughness => ParamValue::Number(material.roughness),
        })
    }
}
