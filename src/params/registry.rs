//! Named parameters with bound slots and change listeners
//!
//! `update` is the only way a value changes. It writes the new value into
//! every bound slot in binding order, then calls every listener in
//! registration order, all before returning.

use std::{collections::HashMap, rc::Rc};

use log::{debug, warn};
use thiserror::Error;

use super::{
    slot::{Slot, Uniform},
    value::{ParamOptions, ParamValue, Parameter},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("parameter '{0}' is not defined")]
    UnknownParameter(String),
    #[error("parameter '{0}' is already defined")]
    AlreadyDefined(String),
}

/// Callback run after a parameter changes, with the new value and the parameter name
pub type Listener = Box<dyn FnMut(&ParamValue, &str)>;

#[derive(Default)]
pub struct ParamRegistry {
    params: Vec<Parameter>,
    index: HashMap<String, usize>,
    bindings: HashMap<String, Vec<Box<dyn Slot>>>,
    listeners: HashMap<String, Vec<Listener>>,
}

impl ParamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a parameter with its default value
    ///
    /// Redefinition is rejected and leaves the existing parameter as it was.
    pub fn define(
        &mut self,
        name: &str,
        default: impl Into<ParamValue>,
        options: ParamOptions,
    ) -> Result<(), ParamError> {
        if self.index.contains_key(name) {
            warn!("Parameter '{}' is already defined, keeping the first definition", name);
            return Err(ParamError::AlreadyDefined(name.to_string()));
        }

        let default = default.into();
        debug!("Defining parameter '{}' = {}", name, default);
        self.index.insert(name.to_string(), self.params.len());
        self.params.push(Parameter {
            name: name.to_string(),
            value: default.clone(),
            default,
            options,
        });
        Ok(())
    }

    /// Binds a slot and writes the current value into it straight away
    pub fn bind(&mut self, name: &str, slot: impl Slot + 'static) -> Result<(), ParamError> {
        let Some(value) = self.get(name) else {
            warn!("Cannot bind to undefined parameter '{}'", name);
            return Err(ParamError::UnknownParameter(name.to_string()));
        };
        slot.set(value);
        self.bindings
            .entry(name.to_string())
            .or_default()
            .push(Box::new(slot));
        Ok(())
    }

    /// Binds a uniform cell; the registry keeps only a weak reference to it
    pub fn bind_uniform(&mut self, name: &str, uniform: &Rc<Uniform>) -> Result<(), ParamError> {
        self.bind(name, Rc::downgrade(uniform))
    }

    pub fn bind_all<S, I>(&mut self, name: &str, slots: I) -> Result<(), ParamError>
    where
        S: Slot + 'static,
        I: IntoIterator<Item = S>,
    {
        slots.into_iter().try_for_each(|slot| self.bind(name, slot))
    }

    /// Registers a listener; it only sees changes made after this call
    ///
    /// Listeners may be registered before the parameter is defined.
    pub fn on_change<F>(&mut self, name: &str, callback: F)
    where
        F: FnMut(&ParamValue, &str) + 'static,
    {
        self.listeners
            .entry(name.to_string())
            .or_default()
            .push(Box::new(callback));
    }

    /// Sets a value and propagates it to slots, then listeners
    ///
    /// Constraints in [`ParamOptions`] are not enforced here.
    pub fn update(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<(), ParamError> {
        let Some(&index) = self.index.get(name) else {
            warn!("Parameter '{}' not defined", name);
            return Err(ParamError::UnknownParameter(name.to_string()));
        };

        let value = value.into();
        self.params[index].value = value.clone();

        if let Some(slots) = self.bindings.get(name) {
            for slot in slots {
                slot.set(&value);
            }
        }
        if let Some(listeners) = self.listeners.get_mut(name) {
            for listener in listeners.iter_mut() {
                listener(&value, name);
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.definition(name).map(|param| &param.value)
    }

    pub fn definition(&self, name: &str) -> Option<&Parameter> {
        self.index.get(name).map(|&i| &self.params[i])
    }

    /// Every parameter in definition order
    pub fn parameters(&self) -> &[Parameter] {
        &self.params
    }

    /// Rewrites every bound slot from its parameter's current value
    pub fn resync_all(&self) {
        for (name, slots) in &self.bindings {
            let Some(value) = self.get(name) else {
                continue;
            };
            for slot in slots {
                slot.set(value);
            }
        }
    }

    /// Updates a parameter back to its default
    pub fn reset(&mut self, name: &str) -> Result<(), ParamError> {
        let default = self
            .definition(name)
            .map(|param| param.default.clone())
            .ok_or_else(|| ParamError::UnknownParameter(name.to_string()))?;
        self.update(name, default)
    }

    pub fn reset_all(&mut self) {
        let names: Vec<String> = self.params.iter().map(|p| p.name.clone()).collect();
        for name in names {
            // every name comes from the registry itself
            let _ = self.reset(&name);
        }
    }

    pub fn binding_count(&self, name: &str) -> usize {
        self.bindings.get(name).map_or(0, Vec::len)
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.get(name).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
