//! Named extension registry
//!
//! Every extension kind (options, stage conditionals, agents, triggers) keeps
//! one [`DescriptorRegistry`] mapping a symbol to a [`Descriptor`]. A
//! descriptor knows the extension's parameters and how to build an instance
//! from bound arguments.

pub mod describable;

pub use describable::{
    Arguments, BoundArguments, DescribableModel, ParamType, ParameterSpec, closest_match,
};

use crate::errors::{InstantiationError, RegistrationError};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Builds an extension instance from bound arguments
pub type Factory<T> = fn(&BoundArguments) -> Result<Box<T>, InstantiationError>;

/// How many nested conditions an extension takes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NestedConditions {
    /// Leaf extension
    #[default]
    None,
    /// Exactly this many
    Exactly(usize),
    /// One or more
    AtLeastOne,
}

/// Metadata and factory for one extension type
pub struct Descriptor<T: ?Sized> {
    type_name: &'static str,
    symbol: Option<String>,
    display_name: Option<String>,
    model: DescribableModel,
    factory: Factory<T>,
    allowed_in_stage: bool,
    stage_only: bool,
    nested: NestedConditions,
}

impl<T: ?Sized> Descriptor<T> {
    /// Creates a descriptor for `type_name` without a symbol
    #[must_use]
    pub fn new(type_name: &'static str, factory: Factory<T>) -> Self {
        Self {
            type_name,
            symbol: None,
            display_name: None,
            model: DescribableModel::default(),
            factory,
            allowed_in_stage: false,
            stage_only: false,
            nested: NestedConditions::None,
        }
    }

    /// Sets the symbol authors use to refer to this extension
    #[must_use]
    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Sets the human readable label
    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Declares the parameters in order
    #[must_use]
    pub fn params(mut self, params: Vec<ParameterSpec>) -> Self {
        self.model = DescribableModel::new(params);
        self
    }

    /// Marks the extension as usable inside a stage
    #[must_use]
    pub fn allowed_in_stage(mut self, allowed: bool) -> Self {
        self.allowed_in_stage = allowed;
        self
    }

    /// Marks the extension as usable only inside a stage
    #[must_use]
    pub fn stage_only(mut self, stage_only: bool) -> Self {
        self.stage_only = stage_only;
        if stage_only {
            self.allowed_in_stage = true;
        }
        self
    }

    /// Declares how many nested conditions the extension wraps
    #[must_use]
    pub fn nested(mut self, nested: NestedConditions) -> Self {
        self.nested = nested;
        self
    }

    /// The registered symbol.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::MissingSymbol`] if none was declared.
    pub fn name(&self) -> Result<&str, RegistrationError> {
        self.symbol
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RegistrationError::MissingSymbol {
                type_name: self.type_name.to_string(),
            })
    }

    /// Human readable label, falling back to the symbol
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.symbol.as_deref())
            .unwrap_or(self.type_name)
    }

    /// Parameter model
    #[must_use]
    pub fn model(&self) -> &DescribableModel {
        &self.model
    }

    /// Whether instances may appear inside a stage
    #[must_use]
    pub fn is_allowed_in_stage(&self) -> bool {
        self.allowed_in_stage
    }

    /// Whether instances may only appear inside a stage
    #[must_use]
    pub fn is_stage_only(&self) -> bool {
        self.stage_only
    }

    /// Nested condition arity
    #[must_use]
    pub fn nested_conditions(&self) -> NestedConditions {
        self.nested
    }

    /// Builds an instance from already bound arguments.
    ///
    /// # Errors
    ///
    /// Returns an [`InstantiationError`] if the factory rejects a value.
    pub fn instantiate(&self, bound: &BoundArguments) -> Result<Box<T>, InstantiationError> {
        (self.factory)(bound)
    }

    /// Binds `args` and builds an instance.
    ///
    /// # Errors
    ///
    /// Returns an [`InstantiationError`] if binding or construction fails.
    pub fn new_instance(&self, args: &Arguments) -> Result<Box<T>, InstantiationError> {
        let bound = self.model.bind(args)?;
        self.instantiate(&bound)
    }
}

impl<T: ?Sized> fmt::Debug for Descriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("type_name", &self.type_name)
            .field("symbol", &self.symbol)
            .field("params", &self.model.params())
            .field("allowed_in_stage", &self.allowed_in_stage)
            .field("stage_only", &self.stage_only)
            .field("nested", &self.nested)
            .finish_non_exhaustive()
    }
}

/// Symbol-keyed registry for one extension kind
pub struct DescriptorRegistry<T: ?Sized> {
    kind: &'static str,
    descriptors: RwLock<BTreeMap<String, Arc<Descriptor<T>>>>,
}

impl<T: ?Sized> DescriptorRegistry<T> {
    /// Creates an empty registry for `kind` (used in log output)
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            descriptors: RwLock::new(BTreeMap::new()),
        }
    }

    /// Extension kind served by this registry
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Adds a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] if the descriptor has no symbol or the
    /// symbol is already taken; the registry is left unchanged.
    pub fn register(&self, descriptor: Descriptor<T>) -> Result<(), RegistrationError> {
        let name = descriptor.name()?.to_string();
        let mut descriptors = self.descriptors.write();
        if descriptors.contains_key(&name) {
            return Err(RegistrationError::DuplicateSymbol { name });
        }
        tracing::debug!(kind = self.kind, %name, "registered descriptor");
        descriptors.insert(name, Arc::new(descriptor));
        Ok(())
    }

    /// Every descriptor, sorted by symbol
    #[must_use]
    pub fn all(&self) -> Vec<Arc<Descriptor<T>>> {
        self.descriptors.read().values().cloned().collect()
    }

    /// Every symbol, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.descriptors.read().keys().cloned().collect()
    }

    /// Exact, case-sensitive lookup
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<Arc<Descriptor<T>>> {
        let found = self.descriptors.read().get(name).cloned();
        if found.is_none() {
            tracing::trace!(kind = self.kind, name, "no descriptor registered");
        }
        found
    }

    /// Looks up `name` and builds an instance from `args`.
    ///
    /// An unknown name yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an [`InstantiationError`] if the extension exists but the
    /// arguments do not fit it.
    pub fn instance_from_name(
        &self,
        name: &str,
        args: &Arguments,
    ) -> Result<Option<Box<T>>, InstantiationError> {
        self.by_name(name)
            .map(|descriptor| descriptor.new_instance(args))
            .transpose()
    }

    /// Number of registered descriptors
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.read().len()
    }

    /// Returns true if nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized> fmt::Debug for DescriptorRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorRegistry")
            .field("kind", &self.kind)
            .field("names", &self.names())
            .finish()
    }
}
