//! Chained symbol environments.
//!
//! A [`Scope`] is a cheap handle (`Rc`) to a frame holding its own symbols
//! and a link to its parent. Entity bodies, lambda calls and in-progress
//! instances each get their own frame; frames are dropped once nothing
//! holds a handle to them.

use crate::context::GenContext;
use crate::generator::GeneratorRef;
use datagen_core::{GenError, SharedEntity, Value};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Postponed computation, run against the scope it is finally invoked in.
pub type DeferredFn = Rc<dyn Fn(&Scope, &mut GenContext) -> Result<Value, GenError>>;

/// Something that can be applied to argument values.
pub trait Callable {
    fn name(&self) -> &str;

    fn call(&self, args: Vec<Value>, ctx: &mut GenContext) -> Result<Value, GenError>;
}

/// What a scope binds a name to.
#[derive(Clone)]
pub enum Symbol {
    Value(Value),
    Entity(GeneratorRef),
    Callable(Rc<dyn Callable>),
}

impl Symbol {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Symbol::Value(value) => value.kind_name(),
            Symbol::Entity(_) => "entity",
            Symbol::Callable(_) => "lambda",
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Symbol::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&GeneratorRef> {
        match self {
            Symbol::Entity(generator) => Some(generator),
            _ => None,
        }
    }
}

impl From<Value> for Symbol {
    fn from(value: Value) -> Self {
        Symbol::Value(value)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Value(value) => write!(f, "Value({value:?})"),
            Symbol::Entity(generator) => write!(f, "Entity({})", generator.name()),
            Symbol::Callable(callable) => write!(f, "Callable({})", callable.name()),
        }
    }
}

struct Frame {
    parent: Option<Scope>,
    symbols: RefCell<IndexMap<String, Symbol>>,
    /// Live view of an in-progress entity, for transient scopes.
    entity: Option<SharedEntity>,
}

#[derive(Clone)]
pub struct Scope {
    frame: Rc<Frame>,
}

impl Scope {
    pub fn root() -> Self {
        Self::with_parent(None, None)
    }

    fn with_parent(parent: Option<Scope>, entity: Option<SharedEntity>) -> Self {
        Self {
            frame: Rc::new(Frame {
                parent,
                symbols: RefCell::new(IndexMap::new()),
                entity,
            }),
        }
    }

    /// New child scope.
    pub fn extend(&self) -> Scope {
        Self::with_parent(Some(self.clone()), None)
    }

    /// Child scope that also exposes the fields of `seed` as values.
    ///
    /// `seed` is shared, not copied: fields written into the entity after
    /// this call are visible through the scope. Nothing is ever written to
    /// `parent`.
    pub fn transient(parent: &Scope, seed: SharedEntity) -> Scope {
        Self::with_parent(Some(parent.clone()), Some(seed))
    }

    pub fn parent(&self) -> Option<&Scope> {
        self.frame.parent.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.frame.parent.is_none()
    }

    /// Whether both handles point at the same frame.
    pub fn same_as(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.frame, &other.frame)
    }

    /// Whether `identifier` is bound in this frame (ancestors excluded).
    pub fn defines_locally(&self, identifier: &str) -> bool {
        if self.frame.symbols.borrow().contains_key(identifier) {
            return true;
        }
        self.frame
            .entity
            .as_ref()
            .is_some_and(|entity| entity.borrow().contains_key(identifier))
    }

    /// Nearest scope in the chain that binds `identifier`.
    pub fn defined_in_scope(&self, identifier: &str) -> Option<Scope> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if scope.defines_locally(identifier) {
                return Some(scope.clone());
            }
            current = scope.parent();
        }
        None
    }

    fn lookup_local(&self, identifier: &str) -> Option<Symbol> {
        if let Some(symbol) = self.frame.symbols.borrow().get(identifier) {
            return Some(symbol.clone());
        }
        let entity = self.frame.entity.as_ref()?;
        let value = entity.borrow().get(identifier).cloned()?;
        Some(Symbol::Value(value))
    }

    /// Nearest bound symbol, or `None` when no scope in the chain binds it.
    pub fn resolve_symbol(&self, identifier: &str) -> Option<Symbol> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(symbol) = scope.lookup_local(identifier) {
                return Some(symbol);
            }
            current = scope.parent();
        }
        None
    }

    /// Bind `identifier` in this frame, shadowing any ancestor binding.
    ///
    /// Returns the symbol previously bound in this same frame, if any.
    pub fn set_symbol(&self, identifier: impl Into<String>, symbol: Symbol) -> Option<Symbol> {
        self.frame
            .symbols
            .borrow_mut()
            .insert(identifier.into(), symbol)
    }

    /// Overwrite an existing binding in the scope that owns it.
    pub fn assign(&self, identifier: &str, symbol: Symbol) -> Result<(), GenError> {
        let owner = self
            .defined_in_scope(identifier)
            .ok_or_else(|| GenError::unresolved(identifier))?;

        if !owner.frame.symbols.borrow().contains_key(identifier) {
            if let (Some(entity), Symbol::Value(value)) = (&owner.frame.entity, &symbol) {
                entity
                    .borrow_mut()
                    .insert(identifier.to_string(), value.clone());
                return Ok(());
            }
        }

        owner.set_symbol(identifier, symbol);
        Ok(())
    }

    /// Bind each symbol whose name is not yet defined anywhere in the chain.
    pub fn predefined_defaults<I>(&self, defaults: I)
    where
        I: IntoIterator<Item = (String, Symbol)>,
    {
        for (identifier, symbol) in defaults {
            if self.defined_in_scope(&identifier).is_none() {
                self.set_symbol(identifier, symbol);
            }
        }
    }

    /// Names bound in this frame, in binding order.
    pub fn symbol_names(&self) -> Vec<String> {
        self.frame.symbols.borrow().keys().cloned().collect()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.is_root() { "Scope [ROOT]" } else { "Scope" };
        f.debug_struct(label)
            .field("symbols", &*self.frame.symbols.borrow())
            .field("transient", &self.frame.entity.is_some())
            .field("parent", &self.frame.parent)
            .finish()
    }
}
