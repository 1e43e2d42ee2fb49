//! Two-mode expression evaluation.
//!
//! Every node evaluates to an [`Evaluated`]: either a symbol available right
//! away, or a closure to run once the target scope is known. Field bodies
//! evaluate in deferred mode so a field can read a sibling of the same
//! instance; everything else evaluates immediately and runs any closure it
//! meets against the current scope.

use super::lambda::Lambda;
use super::ops::apply_operator;
use crate::config::InterpreterConfig;
use datagen_core::{GenError, Node, NodeKind, Value};
use datagen_generator::{builtin_from_args, DeferredFn, GenContext, Scope, Symbol};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

/// Result of evaluating a node.
#[derive(Clone)]
pub enum Evaluated {
    Immediate(Symbol),
    Deferred(DeferredFn),
}

impl Evaluated {
    pub fn value(value: Value) -> Self {
        Evaluated::Immediate(Symbol::Value(value))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Evaluated::Deferred(_))
    }

    /// Run a deferred closure against `scope`; immediate symbols pass through.
    pub fn resolve(self, scope: &Scope, ctx: &mut GenContext) -> Result<Symbol, GenError> {
        match self {
            Evaluated::Immediate(symbol) => Ok(symbol),
            Evaluated::Deferred(deferred) => deferred(scope, ctx).map(Symbol::Value),
        }
    }

    pub fn resolve_value(self, scope: &Scope, ctx: &mut GenContext) -> Result<Value, GenError> {
        into_value(self.resolve(scope, ctx)?)
    }
}

impl fmt::Debug for Evaluated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluated::Immediate(symbol) => write!(f, "Immediate({symbol:?})"),
            Evaluated::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

/// Unwrap a plain value; entities and lambdas are not values.
pub fn into_value(symbol: Symbol) -> Result<Value, GenError> {
    match symbol {
        Symbol::Value(value) => Ok(value),
        other => Err(GenError::structural(format!(
            "Expected a value, but got {}",
            other.kind_name()
        ))),
    }
}

type Combine = Rc<dyn Fn(Vec<Value>, &mut GenContext) -> Result<Value, GenError>>;

/// Tree-walking evaluator.
///
/// Cheap to clone: lambdas keep a copy so their bodies can be evaluated
/// whenever they are called.
#[derive(Clone)]
pub struct Evaluator {
    config: Rc<InterpreterConfig>,
    warnings: Rc<RefCell<Vec<String>>>,
}

impl Evaluator {
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            config: Rc::new(config),
            warnings: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Non-fatal diagnostics collected so far.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.borrow().clone()
    }

    pub(crate) fn warn(&self, message: String) {
        warn!("{message}");
        self.warnings.borrow_mut().push(message);
    }

    /// Evaluate `node` in `scope`.
    ///
    /// With `deferred` set, identifiers and anything computed from them come
    /// back as closures; otherwise closures are run against `scope` before
    /// returning.
    pub fn eval(
        &self,
        node: &Node,
        scope: &Scope,
        ctx: &mut GenContext,
        deferred: bool,
    ) -> Result<Evaluated, GenError> {
        self.eval_node(node, scope, ctx, deferred)
            .map_err(|e| e.at(node.location.as_ref()))
    }

    /// Evaluate immediately and require a plain value.
    pub fn eval_value(
        &self,
        node: &Node,
        scope: &Scope,
        ctx: &mut GenContext,
    ) -> Result<Value, GenError> {
        self.eval(node, scope, ctx, false)?
            .resolve_value(scope, ctx)
            .map_err(|e| e.at(node.location.as_ref()))
    }

    fn eval_node(
        &self,
        node: &Node,
        scope: &Scope,
        ctx: &mut GenContext,
        deferred: bool,
    ) -> Result<Evaluated, GenError> {
        match node.kind {
            NodeKind::Literal => Ok(Evaluated::value(
                node.value.as_ref().map(Value::from).unwrap_or(Value::Null),
            )),

            NodeKind::Identifier => self.eval_identifier(node, scope, deferred),

            NodeKind::Collection => {
                let parts = self.eval_all(&node.children, scope, ctx, deferred)?;
                let collect: Combine = Rc::new(|values: Vec<Value>, _: &mut GenContext| {
                    Ok(Value::Collection(values))
                });
                combine(parts, scope, ctx, deferred, collect)
            }

            NodeKind::Binary => {
                let [lhs, rhs] = node.children.as_slice() else {
                    return Err(GenError::structural(format!(
                        "Binary expression expects 2 operands, but got {}",
                        node.children.len()
                    )));
                };
                let op = node.name_or_empty().to_string();
                let parts = vec![
                    self.eval(lhs, scope, ctx, deferred)?,
                    self.eval(rhs, scope, ctx, deferred)?,
                ];
                let apply: Combine = Rc::new(move |values: Vec<Value>, _: &mut GenContext| {
                    apply_operator(&op, &values[0], &values[1])
                });
                combine(parts, scope, ctx, deferred, apply)
            }

            NodeKind::Builtin => self.eval_builtin(node, scope, ctx, deferred),

            NodeKind::Declaration => {
                let name = required_name(node, "Declaration")?;
                let symbol = self.eval_related(node, scope, ctx)?;
                if scope.set_symbol(name, symbol.clone()).is_some() {
                    self.warn(format!("Symbol `{name}` already declared in this scope"));
                }
                Ok(Evaluated::Immediate(symbol))
            }

            NodeKind::Assignment => {
                let name = required_name(node, "Assignment")?;
                let symbol = self.eval_related(node, scope, ctx)?;
                scope.assign(name, symbol.clone())?;
                Ok(Evaluated::Immediate(symbol))
            }

            NodeKind::Sequence => {
                let mut last = Evaluated::value(Value::Null);
                for child in &node.children {
                    last = self.eval(child, scope, ctx, deferred)?;
                }
                Ok(last)
            }

            NodeKind::Lambda => {
                let params = node
                    .args
                    .iter()
                    .map(|param| match param.kind {
                        NodeKind::Identifier => Ok(param.name_or_empty().to_string()),
                        other => Err(GenError::structural(format!(
                            "Lambda parameter must be an identifier, but got {other}"
                        ))
                        .at(param.location.as_ref())),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let lambda = Lambda::new(params, node.children.clone(), scope.clone(), self.clone());
                Ok(Evaluated::Immediate(Symbol::Callable(Rc::new(lambda))))
            }

            NodeKind::Call => self.eval_call(node, scope, ctx, deferred),

            NodeKind::Entity => {
                let generator = self.declare_entity(node, scope, ctx)?;
                Ok(Evaluated::Immediate(Symbol::Entity(generator)))
            }

            NodeKind::Generation => Err(GenError::structural(
                "Generation statements are only allowed at the top level",
            )),

            NodeKind::Import => Err(GenError::structural(
                "Import statements are only allowed at the top level",
            )),

            other => Err(GenError::structural(format!(
                "Unexpected {other} node in expression"
            ))),
        }
    }

    fn eval_all(
        &self,
        nodes: &[Node],
        scope: &Scope,
        ctx: &mut GenContext,
        deferred: bool,
    ) -> Result<Vec<Evaluated>, GenError> {
        nodes
            .iter()
            .map(|node| self.eval(node, scope, ctx, deferred))
            .collect()
    }

    fn eval_related(
        &self,
        node: &Node,
        scope: &Scope,
        ctx: &mut GenContext,
    ) -> Result<Symbol, GenError> {
        let expr = node.related_node().ok_or_else(|| {
            GenError::structural(format!("{} requires an expression", node.kind))
        })?;
        self.eval(expr, scope, ctx, false)?
            .resolve(scope, ctx)
            .map_err(|e| e.at(expr.location.as_ref()))
    }

    fn eval_identifier(
        &self,
        node: &Node,
        scope: &Scope,
        deferred: bool,
    ) -> Result<Evaluated, GenError> {
        let name = required_name(node, "Identifier")?;

        match scope.resolve_symbol(name) {
            Some(symbol @ (Symbol::Entity(_) | Symbol::Callable(_))) => {
                return Ok(Evaluated::Immediate(symbol))
            }
            Some(symbol) if !deferred => return Ok(Evaluated::Immediate(symbol)),
            None if !deferred => return Err(GenError::unresolved(name)),
            _ => {}
        }

        // Resolved where the closure runs first (siblings of the instance
        // being generated), then where it was written.
        let name = name.to_string();
        let lexical = scope.clone();
        let location = node.location.clone();
        debug!(identifier = %name, "Deferring identifier");
        Ok(Evaluated::Deferred(Rc::new(move |target: &Scope, _ctx: &mut GenContext| {
            let symbol = target
                .resolve_symbol(&name)
                .or_else(|| lexical.resolve_symbol(&name))
                .ok_or_else(|| GenError::unresolved(name.as_str()).at(location.as_ref()))?;
            into_value(symbol).map_err(|e| e.at(location.as_ref()))
        })))
    }

    fn eval_builtin(
        &self,
        node: &Node,
        scope: &Scope,
        ctx: &mut GenContext,
        deferred: bool,
    ) -> Result<Evaluated, GenError> {
        let args = self.eval_args(&node.args, scope, ctx)?;
        let builtin = builtin_from_args(node.name_or_empty(), &args)?;

        if deferred {
            let builtin = Rc::new(builtin);
            Ok(Evaluated::Deferred(Rc::new(move |_scope: &Scope, ctx: &mut GenContext| {
                builtin.sample(ctx)
            })))
        } else {
            Ok(Evaluated::value(builtin.sample(ctx)?))
        }
    }

    fn eval_call(
        &self,
        node: &Node,
        scope: &Scope,
        ctx: &mut GenContext,
        deferred: bool,
    ) -> Result<Evaluated, GenError> {
        let callee = node
            .related_node()
            .ok_or_else(|| GenError::structural("Call requires a callee"))?;

        let callable = match self.eval(callee, scope, ctx, false)?.resolve(scope, ctx)? {
            Symbol::Callable(callable) => callable,
            other => {
                return Err(GenError::structural(format!(
                    "Cannot call a value of kind {}",
                    other.kind_name()
                ))
                .at(callee.location.as_ref()))
            }
        };

        let parts = self.eval_all(&node.args, scope, ctx, deferred)?;
        let call: Combine = Rc::new(move |args: Vec<Value>, ctx: &mut GenContext| {
            callable.call(args, ctx)
        });
        combine(parts, scope, ctx, deferred, call)
    }

    /// Evaluate builtin or count arguments, which must be known up front.
    pub(crate) fn eval_args(
        &self,
        args: &[Node],
        scope: &Scope,
        ctx: &mut GenContext,
    ) -> Result<Vec<Value>, GenError> {
        args.iter()
            .map(|arg| self.eval_value(arg, scope, ctx))
            .collect()
    }
}

pub(crate) fn required_name<'a>(node: &'a Node, what: &str) -> Result<&'a str, GenError> {
    match node.name.as_deref() {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(GenError::structural(format!("{what} requires a name"))),
    }
}

/// Apply `f` to the values of `parts`.
///
/// When a part is deferred and the caller is in deferred mode, the whole
/// expression becomes a closure that resolves every part against the scope
/// it is invoked in.
fn combine(
    parts: Vec<Evaluated>,
    scope: &Scope,
    ctx: &mut GenContext,
    deferred: bool,
    f: Combine,
) -> Result<Evaluated, GenError> {
    if deferred && parts.iter().any(Evaluated::is_deferred) {
        return Ok(Evaluated::Deferred(Rc::new(move |target: &Scope, ctx: &mut GenContext| {
            let values = parts
                .iter()
                .cloned()
                .map(|part| part.resolve_value(target, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            f(values, ctx)
        })));
    }

    let values = parts
        .into_iter()
        .map(|part| part.resolve_value(scope, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Evaluated::value(f(values, ctx)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagen_core::Location;

    fn evaluator() -> Evaluator {
        Evaluator::new(InterpreterConfig::default())
    }

    #[test]
    fn test_literals_and_arithmetic() {
        let eval = evaluator();
        let scope = Scope::root();
        let mut ctx = GenContext::new(42);

        let node = Node::binary("+", Node::int(2), Node::binary("*", Node::int(3), Node::float(1.5)));
        assert_eq!(eval.eval_value(&node, &scope, &mut ctx).unwrap(), Value::Float(6.5));
    }

    #[test]
    fn test_declaration_and_assignment() {
        let eval = evaluator();
        let scope = Scope::root();
        let mut ctx = GenContext::new(42);

        eval.eval(&Node::declaration("x", Node::int(1)), &scope, &mut ctx, false)
            .unwrap();
        let inner = scope.extend();
        eval.eval(&Node::assignment("x", Node::int(7)), &inner, &mut ctx, false)
            .unwrap();

        assert_eq!(
            eval.eval_value(&Node::identifier("x"), &scope, &mut ctx).unwrap(),
            Value::Int(7)
        );
        assert!(inner.symbol_names().is_empty());
    }

    #[test]
    fn test_redeclaration_warns() {
        let eval = evaluator();
        let scope = Scope::root();
        let mut ctx = GenContext::new(42);

        eval.eval(&Node::declaration("x", Node::int(1)), &scope, &mut ctx, false)
            .unwrap();
        eval.eval(&Node::declaration("x", Node::int(2)), &scope, &mut ctx, false)
            .unwrap();
        // Shadowing in a child scope is not a redeclaration
        eval.eval(&Node::declaration("x", Node::int(3)), &scope.extend(), &mut ctx, false)
            .unwrap();

        assert_eq!(eval.warnings().len(), 1);
        assert!(eval.warnings()[0].contains("`x`"));
    }

    #[test]
    fn test_unresolved_identifier_reports_location() {
        let eval = evaluator();
        let mut ctx = GenContext::new(42);
        let node = Node::identifier("missing").at(Location::new("t.lang", 2, 5, 14));

        let err = eval.eval_value(&node, &Scope::root(), &mut ctx).unwrap_err();
        assert_eq!(err.to_string(), "t.lang:2:5 [byte 14]: Cannot resolve symbol `missing`");
    }

    #[test]
    fn test_deferred_identifier_resolves_at_invocation() {
        let eval = evaluator();
        let scope = Scope::root();
        let mut ctx = GenContext::new(42);

        let node = Node::binary("+", Node::identifier("name"), Node::string("!"));
        let evaluated = eval.eval(&node, &scope, &mut ctx, true).unwrap();
        assert!(evaluated.is_deferred());

        let target = scope.extend();
        target.set_symbol("name", Symbol::Value(Value::from("ada")));
        assert_eq!(
            evaluated.resolve_value(&target, &mut ctx).unwrap(),
            Value::from("ada!")
        );
    }

    #[test]
    fn test_deferred_identifier_falls_back_to_lexical_scope() {
        let eval = evaluator();
        let scope = Scope::root();
        let mut ctx = GenContext::new(42);
        let body = scope.extend();
        body.set_symbol("base", Symbol::Value(Value::Int(10)));

        let evaluated = eval
            .eval(&Node::identifier("base"), &body, &mut ctx, true)
            .unwrap();
        assert_eq!(
            evaluated.resolve_value(&scope.extend(), &mut ctx).unwrap(),
            Value::Int(10)
        );
    }

    #[test]
    fn test_immediate_operands_stay_immediate_in_deferred_mode() {
        let eval = evaluator();
        let mut ctx = GenContext::new(42);
        let node = Node::collection(vec![Node::int(1), Node::string("a")]);

        let evaluated = eval.eval(&node, &Scope::root(), &mut ctx, true).unwrap();
        assert!(!evaluated.is_deferred());
    }

    #[test]
    fn test_builtin_expression() {
        let eval = evaluator();
        let scope = Scope::root();
        let mut ctx = GenContext::new(42);
        let node = Node::builtin("integer", vec![Node::int(3), Node::int(3)]);

        assert_eq!(eval.eval_value(&node, &scope, &mut ctx).unwrap(), Value::Int(3));

        let serial = eval
            .eval(&Node::builtin("serial", vec![]), &scope, &mut ctx, true)
            .unwrap();
        let first = serial.clone().resolve_value(&scope, &mut ctx).unwrap();
        let second = serial.resolve_value(&scope, &mut ctx).unwrap();
        assert_eq!((first, second), (Value::Int(0), Value::Int(1)));
    }

    #[test]
    fn test_generation_outside_root_is_structural() {
        let eval = evaluator();
        let mut ctx = GenContext::new(42);
        let node = Node::sequence(vec![Node::generation(Node::identifier("A"), Node::int(1))]);

        let err = eval.eval(&node, &Scope::root(), &mut ctx, false).unwrap_err();
        assert!(matches!(err, GenError::StructuralMismatch { .. }));
    }

    #[test]
    fn test_calling_a_value_fails() {
        let eval = evaluator();
        let scope = Scope::root();
        let mut ctx = GenContext::new(42);
        scope.set_symbol("x", Symbol::Value(Value::Int(1)));

        let err = eval
            .eval(&Node::call(Node::identifier("x"), vec![]), &scope, &mut ctx, false)
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot call a value of kind integer");
    }
}
