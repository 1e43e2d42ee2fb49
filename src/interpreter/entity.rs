//! Entity declarations: turning `entity` nodes into registered generators.

use super::eval::{Evaluated, Evaluator};
use datagen_core::{CountRange, GenError, Node, NodeKind, NodeValue, Value};
use datagen_generator::{
    builtin_from_args, Distribution, DistributionKind, FieldType, GenContext, Generator,
    GeneratorRef, PrimaryKey, PrimaryKeyKind, Scope, Symbol, DEFAULT_PRIMARY_KEY_NAME,
};
use std::str::FromStr;
use tracing::debug;

impl Evaluator {
    /// Build the generator for an entity node and register it in `scope`.
    ///
    /// The generator is registered before its fields are declared, so field
    /// expressions may refer to the entity itself.
    pub fn declare_entity(
        &self,
        node: &Node,
        scope: &Scope,
        ctx: &mut GenContext,
    ) -> Result<GeneratorRef, GenError> {
        let name = node.name_or_empty();
        let metadata = self.config().metadata_enabled;
        let primary_key = primary_key_of(node)?;

        let generator = match node.related_node() {
            Some(parent_node) => {
                let parent = self.resolve_entity(parent_node, scope, ctx)?.ok_or_else(|| {
                    GenError::structural(format!(
                        "Entity `{name}` can only extend another entity"
                    ))
                    .at(parent_node.location.as_ref())
                })?;
                Generator::extend(name, &parent, primary_key, metadata)
            }
            None => Generator::new(
                name,
                primary_key.unwrap_or_else(|| self.config().default_primary_key.clone()),
                metadata,
            ),
        };

        if !name.is_empty()
            && scope
                .set_symbol(name, Symbol::Entity(GeneratorRef::clone(&generator)))
                .is_some()
        {
            self.warn(format!("Symbol `{name}` already declared in this scope"));
        }

        let body = scope.extend();
        for field in &node.children {
            self.declare_field(&generator, field, &body, ctx)
                .map_err(|e| e.at(field.location.as_ref()))?;
        }

        debug!(
            entity = %generator.name(),
            fields = ?generator.field_names(),
            "Declared entity"
        );
        Ok(generator)
    }

    fn declare_field(
        &self,
        generator: &GeneratorRef,
        node: &Node,
        scope: &Scope,
        ctx: &mut GenContext,
    ) -> Result<(), GenError> {
        if node.kind != NodeKind::Field {
            return Err(GenError::structural(format!(
                "Entity body expects field declarations, but got {}",
                node.kind
            )));
        }
        let name = node
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| GenError::structural("Field declaration requires a name"))?;
        let expr = node.related_node().ok_or_else(|| {
            GenError::structural(format!("Field `{name}` requires an expression"))
        })?;
        let count = self.count_range(node.count_range.as_deref(), scope, ctx)?;

        let field_type = self
            .field_type(expr, scope, ctx)
            .map_err(|e| e.at(expr.location.as_ref()))?;
        generator.with_field_type(name, field_type, count, node.unique);
        Ok(())
    }

    /// Field type for one field expression or distribution interval.
    fn field_type(
        &self,
        expr: &Node,
        scope: &Scope,
        ctx: &mut GenContext,
    ) -> Result<FieldType, GenError> {
        match expr.kind {
            NodeKind::Builtin => {
                let args = self.eval_args(&expr.args, scope, ctx)?;
                Ok(FieldType::Builtin(builtin_from_args(expr.name_or_empty(), &args)?))
            }
            NodeKind::Distribution => Ok(FieldType::Distribution(
                self.distribution(expr, scope, ctx)?,
            )),
            NodeKind::Entity => Ok(FieldType::Entity(self.declare_entity(expr, scope, ctx)?)),
            _ => match self.eval(expr, scope, ctx, true)? {
                Evaluated::Immediate(Symbol::Value(value)) => Ok(FieldType::Literal(value)),
                Evaluated::Immediate(Symbol::Entity(generator)) => Ok(FieldType::Entity(generator)),
                Evaluated::Immediate(Symbol::Callable(callable)) => {
                    Err(GenError::structural(format!(
                        "Lambda `{}` cannot be used as a field value without calling it",
                        callable.name()
                    )))
                }
                Evaluated::Deferred(deferred) => Ok(FieldType::Deferred(deferred)),
            },
        }
    }

    fn distribution(
        &self,
        node: &Node,
        scope: &Scope,
        ctx: &mut GenContext,
    ) -> Result<Distribution, GenError> {
        let kind = DistributionKind::from_str(node.name_or_empty())?;

        let weighted = node
            .children
            .iter()
            .filter(|child| child.kind == NodeKind::Weighted)
            .count();
        if weighted != 0 && weighted != node.children.len() {
            return Err(GenError::arity(format!(
                "Distribution {kind} mixes weighted and unweighted intervals"
            )));
        }

        let mut intervals = Vec::with_capacity(node.children.len());
        let mut weights = Vec::with_capacity(weighted);
        for child in &node.children {
            let interval = if child.kind == NodeKind::Weighted {
                weights.push(weight_of(child)?);
                child.related_node().ok_or_else(|| {
                    GenError::structural("Weighted interval requires an expression")
                        .at(child.location.as_ref())
                })?
            } else {
                child
            };
            intervals.push(
                self.field_type(interval, scope, ctx)
                    .map_err(|e| e.at(interval.location.as_ref()))?,
            );
        }

        Distribution::new(kind, intervals, weights)
    }

    /// Cardinality of a field or generation statement.
    ///
    /// No bounds means one value, one bound `k` means exactly `k`.
    pub(crate) fn count_range(
        &self,
        node: Option<&Node>,
        scope: &Scope,
        ctx: &mut GenContext,
    ) -> Result<Option<CountRange>, GenError> {
        let Some(node) = node else {
            return Ok(None);
        };
        if node.kind != NodeKind::Range {
            return Err(GenError::structural(format!(
                "Count range expects a range, but got {}",
                node.kind
            ))
            .at(node.location.as_ref()));
        }

        let bounds = self
            .eval_args(&node.args, scope, ctx)?
            .iter()
            .map(|bound| match bound {
                Value::Int(i) => Ok(*i),
                other => Err(GenError::arity(format!(
                    "Count range expects integer bounds, but got {}",
                    other.kind_name()
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.at(node.location.as_ref()))?;

        let (min, max) = match bounds.as_slice() {
            [] => (0, 0),
            [k] => (*k, *k),
            [min, max] => (*min, *max),
            more => {
                return Err(GenError::arity(format!(
                    "Count range takes at most 2 bounds, but got {}",
                    more.len()
                ))
                .at(node.location.as_ref()))
            }
        };
        CountRange::new(min, max)
            .map(Some)
            .map_err(|e| e.at(node.location.as_ref()))
    }

    /// Generator named or declared by `node`, if it denotes an entity.
    pub(crate) fn resolve_entity(
        &self,
        node: &Node,
        scope: &Scope,
        ctx: &mut GenContext,
    ) -> Result<Option<GeneratorRef>, GenError> {
        match self.eval(node, scope, ctx, false)? {
            Evaluated::Immediate(Symbol::Entity(generator)) => Ok(Some(generator)),
            _ => Ok(None),
        }
    }
}

fn weight_of(node: &Node) -> Result<f64, GenError> {
    match node.value {
        Some(NodeValue::Float(weight)) => Ok(weight),
        Some(NodeValue::Int(weight)) => Ok(weight as f64),
        _ => Err(GenError::arity("Weighted interval requires a numeric weight")
            .at(node.location.as_ref())),
    }
}

/// Explicit key declared on an entity node, if any.
fn primary_key_of(node: &Node) -> Result<Option<PrimaryKey>, GenError> {
    let mut declared = None;
    for arg in &node.args {
        if arg.kind != NodeKind::PrimaryKey {
            return Err(GenError::structural(format!(
                "Entity arguments must be primary key declarations, but got {}",
                arg.kind
            ))
            .at(arg.location.as_ref()));
        }
        if declared.is_some() {
            return Err(GenError::structural("Entity declares more than one primary key")
                .at(arg.location.as_ref()));
        }

        let kind = match &arg.value {
            Some(NodeValue::Str(kind)) => PrimaryKeyKind::from_str(kind)
                .map_err(|e| GenError::arity(e).at(arg.location.as_ref()))?,
            None => PrimaryKeyKind::default(),
            Some(other) => {
                return Err(GenError::arity(format!(
                    "Primary key kind must be a string, but got {other:?}"
                ))
                .at(arg.location.as_ref()))
            }
        };
        let name = match arg.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_PRIMARY_KEY_NAME,
        };
        declared = Some(PrimaryKey::new(name, kind));
    }
    Ok(declared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InterpreterConfig;
    use datagen_core::DiscardEmitter;

    fn setup() -> (Evaluator, Scope, GenContext) {
        (
            Evaluator::new(InterpreterConfig::default()),
            Scope::root(),
            GenContext::new(42),
        )
    }

    #[test]
    fn test_declares_and_registers_entity() {
        let (eval, scope, mut ctx) = setup();
        let node = Node::entity(
            "Person",
            vec![
                Node::field("name", Node::builtin("string", vec![Node::int(5)])),
                Node::field("tags", Node::builtin("dict", vec![Node::string("city")])).with_count(1, 3),
                Node::field("kind", Node::string("human")),
            ],
        );

        let person = eval.declare_entity(&node, &scope, &mut ctx).unwrap();

        assert_eq!(person.field_names(), vec!["$id", "$type", "name", "tags", "kind"]);
        assert!(person.field("tags").unwrap().is_multi_valued());
        assert_eq!(person.field("kind").unwrap().type_name(), "literal");
        assert!(scope.resolve_symbol("Person").is_some_and(|s| s.as_entity().is_some()));
    }

    #[test]
    fn test_sibling_reference_is_deferred() {
        let (eval, scope, mut ctx) = setup();
        let node = Node::entity(
            "E",
            vec![Node::field(
                "greeting",
                Node::binary("+", Node::string("hi "), Node::identifier("name")),
            )],
        );

        let e = eval.declare_entity(&node, &scope, &mut ctx).unwrap();
        assert_eq!(e.field("greeting").unwrap().type_name(), "deferred");
    }

    #[test]
    fn test_entity_identifier_field_nests() {
        let (eval, scope, mut ctx) = setup();
        eval.declare_entity(&Node::entity("Pet", vec![]), &scope, &mut ctx)
            .unwrap();

        let owner = eval
            .declare_entity(
                &Node::entity("Owner", vec![Node::field("pet", Node::identifier("Pet"))]),
                &scope,
                &mut ctx,
            )
            .unwrap();
        assert_eq!(owner.field("pet").unwrap().type_name(), "entity");
    }

    #[test]
    fn test_extension_requires_entity_parent() {
        let (eval, scope, mut ctx) = setup();
        scope.set_symbol("x", Symbol::Value(Value::Int(1)));

        let err = eval
            .declare_entity(&Node::entity("C", vec![]).extending("x"), &scope, &mut ctx)
            .unwrap_err();
        assert!(matches!(err, GenError::StructuralMismatch { .. }));
    }

    #[test]
    fn test_explicit_primary_key() {
        let (eval, scope, mut ctx) = setup();
        let node = Node::entity("Row", vec![]).with_primary_key("id", "serial");

        let row = eval.declare_entity(&node, &scope, &mut ctx).unwrap();
        assert_eq!(row.primary_key().name(), "id");
        assert_eq!(row.primary_key().kind, PrimaryKeyKind::Serial);

        let ids = row
            .generate(3, &mut DiscardEmitter, &scope, &mut ctx)
            .unwrap();
        assert_eq!(ids, vec![Value::Int(0), Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_unknown_primary_key_kind() {
        let (eval, scope, mut ctx) = setup();
        let node = Node::entity("Row", vec![]).with_primary_key("id", "nope");

        let err = eval.declare_entity(&node, &scope, &mut ctx).unwrap_err();
        assert!(matches!(err, GenError::ArityOrTypeMismatch { .. }));
    }

    #[test]
    fn test_count_range_forms() {
        let (eval, scope, mut ctx) = setup();
        let count = |eval: &Evaluator, ctx: &mut GenContext, bounds: Vec<Node>| {
            eval.count_range(Some(&Node::range(bounds)), &scope, ctx)
        };

        let none = count(&eval, &mut ctx, vec![]).unwrap().unwrap();
        assert_eq!((none.min(), none.max()), (0, 0));

        let exact = count(&eval, &mut ctx, vec![Node::int(3)]).unwrap().unwrap();
        assert_eq!((exact.min(), exact.max()), (3, 3));

        let span = count(&eval, &mut ctx, vec![Node::int(1), Node::int(4)])
            .unwrap()
            .unwrap();
        assert_eq!((span.min(), span.max()), (1, 4));

        assert!(matches!(
            count(&eval, &mut ctx, vec![Node::int(5), Node::int(1)]).unwrap_err(),
            GenError::RangeViolation { .. }
        ));
        assert!(matches!(
            count(&eval, &mut ctx, vec![Node::int(-1)]).unwrap_err(),
            GenError::RangeViolation { .. }
        ));
        assert!(matches!(
            count(&eval, &mut ctx, vec![Node::int(1), Node::int(2), Node::int(3)]).unwrap_err(),
            GenError::ArityOrTypeMismatch { .. }
        ));
        assert!(matches!(
            count(&eval, &mut ctx, vec![Node::string("a")]).unwrap_err(),
            GenError::ArityOrTypeMismatch { .. }
        ));
    }

    #[test]
    fn test_distribution_field() {
        let (eval, scope, mut ctx) = setup();
        let node = Node::entity(
            "D",
            vec![Node::field(
                "pick",
                Node::distribution(
                    "percent",
                    vec![
                        Node::weighted(50.0, Node::string("a")),
                        Node::weighted(50.0, Node::builtin("integer", vec![Node::int(1), Node::int(2)])),
                    ],
                ),
            )],
        );

        let d = eval.declare_entity(&node, &scope, &mut ctx).unwrap();
        assert_eq!(d.field("pick").unwrap().type_name(), "distribution");
    }

    #[test]
    fn test_distribution_mixing_weights_fails() {
        let (eval, scope, mut ctx) = setup();
        let node = Node::entity(
            "D",
            vec![Node::field(
                "pick",
                Node::distribution(
                    "weight",
                    vec![Node::weighted(1.0, Node::string("a")), Node::string("b")],
                ),
            )],
        );

        let err = eval.declare_entity(&node, &scope, &mut ctx).unwrap_err();
        assert!(matches!(err, GenError::ArityOrTypeMismatch { .. }));
    }

    #[test]
    fn test_builtin_errors_carry_field_location() {
        let (eval, scope, mut ctx) = setup();
        let location = datagen_core::Location::new("e.lang", 3, 4, 20);
        let node = Node::entity(
            "E",
            vec![Node::field("x", Node::builtin("integer", vec![Node::int(10), Node::int(1)]))
                .at(location.clone())],
        );

        let err = eval.declare_entity(&node, &scope, &mut ctx).unwrap_err();
        assert_eq!(err.location(), Some(&location));
        assert!(err.to_string().ends_with("max 1 cannot be less than min 10"));
    }
}
