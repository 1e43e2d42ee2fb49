//! Script interpreter.
//!
//! Walks a root node statement by statement: declarations (entities,
//! variables, lambdas) populate the root scope, and generation statements
//! drive the declared generators into an emitter. Import statements splice
//! another script's statements into the same root scope; each file is
//! evaluated at most once per interpreter.

mod entity;
mod eval;
mod lambda;
mod ops;

pub use eval::{into_value, Evaluated, Evaluator};
pub use lambda::Lambda;
pub use ops::apply_operator;

use crate::config::InterpreterConfig;
use crate::script::load_script;
use datagen_core::{Emitter, GenError, Node, NodeKind, Value};
use datagen_generator::{GenContext, Scope, Symbol};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of one generation statement.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// Declared type of the generated entities
    pub entity: String,
    /// Primary keys, in generation order
    pub ids: Vec<Value>,
}

pub struct Interpreter {
    evaluator: Evaluator,
    scope: Scope,
    ctx: GenContext,
    /// Canonical paths of every script loaded so far
    imported: HashSet<PathBuf>,
    /// Directory relative imports resolve against; `None` is the working directory
    base_dir: Option<PathBuf>,
}

impl Interpreter {
    pub fn new(config: InterpreterConfig, ctx: GenContext) -> Self {
        Self {
            evaluator: Evaluator::new(config),
            scope: Scope::root(),
            ctx,
            imported: HashSet::new(),
            base_dir: None,
        }
    }

    pub fn root_scope(&self) -> &Scope {
        &self.scope
    }

    pub fn context(&mut self) -> &mut GenContext {
        &mut self.ctx
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Bind values in the root scope, skipping names the script already defines.
    pub fn define_defaults<I>(&self, defaults: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.scope.predefined_defaults(
            defaults
                .into_iter()
                .map(|(name, value)| (name, Symbol::Value(value))),
        );
    }

    /// Re-declarations and other non-fatal diagnostics.
    pub fn warnings(&self) -> Vec<String> {
        self.evaluator.warnings()
    }

    /// Evaluate a whole script. The first error aborts the run.
    ///
    /// Relative imports resolve against the working directory; use
    /// [`Interpreter::run_file`] to resolve them against the script itself.
    pub fn run(
        &mut self,
        root: &Node,
        emitter: &mut dyn Emitter,
    ) -> Result<Vec<GenerationReport>, GenError> {
        let mut reports = Vec::new();
        self.run_statements(root, emitter, &mut reports)?;
        Ok(reports)
    }

    /// Load and evaluate a script file.
    pub fn run_file(
        &mut self,
        path: &Path,
        emitter: &mut dyn Emitter,
    ) -> Result<Vec<GenerationReport>, GenError> {
        let mut reports = Vec::new();
        self.run_import(path, emitter, &mut reports)?;
        Ok(reports)
    }

    fn run_statements(
        &mut self,
        root: &Node,
        emitter: &mut dyn Emitter,
        reports: &mut Vec<GenerationReport>,
    ) -> Result<(), GenError> {
        if root.kind != NodeKind::Root {
            return Err(GenError::structural(format!(
                "Script must start with a root node, but got {}",
                root.kind
            ))
            .at(root.location.as_ref()));
        }

        for statement in &root.children {
            match statement.kind {
                NodeKind::Generation => {
                    let report = self
                        .generate(statement, emitter)
                        .map_err(|e| e.at(statement.location.as_ref()))?;
                    reports.push(report);
                }
                NodeKind::Import => {
                    let path = statement
                        .name
                        .as_deref()
                        .filter(|path| !path.is_empty())
                        .ok_or_else(|| {
                            GenError::structural("Import requires a path")
                                .at(statement.location.as_ref())
                        })?;
                    let path = match &self.base_dir {
                        Some(base) => base.join(path),
                        None => PathBuf::from(path),
                    };
                    self.run_import(&path, emitter, reports)
                        .map_err(|e| e.at(statement.location.as_ref()))?;
                }
                _ => {
                    self.evaluator
                        .eval(statement, &self.scope, &mut self.ctx, false)?;
                }
            }
        }
        Ok(())
    }

    fn run_import(
        &mut self,
        path: &Path,
        emitter: &mut dyn Emitter,
        reports: &mut Vec<GenerationReport>,
    ) -> Result<(), GenError> {
        let canonical = path.canonicalize().map_err(|e| {
            GenError::structural(format!("Cannot resolve script {}: {e}", path.display()))
        })?;
        if !self.imported.insert(canonical.clone()) {
            debug!(path = %canonical.display(), "Script already imported, skipping");
            return Ok(());
        }

        let root = load_script(&canonical).map_err(|e| {
            GenError::structural(format!("Cannot import {}: {e}", canonical.display()))
        })?;
        debug!(path = %canonical.display(), "Importing script");

        let parent = canonical.parent().map(Path::to_path_buf);
        let outer = std::mem::replace(&mut self.base_dir, parent);
        let result = self.run_statements(&root, emitter, reports);
        self.base_dir = outer;
        result
    }

    fn generate(
        &mut self,
        node: &Node,
        emitter: &mut dyn Emitter,
    ) -> Result<GenerationReport, GenError> {
        let target = node
            .related_node()
            .ok_or_else(|| GenError::structural("Generation requires an entity"))?;
        let generator = self
            .evaluator
            .resolve_entity(target, &self.scope, &mut self.ctx)?
            .ok_or_else(|| {
                GenError::structural("Generation target must be an entity")
                    .at(target.location.as_ref())
            })?;

        let count_node = node
            .args
            .first()
            .ok_or_else(|| GenError::structural("Generation requires a count"))?;
        let count = match self
            .evaluator
            .eval_value(count_node, &self.scope, &mut self.ctx)?
        {
            Value::Int(count) => count,
            other => {
                return Err(GenError::arity(format!(
                    "Generation count must be an integer, but got {}",
                    other.kind_name()
                ))
                .at(count_node.location.as_ref()))
            }
        };

        let ids = generator
            .generate(count, emitter, &self.scope, &mut self.ctx)
            .map_err(|e| e.at(count_node.location.as_ref()))?;
        info!(entity = %generator.declared_type(), count = ids.len(), "Generated entities");

        Ok(GenerationReport {
            entity: generator.declared_type().to_string(),
            ids,
        })
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(InterpreterConfig::default(), GenContext::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagen_core::DiscardEmitter;

    #[test]
    fn test_rejects_non_root() {
        let mut interpreter = Interpreter::default();
        let err = interpreter
            .run(&Node::sequence(vec![]), &mut DiscardEmitter)
            .unwrap_err();
        assert!(matches!(err, GenError::StructuralMismatch { .. }));
    }

    #[test]
    fn test_generation_count_must_be_positive() {
        let mut interpreter = Interpreter::default();
        let script = Node::root(vec![
            Node::entity("A", vec![]),
            Node::generation(Node::identifier("A"), Node::int(0)),
        ]);

        let err = interpreter.run(&script, &mut DiscardEmitter).unwrap_err();
        assert!(matches!(err, GenError::RangeViolation { .. }));
    }

    #[test]
    fn test_generation_of_non_entity() {
        let mut interpreter = Interpreter::default();
        let script = Node::root(vec![
            Node::declaration("x", Node::int(1)),
            Node::generation(Node::identifier("x"), Node::int(1)),
        ]);

        let err = interpreter.run(&script, &mut DiscardEmitter).unwrap_err();
        assert_eq!(err.to_string(), "Generation target must be an entity");
    }

    #[test]
    fn test_inline_entity_generation() {
        let mut interpreter = Interpreter::default();
        let script = Node::root(vec![Node::generation(
            Node::entity("", vec![Node::field("n", Node::int(1))]),
            Node::int(2),
        )]);

        let reports = interpreter.run(&script, &mut DiscardEmitter).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].ids.len(), 2);
        assert!(reports[0].entity.starts_with("$anon"));
    }

    #[test]
    fn test_import_requires_top_level_path() {
        let mut interpreter = Interpreter::default();
        let err = interpreter
            .run(&Node::root(vec![Node::import("")]), &mut DiscardEmitter)
            .unwrap_err();
        assert_eq!(err.to_string(), "Import requires a path");

        let nested = Node::root(vec![Node::declaration(
            "x",
            Node::sequence(vec![Node::import("other.json")]),
        )]);
        let err = interpreter.run(&nested, &mut DiscardEmitter).unwrap_err();
        assert!(matches!(err, GenError::StructuralMismatch { .. }));
    }

    #[test]
    fn test_defaults_do_not_override_script() {
        let mut interpreter = Interpreter::default();
        interpreter.define_defaults(vec![("greeting".to_string(), Value::from("hello"))]);

        let script = Node::root(vec![Node::declaration("prefix", Node::identifier("greeting"))]);
        interpreter.run(&script, &mut DiscardEmitter).unwrap();

        interpreter.define_defaults(vec![("prefix".to_string(), Value::from("ignored"))]);
        let prefix = interpreter.root_scope().resolve_symbol("prefix").unwrap();
        assert_eq!(prefix.as_value(), Some(&Value::from("hello")));
        assert!(interpreter.warnings().is_empty());
    }
}
