//! User-defined functions.

use super::eval::{into_value, Evaluator};
use datagen_core::{GenError, Node, Value};
use datagen_generator::{Callable, GenContext, Scope, Symbol};

/// A lambda closing over the scope it was declared in.
///
/// Each call binds the arguments in a fresh child of that scope and
/// evaluates the body statements in order; the last one is the result.
pub struct Lambda {
    params: Vec<String>,
    body: Vec<Node>,
    closure: Scope,
    evaluator: Evaluator,
}

impl Lambda {
    pub fn new(params: Vec<String>, body: Vec<Node>, closure: Scope, evaluator: Evaluator) -> Self {
        Self {
            params,
            body,
            closure,
            evaluator,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl Callable for Lambda {
    fn name(&self) -> &str {
        "lambda"
    }

    fn call(&self, args: Vec<Value>, ctx: &mut GenContext) -> Result<Value, GenError> {
        if args.len() != self.params.len() {
            return Err(GenError::arity(format!(
                "Lambda expects {} arguments, but got {}",
                self.params.len(),
                args.len()
            )));
        }

        let call_scope = self.closure.extend();
        for (param, arg) in self.params.iter().zip(args) {
            call_scope.set_symbol(param.as_str(), Symbol::Value(arg));
        }

        let mut result = Symbol::Value(Value::Null);
        for statement in &self.body {
            result = self
                .evaluator
                .eval(statement, &call_scope, ctx, false)?
                .resolve(&call_scope, ctx)?;
        }
        into_value(result)
    }
}
