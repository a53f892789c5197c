//! Tree-walking evaluator.
//!
//! Statements report how they finished through [`ControlFlow`]; a `return`
//! travels up as `Ok(ControlFlow::Return(_))` through blocks, loops and ifs
//! and is consumed by `LoxFunction::call`.  Runtime failures travel on the
//! `Err` channel and abort the program.

use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{BinaryOp, Expr, ExprId, Ident, LiteralValue, LogicalOp, Stmt, UnaryOp};
use crate::callable::{LoxFunction, NativeFunction};
use crate::class::{LoxClass, LoxInstance, INITIALIZER};
use crate::environment::{Environment, SharedEnv};
use crate::error::{
    RuntimeError, RuntimeErrorKind, OPERANDS_MUST_BE_NUMBERS,
    OPERANDS_MUST_BE_NUMBERS_OR_STRINGS, OPERAND_MUST_BE_NUMBER, SUPERCLASS_MUST_BE_CLASS,
};
use crate::value::Value;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    /// Continue with the next statement.
    Normal,
    /// A `return` is unwinding toward the nearest call boundary.
    Return(Value),
}

/// Deepest call nesting allowed before a `Stack overflow.` runtime error.
pub const MAX_CALL_DEPTH: usize = 255;

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, RuntimeError>;

pub struct Interpreter {
    globals: SharedEnv,
    environment: SharedEnv,
    /// Resolver output: reference node → number of scopes out to its binding.
    /// Absent means global.
    locals: HashMap<ExprId, usize>,
    output: Box<dyn Write>,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter printing to stdout, with `clock` defined.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an interpreter whose `print` statements write to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Environment::new().into_shared();

        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
            call_depth: 0,
        };

        interpreter.define_native("clock", 0, |_args: &[Value]| {
            let millis = chrono::Utc::now().timestamp_millis();
            debug!("Native function 'clock' returned: {}", millis);
            Ok(Value::Number(millis as f64))
        });

        interpreter
    }

    /// Registers a host function in the global scope.  Call before running
    /// any user code.
    pub fn define_native(
        &mut self,
        name: &str,
        arity: usize,
        func: fn(&[Value]) -> Result<Value, String>,
    ) {
        debug!("Defining native function '{}'", name);

        let native = NativeFunction {
            name: name.to_string(),
            arity,
            func,
        };

        self.globals
            .borrow_mut()
            .define(name, Value::NativeFunction(Rc::new(native)));
    }

    pub fn globals(&self) -> &SharedEnv {
        &self.globals
    }

    /// Takes the resolver's depths for one cleanly resolved program.  Entries
    /// from earlier programs in the same session are kept.
    pub fn resolve_locals(&mut self, locals: HashMap<ExprId, usize>) {
        debug!("Adding {} resolved local(s)", locals.len());
        self.locals.extend(locals);
    }

    /// Interprets a list of statements (a "program").  Stops at the first
    /// runtime error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> IResult<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            let flow = self.execute(stmt)?;

            debug_assert_eq!(flow, ControlFlow::Normal, "return escaped to top level");
        }

        info!("Interpretation completed successfully");

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> IResult<ControlFlow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                debug!("Printing value: {}", value);

                writeln!(self.output, "{}", value).map_err(|e| {
                    RuntimeErrorKind::Output(e.to_string()).at(expr.line().unwrap_or(0))
                })?;
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.name, value);
                self.environment.borrow_mut().define(&name.name, value);
            }

            Stmt::Block(statements) => {
                let scope = Environment::with_enclosing(Rc::clone(&self.environment));
                return self.execute_block(statements, scope.into_shared());
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let ControlFlow::Return(value) = self.execute(body)? {
                        return Ok(ControlFlow::Return(value));
                    }
                }
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.name);

                let function =
                    LoxFunction::new(Rc::clone(declaration), Rc::clone(&self.environment), false);

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.name, Value::Function(Rc::new(function)));
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);

                return Ok(ControlFlow::Return(value));
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let superclass = match superclass {
                    Some(expr) => match self.evaluate(expr)? {
                        Value::Class(class) => Some(class),
                        _ => {
                            let line = expr.line().unwrap_or(name.line);
                            return Err(
                                RuntimeErrorKind::TypeError(SUPERCLASS_MUST_BE_CLASS).at(line)
                            );
                        }
                    },
                    None => None,
                };

                // Bound first so methods can refer to the class by name.
                let defining = Rc::clone(&self.environment);
                defining.borrow_mut().define(&name.name, Value::Nil);

                let method_scope = match &superclass {
                    Some(superclass) => {
                        let mut scope = Environment::with_enclosing(Rc::clone(&defining));
                        scope.define("super", Value::Class(Rc::clone(superclass)));
                        scope.into_shared()
                    }
                    None => Rc::clone(&defining),
                };

                let methods: HashMap<String, Rc<LoxFunction>> = methods
                    .iter()
                    .map(|declaration| {
                        let method = LoxFunction::new(
                            Rc::clone(declaration),
                            Rc::clone(&method_scope),
                            declaration.name.name == INITIALIZER,
                        );

                        (declaration.name.name.clone(), Rc::new(method))
                    })
                    .collect();

                debug!("Defining class '{}' with {} method(s)", name.name, methods.len());

                let class = LoxClass::new(name.name.clone(), superclass, methods);

                defining
                    .borrow_mut()
                    .define(&name.name, Value::Class(Rc::new(class)));
            }
        }

        Ok(ControlFlow::Normal)
    }

    /// Runs `statements` with `environment` as the current scope, restoring
    /// the previous scope afterwards on every exit path.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: SharedEnv,
    ) -> IResult<ControlFlow> {
        debug!("Entering block with {} statements", statements.len());

        let previous = std::mem::replace(&mut self.environment, environment);
        let result = self.execute_statements(statements);
        self.environment = previous;

        debug!("Exited block");

        result
    }

    fn execute_statements(&mut self, statements: &[Stmt]) -> IResult<ControlFlow> {
        for stmt in statements {
            if let ControlFlow::Return(value) = self.execute(stmt)? {
                return Ok(ControlFlow::Return(value));
            }
        }

        Ok(ControlFlow::Normal)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary {
                operator,
                right,
                line,
            } => {
                let right = self.evaluate(right)?;

                match operator {
                    UnaryOp::Negate => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeErrorKind::TypeError(OPERAND_MUST_BE_NUMBER).at(*line)),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!right.is_truthy())),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
                line,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;

                binary(*operator, left, right).map_err(|kind| kind.at(*line))
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                // The deciding operand is returned as is, not coerced.
                let decided = match operator {
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::And => !left.is_truthy(),
                };

                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                let assigned = match self.locals.get(id) {
                    Some(&depth) => {
                        Environment::assign_at(&self.environment, depth, &name.name, value.clone())
                    }
                    None => self.globals.borrow_mut().assign(&name.name, value.clone()),
                };

                assigned.map_err(|kind| kind.at(name.line))?;
                debug!("Assigned {} to '{}'", value, name.name);

                Ok(value)
            }

            Expr::Call {
                callee,
                arguments,
                line,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                let callable = callee
                    .as_callable()
                    .ok_or_else(|| RuntimeErrorKind::NotCallable.at(*line))?;

                if values.len() != callable.arity() {
                    return Err(RuntimeErrorKind::ArityMismatch {
                        expected: callable.arity(),
                        got: values.len(),
                    }
                    .at(*line));
                }

                if self.call_depth >= MAX_CALL_DEPTH {
                    return Err(RuntimeErrorKind::StackOverflow.at(*line));
                }

                debug!("Calling {} with {} argument(s)", callee, values.len());

                self.call_depth += 1;
                let result = callable.call(self, values, *line);
                self.call_depth -= 1;

                result
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, &name.name)
                    .ok_or_else(|| {
                        RuntimeErrorKind::UndefinedProperty(name.name.clone()).at(name.line)
                    }),
                _ => Err(RuntimeErrorKind::OnlyInstancesHaveProperties.at(name.line)),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeErrorKind::OnlyInstancesHaveFields.at(name.line));
                };

                let value = self.evaluate(value)?;
                instance.set(&name.name, value.clone());

                Ok(value)
            }

            Expr::This { id, line } => self.look_up_variable(*id, &Ident::new("this", *line)),

            Expr::Super { id, line, method } => self.evaluate_super(*id, *line, method),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Ident) -> IResult<Value> {
        let value = match self.locals.get(&id) {
            Some(&depth) => Environment::get_at(&self.environment, depth, &name.name),
            None => self.globals.borrow().get(&name.name),
        };

        value.map_err(|kind| kind.at(name.line))
    }

    /// `super.method`: look the method up from the superclass, bound to the
    /// current `this`, which lives one scope inside `super`'s.
    fn evaluate_super(&self, id: ExprId, line: usize, method: &Ident) -> IResult<Value> {
        let depth = self
            .locals
            .get(&id)
            .copied()
            .ok_or_else(|| RuntimeErrorKind::UndefinedVariable("super".into()).at(line))?;

        let superclass = Environment::get_at(&self.environment, depth, "super")
            .map_err(|kind| kind.at(line))?;
        let object = Environment::get_at(&self.environment, depth.saturating_sub(1), "this")
            .map_err(|kind| kind.at(line))?;

        let (Value::Class(superclass), Value::Instance(instance)) = (superclass, object) else {
            return Err(RuntimeErrorKind::TypeError(SUPERCLASS_MUST_BE_CLASS).at(line));
        };

        let found = superclass.find_method(&method.name).ok_or_else(|| {
            RuntimeErrorKind::UndefinedProperty(method.name.clone()).at(method.line)
        })?;

        Ok(Value::Function(Rc::new(found.bind(instance))))
    }
}

/// Arithmetic, comparison and equality.  Only `+` accepts strings; nothing
/// is coerced.  Division follows IEEE semantics.
fn binary(operator: BinaryOp, left: Value, right: Value) -> Result<Value, RuntimeErrorKind> {
    use Value::{Bool, Number};

    match (operator, left, right) {
        (BinaryOp::Equal, a, b) => Ok(Bool(a == b)),
        (BinaryOp::NotEqual, a, b) => Ok(Bool(a != b)),

        (BinaryOp::Add, Number(a), Number(b)) => Ok(Number(a + b)),
        (BinaryOp::Add, Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
        (BinaryOp::Add, _, _) => Err(RuntimeErrorKind::TypeError(
            OPERANDS_MUST_BE_NUMBERS_OR_STRINGS,
        )),

        (BinaryOp::Subtract, Number(a), Number(b)) => Ok(Number(a - b)),
        (BinaryOp::Multiply, Number(a), Number(b)) => Ok(Number(a * b)),
        (BinaryOp::Divide, Number(a), Number(b)) => Ok(Number(a / b)),
        (BinaryOp::Less, Number(a), Number(b)) => Ok(Bool(a < b)),
        (BinaryOp::LessEqual, Number(a), Number(b)) => Ok(Bool(a <= b)),
        (BinaryOp::Greater, Number(a), Number(b)) => Ok(Bool(a > b)),
        (BinaryOp::GreaterEqual, Number(a), Number(b)) => Ok(Bool(a >= b)),

        _ => Err(RuntimeErrorKind::TypeError(OPERANDS_MUST_BE_NUMBERS)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Resolver;
    use crate::session::parse_source;

    fn resolve(interpreter: &mut Interpreter, source: &str) -> bool {
        let statements = parse_source(source).expect("parses");
        Resolver::new(interpreter).resolve(&statements).is_ok()
    }

    #[test]
    fn rejected_program_leaves_locals_untouched() {
        let mut interpreter = Interpreter::with_output(Box::new(io::sink()));

        assert!(!resolve(&mut interpreter, "{ var a = 1; print a; return 1; }"));
        assert!(interpreter.locals.is_empty());
    }

    #[test]
    fn clean_programs_accumulate_locals() {
        let mut interpreter = Interpreter::with_output(Box::new(io::sink()));

        assert!(resolve(&mut interpreter, "{ var a = 1; print a; }"));
        assert_eq!(interpreter.locals.len(), 1);

        assert!(!resolve(&mut interpreter, "{ var b = 2; b = b + 1; return; }"));
        assert_eq!(interpreter.locals.len(), 1);

        assert!(resolve(&mut interpreter, "fun f(x) { return x; }"));
        assert_eq!(interpreter.locals.len(), 2);
    }

    #[test]
    fn call_depth_unwinds_after_errors() {
        let mut interpreter = Interpreter::with_output(Box::new(io::sink()));
        let statements = parse_source("fun f() { return nil + 1; } f();").expect("parses");

        assert!(Resolver::new(&mut interpreter).resolve(&statements).is_ok());
        assert!(interpreter.interpret(&statements).is_err());
        assert_eq!(interpreter.call_depth, 0);
    }
}
