use crate::ast::{Expr, LiteralValue, LogicalOp, Stmt, UnaryOp};

/// Renders trees in parenthesized prefix form, e.g. `(* (- 123) (group 45.67))`.
pub struct Ast;

impl Ast {
    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(literal) => match literal {
                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
                LiteralValue::Str(s) => s.to_string(),
                LiteralValue::True => "true".to_string(),
                LiteralValue::False => "false".to_string(),
                LiteralValue::Nil => "nil".to_string(),
            },

            Expr::Unary {
                operator, right, ..
            } => {
                let op = match operator {
                    UnaryOp::Negate => "-",
                    UnaryOp::Not => "!",
                };

                format!("({} {})", op, self.print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
                ..
            } => format!(
                "({} {} {})",
                operator.symbol(),
                self.print(left),
                self.print(right)
            ),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let op = match operator {
                    LogicalOp::And => "and",
                    LogicalOp::Or => "or",
                };

                format!("({} {} {})", op, self.print(left), self.print(right))
            }

            Expr::Grouping(inner) => format!("(group {})", self.print(inner)),

            Expr::Variable { name, .. } => name.name.clone(),

            Expr::Assign { name, value, .. } => format!("(= {} {})", name.name, self.print(value)),

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut out = format!("(call {}", self.print(callee));
                for argument in arguments {
                    out.push(' ');
                    out.push_str(&self.print(argument));
                }
                out.push(')');
                out
            }

            Expr::Get { object, name } => format!("(. {} {})", self.print(object), name.name),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                self.print(object),
                name.name,
                self.print(value)
            ),

            Expr::This { .. } => "this".to_string(),

            Expr::Super { method, .. } => format!("(super {})", method.name),
        }
    }

    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", self.print(expr)),

            Stmt::Print(expr) => format!("(print {})", self.print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(expr) => format!("(var {} {})", name.name, self.print(expr)),
                None => format!("(var {})", name.name),
            },

            Stmt::Block(statements) => self.block(statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch),
                    self.print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => {
                format!("(while {} {})", self.print(condition), self.print_stmt(body))
            }

            Stmt::Function(declaration) => {
                let params: Vec<&str> = declaration.params.iter().map(|p| p.name.as_str()).collect();

                format!(
                    "(fun {} ({}) {})",
                    declaration.name.name,
                    params.join(" "),
                    self.block(&declaration.body)
                )
            }

            Stmt::Return { value, .. } => match value {
                Some(expr) => format!("(return {})", self.print(expr)),
                None => "(return)".to_string(),
            },

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut out = format!("(class {}", name.name);

                if let Some(superclass) = superclass {
                    out.push_str(&format!(" < {}", self.print(superclass)));
                }

                for method in methods {
                    out.push(' ');
                    out.push_str(&self.print_stmt(&Stmt::Function(method.clone())));
                }

                out.push(')');
                out
            }
        }
    }

    fn block(&self, statements: &[Stmt]) -> String {
        let mut out = String::from("(block");

        for stmt in statements {
            out.push(' ');
            out.push_str(&self.print_stmt(stmt));
        }

        out.push(')');
        out
    }
}
