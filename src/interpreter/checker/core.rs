use std::rc::Rc;

use tracing::{debug, instrument};

use crate::{
    ast::{Expr, ExprKind, FuncDecl, LiteralValue, NodeId, Program, Stmt, StmtKind},
    error::{Diagnostic, EcruResult, ErrorKind},
    interpreter::{binder::Resolution, types::Type},
};

/// State of the checking pass.
///
/// The checker never mutates its input. It reads symbol types from the
/// binder's [`Resolution`] and numbers the cast nodes it inserts after the
/// ids the parser handed out, so every node id in the typed tree stays
/// unique.
pub struct Checker<'a> {
    resolution: &'a Resolution,
    next_id:    u32,
    /// Declared return types of the functions being checked, innermost last.
    returns:    Vec<Type>,
}

/// Type-checks a bound program.
///
/// # Returns
/// A copy of the program in which every expression carries its static type
/// and every implicit conversion is an explicit cast node.
///
/// # Errors
/// The first type error found, e.g. `IllegalTypeConversionError`,
/// `UnsupportedBinop`, `IllegalCallError` or `NonexistentReturnError`.
///
/// # Example
/// ```
/// use ecru::interpreter::{
///     binder::bind_program, checker::core::check_program, lexer::tokenize,
///     parser::core::parse_program,
/// };
///
/// let program = parse_program(tokenize("x: Q = 1; print x / 2;").unwrap()).unwrap();
/// let resolution = bind_program(&program).unwrap();
/// let typed = check_program(&program, &resolution).unwrap();
///
/// assert_eq!(typed.to_string(), "Program(DeclAssignStmt(x,Q,ToRat(1)),Print(Div(x,ToRat(2))))");
/// ```
#[instrument(skip_all)]
pub fn check_program(program: &Program, resolution: &Resolution) -> EcruResult<Program> {
    let mut checker = Checker::new(resolution, program.node_count);
    let statements = checker.check_block(&program.statements)?;
    debug!(casts = checker.next_id - program.node_count, "checked program");
    Ok(Program { statements,
                 span: program.span,
                 node_count: checker.next_id })
}

impl<'a> Checker<'a> {
    #[must_use]
    pub const fn new(resolution: &'a Resolution, first_id: u32) -> Self {
        Self { resolution,
               next_id: first_id,
               returns: Vec::new() }
    }

    pub(super) const fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn check_block(&mut self, statements: &[Stmt]) -> EcruResult<Vec<Stmt>> {
        statements.iter().map(|stmt| self.check_stmt(stmt)).collect()
    }

    fn symbol_type(&self, node: NodeId, stmt: &Stmt) -> EcruResult<Type> {
        let (_, symbol) = self.resolution.resolve(node, stmt.span)?;
        Ok(symbol.ty.clone())
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> EcruResult<Stmt> {
        let kind = match &stmt.kind {
            StmtKind::Comment(_) | StmtKind::Declaration { .. } => stmt.kind.clone(),
            StmtKind::Assignment { name, value } => {
                let ty = self.symbol_type(stmt.id, stmt)?;
                let value = self.check_expr(value)?;
                StmtKind::Assignment { name:  name.clone(),
                                       value: self.coerce(value, &ty)?, }
            },
            StmtKind::DeclarationAndAssignment { name, ty, value } => {
                let value = self.check_expr(value)?;
                StmtKind::DeclarationAndAssignment { name:  name.clone(),
                                                     ty:    ty.clone(),
                                                     value: self.coerce(value, ty)?, }
            },
            StmtKind::Expr(expr) => StmtKind::Expr(self.check_expr(expr)?),
            StmtKind::Print { mode, expr } => StmtKind::Print { mode: *mode,
                                                                expr: self.check_expr(expr)?, },
            StmtKind::While { condition, body } => {
                StmtKind::While { condition: self.check_condition(condition)?,
                                  body:      self.check_block(body)?, }
            },
            StmtKind::For { init,
                            condition,
                            step,
                            body, } => {
                let init = init.as_deref().map(|s| self.check_stmt(s).map(Box::new)).transpose()?;
                let condition = self.check_condition(condition)?;
                let step = step.as_deref().map(|s| self.check_stmt(s).map(Box::new)).transpose()?;
                StmtKind::For { init,
                                condition,
                                step,
                                body: self.check_block(body)? }
            },
            StmtKind::If { condition,
                           then_branch,
                           else_branch, } => {
                let condition = self.check_condition(condition)?;
                let then_branch = self.check_block(then_branch)?;
                let else_branch = else_branch.as_deref().map(|b| self.check_block(b)).transpose()?;
                StmtKind::If { condition,
                               then_branch,
                               else_branch }
            },
            StmtKind::Return(expr) => {
                let value = self.check_expr(expr)?;
                match self.returns.last().cloned() {
                    Some(ret) => StmtKind::Return(self.coerce(value, &ret)?),
                    None => StmtKind::Return(value),
                }
            },
        };
        Ok(Stmt::new(stmt.id, kind, stmt.span))
    }

    fn check_condition(&mut self, condition: &Expr) -> EcruResult<Expr> {
        let condition = self.check_expr(condition)?;
        self.coerce(condition, &Type::Bool)
    }

    /// Types one expression and everything below it.
    ///
    /// # Errors
    /// The first type error in the expression.
    pub fn check_expr(&mut self, expr: &Expr) -> EcruResult<Expr> {
        let (kind, ty) = match &expr.kind {
            ExprKind::Id(name) => {
                let (_, symbol) = self.resolution.resolve(expr.id, expr.span)?;
                (ExprKind::Id(name.clone()), symbol.ty.clone())
            },
            ExprKind::Literal(value) => (ExprKind::Literal(value.clone()), value.ty()),
            ExprKind::Tuple(items) => {
                let items = items.iter().map(|item| self.check_expr(item)).collect::<EcruResult<Vec<_>>>()?;
                let ty = Type::Product(items.iter().map(|item| item.ty.clone()).collect());
                (ExprKind::Tuple(items), ty)
            },
            ExprKind::FuncDecl(func) => return self.check_function(expr, func),
            ExprKind::Call { callee, args } => return self.check_call(expr, callee, args),
            ExprKind::Index { base, index } => return self.check_index(expr, base, index),
            ExprKind::Binary { op, left, right } => return self.check_binary(expr, *op, left, right),
            ExprKind::Unary { op, expr: operand } => return self.check_unary(expr, *op, operand),
            ExprKind::Cast { target, expr: inner } => {
                let inner = self.check_expr(inner)?;
                return self.coerce(inner, target);
            },
        };
        Ok(Expr { id: expr.id,
                  kind,
                  span: expr.span,
                  ty })
    }

    /// Checks a function literal against its declared return type.
    ///
    /// A function whose return type is not `void` must have a `return` among
    /// the top-level statements of its body; returns nested in branches or
    /// loops do not count. A lambda written without a return type takes the
    /// type of its first top-level `return`, or `void` without one; every
    /// other `return` of the body is then converted to that type.
    fn check_function(&mut self, expr: &Expr, func: &FuncDecl) -> EcruResult<Expr> {
        self.returns.push(func.ret.clone());
        let body = self.check_block(&func.body);
        self.returns.pop();
        let mut body = body?;

        let ret = if func.ret == Type::Any {
            let ret = body.iter()
                          .find_map(|stmt| match &stmt.kind {
                              StmtKind::Return(value) => Some(value.ty.clone()),
                              _ => None,
                          })
                          .unwrap_or(Type::Void);
            body = self.coerce_returns(body, &ret)?;
            ret
        } else {
            func.ret.clone()
        };
        let has_return = body.iter().any(|stmt| matches!(stmt.kind, StmtKind::Return(_)));
        if ret != Type::Void && !has_return {
            let name = func.name.as_deref().unwrap_or("<lambda>");
            return Err(Diagnostic::new(ErrorKind::NonexistentReturnError,
                                       func.span,
                                       format!("function '{name}' returns {ret} but has no return statement")));
        }

        let checked = FuncDecl { name: func.name.clone(),
                                 params: func.params.clone(),
                                 ret,
                                 body,
                                 span: func.span };
        let ty = checked.ty();
        Ok(Expr { id: expr.id,
                  kind: ExprKind::FuncDecl(Rc::new(checked)),
                  span: expr.span,
                  ty })
    }

    /// Converts the value of every `return` in `body` to `ret`. Bodies of
    /// nested functions keep their own returns.
    fn coerce_returns(&mut self, body: Vec<Stmt>, ret: &Type) -> EcruResult<Vec<Stmt>> {
        body.into_iter().map(|stmt| self.coerce_return(stmt, ret)).collect()
    }

    fn coerce_return(&mut self, stmt: Stmt, ret: &Type) -> EcruResult<Stmt> {
        let kind = match stmt.kind {
            StmtKind::Return(value) => StmtKind::Return(self.coerce(value, ret)?),
            StmtKind::While { condition, body } => StmtKind::While { condition,
                                                                     body: self.coerce_returns(body, ret)? },
            StmtKind::For { init,
                            condition,
                            step,
                            body, } => {
                let init = init.map(|s| self.coerce_return(*s, ret).map(Box::new)).transpose()?;
                let step = step.map(|s| self.coerce_return(*s, ret).map(Box::new)).transpose()?;
                StmtKind::For { init,
                                condition,
                                step,
                                body: self.coerce_returns(body, ret)? }
            },
            StmtKind::If { condition,
                           then_branch,
                           else_branch, } => {
                let then_branch = self.coerce_returns(then_branch, ret)?;
                let else_branch = else_branch.map(|b| self.coerce_returns(b, ret)).transpose()?;
                StmtKind::If { condition,
                               then_branch,
                               else_branch }
            },
            kind => kind,
        };
        Ok(Stmt::new(stmt.id, kind, stmt.span))
    }

    fn check_call(&mut self, expr: &Expr, callee: &Expr, args: &[Expr]) -> EcruResult<Expr> {
        let callee = self.check_expr(callee)?;
        let Type::Function { params, ret } = callee.ty.clone() else {
            return Err(Diagnostic::new(ErrorKind::IllegalCallError,
                                       callee.span,
                                       format!("a value of type {} cannot be called", callee.ty)));
        };
        if params.len() != args.len() {
            return Err(Diagnostic::new(ErrorKind::ArgumentLengthError,
                                       expr.span,
                                       format!("expected {} argument(s), found {}", params.len(), args.len())));
        }
        let args = args.iter()
                       .zip(&params)
                       .map(|(arg, param)| {
                           let arg = self.check_expr(arg)?;
                           self.coerce(arg, param)
                       })
                       .collect::<EcruResult<Vec<_>>>()?;
        Ok(Expr { id:   expr.id,
                  kind: ExprKind::Call { callee: Box::new(callee),
                                         args },
                  span: expr.span,
                  ty:   *ret, })
    }

    /// Types `base[index]`.
    ///
    /// Strings index to one-character strings. Tuples index to the
    /// component at a constant index, which is bounds-checked here; a
    /// computed index is only allowed when every component has the same
    /// type.
    fn check_index(&mut self, expr: &Expr, base: &Expr, index: &Expr) -> EcruResult<Expr> {
        let base = self.check_expr(base)?;
        let index = self.check_expr(index)?;
        let constant = match &index.kind {
            ExprKind::Literal(LiteralValue::Natural(n)) => n.get_val(),
            ExprKind::Literal(LiteralValue::Integer(_)) => Some(0),
            _ => None,
        };
        let ty = match &base.ty {
            Type::Str => Type::Str,
            Type::Product(components) => match constant {
                Some(i) => {
                    let component = usize::try_from(i).ok().and_then(|i| components.get(i));
                    component.cloned().ok_or_else(|| {
                                          Diagnostic::new(ErrorKind::OutOfBoundsError,
                                                          index.span,
                                                          format!("index {i} is out of bounds for a tuple of length {}",
                                                                  components.len()))
                                      })?
                },
                None => match components.split_first() {
                    Some((first, rest)) if rest.iter().all(|c| c == first) => first.clone(),
                    _ => {
                        return Err(Diagnostic::new(ErrorKind::IllegalIndexError,
                                                   index.span,
                                                   format!("a tuple of type {} needs a constant index",
                                                           base.ty)));
                    },
                },
            },
            other => {
                return Err(Diagnostic::new(ErrorKind::IllegalIndexError,
                                           base.span,
                                           format!("a value of type {other} cannot be indexed")));
            },
        };
        let index = self.coerce(index, &Type::Integer)?;
        Ok(Expr { id: expr.id,
                  kind: ExprKind::Index { base:  Box::new(base),
                                          index: Box::new(index), },
                  span: expr.span,
                  ty })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::{binder::bind_program, lexer::tokenize, parser::core::parse_program};

    fn check(source: &str) -> EcruResult<Program> {
        let program = parse_program(tokenize(source).unwrap()).unwrap();
        let resolution = bind_program(&program).unwrap();
        check_program(&program, &resolution)
    }

    fn error_kind(source: &str) -> ErrorKind {
        check(source).unwrap_err().kind
    }

    #[test]
    fn assignments_insert_casts() {
        assert_eq!(check("x: Z; x = 3;").unwrap().to_string(), "Program(DeclStmt(x,Z),AssignStmt(x,ToInt(3)))");
        assert_eq!(check("s: Str = 1.5;").unwrap().to_string(), "Program(DeclAssignStmt(s,Str,ToStr(1.5)))");
    }

    #[test]
    fn literals_fold_into_residues() {
        assert_eq!(check("m: Z/5Z = 7;").unwrap().to_string(), "Program(DeclAssignStmt(m,Z/5Z,2))");
    }

    #[test]
    fn cast_ids_follow_parser_ids() {
        let program = parse_program(tokenize("x: Z = 3;").unwrap()).unwrap();
        let resolution = bind_program(&program).unwrap();
        let typed = check_program(&program, &resolution).unwrap();
        assert_eq!(typed.node_count, program.node_count + 1);
        let StmtKind::DeclarationAndAssignment { value, .. } = &typed.statements[0].kind else {
            panic!("expected a declaration");
        };
        assert_eq!(value.id, NodeId(program.node_count));
    }

    #[test]
    fn missing_top_level_return() {
        assert_eq!(error_kind("f():Z{}"), ErrorKind::NonexistentReturnError);
        assert_eq!(error_kind("f(b: Bool): Z { if (b) { return 1; } }"), ErrorKind::NonexistentReturnError);
        assert!(check("f(b: Bool): Z { if (b) { return 1; } return 2; }").is_ok());
        assert!(check("f(): void {}").is_ok());
    }

    #[test]
    fn lambdas_infer_their_return_type() {
        let typed = check("f: N->Bool = \\lambda(n: N) => n > 3;").unwrap();
        let StmtKind::DeclarationAndAssignment { value, .. } = &typed.statements[0].kind else {
            panic!("expected a declaration");
        };
        assert_eq!(value.ty, Type::function(vec![Type::Natural], Type::Bool));
    }

    #[test]
    fn block_lambdas_infer_their_return_type() {
        let typed = check("f: Z->Z = \\lambda(x: Z) { if (x < 0) { return 1; } return x - 1; };").unwrap();
        let StmtKind::DeclarationAndAssignment { value, .. } = &typed.statements[0].kind else {
            panic!("expected a declaration");
        };
        assert_eq!(value.ty, Type::function(vec![Type::Integer], Type::Integer));
        assert!(value.to_string().contains("Body(Return(ToInt(1)))"), "{value}");

        let typed = check("g: void->void = \\lambda() { print 1; };").unwrap();
        assert!(typed.to_string().contains("FuncDecl(Params(),void,"), "{typed}");
    }

    #[test]
    fn calls_check_callee_and_arity() {
        assert_eq!(error_kind("x: Z; x(1);"), ErrorKind::IllegalCallError);
        assert_eq!(error_kind("f(a: Z): Z { return a; } f(1, 2);"), ErrorKind::ArgumentLengthError);
        assert_eq!(error_kind("f(a: Z): Z { return a; } f(\"s\" == \"t\");"),
                   ErrorKind::IllegalTypeConversionError);
    }

    #[test]
    fn indexing_rules() {
        assert!(check("t: Z*Str = (1, \"a\"); print t[1];").is_ok());
        assert_eq!(error_kind("t: Z*Str = (1, \"a\"); print t[2];"), ErrorKind::OutOfBoundsError);
        assert_eq!(error_kind("t: Z*Str = (1, \"a\"); i: Z; print t[i];"), ErrorKind::IllegalIndexError);
        assert!(check("t: Z^3; i: Z; print t[i];").is_ok());
        assert_eq!(error_kind("x: Z; print x[0];"), ErrorKind::IllegalIndexError);
    }
}
