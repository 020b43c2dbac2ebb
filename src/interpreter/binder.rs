use std::collections::HashMap;

use la_arena::{Arena, Idx};
use tracing::{debug, instrument};

use crate::{
    ast::{Expr, ExprKind, FuncDecl, NodeId, Program, Stmt, StmtKind},
    error::{Diagnostic, EcruResult, ErrorKind},
    interpreter::types::Type,
    util::span::Span,
};

pub type ScopeId = Idx<Scope>;
pub type SymbolId = Idx<Symbol>;

/// A lexical scope: the names declared directly in it and a link to the
/// enclosing scope.
#[derive(Debug, Default)]
pub struct Scope {
    parent:  Option<ScopeId>,
    symbols: HashMap<String, SymbolId>,
}

/// A declared identifier.
///
/// Symbols are created once, by a declaration or a parameter, and live for
/// the whole run. Their runtime values are held by the evaluator, keyed by
/// [`SymbolId`].
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name:  String,
    /// The declared type.
    pub ty:    Type,
    /// Where the symbol was declared.
    pub span:  Span,
    pub scope: ScopeId,
}

/// All scopes and symbols of one program, arena-allocated and addressed by
/// index.
#[derive(Debug)]
pub struct SymbolTable {
    scopes:  Arena<Scope>,
    symbols: Arena<Symbol>,
    root:    ScopeId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Creates a table holding only the empty global scope.
    #[must_use]
    pub fn new() -> Self {
        let mut scopes = Arena::new();
        let root = scopes.alloc(Scope::default());
        Self { scopes,
               symbols: Arena::new(),
               root }
    }

    /// The global scope.
    #[must_use]
    pub const fn root(&self) -> ScopeId {
        self.root
    }

    /// Opens a scope nested in `parent`.
    pub fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.alloc(Scope { parent:  Some(parent),
                                  symbols: HashMap::new(), })
    }

    /// Declares `name` in `scope`.
    ///
    /// Shadowing a name from an enclosing scope is allowed; declaring it
    /// twice in the same scope is not.
    ///
    /// # Errors
    /// `RedefinedIdentifierError` if `scope` already declares `name`.
    pub fn declare(&mut self, scope: ScopeId, name: &str, ty: Type, span: Span) -> EcruResult<SymbolId> {
        if let Some(&existing) = self.scopes[scope].symbols.get(name) {
            let previous = self.symbols[existing].span;
            return Err(Diagnostic::new(ErrorKind::RedefinedIdentifierError,
                                       span,
                                       format!("'{name}' is already declared in this scope at {previous}")));
        }
        let id = self.symbols.alloc(Symbol { name: name.to_string(),
                                             ty,
                                             span,
                                             scope });
        self.scopes[scope].symbols.insert(name.to_string(), id);
        Ok(id)
    }

    /// Resolves `name` from `scope` outward through the enclosing scopes.
    #[must_use]
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id];
            if let Some(&symbol) = scope.symbols.get(name) {
                return Some(symbol);
            }
            current = scope.parent;
        }
        None
    }

    #[must_use]
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id]
    }

    /// Number of declared symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// The output of binding: every name in the program tied to its symbol.
///
/// Keys are node ids:
///
/// - identifier expressions, assignments and declarations map to the symbol
///   they read, write or create,
/// - parameters map to their own symbol,
/// - function literals map to their frame: every symbol declared inside the
///   function (parameters and body locals, not the locals of nested
///   functions). The evaluator saves and restores a frame around each call.
#[derive(Debug, Default)]
pub struct Resolution {
    pub table: SymbolTable,
    uses:      HashMap<NodeId, SymbolId>,
    frames:    HashMap<NodeId, Vec<SymbolId>>,
}

impl Resolution {
    /// The symbol a node refers to.
    #[must_use]
    pub fn symbol_of(&self, node: NodeId) -> Option<SymbolId> {
        self.uses.get(&node).copied()
    }

    /// The symbol a node refers to, together with its record.
    ///
    /// # Errors
    /// `CompilerError` if the node was never bound; later passes only ask for
    /// nodes the binder has seen.
    pub fn resolve(&self, node: NodeId, span: Span) -> EcruResult<(SymbolId, &Symbol)> {
        let id = self.symbol_of(node).ok_or_else(|| {
                                         Diagnostic::new(ErrorKind::CompilerError,
                                                         span,
                                                         format!("node {} has no bound symbol", node.0))
                                     })?;
        Ok((id, self.table.symbol(id)))
    }

    /// The frame of the function literal with the given node id.
    #[must_use]
    pub fn frame(&self, func: NodeId) -> &[SymbolId] {
        self.frames.get(&func).map_or(&[], Vec::as_slice)
    }
}

/// Binds every identifier of a program to its declaration.
///
/// Blocks of `if`, `else`, `while` and `for` open child scopes, a `for`
/// header gets a scope of its own around its body, and each function gets a
/// parameter scope with a body scope inside it. A declaration is visible to
/// its own initializer, which is what lets a function call itself.
///
/// # Errors
/// `UndefinedIdentifierError` for names with no visible declaration and
/// `RedefinedIdentifierError` for duplicate declarations in one scope.
///
/// # Example
/// ```
/// use ecru::{
///     error::ErrorKind,
///     interpreter::{binder::bind_program, lexer::tokenize, parser::core::parse_program},
/// };
///
/// let program = parse_program(tokenize("x: Z; y = x;").unwrap()).unwrap();
///
/// assert_eq!(bind_program(&program).unwrap_err().kind, ErrorKind::UndefinedIdentifierError);
/// ```
#[instrument(skip_all)]
pub fn bind_program(program: &Program) -> EcruResult<Resolution> {
    let mut binder = Binder::default();
    let root = binder.resolution.table.root();
    binder.bind_block(&program.statements, root)?;
    debug!(symbols = binder.resolution.table.len(), "bound program");
    Ok(binder.resolution)
}

#[derive(Default)]
struct Binder {
    resolution: Resolution,
    /// Symbols collected for each function being bound, innermost last.
    open_frames: Vec<Vec<SymbolId>>,
}

impl Binder {
    fn declare(&mut self, scope: ScopeId, node: NodeId, name: &str, ty: &Type, span: Span) -> EcruResult<()> {
        let id = self.resolution.table.declare(scope, name, ty.clone(), span)?;
        self.resolution.uses.insert(node, id);
        if let Some(frame) = self.open_frames.last_mut() {
            frame.push(id);
        }
        Ok(())
    }

    fn reference(&mut self, scope: ScopeId, node: NodeId, name: &str, span: Span) -> EcruResult<()> {
        let id = self.resolution.table.lookup(scope, name).ok_or_else(|| {
                                                               Diagnostic::new(ErrorKind::UndefinedIdentifierError,
                                                                               span,
                                                                               format!("'{name}' is not defined"))
                                                           })?;
        self.resolution.uses.insert(node, id);
        Ok(())
    }

    fn bind_block(&mut self, statements: &[Stmt], scope: ScopeId) -> EcruResult<()> {
        statements.iter().try_for_each(|stmt| self.bind_stmt(stmt, scope))
    }

    fn bind_nested(&mut self, statements: &[Stmt], parent: ScopeId) -> EcruResult<()> {
        let scope = self.resolution.table.push_scope(parent);
        self.bind_block(statements, scope)
    }

    fn bind_stmt(&mut self, stmt: &Stmt, scope: ScopeId) -> EcruResult<()> {
        match &stmt.kind {
            StmtKind::Comment(_) => Ok(()),
            StmtKind::Declaration { name, ty } => self.declare(scope, stmt.id, name, ty, stmt.span),
            StmtKind::Assignment { name, value } => {
                self.bind_expr(value, scope)?;
                self.reference(scope, stmt.id, name, stmt.span)
            },
            StmtKind::DeclarationAndAssignment { name, ty, value } => {
                self.declare(scope, stmt.id, name, ty, stmt.span)?;
                self.bind_expr(value, scope)
            },
            StmtKind::Expr(expr) | StmtKind::Print { expr, .. } | StmtKind::Return(expr) => {
                self.bind_expr(expr, scope)
            },
            StmtKind::While { condition, body } => {
                self.bind_expr(condition, scope)?;
                self.bind_nested(body, scope)
            },
            StmtKind::For { init,
                            condition,
                            step,
                            body, } => {
                let header = self.resolution.table.push_scope(scope);
                if let Some(init) = init {
                    self.bind_stmt(init, header)?;
                }
                self.bind_expr(condition, header)?;
                if let Some(step) = step {
                    self.bind_stmt(step, header)?;
                }
                self.bind_nested(body, header)
            },
            StmtKind::If { condition,
                           then_branch,
                           else_branch, } => {
                self.bind_expr(condition, scope)?;
                self.bind_nested(then_branch, scope)?;
                if let Some(else_branch) = else_branch {
                    self.bind_nested(else_branch, scope)?;
                }
                Ok(())
            },
        }
    }

    fn bind_expr(&mut self, expr: &Expr, scope: ScopeId) -> EcruResult<()> {
        match &expr.kind {
            ExprKind::Id(name) => self.reference(scope, expr.id, name, expr.span),
            ExprKind::Literal(_) => Ok(()),
            ExprKind::Tuple(items) => items.iter().try_for_each(|item| self.bind_expr(item, scope)),
            ExprKind::FuncDecl(func) => self.bind_function(expr.id, func, scope),
            ExprKind::Call { callee, args } => {
                self.bind_expr(callee, scope)?;
                args.iter().try_for_each(|arg| self.bind_expr(arg, scope))
            },
            ExprKind::Index { base, index } => {
                self.bind_expr(base, scope)?;
                self.bind_expr(index, scope)
            },
            ExprKind::Binary { left, right, .. } => {
                self.bind_expr(left, scope)?;
                self.bind_expr(right, scope)
            },
            ExprKind::Unary { expr, .. } | ExprKind::Cast { expr, .. } => self.bind_expr(expr, scope),
        }
    }

    fn bind_function(&mut self, node: NodeId, func: &FuncDecl, scope: ScopeId) -> EcruResult<()> {
        self.open_frames.push(Vec::new());
        let params = self.resolution.table.push_scope(scope);
        let result = func.params
                         .iter()
                         .try_for_each(|param| self.declare(params, param.id, &param.name, &param.ty, param.span))
                         .and_then(|()| self.bind_nested(&func.body, params));
        let frame = self.open_frames.pop().unwrap_or_default();
        self.resolution.frames.insert(node, frame);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::{lexer::tokenize, parser::core::parse_program};

    fn bind(source: &str) -> (Program, EcruResult<Resolution>) {
        let program = parse_program(tokenize(source).unwrap()).unwrap();
        let resolution = bind_program(&program);
        (program, resolution)
    }

    fn error_kind(source: &str) -> ErrorKind {
        bind(source).1.unwrap_err().kind
    }

    #[test]
    fn uses_resolve_to_their_declaration() {
        let (program, resolution) = bind("x: Z; x = 3;");
        let resolution = resolution.unwrap();
        let declared = resolution.symbol_of(program.statements[0].id).unwrap();
        let assigned = resolution.symbol_of(program.statements[1].id).unwrap();
        assert_eq!(declared, assigned);
        assert_eq!(resolution.table.symbol(declared).ty, Type::Integer);
    }

    #[test]
    fn undefined_and_redefined_names() {
        assert_eq!(error_kind("x = 3;"), ErrorKind::UndefinedIdentifierError);
        assert_eq!(error_kind("print y;"), ErrorKind::UndefinedIdentifierError);
        assert_eq!(error_kind("x: Z; x: N;"), ErrorKind::RedefinedIdentifierError);
        assert_eq!(error_kind("f(a: Z, a: Z): void {}"), ErrorKind::RedefinedIdentifierError);
    }

    #[test]
    fn blocks_do_not_leak_declarations() {
        assert_eq!(error_kind("if (true) { y: Z; } y = 1;"), ErrorKind::UndefinedIdentifierError);
        assert_eq!(error_kind("for (i: Z = 0; i < 3; i += 1) {} print i;"),
                   ErrorKind::UndefinedIdentifierError);
        assert!(bind("x: Z; while (true) { x: N; }").1.is_ok());
    }

    #[test]
    fn parameters_may_be_shadowed_only_inside_the_body() {
        assert!(bind("f(x: Z): Z { x: N = 2; return x; }").1.is_ok());
        assert!(bind("f(n: N): N { return f(n); }").1.is_ok());
    }

    #[test]
    fn frames_hold_parameters_and_locals_but_not_nested_functions() {
        let (program, resolution) = bind("f(a: Z): Z { b: Z; g(c: Z): Z { d: Z; return c; } return a; }");
        let resolution = resolution.unwrap();
        let StmtKind::DeclarationAndAssignment { value, .. } = &program.statements[0].kind else {
            panic!("expected a function declaration");
        };
        let names = resolution.frame(value.id)
                              .iter()
                              .map(|&id| resolution.table.symbol(id).name.as_str())
                              .collect::<Vec<_>>();
        assert_eq!(names, ["a", "b", "g"]);
    }
}
