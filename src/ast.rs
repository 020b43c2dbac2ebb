use std::{fmt, rc::Rc};

use crate::{
    interpreter::{
        types::Type,
        value::{integer::Integer, modulus::Modulus, natural::Natural, rational::Rational},
    },
    util::span::Span,
};

/// Identity of a tree node, unique within one [`Program`].
///
/// The binder keys its side tables by node id, so passes that rebuild the
/// tree keep the ids of the nodes they copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Represents a literal value in the language.
///
/// `LiteralValue` covers the constants that can appear directly in source
/// code, plus residue literals produced when the checker folds a coercion
/// into a constant.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// A string literal, with escapes already resolved.
    Str(Rc<str>),
    /// The literal `0`.
    Integer(Integer),
    /// A positive whole-number literal.
    Natural(Natural),
    /// A decimal literal such as `1.25`, kept unreduced.
    Rational {
        /// The exact value, `125/100` for `1.25`.
        value: Rational,
        /// The digits as written.
        text:  Rc<str>,
    },
    /// A residue class, only ever produced by the checker.
    Modulus(Modulus),
    /// `true` or `false`.
    Bool(bool),
    /// The `void` object.
    Void,
}

impl LiteralValue {
    /// The static type of this literal.
    #[must_use]
    pub const fn ty(&self) -> Type {
        match self {
            Self::Str(_) => Type::Str,
            Self::Integer(_) => Type::Integer,
            Self::Natural(_) => Type::Natural,
            Self::Rational { .. } => Type::Rational,
            Self::Modulus(m) => Type::Modulus(m.modulus()),
            Self::Bool(_) => Type::Bool,
            Self::Void => Type::Void,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    match c {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        other => write!(f, "{other}")?,
                    }
                }
                write!(f, "\"")
            },
            Self::Integer(i) => write!(f, "{i}"),
            Self::Natural(n) => write!(f, "{n}"),
            Self::Rational { text, .. } => write!(f, "{text}"),
            Self::Modulus(m) => write!(f, "{m}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Void => write!(f, "void"),
        }
    }
}

/// Represents a binary operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// Addition, or concatenation when either side is a string (`+`)
    Add,
    /// Subtraction (`-`)
    Sub,
    /// Multiplication (`*`)
    Mul,
    /// Division (`/`)
    Div,
    /// Floor modulus (`%`)
    Mod,
    /// Exponentiation (`^`)
    Pow,
    /// Equal to (`==`)
    Eq,
    /// Not equal to (`~=`)
    Neq,
    /// Less than (`<`)
    Lt,
    /// Less than or equal (`<=`)
    Le,
    /// Greater than (`>`)
    Gt,
    /// Greater than or equal (`>=`)
    Ge,
    /// Short-circuit conjunction (`&&`)
    And,
    /// Short-circuit disjunction (`||`)
    Or,
}

impl BinaryOperator {
    /// The node name used in the canonical tree rendering.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Sub => "Sub",
            Self::Mul => "Mul",
            Self::Div => "Div",
            Self::Mod => "Mod",
            Self::Pow => "Pow",
            Self::Eq => "Eq",
            Self::Neq => "Neq",
            Self::Lt => "Lt",
            Self::Le => "Le",
            Self::Gt => "Gt",
            Self::Ge => "Ge",
            Self::And => "And",
            Self::Or => "Or",
        }
    }

    /// Whether the operator compares its operands and yields `Bool`.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(self, Self::Eq | Self::Neq | Self::Lt | Self::Le | Self::Gt | Self::Ge)
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operator = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "^",
            Self::Eq => "==",
            Self::Neq => "~=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
        };
        write!(f, "{operator}")
    }
}

/// Represents a unary operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// Arithmetic negation (`-x`).
    Neg,
    /// Logical negation (`~x`).
    Not,
    /// Postfix factorial (`x!`).
    Fact,
}

impl UnaryOperator {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Neg => "Neg",
            Self::Not => "Not",
            Self::Fact => "Fact",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operator = match self {
            Self::Neg => "-",
            Self::Not => "~",
            Self::Fact => "!",
        };
        write!(f, "{operator}")
    }
}

/// An expression node.
///
/// `ty` starts out as [`Type::Any`]; the checker returns a copy of the tree
/// with every expression typed.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id:   NodeId,
    pub kind: ExprKind,
    pub span: Span,
    pub ty:   Type,
}

impl Expr {
    /// Creates an untyped expression node.
    #[must_use]
    pub const fn new(id: NodeId, kind: ExprKind, span: Span) -> Self {
        Self { id,
               kind,
               span,
               ty: Type::Any }
    }

    /// The same node with its static type set.
    #[must_use]
    pub fn typed(mut self, ty: Type) -> Self {
        self.ty = ty;
        self
    }
}

/// The variants of [`Expr`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Reference to a variable by name.
    Id(String),
    /// A constant.
    Literal(LiteralValue),
    /// A tuple of two or more expressions.
    Tuple(Vec<Expr>),
    /// A function literal, from a declaration or a lambda.
    FuncDecl(Rc<FuncDecl>),
    /// A call (`f(a, b)`).
    Call {
        callee: Box<Expr>,
        args:   Vec<Expr>,
    },
    /// Zero-based indexing (`t[i]`).
    Index {
        base:  Box<Expr>,
        index: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        op:    BinaryOperator,
        left:  Box<Expr>,
        right: Box<Expr>,
    },
    /// A unary operation.
    Unary {
        op:   UnaryOperator,
        expr: Box<Expr>,
    },
    /// A coercion inserted by the checker.
    Cast {
        target: Type,
        expr:   Box<Expr>,
    },
}

/// One formal parameter of a function.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub id:   NodeId,
    pub name: String,
    pub ty:   Type,
    pub span: Span,
}

/// A function literal.
///
/// Shared behind an `Rc` so that function values can refer to their body
/// without copying it.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    /// The declared name; `None` for lambdas.
    pub name:   Option<String>,
    pub params: Vec<Param>,
    /// The declared codomain.
    pub ret:    Type,
    pub body:   Vec<Stmt>,
    pub span:   Span,
}

impl FuncDecl {
    /// The function type `params -> ret`.
    #[must_use]
    pub fn ty(&self) -> Type {
        Type::function(self.params.iter().map(|p| p.ty.clone()).collect(), self.ret.clone())
    }
}

/// Which print statement was written.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PrintMode {
    /// `print`: display form.
    Print,
    /// `println`: display form and a newline.
    Println,
    /// `pprint`: structural form.
    PPrint,
    /// `pprintln`: structural form and a newline.
    PPrintln,
}

impl PrintMode {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Print => "Print",
            Self::Println => "Println",
            Self::PPrint => "PPrint",
            Self::PPrintln => "PPrintln",
        }
    }

    #[must_use]
    pub const fn is_pretty(self) -> bool {
        matches!(self, Self::PPrint | Self::PPrintln)
    }

    #[must_use]
    pub const fn newline(self) -> bool {
        matches!(self, Self::Println | Self::PPrintln)
    }
}

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub id:   NodeId,
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    #[must_use]
    pub const fn new(id: NodeId, kind: StmtKind, span: Span) -> Self {
        Self { id, kind, span }
    }
}

/// The variants of [`Stmt`].
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// A comment in statement position. Does nothing.
    Comment(String),
    /// `x: T;`
    Declaration {
        name: String,
        ty:   Type,
    },
    /// `x = e;`
    Assignment {
        name:  String,
        value: Expr,
    },
    /// `x: T = e;`, and the desugared form of `f(params): T { ... }`.
    DeclarationAndAssignment {
        name:  String,
        ty:    Type,
        value: Expr,
    },
    /// An expression evaluated for its effects.
    Expr(Expr),
    /// One of the four print statements.
    Print {
        mode: PrintMode,
        expr: Expr,
    },
    /// `while (c) { ... }`
    While {
        condition: Expr,
        body:      Vec<Stmt>,
    },
    /// `for (init; c; step) { ... }`
    For {
        init:      Option<Box<Stmt>>,
        condition: Expr,
        step:      Option<Box<Stmt>>,
        body:      Vec<Stmt>,
    },
    /// `if (c) { ... } else { ... }`. `else if` nests an `If` in the else body.
    If {
        condition:   Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    /// `return e;`. A bare `return;` returns `void`.
    Return(Expr),
}

/// The root of a parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub span:       Span,
    /// Number of node ids handed out by the parser. Later passes allocate
    /// fresh ids from here.
    pub node_count: u32,
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_body(f: &mut fmt::Formatter<'_>, body: &[Stmt]) -> fmt::Result {
    write!(f, "Body(")?;
    write_list(f, body)?;
    write!(f, ")")
}

fn cast_name(target: &Type) -> String {
    match target {
        Type::Integer => "ToInt".to_string(),
        Type::Natural => "ToNat".to_string(),
        Type::Rational | Type::Real => "ToRat".to_string(),
        Type::Modulus(n) => format!("ToMod{n}"),
        Type::Bool => "ToBool".to_string(),
        Type::Str => "ToStr".to_string(),
        Type::Product(_) => "ToTuple".to_string(),
        Type::Function { .. } => "ToMap".to_string(),
        Type::Void | Type::Any => "ToVoid".to_string(),
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Program(")?;
        write_list(f, &self.statements)?;
        write!(f, ")")
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StmtKind::Comment(_) => write!(f, "Comment"),
            StmtKind::Declaration { name, ty } => write!(f, "DeclStmt({name},{ty})"),
            StmtKind::Assignment { name, value } => write!(f, "AssignStmt({name},{value})"),
            StmtKind::DeclarationAndAssignment { name, ty, value } => {
                write!(f, "DeclAssignStmt({name},{ty},{value})")
            },
            StmtKind::Expr(expr) => write!(f, "ExprStmt({expr})"),
            StmtKind::Print { mode, expr } => write!(f, "{}({expr})", mode.name()),
            StmtKind::While { condition, body } => {
                write!(f, "While({condition},")?;
                write_body(f, body)?;
                write!(f, ")")
            },
            StmtKind::For { init,
                            condition,
                            step,
                            body, } => {
                write!(f, "For(")?;
                match init {
                    Some(init) => write!(f, "{init},")?,
                    None => write!(f, "_,")?,
                }
                write!(f, "{condition},")?;
                match step {
                    Some(step) => write!(f, "{step},")?,
                    None => write!(f, "_,")?,
                }
                write_body(f, body)?;
                write!(f, ")")
            },
            StmtKind::If { condition,
                           then_branch,
                           else_branch, } => {
                write!(f, "If({condition},")?;
                write_body(f, then_branch)?;
                if let Some(else_branch) = else_branch {
                    write!(f, ",")?;
                    write_body(f, else_branch)?;
                }
                write!(f, ")")
            },
            StmtKind::Return(expr) => write!(f, "Return({expr})"),
        }
    }
}

impl fmt::Display for FuncDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FuncDecl(Params(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}:{}", param.name, param.ty)?;
        }
        write!(f, "),{},", self.ret)?;
        write_body(f, &self.body)?;
        write!(f, ")")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Id(name) => write!(f, "{name}"),
            ExprKind::Literal(value) => write!(f, "{value}"),
            ExprKind::Tuple(items) => {
                write!(f, "Tuple(")?;
                write_list(f, items)?;
                write!(f, ")")
            },
            ExprKind::FuncDecl(func) => write!(f, "{func}"),
            ExprKind::Call { callee, args } => {
                write!(f, "Call({callee}")?;
                for arg in args {
                    write!(f, ",{arg}")?;
                }
                write!(f, ")")
            },
            ExprKind::Index { base, index } => write!(f, "Index({base},{index})"),
            ExprKind::Binary { op, left, right } => write!(f, "{}({left},{right})", op.name()),
            ExprKind::Unary { op, expr } => write!(f, "{}({expr})", op.name()),
            ExprKind::Cast { target, expr } => write!(f, "{}({expr})", cast_name(target)),
        }
    }
}
