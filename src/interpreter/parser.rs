/// Token stream, parser entry points and shared parser types.
///
/// Holds [`core::TokenStream`], the comment-aware cursor over the token
/// sequence that also hands out node ids, and [`core::parse_program`].
pub mod core;

/// Statement parsing.
///
/// Chooses a statement form by lookahead and parses declarations,
/// assignments, print statements, control flow and function declarations.
pub mod statement;

/// Binary operator parsing.
///
/// One function per precedence level, from `||` down to `^`.
pub mod binary;

/// Unary, postfix and primary expressions.
///
/// Negations, factorial, calls, indexing, literals, tuples and lambdas.
pub mod unary;

/// Type annotation parsing.
pub mod types;

/// Helpers shared by the other parser modules: comma-separated lists,
/// parameter lists, numeric literals and string escapes.
pub mod utils;

#[cfg(test)]
mod tests {
    use crate::{
        error::ErrorKind,
        interpreter::{lexer::tokenize, parser::core::parse_program},
    };

    fn tree(source: &str) -> String {
        parse_program(tokenize(source).unwrap()).map_or_else(|_| "Error".to_string(), |p| p.to_string())
    }

    #[test]
    fn canonical_renderings() {
        assert_eq!(tree("x = 3;"), "Program(AssignStmt(x,3))");
        assert_eq!(tree(""), "Program()");
        assert_eq!(tree("x"), "Error");
        assert_eq!(tree("x: Z; x = 3;"), "Program(DeclStmt(x,Z),AssignStmt(x,3))");
    }

    #[test]
    fn function_declaration_is_declaration_sugar() {
        assert_eq!(tree("f(x:Z):Z{return x+1;}"),
                   "Program(DeclAssignStmt(f,Z->Z,FuncDecl(Params(x:Z),Z,Body(Return(Add(x,1))))))");
        assert_eq!(tree("g(): void { print 1; }"),
                   "Program(DeclAssignStmt(g,void->void,FuncDecl(Params(),void,Body(Print(1)))))");
    }

    #[test]
    fn control_flow() {
        assert_eq!(tree("while (i < 3) { i += 1; }"),
                   "Program(While(Lt(i,3),Body(AssignStmt(i,Add(i,1)))))");
        assert_eq!(tree("for (i: Z = 0; i < 3; i = i + 1) { println i; }"),
                   "Program(For(DeclAssignStmt(i,Z,0),Lt(i,3),AssignStmt(i,Add(i,1)),Body(Println(i))))");
        assert_eq!(tree("for (; true;) {}"), "Program(For(_,true,_,Body()))");
        assert_eq!(tree("if (a) { return; } else if (b) { pprint 1; } else {}"),
                   "Program(If(a,Body(Return(void)),Body(If(b,Body(PPrint(1)),Body()))))");
    }

    #[test]
    fn conditions_are_parenthesized() {
        assert_eq!(tree("if a { print 1; }"), "Error");
        assert_eq!(tree("while a { print 1; }"), "Error");
        assert_eq!(tree("if (a) b; "), "Error");
        assert_eq!(tree("while ((a)) {}"), "Program(While(a,Body()))");
    }

    #[test]
    fn declarations_are_told_from_calls_by_one_scan() {
        assert_eq!(tree("f(g(1), (2, 3));"), "Program(ExprStmt(Call(f,Call(g,1),Tuple(2,3))))");
        assert_eq!(tree("f /* c */ (x: Z) /* c */ : Z { return x; }"),
                   "Program(DeclAssignStmt(f,Z->Z,FuncDecl(Params(x:Z),Z,Body(Return(x)))))");
        assert_eq!(tree("f((1);"), "Error");
        let args = "(1), ".repeat(20_000);
        assert!(tree(&format!("f({args}0);")).starts_with("Program(ExprStmt(Call(f,1,1,"));
    }

    #[test]
    fn comments_in_statement_position_become_statements() {
        assert_eq!(tree("// hi\nx = 1; /* a */ y = 2;"), "Program(Comment,AssignStmt(x,1),Comment,AssignStmt(y,2))");
        assert_eq!(tree("x = /* inline */ 1;"), "Program(AssignStmt(x,1))");
    }

    #[test]
    fn missing_semicolon_has_its_own_kind() {
        let error = parse_program(tokenize("print 1").unwrap()).unwrap_err();
        assert_eq!(error.kind, ErrorKind::MissingSemicolonError);
        let error = parse_program(tokenize("if (x) { print 1;").unwrap()).unwrap_err();
        assert_eq!(error.kind, ErrorKind::ParserError);
    }
}
