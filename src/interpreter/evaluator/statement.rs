use crate::{
    ast::{Stmt, StmtKind},
    interpreter::{
        evaluator::core::{Context, EvalResult, Signal},
        value::core::Value,
    },
};

impl Context<'_> {
    /// Executes statements in order until one of them returns.
    ///
    /// # Returns
    /// [`Signal::Return`] from the first statement that produced it, or
    /// [`Signal::Continue`] once every statement has run.
    pub fn exec_block(&mut self, statements: &[Stmt]) -> EvalResult<Signal> {
        for stmt in statements {
            let signal = self.exec_stmt(stmt)?;
            if matches!(signal, Signal::Return(_)) {
                return Ok(signal);
            }
        }
        Ok(Signal::Continue)
    }

    /// Executes a single statement.
    ///
    /// A bare declaration resets the variable to its type's default every
    /// time it runs, so a declaration in a loop body starts fresh on each
    /// iteration.
    pub fn exec_stmt(&mut self, stmt: &Stmt) -> EvalResult<Signal> {
        match &stmt.kind {
            StmtKind::Comment(_) => {},
            StmtKind::Declaration { ty, .. } => {
                let id = self.symbol(stmt.id, stmt.span)?;
                self.set(id, Value::default_for(ty));
            },
            StmtKind::Assignment { value, .. } | StmtKind::DeclarationAndAssignment { value, .. } => {
                let value = self.eval(value)?;
                let id = self.symbol(stmt.id, stmt.span)?;
                self.set(id, Some(value));
            },
            StmtKind::Expr(expr) => {
                self.eval(expr)?;
            },
            StmtKind::Print { mode, expr } => {
                let value = self.eval(expr)?;
                let text = if mode.is_pretty() { value.pretty() } else { value.to_string() };
                self.buffer.print(&text, mode.newline());
            },
            StmtKind::While { condition, body } => {
                while self.eval_bool(condition)? {
                    let signal = self.exec_block(body)?;
                    if matches!(signal, Signal::Return(_)) {
                        return Ok(signal);
                    }
                }
            },
            StmtKind::For { init,
                            condition,
                            step,
                            body, } => {
                if let Some(init) = init {
                    self.exec_stmt(init)?;
                }
                while self.eval_bool(condition)? {
                    let signal = self.exec_block(body)?;
                    if matches!(signal, Signal::Return(_)) {
                        return Ok(signal);
                    }
                    if let Some(step) = step {
                        self.exec_stmt(step)?;
                    }
                }
            },
            StmtKind::If { condition,
                           then_branch,
                           else_branch, } => {
                if self.eval_bool(condition)? {
                    return self.exec_block(then_branch);
                }
                if let Some(else_branch) = else_branch {
                    return self.exec_block(else_branch);
                }
            },
            StmtKind::Return(expr) => return Ok(Signal::Return(self.eval(expr)?)),
        }
        Ok(Signal::Continue)
    }
}
