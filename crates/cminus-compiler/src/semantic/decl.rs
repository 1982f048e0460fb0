//! Declarations: variables, arrays, functions and prototypes.

use cminus_ast::{Decl, FunctionDecl, VarDecl};
use cminus_core::{CompilationError, DataType};
use log::{debug, warn};

use super::SemanticAnalyzer;
use crate::scope::{Definition, ScopeId, SymbolEntry};

impl<'ast> SemanticAnalyzer<'ast> {
    pub(super) fn visit_decl(&mut self, decl: &'ast Decl<'ast>) {
        match decl {
            Decl::Var(var) => self.declare_var(var),
            Decl::Function(func) => self.visit_function(*func),
        }
    }

    /// Declare a variable, array or parameter in the current scope.
    ///
    /// A rejected redeclaration leaves the original entry in place.
    pub(super) fn declare_var(&mut self, var: &'ast VarDecl<'ast>) {
        let name = var.name();
        if let Some(original) = self.redeclared(name) {
            let kind = if var.is_array() {
                "Array variable"
            } else {
                "Variable"
            };
            self.report(CompilationError::Redeclaration {
                kind,
                name: name.to_string(),
                original,
                span: var.span(),
            });
            return;
        }

        let mut entry = SymbolEntry::new(name, Definition::Var(var), self.level(), var.declared_type());
        if entry.data_type == DataType::Void {
            warn!("{} declared void at {}, recording it as int", name, var.span());
            self.report(CompilationError::VoidVariable {
                name: name.to_string(),
                span: var.span(),
            });
            entry.data_type = DataType::Int;
            entry.normalized = true;
        }

        let scope = self.current_scope();
        debug!("declared {} in scope {} at level {}", name, scope, entry.level);
        self.table.insert(&scope, entry);
    }

    fn visit_function(&mut self, func: &'ast FunctionDecl<'ast>) {
        let name = func.name.name;

        let existing = self
            .table
            .lookup_in(&ScopeId::Global, name)
            .map(|entry| (entry.definition, entry.builtin, entry.span()));
        match existing {
            // A definition completing an earlier prototype replaces it.
            Some((Definition::Function(prev), false, _))
                if prev.is_prototype() && !func.is_prototype() =>
            {
                self.table.remove_from(&ScopeId::Global, name);
            }
            Some((_, _, original)) => {
                self.report(CompilationError::Redeclaration {
                    kind: "Function",
                    name: name.to_string(),
                    original,
                    span: func.span,
                });
                return;
            }
            None => {}
        }

        let entry = SymbolEntry::new(name, Definition::Function(func), self.level(), func.result);
        self.table.insert(&ScopeId::Global, entry);

        self.line(self.indent, &format!("Entering the scope for function {}:", name));
        self.indent += 1;

        let scope = ScopeId::Function(name.to_string());
        self.table.open_scope(&scope);
        self.push_scope(scope);
        let enclosing = self.current_function.replace(func);

        for param in func.params {
            self.declare_var(param);
        }
        if let Some(body) = func.body {
            self.check_expr(body);
        }

        self.dump_scope(self.indent);
        self.current_function = enclosing;
        self.pop_scope();
        self.indent = self.indent.saturating_sub(1);
        self.line(self.indent, "Leaving the function scope");
    }

    /// Report prototypes that never received a body.
    pub(super) fn check_missing_definitions(&mut self) {
        let missing: Vec<_> = self
            .table
            .entries(&ScopeId::Global)
            .iter()
            .filter(|entry| !entry.builtin)
            .filter_map(|entry| entry.definition.as_function())
            .filter(|func| func.is_prototype())
            .collect();
        for func in missing {
            self.report(CompilationError::MissingDefinition {
                name: func.name.name.to_string(),
                span: func.span,
            });
        }
    }
}
