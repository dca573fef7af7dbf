//! The stack of currently open scopes

use crate::entity::TableId;
use crate::error::Fatal;
use crate::forest::SymbolForest;
use crate::table::TableKind;
use std::iter;
use tracing::debug;

/// Open tables mirroring lexical nesting; the global table is always at the bottom
///
/// Popping never frees anything: the table belongs to whoever pushed it.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    global: TableId,
    tables: Vec<TableId>,
}

impl ScopeStack {
    /// Stack holding only `global`
    pub fn new(global: TableId) -> Self {
        Self {
            global,
            tables: Vec::new(),
        }
    }

    /// Innermost open table
    pub fn current(&self) -> TableId {
        self.tables.last().copied().unwrap_or(self.global)
    }

    /// The global table
    pub fn first(&self) -> TableId {
        self.global
    }

    /// Open `table`
    pub fn push(&mut self, table: TableId) {
        self.tables.push(table);
        debug!(?table, depth = self.depth(), "push scope");
    }

    /// Close the innermost table and return it
    ///
    /// # Errors
    ///
    /// Returns `Fatal::PopGlobal` when only the global table is open.
    pub fn pop(&mut self) -> Result<TableId, Fatal> {
        let table = self.tables.pop().ok_or(Fatal::PopGlobal)?;
        debug!(?table, depth = self.depth(), "pop scope");
        Ok(table)
    }

    /// Open a qualifier chain outermost first; returns how many were pushed
    pub fn push_chain(&mut self, tables: &[TableId]) -> usize {
        for &table in tables {
            self.push(table);
        }
        tables.len()
    }

    /// Close `count` tables opened by [`push_chain`](Self::push_chain)
    ///
    /// # Errors
    ///
    /// Returns `Fatal::PopGlobal` if fewer than `count` tables are open.
    pub fn pop_chain(&mut self, count: usize) -> Result<(), Fatal> {
        for _ in 0..count {
            self.pop()?;
        }
        Ok(())
    }

    /// Number of open tables, global included
    pub fn depth(&self) -> usize {
        self.tables.len() + 1
    }

    /// Open tables, innermost first
    pub fn iter(&self) -> impl Iterator<Item = TableId> + '_ {
        self.tables
            .iter()
            .rev()
            .copied()
            .chain(iter::once(self.global))
    }

    /// Whether `table` is open
    pub fn contains(&self, table: TableId) -> bool {
        table == self.global || self.tables.contains(&table)
    }

    /// The function table enclosing the current block
    ///
    /// # Errors
    ///
    /// Returns `Fatal::NotInFunction` unless the current table is a
    /// function or block table.
    pub fn nearest_function_table(&self, forest: &SymbolForest) -> Result<TableId, Fatal> {
        for table in self.iter() {
            match forest.table(table)?.kind() {
                TableKind::Local => continue,
                TableKind::Function => return Ok(table),
                _ => break,
            }
        }
        Err(Fatal::NotInFunction)
    }

    /// Innermost open namespace table, or the global table
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle.
    pub fn nearest_global_or_namespace(&self, forest: &SymbolForest) -> Result<TableId, Fatal> {
        for table in self.iter() {
            if matches!(
                forest.table(table)?.kind(),
                TableKind::Global | TableKind::Namespace
            ) {
                return Ok(table);
            }
        }
        Ok(self.global)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityDraft, FunctionSig, Type};
    use crate::table::LocalKind;
    use sb_intern::Interner;
    use sb_span::FileSpan;

    #[test]
    fn test_global_is_never_popped() {
        let forest = SymbolForest::new(Interner::new());
        let mut stack = ScopeStack::new(forest.global());
        assert_eq!(stack.current(), forest.global());
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.pop(), Err(Fatal::PopGlobal));
        assert_eq!(stack.current(), forest.global());
    }

    #[test]
    fn test_nearest_function_walks_blocks() {
        let mut forest = SymbolForest::new(Interner::new());
        let global = forest.global();
        let main = forest.interner().intern("main");
        let function = forest
            .add_entity(
                global,
                EntityDraft::function(main, Type::function(Type::int(), FunctionSig::new(vec![])), FileSpan::synthetic()),
            )
            .unwrap()
            .entity;
        let mut stack = ScopeStack::new(global);
        assert_eq!(stack.nearest_function_table(&forest), Err(Fatal::NotInFunction));

        let body = forest.open_function(function).unwrap();
        stack.push(body);
        let block = forest.open_block(LocalKind::Block, body).unwrap();
        stack.push(block);
        let catch = forest.open_block(LocalKind::Catch, block).unwrap();
        stack.push(catch);

        assert_eq!(stack.nearest_function_table(&forest), Ok(body));
        assert_eq!(stack.nearest_global_or_namespace(&forest), Ok(global));
        assert_eq!(stack.iter().collect::<Vec<_>>(), vec![catch, block, body, global]);
        stack.pop_chain(3).unwrap();
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_push_chain_counts() {
        let forest = SymbolForest::new(Interner::new());
        let mut stack = ScopeStack::new(forest.global());
        let pushed = stack.push_chain(&[forest.global(), forest.global()]);
        assert_eq!(pushed, 2);
        assert_eq!(stack.pop_chain(3), Err(Fatal::PopGlobal));
    }
}
