use log::debug;

use crate::classify::{ClassificationTree, NodeId};
use crate::models::EtbRow;

/// Validated, filtered rows of one upload and the classification tree derived from them.
///
/// The tree is rebuilt whenever a dataset is constructed; it is never stored on its own.
#[derive(Debug, Clone)]
pub struct TrialBalanceDataset {
    rows: Vec<EtbRow>,
    tree: ClassificationTree,
}

impl TrialBalanceDataset {
    pub fn new(rows: Vec<EtbRow>) -> Self {
        let tree = ClassificationTree::build(&rows);
        debug!(
            "built classification tree: {} nodes, {} unclassified rows",
            tree.len(),
            tree.unclassified().len()
        );
        Self { rows, tree }
    }

    pub fn rows(&self) -> &[EtbRow] {
        &self.rows
    }

    pub fn tree(&self) -> &ClassificationTree {
        &self.tree
    }

    pub fn direct_rows(&self, id: NodeId) -> impl Iterator<Item = &EtbRow> {
        self.tree.node(id).direct_rows.iter().map(move |&i| &self.rows[i])
    }

    pub fn unclassified_rows(&self) -> impl Iterator<Item = &EtbRow> {
        self.tree.unclassified().iter().map(move |&i| &self.rows[i])
    }

    /// Rows classified at `id` or anywhere beneath it, in upload order.
    pub fn subtree_rows(&self, id: NodeId) -> Vec<&EtbRow> {
        let mut indices: Vec<usize> = self
            .tree
            .nodes()
            .filter(|&(nid, _)| nid == id || self.tree.is_ancestor(id, nid))
            .flat_map(|(_, node)| node.direct_rows.iter().copied())
            .collect();
        indices.sort_unstable();
        indices.into_iter().map(|i| &self.rows[i]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::row;

    #[test]
    fn test_direct_and_unclassified_rows() {
        let ds = TrialBalanceDataset::new(vec![
            row("1", "Cash", 1, 0, &["Assets", "Current", "Cash"]),
            row("2", "Suspense", 2, 0, &[]),
            row("3", "Bank", 3, 0, &["Assets", "Current", "Cash"]),
        ]);
        let cash = ds.tree().find_str("Assets > Current > Cash").unwrap();
        let names: Vec<&str> = ds.direct_rows(cash).map(|r| r.account_name.as_str()).collect();
        assert_eq!(names, vec!["Cash", "Bank"]);
        let unclassified: Vec<&str> = ds.unclassified_rows().map(|r| r.code.as_str()).collect();
        assert_eq!(unclassified, vec!["2"]);
    }

    #[test]
    fn test_subtree_rows_keep_upload_order() {
        let ds = TrialBalanceDataset::new(vec![
            row("1", "Cash", 1, 0, &["Assets", "Current", "Cash"]),
            row("2", "Plant", 2, 0, &["Assets", "Non-current", "PPE"]),
            row("3", "Debtors", 3, 0, &["Assets", "Current", "Receivables"]),
            row("4", "Sundry", 4, 0, &["Assets", "Current"]),
            row("5", "Creditors", 5, 0, &["Liabilities", "Current", "Payables"]),
        ]);
        let current = ds.tree().find_str("Assets > Current").unwrap();
        let codes: Vec<&str> = ds.subtree_rows(current).iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["1", "3", "4"]);

        let assets = ds.tree().find_str("Assets").unwrap();
        assert_eq!(ds.subtree_rows(assets).len(), 4);
    }
}
