use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::NodeId;
use crate::dataset::TrialBalanceDataset;
use crate::models::Period;

// ---------------------------------------------------------------------------
// Statement labels
// ---------------------------------------------------------------------------

/// Depth-1 classification labels that feed each statement, matched ignoring case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLabels {
    #[serde(default = "default_assets")]
    pub assets: String,
    #[serde(default = "default_liabilities")]
    pub liabilities: String,
    #[serde(default = "default_equity")]
    pub equity: String,
    #[serde(default = "default_revenue")]
    pub revenue: Vec<String>,
    #[serde(default = "default_expenses")]
    pub expenses: Vec<String>,
}

fn default_assets() -> String {
    "Assets".to_string()
}

fn default_liabilities() -> String {
    "Liabilities".to_string()
}

fn default_equity() -> String {
    "Equity".to_string()
}

fn default_revenue() -> Vec<String> {
    vec!["Revenue".to_string(), "Income".to_string()]
}

fn default_expenses() -> Vec<String> {
    vec!["Expenses".to_string(), "Expense".to_string()]
}

impl Default for StatementLabels {
    fn default() -> Self {
        Self {
            assets: default_assets(),
            liabilities: default_liabilities(),
            equity: default_equity(),
            revenue: default_revenue(),
            expenses: default_expenses(),
        }
    }
}

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

/// Sum of the node's own rows plus the totals of all of its children.
///
/// Validation keeps each column's summed magnitudes within `i64`, so no total, section sum
/// or difference drawn from one dataset can overflow.
pub fn total(dataset: &TrialBalanceDataset, id: NodeId, period: Period) -> i64 {
    let own: i64 = dataset.direct_rows(id).map(|r| r.amount(period)).sum();
    let children: i64 = dataset
        .tree()
        .node(id)
        .children
        .values()
        .map(|&child| total(dataset, child, period))
        .sum();
    own + children
}

/// Total of every depth-1 subtree labelled `label` in any letter case, or zero when there
/// is none.
pub fn category_total(dataset: &TrialBalanceDataset, label: &str, period: Period) -> i64 {
    dataset
        .tree()
        .roots_named(label)
        .into_iter()
        .map(|id| total(dataset, id, period))
        .sum()
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementLine {
    pub label: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementSection {
    pub name: String,
    pub total: i64,
    pub lines: Vec<StatementLine>,
}

fn row_label(code: &str, name: &str) -> String {
    match (code.is_empty(), name.is_empty()) {
        (false, false) => format!("{code} {name}"),
        (true, false) => name.to_string(),
        _ => code.to_string(),
    }
}

/// One line per child subtree, then one line per row sitting directly on the node.
pub fn section_for(dataset: &TrialBalanceDataset, id: NodeId, name: &str, period: Period) -> StatementSection {
    let tree = dataset.tree();
    let mut lines: Vec<StatementLine> = tree
        .children(id)
        .into_iter()
        .map(|child| StatementLine {
            label: tree.node(child).label().to_string(),
            amount: total(dataset, child, period),
        })
        .collect();
    lines.extend(dataset.direct_rows(id).map(|r| StatementLine {
        label: row_label(&r.code, &r.account_name),
        amount: r.amount(period),
    }));
    StatementSection {
        name: name.to_string(),
        total: lines.iter().map(|l| l.amount).sum(),
        lines,
    }
}

fn rows_only_section(dataset: &TrialBalanceDataset, id: NodeId, name: &str, period: Period) -> StatementSection {
    let lines: Vec<StatementLine> = dataset
        .direct_rows(id)
        .map(|r| StatementLine {
            label: row_label(&r.code, &r.account_name),
            amount: r.amount(period),
        })
        .collect();
    StatementSection {
        name: name.to_string(),
        total: lines.iter().map(|l| l.amount).sum(),
        lines,
    }
}

fn section_name(child_label: &str, category: &str) -> String {
    let squashed: String = child_label
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    if squashed == "current" || squashed == "noncurrent" {
        format!("{child_label} {category}")
    } else {
        child_label.to_string()
    }
}

/// Sections of one balance sheet category: one per depth-2 child, plus one for rows that
/// stop at the category itself. Roots spelled in different cases each contribute theirs.
fn category_sections(dataset: &TrialBalanceDataset, label: &str, period: Period) -> Vec<StatementSection> {
    let tree = dataset.tree();
    let mut sections = Vec::new();
    for root in tree.roots_named(label) {
        let category = tree.node(root).label();
        sections.extend(
            tree.children(root)
                .into_iter()
                .map(|child| section_for(dataset, child, &section_name(tree.node(child).label(), category), period)),
        );
        if !tree.node(root).direct_rows.is_empty() {
            sections.push(rows_only_section(dataset, root, category, period));
        }
    }
    sections
}

fn sum(sections: &[StatementSection]) -> i64 {
    sections.iter().map(|s| s.total).sum()
}

// ---------------------------------------------------------------------------
// Balance sheet
// ---------------------------------------------------------------------------

/// Assets do not equal liabilities plus equity. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceWarning {
    pub period: Period,
    pub assets: i64,
    pub liabilities: i64,
    pub equity: i64,
    pub difference: i64,
}

impl fmt::Display for BalanceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: assets ({}) != liabilities ({}) + equity ({}); difference {}",
            self.period.label(),
            self.assets,
            self.liabilities,
            self.equity,
            self.difference
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSheet {
    pub period: Period,
    pub assets: Vec<StatementSection>,
    pub liabilities: Vec<StatementSection>,
    pub equity: Vec<StatementSection>,
    pub total_assets: i64,
    pub total_liabilities: i64,
    pub total_equity: i64,
    pub warning: Option<BalanceWarning>,
}

pub fn balance_sheet(dataset: &TrialBalanceDataset, labels: &StatementLabels, period: Period) -> BalanceSheet {
    let assets = category_sections(dataset, &labels.assets, period);
    let liabilities = category_sections(dataset, &labels.liabilities, period);
    let equity = category_sections(dataset, &labels.equity, period);
    let total_assets = category_total(dataset, &labels.assets, period);
    let total_liabilities = category_total(dataset, &labels.liabilities, period);
    let total_equity = category_total(dataset, &labels.equity, period);
    let difference = total_assets - (total_liabilities + total_equity);
    let warning = (difference != 0).then(|| BalanceWarning {
        period,
        assets: total_assets,
        liabilities: total_liabilities,
        equity: total_equity,
        difference,
    });
    BalanceSheet {
        period,
        assets,
        liabilities,
        equity,
        total_assets,
        total_liabilities,
        total_equity,
        warning,
    }
}

/// Balance warnings for both years.
pub fn reconcile(dataset: &TrialBalanceDataset, labels: &StatementLabels) -> Vec<BalanceWarning> {
    [Period::CurrentYear, Period::PriorYear]
        .into_iter()
        .filter_map(|period| balance_sheet(dataset, labels, period).warning)
        .collect()
}

// ---------------------------------------------------------------------------
// Income statement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomeStatement {
    pub period: Period,
    pub revenue: Vec<StatementSection>,
    pub expenses: Vec<StatementSection>,
    pub total_revenue: i64,
    pub total_expenses: i64,
    pub net_result: i64,
}

fn root_sections(dataset: &TrialBalanceDataset, labels: &[String], period: Period) -> Vec<StatementSection> {
    let tree = dataset.tree();
    tree.roots()
        .into_iter()
        .filter(|&id| {
            let label = tree.node(id).label();
            labels.iter().any(|l| l.trim().eq_ignore_ascii_case(label))
        })
        .map(|id| section_for(dataset, id, tree.node(id).label(), period))
        .collect()
}

/// Revenue is credit-normal and expenses debit-normal, both stored positive; no sign is
/// flipped here.
pub fn income_statement(dataset: &TrialBalanceDataset, labels: &StatementLabels, period: Period) -> IncomeStatement {
    let revenue = root_sections(dataset, &labels.revenue, period);
    let expenses = root_sections(dataset, &labels.expenses, period);
    let (total_revenue, total_expenses) = (sum(&revenue), sum(&expenses));
    IncomeStatement {
        period,
        revenue,
        expenses,
        total_revenue,
        total_expenses,
        net_result: total_revenue - total_expenses,
    }
}

// ---------------------------------------------------------------------------
// Comparatives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparativeLine {
    pub label: String,
    pub current: i64,
    pub prior: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparativeSection {
    pub name: String,
    pub lines: Vec<ComparativeLine>,
    pub current_total: i64,
    pub prior_total: i64,
}

/// Pair current- and prior-year sections built from the same dataset.
///
/// Both sides come from one classification tree, so sections and lines line up by position.
pub fn side_by_side(current: &[StatementSection], prior: &[StatementSection]) -> Vec<ComparativeSection> {
    current
        .iter()
        .zip(prior)
        .map(|(cy, py)| ComparativeSection {
            name: cy.name.clone(),
            lines: cy
                .lines
                .iter()
                .zip(&py.lines)
                .map(|(c, p)| ComparativeLine {
                    label: c.label.clone(),
                    current: c.amount,
                    prior: p.amount,
                })
                .collect(),
            current_total: cy.total,
            prior_total: py.total,
        })
        .collect()
}
