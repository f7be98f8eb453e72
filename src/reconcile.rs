//! Incremental reconciliation of the address table.
//!
//! The table is modeled as a [`TableView`]: an ordered list of rows keyed by
//! address, holding already-formatted cell strings. [`reconcile`] diffs the
//! view against a freshly merged record list and produces an edit script of
//! [`TableOp`]s; [`apply`] replays the script onto the view. The renderer
//! only ever draws the view, so rows that did not change are never rebuilt
//! and transient state (selection, expansion) survives every poll.

use std::collections::HashSet;

use crate::format::{format_address, format_currency};
use crate::model::AddressRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Balance,
    TokenCount,
    ProjectCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailSection {
    Tokens,
    Projects,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailItem {
    pub label: String,
    pub value: String,
}

/// Expanded breakdown under a row: top tokens and top projects, with the
/// full (untruncated) address as heading.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailBlock {
    pub address: String,
    pub tokens: Vec<DetailItem>,
    pub projects: Vec<DetailItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub address: String,
    pub label: String,
    pub balance: String,
    pub token_count: String,
    pub project_count: String,
    pub detail: Option<DetailBlock>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableView {
    pub rows: Vec<TableRow>,
}

impl TableView {
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn index_of(&self, address: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.address == address)
    }

    /// Current on-screen address order, top to bottom.
    pub fn order(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.address.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableOp {
    Insert {
        index: usize,
        row: TableRow,
    },
    Remove {
        address: String,
    },
    UpdateCell {
        address: String,
        column: Column,
        text: String,
    },
    SetDetail {
        address: String,
        detail: DetailBlock,
    },
    ClearDetail {
        address: String,
    },
    UpdateDetailValue {
        address: String,
        section: DetailSection,
        index: usize,
        text: String,
    },
}

pub fn build_row(record: &AddressRecord, expanded: bool, hidden: bool) -> TableRow {
    TableRow {
        address: record.address.clone(),
        label: format_address(&record.address),
        balance: format_currency(record.total_balance, hidden),
        token_count: record.token_count.to_string(),
        project_count: record.project_count.to_string(),
        detail: expanded.then(|| build_detail(record, hidden)),
    }
}

pub fn build_detail(record: &AddressRecord, hidden: bool) -> DetailBlock {
    DetailBlock {
        address: record.address.clone(),
        tokens: record
            .top_tokens
            .iter()
            .map(|token| DetailItem {
                label: token.symbol.clone(),
                value: format_currency(token.value, hidden),
            })
            .collect(),
        projects: record
            .top_projects
            .iter()
            .map(|project| DetailItem {
                label: project.name.clone(),
                value: format_currency(project.value, hidden),
            })
            .collect(),
    }
}

/// Diffs the rendered view against `records` (already in final display
/// order) and returns the minimal edit script. Reconciling twice with the
/// same input yields an empty script.
pub fn reconcile(
    view: &TableView,
    records: &[AddressRecord],
    expanded: &HashSet<String>,
    hidden: bool,
) -> Vec<TableOp> {
    let mut ops = Vec::new();

    // defensive: upstream lists are additive, but handle removal anyway
    let incoming: HashSet<&str> = records.iter().map(|r| r.address.as_str()).collect();
    let mut working: Vec<&str> = Vec::with_capacity(view.rows.len());
    for row in &view.rows {
        if incoming.contains(row.address.as_str()) {
            working.push(row.address.as_str());
        } else {
            ops.push(TableOp::Remove {
                address: row.address.clone(),
            });
        }
    }

    for (target_index, record) in records.iter().enumerate() {
        let is_expanded = expanded.contains(&record.address);

        let Some(row) = view
            .rows
            .iter()
            .find(|row| row.address == record.address)
        else {
            // new address: insert adjacent to its neighbor in the new order
            let index = target_index.min(working.len());
            working.insert(index, record.address.as_str());
            ops.push(TableOp::Insert {
                index,
                row: build_row(record, is_expanded, hidden),
            });
            continue;
        };

        let fresh = build_row(record, is_expanded, hidden);
        for (column, old, new) in [
            (Column::Balance, &row.balance, &fresh.balance),
            (Column::TokenCount, &row.token_count, &fresh.token_count),
            (Column::ProjectCount, &row.project_count, &fresh.project_count),
        ] {
            if old != new {
                ops.push(TableOp::UpdateCell {
                    address: record.address.clone(),
                    column,
                    text: new.clone(),
                });
            }
        }

        match (&row.detail, is_expanded) {
            (None, true) => ops.push(TableOp::SetDetail {
                address: record.address.clone(),
                detail: build_detail(record, hidden),
            }),
            (Some(_), false) => ops.push(TableOp::ClearDetail {
                address: record.address.clone(),
            }),
            (Some(current), true) => {
                let fresh_detail = build_detail(record, hidden);
                diff_detail(&record.address, current, &fresh_detail, &mut ops);
            }
            (None, false) => {}
        }
    }

    ops
}

fn diff_detail(address: &str, current: &DetailBlock, fresh: &DetailBlock, ops: &mut Vec<TableOp>) {
    let same_shape = |a: &[DetailItem], b: &[DetailItem]| {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.label == y.label)
    };

    // item set changed: replace the whole block
    if !same_shape(&current.tokens, &fresh.tokens) || !same_shape(&current.projects, &fresh.projects)
    {
        ops.push(TableOp::SetDetail {
            address: address.to_string(),
            detail: fresh.clone(),
        });
        return;
    }

    for (section, old_items, new_items) in [
        (DetailSection::Tokens, &current.tokens, &fresh.tokens),
        (DetailSection::Projects, &current.projects, &fresh.projects),
    ] {
        for (index, (old, new)) in old_items.iter().zip(new_items).enumerate() {
            if old.value != new.value {
                ops.push(TableOp::UpdateDetailValue {
                    address: address.to_string(),
                    section,
                    index,
                    text: new.value.clone(),
                });
            }
        }
    }
}

/// Replays an edit script onto the view.
pub fn apply(view: &mut TableView, ops: &[TableOp]) {
    for op in ops {
        match op {
            TableOp::Insert { index, row } => {
                let index = (*index).min(view.rows.len());
                view.rows.insert(index, row.clone());
            }
            TableOp::Remove { address } => {
                if let Some(i) = view.index_of(address) {
                    view.rows.remove(i);
                }
            }
            TableOp::UpdateCell {
                address,
                column,
                text,
            } => {
                if let Some(i) = view.index_of(address) {
                    let row = &mut view.rows[i];
                    match column {
                        Column::Balance => row.balance = text.clone(),
                        Column::TokenCount => row.token_count = text.clone(),
                        Column::ProjectCount => row.project_count = text.clone(),
                    }
                }
            }
            TableOp::SetDetail { address, detail } => {
                if let Some(i) = view.index_of(address) {
                    view.rows[i].detail = Some(detail.clone());
                }
            }
            TableOp::ClearDetail { address } => {
                if let Some(i) = view.index_of(address) {
                    view.rows[i].detail = None;
                }
            }
            TableOp::UpdateDetailValue {
                address,
                section,
                index,
                text,
            } => {
                if let Some(i) = view.index_of(address) {
                    if let Some(detail) = view.rows[i].detail.as_mut() {
                        let items = match section {
                            DetailSection::Tokens => &mut detail.tokens,
                            DetailSection::Projects => &mut detail.projects,
                        };
                        if let Some(item) = items.get_mut(*index) {
                            item.value = text.clone();
                        }
                    }
                }
            }
        }
    }
}
