//! Column sorting and the stable merge of freshly fetched addresses into
//! the on-screen order.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::AddressRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    TotalBalance,
    TokenCount,
    ProjectCount,
}

impl SortField {
    pub fn title(self) -> &'static str {
        match self {
            SortField::TotalBalance => "Balance",
            SortField::TokenCount => "Tokens",
            SortField::ProjectCount => "Projects",
        }
    }

    fn key(self, record: &AddressRecord) -> f64 {
        match self {
            SortField::TotalBalance => record.total_balance,
            SortField::TokenCount => record.token_count as f64,
            SortField::ProjectCount => record.project_count as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> SortDirection {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

/// Current sort selection. At most one field is active; the field sticks
/// around after it was set so the merge keeps using it as its criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    pub field: Option<SortField>,
    pub direction: SortDirection,
}

impl SortState {
    /// Clicking the active column flips direction; a new column starts
    /// descending.
    pub fn toggle(&mut self, field: SortField) {
        if self.field == Some(field) {
            self.direction = self.direction.flipped();
        } else {
            self.field = Some(field);
            self.direction = SortDirection::Desc;
        }
    }
}

pub fn compare(
    a: &AddressRecord,
    b: &AddressRecord,
    field: SortField,
    direction: SortDirection,
) -> Ordering {
    let ord = field
        .key(a)
        .partial_cmp(&field.key(b))
        .unwrap_or(Ordering::Equal);
    match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

pub fn sort_records(records: &mut [AddressRecord], field: SortField, direction: SortDirection) {
    records.sort_by(|a, b| compare(a, b, field, direction));
}

/// Merges a fetched address list against the order currently on screen.
///
/// Addresses already displayed keep their position; addresses that vanished
/// from the fetch are dropped; genuinely new addresses are inserted where a
/// linear scan against the last-ever-set sort criterion places them, or
/// appended at the end when no sort was ever chosen.
pub fn merge_incoming(
    on_screen: &[String],
    fetched: &[AddressRecord],
    state: &SortState,
) -> Vec<AddressRecord> {
    let mut by_addr: HashMap<&str, &AddressRecord> = fetched
        .iter()
        .map(|record| (record.address.as_str(), record))
        .collect();

    let mut merged: Vec<AddressRecord> = on_screen
        .iter()
        .filter_map(|addr| by_addr.remove(addr.as_str()))
        .cloned()
        .collect();

    for record in fetched {
        if !by_addr.contains_key(record.address.as_str()) {
            continue; // already on screen
        }
        match state.field {
            Some(field) => {
                let pos = merged.iter().position(|existing| {
                    let new_key = field.key(record);
                    let existing_key = field.key(existing);
                    match state.direction {
                        SortDirection::Asc => new_key < existing_key,
                        SortDirection::Desc => new_key > existing_key,
                    }
                });
                match pos {
                    Some(i) => merged.insert(i, record.clone()),
                    None => merged.push(record.clone()),
                }
            }
            None => merged.push(record.clone()),
        }
    }

    merged
}
