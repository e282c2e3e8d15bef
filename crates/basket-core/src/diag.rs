//! # Diagnostics
//!
//! Problems and infos attached to basket items.
//!
//! ## Two Kinds of Diagnostics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PROBLEMS (blocking, transient)                                        │
//! │  ─────────────────────────────                                         │
//! │  • Cleared at the start of every validation pass                       │
//! │  • Re-added by whatever still fails                                    │
//! │  • Hidden flag set when the item is not selected for purchase          │
//! │  • Simulated list: debug-only, never cleared by a pass                 │
//! │                                                                         │
//! │  INFOS (non-blocking, sticky)                                          │
//! │  ────────────────────────────                                          │
//! │  • At most one per InfoId, a new one replaces the old                  │
//! │  • Removed only when the client acknowledges (commit)                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Problem Code
// =============================================================================

/// Why an item cannot be bought as is. Codes are persisted.
///
/// Identity is the numeric code: `Other(1)` equals `NotAvailable`, matching
/// what a decode of the persisted form yields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProblemCode {
    NotAvailable,
    CountReduced,
    MaxCountExceeded,
    NotAllowedForCustomer,
    ResaleForbidden,
    ServiceUnavailableInCity,
    /// A code written by a newer service; kept so it survives re-encoding.
    Other(u32),
}

impl ProblemCode {
    pub const fn code(&self) -> u32 {
        match self {
            ProblemCode::NotAvailable => 1,
            ProblemCode::CountReduced => 2,
            ProblemCode::MaxCountExceeded => 3,
            ProblemCode::NotAllowedForCustomer => 4,
            ProblemCode::ResaleForbidden => 5,
            ProblemCode::ServiceUnavailableInCity => 6,
            ProblemCode::Other(code) => *code,
        }
    }

    pub const fn from_code(code: u32) -> Self {
        match code {
            1 => ProblemCode::NotAvailable,
            2 => ProblemCode::CountReduced,
            3 => ProblemCode::MaxCountExceeded,
            4 => ProblemCode::NotAllowedForCustomer,
            5 => ProblemCode::ResaleForbidden,
            6 => ProblemCode::ServiceUnavailableInCity,
            other => ProblemCode::Other(other),
        }
    }

    /// Maps an `Other` holding a known code to its named variant.
    pub const fn normalized(self) -> Self {
        ProblemCode::from_code(self.code())
    }
}

impl PartialEq for ProblemCode {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for ProblemCode {}

impl Hash for ProblemCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

// =============================================================================
// Problem
// =============================================================================

/// A blocking diagnostic on an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub code: ProblemCode,
    pub message: String,
    /// Set when the item was unselected at the time the problem was added.
    /// The client filters these out.
    pub hidden: bool,
}

impl Problem {
    pub fn new(code: ProblemCode, message: impl Into<String>) -> Self {
        Problem {
            code: code.normalized(),
            message: message.into(),
            hidden: false,
        }
    }

    pub fn not_available() -> Self {
        Problem::new(ProblemCode::NotAvailable, "Item is not available")
    }

    pub fn count_reduced(count: u32) -> Self {
        Problem::new(
            ProblemCode::CountReduced,
            format!("Only {count} items are available"),
        )
    }
}

// =============================================================================
// Info
// =============================================================================

/// Kind of info. At most one info of each kind is active on an item.
///
/// Compared, hashed and ordered by numeric code, so `Other(1)` and
/// `PriceChanged` are the same map key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InfoId {
    PriceChanged,
    CountChanged,
    BonusChanged,
    ChildRemoved,
    Other(u32),
}

impl InfoId {
    pub const fn code(&self) -> u32 {
        match self {
            InfoId::PriceChanged => 1,
            InfoId::CountChanged => 2,
            InfoId::BonusChanged => 3,
            InfoId::ChildRemoved => 4,
            InfoId::Other(code) => *code,
        }
    }

    pub const fn from_code(code: u32) -> Self {
        match code {
            1 => InfoId::PriceChanged,
            2 => InfoId::CountChanged,
            3 => InfoId::BonusChanged,
            4 => InfoId::ChildRemoved,
            other => InfoId::Other(other),
        }
    }

    pub const fn normalized(self) -> Self {
        InfoId::from_code(self.code())
    }
}

impl PartialEq for InfoId {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for InfoId {}

impl PartialOrd for InfoId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InfoId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code().cmp(&other.code())
    }
}

impl Hash for InfoId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

/// A non-blocking notice the client must acknowledge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub id: InfoId,
    pub message: String,
    pub old_value: i64,
    pub new_value: i64,
}

impl Info {
    pub fn new(id: InfoId, message: impl Into<String>) -> Self {
        Info {
            id: id.normalized(),
            message: message.into(),
            old_value: 0,
            new_value: 0,
        }
    }

    pub fn price_changed(old: Money, new: Money) -> Self {
        Info {
            id: InfoId::PriceChanged,
            message: format!("Price changed from {old} to {new}"),
            old_value: old.minor(),
            new_value: new.minor(),
        }
    }

    pub fn count_changed(old: u32, new: u32) -> Self {
        Info {
            id: InfoId::CountChanged,
            message: format!("Count changed from {old} to {new}"),
            old_value: old.into(),
            new_value: new.into(),
        }
    }
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Problems and infos of one item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    problems: Vec<Problem>,
    simulated: Vec<Problem>,
    infos: BTreeMap<InfoId, Info>,
}

impl Diagnostics {
    /// Appends a transient problem. `hidden` marks it for client-side filtering.
    pub fn add_problem(&mut self, mut problem: Problem, hidden: bool) {
        problem.code = problem.code.normalized();
        problem.hidden = hidden;
        self.problems.push(problem);
    }

    /// Transient problems followed by simulated ones.
    pub fn problems(&self) -> Vec<Problem> {
        self.problems
            .iter()
            .chain(self.simulated.iter())
            .cloned()
            .collect()
    }

    pub fn transient_problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn has_problem(&self, code: ProblemCode) -> bool {
        self.problems
            .iter()
            .chain(self.simulated.iter())
            .any(|p| p.code == code)
    }

    /// Starts a new validation pass. Simulated problems stay.
    pub fn clear_problems(&mut self) {
        self.problems.clear();
    }

    pub fn set_simulated(&mut self, problems: Vec<Problem>) {
        self.simulated = problems;
    }

    pub fn simulated(&self) -> &[Problem] {
        &self.simulated
    }

    /// Adds an info, replacing any active info of the same kind.
    pub fn add_info(&mut self, mut info: Info) -> Option<Info> {
        info.id = info.id.normalized();
        let replaced = self.infos.remove(&info.id);
        self.infos.insert(info.id, info);
        replaced
    }

    /// Acknowledges one info.
    pub fn commit_info(&mut self, id: InfoId) -> Option<Info> {
        self.infos.remove(&id)
    }

    pub fn info(&self, id: InfoId) -> Option<&Info> {
        self.infos.get(&id)
    }

    pub fn infos(&self) -> &BTreeMap<InfoId, Info> {
        &self.infos
    }

    pub(crate) fn replace_problems(&mut self, problems: Vec<Problem>) {
        self.problems = problems;
    }

    pub(crate) fn replace_infos(&mut self, infos: BTreeMap<InfoId, Info>) {
        self.infos = infos;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
