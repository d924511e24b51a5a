//! Edge requirement predicates and the player-state interface they are
//! evaluated against. Evaluation is conservative: anything the player view
//! cannot answer counts as unmet.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::models::{EdgeType, GraphEdge};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestState {
    NotStarted,
    InProgress,
    Finished,
}

/// The account class an edge is closed to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IronmanKind {
    NonIronman,
    NoHardcore,
    NoUltimate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Requirement {
    MagicLevel { level: i32 },
    AgilityLevel { level: i32 },
    CombatLevel { level: i32 },
    Skill { name: String, level: i32 },
    Quest { name: String, state: QuestState },
    Item {
        id: i32,
        qty: i32,
        #[serde(default)]
        consumed: bool,
    },
    Gold { amount: i64 },
    Runes { name: String, qty: i32 },
    IronmanRestriction { kind: IronmanKind },
    Favour { house: String, pct: i32 },
}

/// Player-state view the core consumes. Accessors returning `Option` model
/// "evaluation unavailable"; `None` never satisfies a requirement.
pub trait PlayerRequirements: Send + Sync {
    fn magic_level(&self) -> Option<i32>;
    fn agility_level(&self) -> Option<i32>;
    fn combat_level(&self) -> Option<i32>;
    fn skill_level(&self, name: &str) -> Option<i32>;
    fn inventory_gold(&self) -> i64;
    fn total_gold(&self) -> i64;
    fn has_item(&self, id: i32, qty: i32) -> bool;
    fn has_runes(&self, name: &str, qty: i32) -> bool;
    fn is_quest_completed(&self, name: &str) -> bool;
    fn is_ironman(&self) -> bool;
    fn is_hardcore(&self) -> bool;
    fn is_ultimate(&self) -> bool;
    fn favour_percent(&self, house: &str) -> Option<i32>;
    fn acceptable_risk_threshold(&self) -> f64;

    fn satisfies(&self, req: &Requirement) -> bool {
        match req {
            Requirement::MagicLevel { level } => self.magic_level().is_some_and(|v| v >= *level),
            Requirement::AgilityLevel { level } => self.agility_level().is_some_and(|v| v >= *level),
            Requirement::CombatLevel { level } => self.combat_level().is_some_and(|v| v >= *level),
            Requirement::Skill { name, level } => self.skill_level(name).is_some_and(|v| v >= *level),
            Requirement::Quest { name, state } => match state {
                // Completion is the only signal the interface exposes; a
                // finished quest has also passed every earlier state.
                QuestState::Finished | QuestState::InProgress => self.is_quest_completed(name),
                QuestState::NotStarted => !self.is_quest_completed(name),
            },
            Requirement::Item { id, qty, .. } => self.has_item(*id, *qty),
            Requirement::Gold { amount } => self.inventory_gold() >= *amount,
            Requirement::Runes { name, qty } => self.has_runes(name, *qty),
            Requirement::IronmanRestriction { kind } => match kind {
                IronmanKind::NonIronman => !self.is_ironman(),
                IronmanKind::NoHardcore => !self.is_hardcore(),
                IronmanKind::NoUltimate => !self.is_ultimate(),
            },
            Requirement::Favour { house, pct } => self.favour_percent(house).is_some_and(|v| v >= *pct),
        }
    }

    /// Conjunction of the edge's requirement list plus the edge-level gates
    /// (agility level field, risk threshold on failure-prone edges).
    fn can_traverse_edge(&self, edge: &GraphEdge) -> bool {
        if let Some(level) = edge.agility_level {
            if !self.agility_level().is_some_and(|v| v >= level) {
                return false;
            }
        }
        if edge.edge_type == EdgeType::Agility && edge.failure_rate > self.acceptable_risk_threshold() {
            return false;
        }
        edge.requirements.iter().all(|r| self.satisfies(r))
    }
}

/// Concrete per-tick snapshot of player state. Consumers populate one of
/// these from the client each tick; tests build them inline.
#[derive(Clone, Debug, Default)]
pub struct PlayerProfile {
    pub skills: FxHashMap<String, i32>,
    pub quests: FxHashMap<String, QuestState>,
    pub items: FxHashMap<i32, i32>,
    pub runes: FxHashMap<String, i32>,
    pub favour: FxHashMap<String, i32>,
    pub inventory_gold: i64,
    pub bank_gold: i64,
    pub ironman: bool,
    pub hardcore: bool,
    pub ultimate: bool,
    pub risk_threshold: f64,
}

impl PlayerProfile {
    pub fn with_skill(mut self, name: &str, level: i32) -> Self {
        self.skills.insert(name.to_string(), level);
        self
    }

    pub fn with_quest(mut self, name: &str, state: QuestState) -> Self {
        self.quests.insert(name.to_string(), state);
        self
    }

    pub fn with_item(mut self, id: i32, qty: i32) -> Self {
        self.items.insert(id, qty);
        self
    }

    pub fn with_gold(mut self, gold: i64) -> Self {
        self.inventory_gold = gold;
        self
    }
}

impl PlayerRequirements for PlayerProfile {
    fn magic_level(&self) -> Option<i32> {
        self.skills.get("magic").copied()
    }

    fn agility_level(&self) -> Option<i32> {
        self.skills.get("agility").copied()
    }

    fn combat_level(&self) -> Option<i32> {
        self.skills.get("combat").copied()
    }

    fn skill_level(&self, name: &str) -> Option<i32> {
        self.skills.get(name).copied()
    }

    fn inventory_gold(&self) -> i64 {
        self.inventory_gold
    }

    fn total_gold(&self) -> i64 {
        self.inventory_gold + self.bank_gold
    }

    fn has_item(&self, id: i32, qty: i32) -> bool {
        self.items.get(&id).copied().unwrap_or(0) >= qty
    }

    fn has_runes(&self, name: &str, qty: i32) -> bool {
        self.runes.get(name).copied().unwrap_or(0) >= qty
    }

    fn is_quest_completed(&self, name: &str) -> bool {
        self.quests.get(name) == Some(&QuestState::Finished)
    }

    fn is_ironman(&self) -> bool {
        self.ironman
    }

    fn is_hardcore(&self) -> bool {
        self.hardcore
    }

    fn is_ultimate(&self) -> bool {
        self.ultimate
    }

    fn favour_percent(&self, house: &str) -> Option<i32> {
        self.favour.get(house).copied()
    }

    fn acceptable_risk_threshold(&self) -> f64 {
        self.risk_threshold
    }
}
