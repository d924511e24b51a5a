//! Account-type and wealth signals the search consumes to reweight edges.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    TeleportSpells,
    CharterShips,
    MagicCarpets,
    GrappleShortcuts,
    WildernessObelisks,
    Canoes,
    FairyRings,
    SpiritTrees,
}

impl TransportKind {
    /// Maps edge metadata `transport_kind` strings; unknown kinds are not gated.
    pub fn from_metadata(s: &str) -> Option<TransportKind> {
        match s {
            "teleport_spell" => Some(TransportKind::TeleportSpells),
            "charter_ship" => Some(TransportKind::CharterShips),
            "magic_carpet" => Some(TransportKind::MagicCarpets),
            "grapple" => Some(TransportKind::GrappleShortcuts),
            "wilderness_obelisk" => Some(TransportKind::WildernessObelisks),
            "canoe" => Some(TransportKind::Canoes),
            "fairy_ring" => Some(TransportKind::FairyRings),
            "spirit_tree" => Some(TransportKind::SpiritTrees),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeleportItemTier {
    None,
    Inventory,
    InventoryPerm,
}

/// Resource signals consumed by the core. Implementations live with the
/// account/wealth model outside this crate.
pub trait ResourcePolicy: Send + Sync {
    fn should_avoid_wilderness(&self) -> bool;
    fn should_use(&self, kind: TransportKind) -> bool;
    fn teleport_items_tier(&self) -> TeleportItemTier;
    /// Reweight a teleport edge given its law-rune draw.
    fn adjust_teleport_cost(&self, base_ticks: i64, law_runes: i64) -> i64;
    /// Reweight a gold-gated edge (tolls, fares) given its gp cost.
    fn adjust_gold_travel(&self, base_ticks: i64, gold_cost: i64) -> i64;
    /// May be negative: an incentive to route through rings.
    fn fairy_ring_bonus(&self) -> i64 {
        0
    }
    /// May be negative: an incentive to route through trees.
    fn spirit_tree_bonus(&self) -> i64 {
        0
    }
}

/// Baseline policy: everything allowed, fallback cost formulas.
#[derive(Clone, Debug)]
pub struct DefaultResourcePolicy {
    pub avoid_wilderness: bool,
    pub disabled: Vec<TransportKind>,
    pub teleport_items: TeleportItemTier,
    pub fairy_ring_bonus: i64,
    pub spirit_tree_bonus: i64,
}

impl Default for DefaultResourcePolicy {
    fn default() -> Self {
        Self {
            avoid_wilderness: false,
            disabled: Vec::new(),
            teleport_items: TeleportItemTier::Inventory,
            fairy_ring_bonus: 0,
            spirit_tree_bonus: 0,
        }
    }
}

impl ResourcePolicy for DefaultResourcePolicy {
    fn should_avoid_wilderness(&self) -> bool {
        self.avoid_wilderness
    }

    fn should_use(&self, kind: TransportKind) -> bool {
        !self.disabled.contains(&kind)
    }

    fn teleport_items_tier(&self) -> TeleportItemTier {
        self.teleport_items
    }

    fn adjust_teleport_cost(&self, base_ticks: i64, _law_runes: i64) -> i64 {
        base_ticks
    }

    fn adjust_gold_travel(&self, base_ticks: i64, gold_cost: i64) -> i64 {
        base_ticks + gold_cost / 10
    }

    fn fairy_ring_bonus(&self) -> i64 {
        self.fairy_ring_bonus
    }

    fn spirit_tree_bonus(&self) -> i64 {
        self.spirit_tree_bonus
    }
}

/// The admissibility snapshot taken from a [`ResourcePolicy`] when a search
/// request is scheduled. Passed opaquely to the worker; it only filters edges
/// and shifts costs, never the graph's shape.
#[derive(Clone, Debug)]
pub struct TravelPreferences {
    pub avoid_wilderness: bool,
    pub teleport_spells: bool,
    pub charter_ships: bool,
    pub magic_carpets: bool,
    pub grapple_shortcuts: bool,
    pub wilderness_obelisks: bool,
    pub canoes: bool,
    pub fairy_rings: bool,
    pub spirit_trees: bool,
    pub teleport_items: TeleportItemTier,
    pub fairy_ring_bonus: i64,
    pub spirit_tree_bonus: i64,
}

impl TravelPreferences {
    pub fn capture(policy: &dyn ResourcePolicy) -> Self {
        Self {
            avoid_wilderness: policy.should_avoid_wilderness(),
            teleport_spells: policy.should_use(TransportKind::TeleportSpells),
            charter_ships: policy.should_use(TransportKind::CharterShips),
            magic_carpets: policy.should_use(TransportKind::MagicCarpets),
            grapple_shortcuts: policy.should_use(TransportKind::GrappleShortcuts),
            wilderness_obelisks: policy.should_use(TransportKind::WildernessObelisks),
            canoes: policy.should_use(TransportKind::Canoes),
            fairy_rings: policy.should_use(TransportKind::FairyRings),
            spirit_trees: policy.should_use(TransportKind::SpiritTrees),
            teleport_items: policy.teleport_items_tier(),
            fairy_ring_bonus: policy.fairy_ring_bonus(),
            spirit_tree_bonus: policy.spirit_tree_bonus(),
        }
    }

    pub fn allows(&self, kind: TransportKind) -> bool {
        match kind {
            TransportKind::TeleportSpells => self.teleport_spells,
            TransportKind::CharterShips => self.charter_ships,
            TransportKind::MagicCarpets => self.magic_carpets,
            TransportKind::GrappleShortcuts => self.grapple_shortcuts,
            TransportKind::WildernessObelisks => self.wilderness_obelisks,
            TransportKind::Canoes => self.canoes,
            TransportKind::FairyRings => self.fairy_rings,
            TransportKind::SpiritTrees => self.spirit_trees,
        }
    }
}

impl Default for TravelPreferences {
    fn default() -> Self {
        Self::capture(&DefaultResourcePolicy::default())
    }
}
