//! Resource balances tracked for both players during a turn.

use siege_core::{PlayerSide, ResourceBalance};

/// Tolerance absorbed when comparing fractional balances against costs.
const EPSILON: f32 = 1e-4;

/// Holds the structure and mobile balances of both players.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ResourceLedger {
    ally: ResourceBalance,
    enemy: ResourceBalance,
}

impl ResourceLedger {
    /// Current balance of the provided side.
    pub(crate) fn balance(&self, side: PlayerSide) -> ResourceBalance {
        match side {
            PlayerSide::Ally => self.ally,
            PlayerSide::Enemy => self.enemy,
        }
    }

    /// Replaces the balance of the provided side.
    pub(crate) fn set_balance(&mut self, side: PlayerSide, balance: ResourceBalance) {
        *self.balance_mut(side) = balance;
    }

    /// Reports whether `side` can pay the provided cost right now.
    pub(crate) fn can_afford(&self, side: PlayerSide, cost: ResourceBalance) -> bool {
        let balance = self.balance(side);
        balance.structure + EPSILON >= cost.structure && balance.mobile + EPSILON >= cost.mobile
    }

    /// Deducts the cost from `side`, returning `false` without spending when unaffordable.
    pub(crate) fn spend(&mut self, side: PlayerSide, cost: ResourceBalance) -> bool {
        if !self.can_afford(side, cost) {
            return false;
        }

        let balance = self.balance_mut(side);
        balance.structure = (balance.structure - cost.structure).max(0.0);
        balance.mobile = (balance.mobile - cost.mobile).max(0.0);
        true
    }

    fn balance_mut(&mut self, side: PlayerSide) -> &mut ResourceBalance {
        match side {
            PlayerSide::Ally => &mut self.ally,
            PlayerSide::Enemy => &mut self.enemy,
        }
    }
}
