//! Faction permission matrix and treasury rules.
//!
//! Ranks gate capabilities per the fixed matrix below. Officer treasury
//! withdrawals are further bounded by a per-day credit limit tracked on
//! the faction; the Founder is unlimited.
//!
//! | Capability | Founder | Officer | Member |
//! |---|---|---|---|
//! | Edit settings, disband | yes | -- | -- |
//! | Transfer leadership | yes | -- | -- |
//! | Promote to / demote from Officer | yes | -- | -- |
//! | Manage (promote, kick) Members | yes | yes | -- |
//! | Withdraw from treasury | unlimited | daily limit | -- |
//! | Deposit to treasury | yes | yes | yes |
//! | Post contracts with faction funds | yes | yes | -- |
//! | Create/edit doctrine | yes | yes | read |
//! | View shared intel | yes | yes | yes |

use burnrate_types::{DailyWithdrawal, Faction, FactionRank, PlayerId};

/// A faction capability subject to rank gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Edit faction settings or disband it.
    EditSettings,
    /// Hand the Founder rank to another member.
    TransferLeadership,
    /// Promote a Member to Officer, or demote an Officer.
    ManageOfficers,
    /// Kick a Member (kicking an Officer requires [`Self::ManageOfficers`]).
    ManageMembers,
    /// Withdraw from the treasury (limits apply below Founder).
    WithdrawTreasury,
    /// Deposit into the treasury.
    DepositTreasury,
    /// Post and manage contracts funded by the treasury.
    PostFactionContracts,
    /// Create, edit, or delete doctrine documents.
    EditDoctrine,
    /// Read intel shared by faction members.
    ViewSharedIntel,
}

/// Whether a rank grants a capability.
pub const fn allows(rank: FactionRank, capability: Capability) -> bool {
    match capability {
        Capability::EditSettings
        | Capability::TransferLeadership
        | Capability::ManageOfficers => matches!(rank, FactionRank::Founder),
        Capability::ManageMembers
        | Capability::WithdrawTreasury
        | Capability::PostFactionContracts
        | Capability::EditDoctrine => {
            matches!(rank, FactionRank::Founder | FactionRank::Officer)
        }
        Capability::DepositTreasury | Capability::ViewSharedIntel => true,
    }
}

/// Why a treasury withdrawal was refused.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WithdrawRefusal {
    /// The rank cannot withdraw at all.
    #[error("rank cannot withdraw from the treasury")]
    NotPermitted,
    /// The officer's daily credit limit would be exceeded.
    #[error("daily withdraw limit of {limit} credits would be exceeded")]
    DailyLimit {
        /// The configured limit.
        limit: i64,
    },
    /// The treasury does not hold enough credits.
    #[error("treasury holds insufficient credits")]
    InsufficientFunds,
}

/// Check a credit withdrawal against rank and daily limits, without
/// applying it.
pub fn check_withdrawal(
    faction: &Faction,
    player: PlayerId,
    rank: FactionRank,
    credits: i64,
    day: u64,
) -> Result<(), WithdrawRefusal> {
    if !allows(rank, Capability::WithdrawTreasury) {
        return Err(WithdrawRefusal::NotPermitted);
    }
    if faction.treasury.credits < credits {
        return Err(WithdrawRefusal::InsufficientFunds);
    }
    if rank == FactionRank::Founder {
        return Ok(());
    }

    let withdrawn_today = faction
        .withdrawals
        .get(&player)
        .filter(|w| w.day == day)
        .map_or(0, |w| w.withdrawn);
    if withdrawn_today.saturating_add(credits) > faction.officer_daily_withdraw {
        return Err(WithdrawRefusal::DailyLimit {
            limit: faction.officer_daily_withdraw,
        });
    }
    Ok(())
}

/// Record a completed credit withdrawal against the player's daily total.
pub fn record_withdrawal(faction: &mut Faction, player: PlayerId, credits: i64, day: u64) {
    let entry = faction
        .withdrawals
        .entry(player)
        .or_insert(DailyWithdrawal { day, withdrawn: 0 });
    if entry.day != day {
        entry.day = day;
        entry.withdrawn = 0;
    }
    entry.withdrawn = entry.withdrawn.saturating_add(credits);
}

/// Transfer leadership: the target becomes Founder and the previous
/// Founder is demoted to Officer, in one step.
///
/// Returns `false` (and changes nothing) if the target is not a member.
pub fn transfer_leadership(faction: &mut Faction, to: PlayerId) -> bool {
    if faction.member(to).is_none() || faction.founder == to {
        return false;
    }
    let previous = faction.founder;
    for member in &mut faction.members {
        if member.player == to {
            member.rank = FactionRank::Founder;
        } else if member.player == previous {
            member.rank = FactionRank::Officer;
        }
    }
    faction.founder = to;
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use burnrate_types::{FactionId, FactionMember, Inventory};

    use super::*;

    fn faction_with(members: Vec<FactionMember>, founder: PlayerId) -> Faction {
        Faction {
            id: FactionId::new(),
            name: "Iron Column".to_owned(),
            tag: "IRON".to_owned(),
            founder,
            treasury: Inventory::with_credits(10_000),
            officer_daily_withdraw: 500,
            doctrines: std::collections::BTreeMap::new(),
            upgrades: std::collections::BTreeMap::new(),
            relations: std::collections::BTreeMap::new(),
            members,
            withdrawals: std::collections::BTreeMap::new(),
            created_tick: 0,
        }
    }

    fn member(player: PlayerId, rank: FactionRank) -> FactionMember {
        FactionMember {
            player,
            rank,
            joined_tick: 0,
        }
    }

    #[test]
    fn permission_matrix() {
        assert!(allows(FactionRank::Founder, Capability::TransferLeadership));
        assert!(!allows(FactionRank::Officer, Capability::TransferLeadership));
        assert!(!allows(FactionRank::Officer, Capability::ManageOfficers));
        assert!(allows(FactionRank::Officer, Capability::ManageMembers));
        assert!(!allows(FactionRank::Member, Capability::ManageMembers));
        assert!(allows(FactionRank::Member, Capability::DepositTreasury));
        assert!(!allows(FactionRank::Member, Capability::WithdrawTreasury));
        assert!(allows(FactionRank::Member, Capability::ViewSharedIntel));
        assert!(allows(FactionRank::Officer, Capability::PostFactionContracts));
    }

    #[test]
    fn officer_withdrawals_respect_daily_limit() {
        let founder = PlayerId::new();
        let officer = PlayerId::new();
        let mut faction = faction_with(
            vec![
                member(founder, FactionRank::Founder),
                member(officer, FactionRank::Officer),
            ],
            founder,
        );

        assert!(check_withdrawal(&faction, officer, FactionRank::Officer, 400, 3).is_ok());
        record_withdrawal(&mut faction, officer, 400, 3);

        // 400 + 200 > 500: refused.
        assert_eq!(
            check_withdrawal(&faction, officer, FactionRank::Officer, 200, 3),
            Err(WithdrawRefusal::DailyLimit { limit: 500 })
        );

        // A new day resets the total.
        assert!(check_withdrawal(&faction, officer, FactionRank::Officer, 200, 4).is_ok());
    }

    #[test]
    fn founder_is_unlimited() {
        let founder = PlayerId::new();
        let faction = faction_with(vec![member(founder, FactionRank::Founder)], founder);
        assert!(check_withdrawal(&faction, founder, FactionRank::Founder, 9_999, 0).is_ok());
        assert_eq!(
            check_withdrawal(&faction, founder, FactionRank::Founder, 10_001, 0),
            Err(WithdrawRefusal::InsufficientFunds)
        );
    }

    #[test]
    fn transfer_swaps_founder_and_officer() {
        let founder = PlayerId::new();
        let officer = PlayerId::new();
        let bystander = PlayerId::new();
        let mut faction = faction_with(
            vec![
                member(founder, FactionRank::Founder),
                member(officer, FactionRank::Officer),
                member(bystander, FactionRank::Member),
            ],
            founder,
        );

        assert!(transfer_leadership(&mut faction, officer));
        assert_eq!(faction.founder, officer);
        assert_eq!(faction.rank_of(officer), Some(FactionRank::Founder));
        assert_eq!(faction.rank_of(founder), Some(FactionRank::Officer));
        assert_eq!(faction.rank_of(bystander), Some(FactionRank::Member));

        // The demoted founder can no longer manage officers.
        assert!(!allows(
            faction.rank_of(founder).unwrap(),
            Capability::ManageOfficers
        ));
    }

    #[test]
    fn transfer_to_non_member_fails() {
        let founder = PlayerId::new();
        let mut faction = faction_with(vec![member(founder, FactionRank::Founder)], founder);
        assert!(!transfer_leadership(&mut faction, PlayerId::new()));
        assert_eq!(faction.founder, founder);
    }
}
