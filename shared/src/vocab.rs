use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A closed set of named buckets that counters are sorted into.
///
/// `DECLARED` lists the buckets with a membership list, in match priority
/// order. `RESIDUAL` receives every name none of them claim; it may also be
/// one of the declared buckets.
pub trait CategoryScheme: Copy + Ord + fmt::Debug + 'static {
    const DECLARED: &'static [Self];
    const RESIDUAL: Self;

    fn members(self) -> &'static [&'static str];

    /// Stable camelCase key used in serialized output.
    fn key(self) -> &'static str;

    /// Every bucket, declared first and residual last, without duplicates.
    fn all() -> Vec<Self> {
        let mut all = Self::DECLARED.to_vec();
        if !all.contains(&Self::RESIDUAL) {
            all.push(Self::RESIDUAL);
        }
        all
    }

    /// First declared bucket whose list names `name`, else the residual.
    fn classify(name: &str) -> Self {
        Self::DECLARED
            .iter()
            .copied()
            .find(|category| {
                category
                    .members()
                    .iter()
                    .any(|member| member.eq_ignore_ascii_case(name))
            })
            .unwrap_or(Self::RESIDUAL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skill {
    Attack,
    Strength,
    Defence,
    Archery,
    Magic,
    Health,
    Crafting,
    Woodcutting,
    Carpentry,
    Fishing,
    Cooking,
    Mining,
    Smithing,
    Foraging,
    Farming,
    Agility,
    Plundering,
    Enchanting,
    Brewing,
    Exterminating,
}

impl Skill {
    pub const ALL: [Skill; 20] = [
        Skill::Attack,
        Skill::Strength,
        Skill::Defence,
        Skill::Archery,
        Skill::Magic,
        Skill::Health,
        Skill::Crafting,
        Skill::Woodcutting,
        Skill::Carpentry,
        Skill::Fishing,
        Skill::Cooking,
        Skill::Mining,
        Skill::Smithing,
        Skill::Foraging,
        Skill::Farming,
        Skill::Agility,
        Skill::Plundering,
        Skill::Enchanting,
        Skill::Brewing,
        Skill::Exterminating,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Skill::Attack => "attack",
            Skill::Strength => "strength",
            Skill::Defence => "defence",
            Skill::Archery => "archery",
            Skill::Magic => "magic",
            Skill::Health => "health",
            Skill::Crafting => "crafting",
            Skill::Woodcutting => "woodcutting",
            Skill::Carpentry => "carpentry",
            Skill::Fishing => "fishing",
            Skill::Cooking => "cooking",
            Skill::Mining => "mining",
            Skill::Smithing => "smithing",
            Skill::Foraging => "foraging",
            Skill::Farming => "farming",
            Skill::Agility => "agility",
            Skill::Plundering => "plundering",
            Skill::Enchanting => "enchanting",
            Skill::Brewing => "brewing",
            Skill::Exterminating => "exterminating",
        }
    }

    pub fn category(self) -> SkillCategory {
        match self {
            Skill::Attack
            | Skill::Strength
            | Skill::Defence
            | Skill::Archery
            | Skill::Magic
            | Skill::Health => SkillCategory::Combat,
            Skill::Woodcutting
            | Skill::Fishing
            | Skill::Mining
            | Skill::Foraging
            | Skill::Farming => SkillCategory::Gathering,
            Skill::Crafting
            | Skill::Carpentry
            | Skill::Cooking
            | Skill::Smithing
            | Skill::Enchanting
            | Skill::Brewing => SkillCategory::Crafting,
            Skill::Agility | Skill::Plundering | Skill::Exterminating => SkillCategory::Support,
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown skill `{0}`")]
pub struct UnknownSkill(pub String);

impl FromStr for Skill {
    type Err = UnknownSkill;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Skill::ALL
            .into_iter()
            .find(|skill| skill.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownSkill(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SkillCategory {
    Combat,
    Gathering,
    Crafting,
    Support,
    /// Names outside the skill vocabulary.
    Other,
}

impl CategoryScheme for SkillCategory {
    const DECLARED: &'static [Self] = &[
        SkillCategory::Combat,
        SkillCategory::Gathering,
        SkillCategory::Crafting,
        SkillCategory::Support,
    ];
    const RESIDUAL: Self = SkillCategory::Other;

    fn members(self) -> &'static [&'static str] {
        match self {
            SkillCategory::Combat => &["attack", "strength", "defence", "archery", "magic", "health"],
            SkillCategory::Gathering => &["woodcutting", "fishing", "mining", "foraging", "farming"],
            SkillCategory::Crafting => &[
                "crafting",
                "carpentry",
                "cooking",
                "smithing",
                "enchanting",
                "brewing",
            ],
            SkillCategory::Support => &["agility", "plundering", "exterminating"],
            SkillCategory::Other => &[],
        }
    }

    fn key(self) -> &'static str {
        match self {
            SkillCategory::Combat => "combat",
            SkillCategory::Gathering => "gathering",
            SkillCategory::Crafting => "crafting",
            SkillCategory::Support => "support",
            SkillCategory::Other => "other",
        }
    }
}

const RAID_BOSSES: &[&str] = &["ReckoningOfTheGods", "GuardiansOfTheCitadel", "BloodmoonMassacre"];
const CLAN_BOSSES: &[&str] = &["MalignantSpider", "SkeletonWarrior", "OtherworldlyGolem"];
const ELITE_BOSSES: &[&str] = &["Sobek", "Mesines"];

/// Boss kills as shown on a player profile: elite bosses count as regular bosses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BossCategory {
    Raids,
    ClanBosses,
    Bosses,
}

impl CategoryScheme for BossCategory {
    const DECLARED: &'static [Self] = &[BossCategory::Raids, BossCategory::ClanBosses];
    const RESIDUAL: Self = BossCategory::Bosses;

    fn members(self) -> &'static [&'static str] {
        match self {
            BossCategory::Raids => RAID_BOSSES,
            BossCategory::ClanBosses => CLAN_BOSSES,
            BossCategory::Bosses => &[],
        }
    }

    fn key(self) -> &'static str {
        match self {
            BossCategory::Raids => "raids",
            BossCategory::ClanBosses => "clanBosses",
            BossCategory::Bosses => "bosses",
        }
    }
}

/// Boss kills split four ways, with elite bosses in their own bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BossTier {
    Raids,
    ClanBosses,
    EliteBosses,
    RegularBosses,
}

impl CategoryScheme for BossTier {
    const DECLARED: &'static [Self] = &[BossTier::Raids, BossTier::ClanBosses, BossTier::EliteBosses];
    const RESIDUAL: Self = BossTier::RegularBosses;

    fn members(self) -> &'static [&'static str] {
        match self {
            BossTier::Raids => RAID_BOSSES,
            BossTier::ClanBosses => CLAN_BOSSES,
            BossTier::EliteBosses => ELITE_BOSSES,
            BossTier::RegularBosses => &[],
        }
    }

    fn key(self) -> &'static str {
        match self {
            BossTier::Raids => "raids",
            BossTier::ClanBosses => "clanBosses",
            BossTier::EliteBosses => "eliteBosses",
            BossTier::RegularBosses => "regularBosses",
        }
    }
}

/// Upgrade tiers. Unlisted upgrades are shown with the general ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum UpgradeCategory {
    General,
    Skilling,
    Combat,
    UnlockedWithItems,
}

impl CategoryScheme for UpgradeCategory {
    const DECLARED: &'static [Self] = &[
        UpgradeCategory::UnlockedWithItems,
        UpgradeCategory::Skilling,
        UpgradeCategory::Combat,
        UpgradeCategory::General,
    ];
    const RESIDUAL: Self = UpgradeCategory::General;

    fn members(self) -> &'static [&'static str] {
        match self {
            UpgradeCategory::General => &["offlineTime", "bankSpace", "autoSell", "loadouts"],
            UpgradeCategory::Skilling => &[
                "efficientGathering",
                "masterCrafter",
                "toolUpgrades",
                "skillingTickets",
            ],
            UpgradeCategory::Combat => &["autoEat", "combatBoost", "bossKeys", "gearSets"],
            UpgradeCategory::UnlockedWithItems => &[
                "plunderingMap",
                "brewingStand",
                "enchantingTable",
                "exterminatorKit",
            ],
        }
    }

    fn key(self) -> &'static str {
        match self {
            UpgradeCategory::General => "general",
            UpgradeCategory::Skilling => "skilling",
            UpgradeCategory::Combat => "combat",
            UpgradeCategory::UnlockedWithItems => "unlockedWithItems",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{BossCategory, BossTier, CategoryScheme, Skill, SkillCategory, UpgradeCategory};

    fn assert_exclusive<C: CategoryScheme>() {
        let mut seen = HashSet::new();
        for category in C::DECLARED {
            for member in category.members() {
                assert!(
                    seen.insert(member.to_ascii_lowercase()),
                    "{member} listed twice in {category:?}"
                );
            }
        }
    }

    #[test]
    fn membership_lists_are_mutually_exclusive() {
        assert_exclusive::<SkillCategory>();
        assert_exclusive::<BossCategory>();
        assert_exclusive::<BossTier>();
        assert_exclusive::<UpgradeCategory>();
    }

    #[test]
    fn skill_enum_and_category_lists_agree() {
        for skill in Skill::ALL {
            assert_eq!(SkillCategory::classify(skill.as_str()), skill.category());
        }
        let listed: usize = SkillCategory::DECLARED
            .iter()
            .map(|category| category.members().len())
            .sum();
        assert_eq!(listed, Skill::ALL.len());
    }

    #[test]
    fn skill_parses_case_insensitively() {
        assert_eq!("Mining".parse::<Skill>(), Ok(Skill::Mining));
        assert_eq!(" defence ".parse::<Skill>(), Ok(Skill::Defence));
        assert!("defense".parse::<Skill>().is_err());
    }

    #[test]
    fn unknown_names_fall_to_residual() {
        assert_eq!(SkillCategory::classify("sailing"), SkillCategory::Other);
        assert_eq!(BossCategory::classify("SomeUnknownBoss"), BossCategory::Bosses);
        assert_eq!(BossTier::classify("SomeUnknownBoss"), BossTier::RegularBosses);
        assert_eq!(UpgradeCategory::classify("mystery"), UpgradeCategory::General);
    }

    #[test]
    fn elite_bosses_differ_between_schemes() {
        assert_eq!(BossCategory::classify("Sobek"), BossCategory::Bosses);
        assert_eq!(BossTier::classify("Sobek"), BossTier::EliteBosses);
    }

    #[test]
    fn all_lists_residual_once() {
        assert_eq!(UpgradeCategory::all().len(), 4);
        assert_eq!(BossTier::all().last(), Some(&BossTier::RegularBosses));
        assert_eq!(SkillCategory::all().len(), 5);
    }
}
