use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::categorize::{CategorizedGroup, categorize};
use crate::error::StatsError;
use crate::progress::{Progress, progress};
use crate::vocab::{BossCategory, BossTier, Skill, SkillCategory, UpgradeCategory};

/// Player payload as returned by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub username: String,
    #[serde(default)]
    pub game_mode: Option<String>,
    #[serde(default)]
    pub guild_name: Option<String>,
    #[serde(default)]
    pub skill_experiences: BTreeMap<String, f64>,
    #[serde(default)]
    pub pvm_stats: BTreeMap<String, f64>,
    #[serde(default)]
    pub upgrades: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillRow {
    pub skill: Skill,
    pub category: SkillCategory,
    pub experience: f64,
    pub progress: Progress,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkillSummary {
    pub total_level: u32,
    pub total_experience: f64,
    pub maxed_skills: usize,
}

impl SkillSummary {
    pub fn from_rows(rows: &[SkillRow]) -> Self {
        Self {
            total_level: rows.iter().map(|row| row.progress.level).sum(),
            total_experience: rows.iter().map(|row| row.experience).sum(),
            maxed_skills: rows.iter().filter(|row| row.progress.is_maxed()).count(),
        }
    }
}

/// One row per vocabulary skill, in vocabulary order.
///
/// Skills missing from the input are shown at zero experience. Names outside
/// the vocabulary are left out of the flat list; they only appear in the
/// residual bucket of the categorized view. Naming one skill twice, in any
/// case, is rejected.
pub fn skill_rows<I, K, V>(experiences: I) -> Result<Vec<SkillRow>, StatsError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Borrow<f64>,
{
    let mut known: HashMap<Skill, f64> = HashMap::new();
    for (name, value) in experiences {
        let name = name.as_ref();
        if let Ok(skill) = name.parse::<Skill>()
            && known.insert(skill, *value.borrow()).is_some()
        {
            return Err(StatsError::DuplicateCounter(name.to_string()));
        }
    }

    Skill::ALL
        .into_iter()
        .map(|skill| {
            let experience = known.get(&skill).copied().unwrap_or(0.0);
            Ok(SkillRow {
                skill,
                category: skill.category(),
                experience,
                progress: progress(experience)?,
            })
        })
        .collect()
}

/// Everything the profile page renders, derived from one payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub game_mode: Option<String>,
    pub guild_name: Option<String>,
    pub skills: Vec<SkillRow>,
    pub skill_groups: CategorizedGroup<SkillCategory>,
    pub summary: SkillSummary,
    pub bosses: CategorizedGroup<BossCategory>,
    pub boss_tiers: CategorizedGroup<BossTier>,
    pub upgrades: CategorizedGroup<UpgradeCategory>,
}

impl ProfileView {
    pub fn build(profile: &PlayerProfile) -> Result<Self, StatsError> {
        let skills = skill_rows(&profile.skill_experiences)?;
        let summary = SkillSummary::from_rows(&skills);
        Ok(Self {
            username: profile.username.clone(),
            game_mode: profile.game_mode.clone(),
            guild_name: profile.guild_name.clone(),
            skill_groups: categorize(&profile.skill_experiences)?,
            skills,
            summary,
            bosses: categorize(&profile.pvm_stats)?,
            boss_tiers: categorize(&profile.pvm_stats)?,
            upgrades: categorize(&profile.upgrades)?,
        })
    }
}
