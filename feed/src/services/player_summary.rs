use clanboard_shared::format::format_compact;
use clanboard_shared::{BossCategory, CategoryScheme, ProfileView, SkillCategory, UpgradeCategory};
use tracing::{info, warn};

use crate::client::PriceFeedClient;

/// Fetch one player's profile and log the dashboard headline numbers.
///
/// Returns the view that was logged, or `None` when the profile could not be
/// fetched or summarized.
pub async fn log_summary(client: &PriceFeedClient, player: &str) -> Option<ProfileView> {
    let profile = match client.player_profile(player).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!(player, error = %e, "failed to fetch player profile");
            return None;
        }
    };

    let view = match ProfileView::build(&profile) {
        Ok(view) => view,
        Err(e) => {
            warn!(player, error = %e, "player profile could not be summarized");
            return None;
        }
    };

    info!(
        player = %view.username,
        guild = view.guild_name.as_deref().unwrap_or("-"),
        total_level = view.summary.total_level,
        total_xp = %format_compact(view.summary.total_experience),
        maxed_skills = view.summary.maxed_skills,
        "player summary"
    );

    for category in SkillCategory::all() {
        info!(
            category = category.key(),
            xp = %format_compact(view.skill_groups.total(category)),
            "skill group"
        );
    }
    for category in BossCategory::all() {
        info!(
            category = category.key(),
            kills = view.bosses.total(category),
            "boss kills"
        );
    }
    for category in UpgradeCategory::all() {
        info!(
            category = category.key(),
            tiers = view.upgrades.total(category),
            "upgrades"
        );
    }

    Some(view)
}
