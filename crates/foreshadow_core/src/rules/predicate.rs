//! Ranking-point predicates.
//!
//! Criteria are declared by id in the rule file and compiled once against the
//! rule set into index form, so evaluating them inside a trial never touches a
//! string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::GameScoringRule;
use crate::engine::trial::{saturating_sum, AllianceTrial};

/// Boolean condition over one alliance's result in one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// Combined count of `categories` reaches `at_least`.
    PiecesAtLeast { categories: Vec<String>, at_least: u32 },
    /// At least `min_groups` groups (all of them by default) individually
    /// reach `at_least`; each group's count is the sum of its categories.
    GroupsAtLeast {
        groups: Vec<Vec<String>>,
        at_least: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_groups: Option<usize>,
    },
    /// Points summed over `sources` reach `at_least`.
    PointsAtLeast { sources: Vec<PointSource>, at_least: u32 },
    /// At least `at_least` teams achieved `event`.
    EventCountAtLeast { event: String, at_least: u32 },
    /// At least `at_least` teams finished in endgame `tier`.
    TierCountAtLeast { tier: String, at_least: u32 },
    /// The alliance earned the cooperation bonus.
    Cooperation,
    All { of: Vec<Predicate> },
    Any { of: Vec<Predicate> },
}

/// Where a [`Predicate::PointsAtLeast`] takes its points from.
///
/// Written as a plain string: `total`, `early`, `main`, `endgame`, `bonus`,
/// `category:<id>` or `event:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PointSource {
    Total,
    /// Early-phase category and event points.
    Early,
    /// Main-phase category and event points.
    Main,
    /// Per-team endgame tier points, excluding alliance bonuses.
    Endgame,
    /// Endgame alliance bonuses plus the cooperation bonus.
    Bonus,
    Category(String),
    Event(String),
}

impl FromStr for PointSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(id) = s.strip_prefix("category:") {
            return Ok(PointSource::Category(id.trim().to_string()));
        }
        if let Some(id) = s.strip_prefix("event:") {
            return Ok(PointSource::Event(id.trim().to_string()));
        }
        match s {
            "total" => Ok(PointSource::Total),
            "early" | "auto" => Ok(PointSource::Early),
            "main" | "teleop" => Ok(PointSource::Main),
            "endgame" => Ok(PointSource::Endgame),
            "bonus" => Ok(PointSource::Bonus),
            other => Err(format!("unknown point source '{other}'")),
        }
    }
}

impl TryFrom<String> for PointSource {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for PointSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PointSource::Total => write!(f, "total"),
            PointSource::Early => write!(f, "early"),
            PointSource::Main => write!(f, "main"),
            PointSource::Endgame => write!(f, "endgame"),
            PointSource::Bonus => write!(f, "bonus"),
            PointSource::Category(id) => write!(f, "category:{id}"),
            PointSource::Event(id) => write!(f, "event:{id}"),
        }
    }
}

impl From<PointSource> for String {
    fn from(source: PointSource) -> Self {
        source.to_string()
    }
}

impl Predicate {
    pub(crate) fn validate(&self, rules: &GameScoringRule) -> Result<(), String> {
        self.compile(rules).map(|_| ())
    }

    pub(crate) fn compile(&self, rules: &GameScoringRule) -> Result<CompiledPredicate, String> {
        let category = |id: &String| {
            rules
                .category_index(id)
                .ok_or_else(|| format!("unknown category '{id}'"))
        };

        Ok(match self {
            Predicate::PiecesAtLeast { categories, at_least } => {
                if categories.is_empty() {
                    return Err("pieces_at_least names no categories".to_string());
                }
                CompiledPredicate::PiecesAtLeast {
                    categories: categories.iter().map(category).collect::<Result<Vec<_>, _>>()?,
                    at_least: *at_least,
                }
            }
            Predicate::GroupsAtLeast { groups, at_least, min_groups } => {
                if groups.is_empty() || groups.iter().any(Vec::is_empty) {
                    return Err("groups_at_least needs non-empty groups".to_string());
                }
                let min_groups = min_groups.unwrap_or(groups.len());
                if min_groups > groups.len() {
                    return Err(format!(
                        "min_groups {min_groups} exceeds the {} declared groups",
                        groups.len()
                    ));
                }
                let groups = groups
                    .iter()
                    .map(|g| g.iter().map(category).collect::<Result<Vec<_>, _>>())
                    .collect::<Result<Vec<_>, _>>()?;
                CompiledPredicate::GroupsAtLeast { groups, at_least: *at_least, min_groups }
            }
            Predicate::PointsAtLeast { sources, at_least } => {
                if sources.is_empty() {
                    return Err("points_at_least names no sources".to_string());
                }
                let sources = sources
                    .iter()
                    .map(|s| match s {
                        PointSource::Total => Ok(CompiledSource::Total),
                        PointSource::Early => Ok(CompiledSource::Early),
                        PointSource::Main => Ok(CompiledSource::Main),
                        PointSource::Endgame => Ok(CompiledSource::Endgame),
                        PointSource::Bonus => Ok(CompiledSource::Bonus),
                        PointSource::Category(id) => category(id).map(CompiledSource::Category),
                        PointSource::Event(id) => rules
                            .event_index(id)
                            .map(CompiledSource::Event)
                            .ok_or_else(|| format!("unknown event '{id}'")),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                CompiledPredicate::PointsAtLeast { sources, at_least: *at_least }
            }
            Predicate::EventCountAtLeast { event, at_least } => CompiledPredicate::EventCountAtLeast {
                event: rules
                    .event_index(event)
                    .ok_or_else(|| format!("unknown event '{event}'"))?,
                at_least: *at_least,
            },
            Predicate::TierCountAtLeast { tier, at_least } => CompiledPredicate::TierCountAtLeast {
                tier: rules
                    .tier_index(tier)
                    .ok_or_else(|| format!("unknown endgame tier '{tier}'"))?,
                at_least: *at_least,
            },
            Predicate::Cooperation => {
                if rules.cooperation.is_none() {
                    return Err("cooperation predicate without a cooperation rule".to_string());
                }
                CompiledPredicate::Cooperation
            }
            Predicate::All { of } => CompiledPredicate::All(
                of.iter().map(|p| p.compile(rules)).collect::<Result<Vec<_>, _>>()?,
            ),
            Predicate::Any { of } => CompiledPredicate::Any(
                of.iter().map(|p| p.compile(rules)).collect::<Result<Vec<_>, _>>()?,
            ),
        })
    }
}

// ============================================================================
// Compiled form
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompiledSource {
    Total,
    Early,
    Main,
    Endgame,
    Bonus,
    Category(usize),
    Event(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CompiledPredicate {
    PiecesAtLeast { categories: Vec<usize>, at_least: u32 },
    GroupsAtLeast { groups: Vec<Vec<usize>>, at_least: u32, min_groups: usize },
    PointsAtLeast { sources: Vec<CompiledSource>, at_least: u32 },
    EventCountAtLeast { event: usize, at_least: u32 },
    TierCountAtLeast { tier: usize, at_least: u32 },
    Cooperation,
    All(Vec<CompiledPredicate>),
    Any(Vec<CompiledPredicate>),
}

impl CompiledPredicate {
    pub(crate) fn holds(&self, trial: &AllianceTrial) -> bool {
        match self {
            CompiledPredicate::PiecesAtLeast { categories, at_least } => {
                saturating_sum(categories.iter().map(|&i| trial.category_counts[i])) >= *at_least
            }
            CompiledPredicate::GroupsAtLeast { groups, at_least, min_groups } => {
                let satisfied = groups
                    .iter()
                    .filter(|g| saturating_sum(g.iter().map(|&i| trial.category_counts[i])) >= *at_least)
                    .count();
                satisfied >= *min_groups
            }
            CompiledPredicate::PointsAtLeast { sources, at_least } => {
                let points = saturating_sum(sources.iter().map(|s| match *s {
                    CompiledSource::Total => trial.total_score,
                    CompiledSource::Early => trial.early_points,
                    CompiledSource::Main => trial.main_points,
                    CompiledSource::Endgame => trial.endgame_points,
                    CompiledSource::Bonus => trial.bonus_points(),
                    CompiledSource::Category(i) => trial.category_points[i],
                    CompiledSource::Event(i) => trial.event_points[i],
                }));
                points >= *at_least
            }
            CompiledPredicate::EventCountAtLeast { event, at_least } => {
                trial.event_counts[*event] >= *at_least
            }
            CompiledPredicate::TierCountAtLeast { tier, at_least } => {
                trial.tier_counts[*tier] >= *at_least
            }
            CompiledPredicate::Cooperation => trial.cooperation,
            CompiledPredicate::All(of) => of.iter().all(|p| p.holds(trial)),
            CompiledPredicate::Any(of) => of.iter().any(|p| p.holds(trial)),
        }
    }
}
