use rand::distributions::{Bernoulli, Distribution};
use rand::Rng;
use rand_distr::Poisson;

use crate::error::{PredictionError, Result};
use crate::models::PerformanceProfile;
use crate::rules::GameScoringRule;

/// One team's realized contribution to one trial, indexed like the rule set's
/// categories, events and endgame tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSample {
    pub counts: Vec<u32>,
    pub events: Vec<bool>,
    /// Index into `GameScoringRule::endgame.tiers`.
    pub tier: usize,
}

/// A profile resolved against a rule set with its distributions prebuilt.
///
/// `sample` takes `&self` and draws only from the generator it is handed, so
/// one sampler can serve any number of trials on any number of threads.
#[derive(Debug, Clone)]
pub struct OutcomeSampler {
    /// `None` for a zero mean, which always yields 0.
    counts: Vec<Option<Poisson<f64>>>,
    events: Vec<Bernoulli>,
    /// (tier index, cumulative probability) in rule tier order, zero-mass
    /// tiers left out.
    cumulative_tiers: Vec<(usize, f64)>,
}

impl OutcomeSampler {
    /// Fails with `UnmappedCategory`, `UnmappedEvent` or `UnmappedTier` when
    /// the profile names something the rule set cannot score. Rule entries
    /// the profile does not mention are sampled as zero.
    pub fn new(profile: &PerformanceProfile, rules: &GameScoringRule) -> Result<Self> {
        let team = profile.team_id();
        let invalid = |reason: String| PredictionError::InvalidProfile {
            team: team.to_string(),
            reason,
        };

        let mut counts = vec![None; rules.categories.len()];
        for (category, &mean) in profile.expected_counts() {
            let index = rules
                .category_index(category)
                .ok_or_else(|| PredictionError::UnmappedCategory {
                    team: team.to_string(),
                    category: category.clone(),
                })?;
            if mean > 0.0 {
                let poisson = Poisson::new(mean)
                    .map_err(|e| invalid(format!("category '{category}' mean {mean}: {e}")))?;
                counts[index] = Some(poisson);
            }
        }

        let mut rates = vec![0.0; rules.events.len()];
        for (event, &rate) in profile.event_rates() {
            let index = rules
                .event_index(event)
                .ok_or_else(|| PredictionError::UnmappedEvent {
                    team: team.to_string(),
                    event: event.clone(),
                })?;
            rates[index] = rate;
        }
        let events = rates
            .into_iter()
            .map(|p| Bernoulli::new(p).map_err(|e| invalid(format!("event rate {p}: {e}"))))
            .collect::<Result<Vec<_>>>()?;

        let mut tier_probabilities = vec![0.0; rules.endgame.tiers.len()];
        for (tier, p) in profile.endgame().iter() {
            let index = rules
                .tier_index(tier)
                .ok_or_else(|| PredictionError::UnmappedTier {
                    team: team.to_string(),
                    tier: tier.to_string(),
                })?;
            tier_probabilities[index] = p;
        }
        let mut cumulative = 0.0;
        let cumulative_tiers: Vec<(usize, f64)> = tier_probabilities
            .into_iter()
            .enumerate()
            .filter(|(_, p)| *p > 0.0)
            .map(|(index, p)| {
                cumulative += p;
                (index, cumulative)
            })
            .collect();
        if cumulative_tiers.is_empty() {
            return Err(invalid("endgame distribution has no mass".to_string()));
        }

        Ok(Self {
            counts,
            events,
            cumulative_tiers,
        })
    }

    /// Draw one independent realization.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> TeamSample {
        let counts = self
            .counts
            .iter()
            .map(|dist| match dist {
                Some(poisson) => {
                    let draw: f64 = poisson.sample(rng);
                    // clamp to the count range
                    draw.min(u32::MAX as f64) as u32
                }
                None => 0,
            })
            .collect();
        let events = self.events.iter().map(|bernoulli| bernoulli.sample(rng)).collect();
        TeamSample {
            counts,
            events,
            tier: self.draw_tier(rng),
        }
    }

    fn draw_tier<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let u: f64 = rng.gen();
        self.cumulative_tiers
            .iter()
            .find(|(_, cumulative)| u < *cumulative)
            .or_else(|| self.cumulative_tiers.last())
            .map(|(index, _)| *index)
            .unwrap_or_default()
    }
}
