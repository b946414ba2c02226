//! Per-shot results and their aggregates

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ai::DiveDirection;
use crate::difficulty::Difficulty;
use crate::events::PenaltyEvent;
use crate::scoring::ShotOutcome;
use crate::shooting::ShotCommand;

/// Result of a single simulated shot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotResult {
    pub index: u32,
    pub difficulty: Difficulty,
    pub seed: u64,
    pub command: ShotCommand,
    /// None when the shot was still live after the tick limit
    pub outcome: Option<ShotOutcome>,
    pub ticks: u32,
    pub flight_time: f32,
    /// Ball position when the shot ended
    pub end_position: [f32; 3],
    pub keeper_dive: Option<DiveDirection>,
    pub save_probability: Option<f32>,
    pub collisions: u32,
    /// Logged events for this shot (used for evlog/DB persistence)
    #[serde(skip)]
    pub events: Vec<(u32, PenaltyEvent)>,
}

impl ShotResult {
    pub fn outcome_label(&self) -> &'static str {
        match self.outcome {
            Some(outcome) => outcome.name(),
            None => "Unfinished",
        }
    }
}

/// Outcome rates for one difficulty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DifficultySummary {
    pub shots: u32,
    pub goals: u32,
    pub saves: u32,
    pub misses: u32,
    pub unfinished: u32,
    pub goal_rate: f32,
    pub save_rate: f32,
    pub miss_rate: f32,
    /// Mean keeper save probability over shots where it dived
    pub avg_save_probability: f32,
    pub avg_flight_time: f32,
    /// Miss counts by reason name
    pub miss_reasons: BTreeMap<String, u32>,
    /// Dive counts by direction name
    pub dives: BTreeMap<String, u32>,
}

impl DifficultySummary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a ShotResult>) -> Self {
        let mut summary = Self::default();
        let mut probability_sum = 0.0;
        let mut probability_count = 0u32;
        let mut flight_sum = 0.0;

        for result in results {
            summary.shots += 1;
            flight_sum += result.flight_time;
            match result.outcome {
                Some(ShotOutcome::Goal) => summary.goals += 1,
                Some(ShotOutcome::Save) => summary.saves += 1,
                Some(ShotOutcome::Miss(reason)) => {
                    summary.misses += 1;
                    *summary.miss_reasons.entry(reason.name().to_string()).or_insert(0) += 1;
                }
                None => summary.unfinished += 1,
            }
            if let Some(direction) = result.keeper_dive {
                *summary.dives.entry(direction.name().to_string()).or_insert(0) += 1;
            }
            if let Some(p) = result.save_probability {
                probability_sum += p;
                probability_count += 1;
            }
        }

        if summary.shots > 0 {
            let total = summary.shots as f32;
            summary.goal_rate = summary.goals as f32 / total;
            summary.save_rate = summary.saves as f32 / total;
            summary.miss_rate = summary.misses as f32 / total;
            summary.avg_flight_time = flight_sum / total;
        }
        if probability_count > 0 {
            summary.avg_save_probability = probability_sum / probability_count as f32;
        }
        summary
    }
}

/// Everything a run produces
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimReport {
    pub seed: u64,
    pub shots: Vec<ShotResult>,
    pub by_difficulty: BTreeMap<String, DifficultySummary>,
}

impl SimReport {
    pub fn new(seed: u64, shots: Vec<ShotResult>) -> Self {
        let mut report = Self {
            seed,
            shots,
            by_difficulty: BTreeMap::new(),
        };
        report.summarize();
        report
    }

    fn summarize(&mut self) {
        self.by_difficulty.clear();
        for difficulty in Difficulty::ALL {
            let results: Vec<_> = self.shots.iter().filter(|r| r.difficulty == difficulty).collect();
            if results.is_empty() {
                continue;
            }
            self.by_difficulty.insert(
                difficulty.name().to_string(),
                DifficultySummary::from_results(results),
            );
        }
    }

    /// Format as ASCII table
    pub fn format_table(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "\n{:>8} | {:>6} | {:>7} | {:>7} | {:>7} | {:>8} | {:>7}\n",
            "Level", "Shots", "Goal", "Save", "Miss", "Avg p", "Flight"
        ));
        output.push_str(&format!(
            "{:-<8}-+-{:-<6}-+-{:-<7}-+-{:-<7}-+-{:-<7}-+-{:-<8}-+-{:-<7}\n",
            "", "", "", "", "", "", ""
        ));
        for difficulty in Difficulty::ALL {
            let Some(s) = self.by_difficulty.get(difficulty.name()) else {
                continue;
            };
            output.push_str(&format!(
                "{:>8} | {:>6} | {:>6.1}% | {:>6.1}% | {:>6.1}% | {:>8.3} | {:>6.2}s\n",
                difficulty.name(),
                s.shots,
                s.goal_rate * 100.0,
                s.save_rate * 100.0,
                s.miss_rate * 100.0,
                s.avg_save_probability,
                s.avg_flight_time
            ));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::MissReason;

    fn result(difficulty: Difficulty, outcome: Option<ShotOutcome>, p: Option<f32>) -> ShotResult {
        ShotResult {
            index: 0,
            difficulty,
            seed: 1,
            command: ShotCommand::new(0.0, 2.5, 1.0),
            outcome,
            ticks: 30,
            flight_time: 0.5,
            end_position: [0.0, 1.0, -20.5],
            keeper_dive: p.map(|_| DiveDirection::Center),
            save_probability: p,
            collisions: 0,
            events: Vec::new(),
        }
    }

    #[test]
    fn test_summary_rates() {
        let results = vec![
            result(Difficulty::Hard, Some(ShotOutcome::Goal), Some(0.2)),
            result(Difficulty::Hard, Some(ShotOutcome::Save), Some(0.4)),
            result(Difficulty::Hard, Some(ShotOutcome::Miss(MissReason::Post)), None),
            result(Difficulty::Hard, None, None),
        ];
        let summary = DifficultySummary::from_results(&results);
        assert_eq!(summary.shots, 4);
        assert_eq!(summary.goal_rate, 0.25);
        assert_eq!(summary.unfinished, 1);
        assert_eq!(summary.miss_reasons.get("post"), Some(&1));
        assert_eq!(summary.dives.get("center"), Some(&2));
        assert!((summary.avg_save_probability - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_report_groups_by_difficulty() {
        let report = SimReport::new(
            5,
            vec![
                result(Difficulty::Easy, Some(ShotOutcome::Goal), None),
                result(Difficulty::Hard, Some(ShotOutcome::Save), Some(0.5)),
                result(Difficulty::Hard, Some(ShotOutcome::Goal), Some(0.1)),
            ],
        );
        assert_eq!(report.by_difficulty.len(), 2);
        assert_eq!(report.by_difficulty["hard"].shots, 2);
        assert!(!report.by_difficulty.contains_key("medium"));
        let table = report.format_table();
        assert!(table.contains("easy"));
        assert!(!table.contains("medium"));
    }
}
