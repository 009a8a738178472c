//! Deterministic synthetic research data
//!
//! Used whenever the provider is unavailable. Every output is seeded from the
//! keyword and location (SHA-256 of both, fed to ChaCha8), so the same request
//! yields the same data across calls and processes.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

use super::range::TimeRange;
use crate::models::{
    CompetitionLevel, DataSource, KeywordMetrics, KeywordSource, SearchIntent, TrendDataPoint,
    TrendPoint,
};

/// Regions used for the synthetic geographic breakdown
pub const MOCK_REGIONS: &[&str] = &[
    "California",
    "Texas",
    "New York",
    "Florida",
    "Illinois",
    "Washington",
    "Pennsylvania",
    "Georgia",
];

const RELATED_QUERY_TEMPLATES: &[&str] = &[
    "{} tools",
    "best {}",
    "{} guide",
    "{} examples",
    "how to use {}",
    "{} alternatives",
    "{} pricing",
    "{} tutorial",
    "free {}",
    "{} meaning",
];

const KEYWORD_TEMPLATES: &[&str] = &[
    "best {}",
    "{} for beginners",
    "{} online",
    "{} course",
    "cheap {}",
    "{} reviews",
    "{} software",
    "{} services",
    "{} near me",
    "how does {} work",
    "{} vs",
    "{} checklist",
];

const RELATED_QUERY_COUNT: usize = 5;

/// Generator for synthetic trend and keyword data
#[derive(Debug, Clone, Default)]
pub struct MockTrendGenerator;

impl MockTrendGenerator {
    pub fn new() -> Self {
        Self
    }

    /// One synthetic point per keyword, in input order
    pub fn trend_data(
        &self,
        keywords: &[String],
        location: &str,
        range: TimeRange,
        today: NaiveDate,
    ) -> Vec<TrendDataPoint> {
        keywords
            .iter()
            .filter_map(|keyword| self.trend_point(keyword, location, range, today))
            .collect()
    }

    /// Synthetic point for one keyword
    ///
    /// Only `None` when the range yields no periods, which no supported range does.
    pub fn trend_point(
        &self,
        keyword: &str,
        location: &str,
        range: TimeRange,
        today: NaiveDate,
    ) -> Option<TrendDataPoint> {
        let mut rng = seeded_rng(keyword, location);
        let periods = range.period_starts(today);
        let count = periods.len().max(1) as f64;

        let base: f64 = rng.gen_range(25.0..65.0);
        let drift: f64 = rng.gen_range(-20.0..20.0);
        let amplitude: f64 = rng.gen_range(5.0..18.0);
        let phase: f64 = rng.gen_range(0.0..TAU);

        let series: Vec<TrendPoint> = periods
            .into_iter()
            .enumerate()
            .map(|(i, date)| {
                let t = i as f64 / count;
                let noise: f64 = rng.gen_range(-6.0..6.0);
                let raw = base + drift * t + amplitude * (TAU * t + phase).sin() + noise;
                TrendPoint::new(date, raw.clamp(0.0, 100.0).round() as u32)
            })
            .collect();

        let geographic: BTreeMap<String, u32> = MOCK_REGIONS
            .iter()
            .map(|region| (region.to_string(), rng.gen_range(15..=100)))
            .collect();

        let mut templates = RELATED_QUERY_TEMPLATES.to_vec();
        templates.shuffle(&mut rng);
        let related = templates
            .into_iter()
            .take(RELATED_QUERY_COUNT)
            .map(|t| t.replace("{}", keyword))
            .collect();

        TrendDataPoint::from_series(keyword, series, DataSource::Mock).map(|point| {
            point
                .with_geographic_data(geographic)
                .with_related_queries(related)
        })
    }

    /// Synthetic related keywords; deeper searches return more rows per seed
    pub fn related_keywords(
        &self,
        seeds: &[String],
        location: &str,
        depth: u8,
    ) -> Vec<KeywordMetrics> {
        let per_seed = (3 + usize::from(depth) * 2).min(KEYWORD_TEMPLATES.len());
        seeds
            .iter()
            .flat_map(|seed| self.derived_keywords(seed, location, per_seed))
            .map(|keyword| self.keyword_metrics(&keyword, location, KeywordSource::RelatedKeywords))
            .collect()
    }

    /// Synthetic keyword ideas, at most `limit` rows spread across seeds
    pub fn keyword_ideas(&self, seeds: &[String], location: &str, limit: u32) -> Vec<KeywordMetrics> {
        if seeds.is_empty() {
            return Vec::new();
        }

        let limit = limit as usize;
        let per_seed = limit.div_ceil(seeds.len()).min(KEYWORD_TEMPLATES.len());
        seeds
            .iter()
            .flat_map(|seed| self.derived_keywords(seed, location, per_seed))
            .take(limit)
            .map(|keyword| self.keyword_metrics(&keyword, location, KeywordSource::KeywordIdeas))
            .collect()
    }

    /// Synthetic metrics for a single keyword
    pub fn keyword_metrics(
        &self,
        keyword: &str,
        location: &str,
        source: KeywordSource,
    ) -> KeywordMetrics {
        let mut rng = seeded_rng(keyword, location);

        let competition = round2(rng.gen_range(0.0..=1.0));
        let competition_level = if competition < 0.34 {
            CompetitionLevel::Low
        } else if competition < 0.67 {
            CompetitionLevel::Medium
        } else {
            CompetitionLevel::High
        };
        let intents = SearchIntent::all();

        KeywordMetrics {
            keyword: keyword.to_string(),
            search_volume: rng.gen_range(10..=50_000u64) / 10 * 10,
            cpc: round2(rng.gen_range(0.05..12.0)),
            competition,
            competition_level: Some(competition_level),
            keyword_difficulty: rng.gen_range(0..=100u8),
            main_intent: intents.choose(&mut rng).copied(),
            source,
            provenance: DataSource::Mock,
        }
    }

    fn derived_keywords(&self, seed: &str, location: &str, count: usize) -> Vec<String> {
        let mut rng = seeded_rng(seed, location);
        let mut templates = KEYWORD_TEMPLATES.to_vec();
        templates.shuffle(&mut rng);
        templates
            .into_iter()
            .take(count)
            .map(|t| t.replace("{}", seed))
            .collect()
    }
}

fn seeded_rng(keyword: &str, location: &str) -> ChaCha8Rng {
    let mut hasher = Sha256::new();
    hasher.update(keyword.trim().to_lowercase().as_bytes());
    hasher.update([0u8]);
    hasher.update(location.trim().to_lowercase().as_bytes());
    let digest = hasher.finalize();

    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    ChaCha8Rng::seed_from_u64(u64::from_le_bytes(seed))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
