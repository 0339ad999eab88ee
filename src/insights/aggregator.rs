//! Symptom and prediction aggregation.
//!
//! Turns raw symptom logs and stored predictions into the three
//! display-ready structures of the insights view: a weekly trend series,
//! a side-effect distribution and an advice history feed.

use crate::insights::keywords::tag_for_description;
use crate::models::{
    AdviceItem, AdvicePriority, DistributionSlice, Insights, Prediction, RiskLevel, Symptom,
    TagAverage, TrendPoint, WeeklyBucket,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::debug;

/// Number of weekly buckets in the trend series.
pub const BUCKET_COUNT: usize = 4;

/// Number of tags kept in every trend point.
pub const TOP_TAGS: usize = 3;

/// Maximum number of distribution slices.
pub const TOP_SLICES: usize = 5;

/// Maximum number of advice entries.
pub const ADVICE_LIMIT: usize = 10;

/// Tags shown when there is nothing else to chart.
pub const CANONICAL_TAGS: [&str; TOP_TAGS] = ["headache", "nausea", "fatigue"];

/// Slice colors, assigned by rank.
pub const PALETTE: [&str; TOP_SLICES] = [
    "hsl(var(--primary))",
    "hsl(var(--secondary))",
    "hsl(var(--accent))",
    "hsl(150 55% 75%)",
    "hsl(var(--muted-foreground))",
];

const NO_DATA_LABEL: &str = "No Data";

/// Build the four weekly windows ending at `now`, oldest first.
pub fn bucketize(now: DateTime<Utc>) -> [WeeklyBucket; BUCKET_COUNT] {
    std::array::from_fn(|i| {
        let start = now - Duration::weeks((BUCKET_COUNT - i) as i64);
        WeeklyBucket {
            label: format!("Week {}", i + 1),
            start,
            end: start + Duration::weeks(1),
        }
    })
}

/// Find the bucket containing `at`.
///
/// Buckets are half-open; the newest one also holds its own end so a
/// symptom logged exactly at aggregation time is kept.
pub fn bucket_index(buckets: &[WeeklyBucket; BUCKET_COUNT], at: DateTime<Utc>) -> Option<usize> {
    let newest = BUCKET_COUNT - 1;
    buckets
        .iter()
        .position(|b| b.start <= at && at < b.end)
        .or_else(|| (at == buckets[newest].end).then_some(newest))
}

/// Per-bucket intensity totals for one tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TagTotals {
    pub tag: String,
    pub sums: [u32; BUCKET_COUNT],
    pub counts: [u32; BUCKET_COUNT],
}

impl TagTotals {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            sums: [0; BUCKET_COUNT],
            counts: [0; BUCKET_COUNT],
        }
    }

    /// Summed intensity across all buckets.
    pub fn total(&self) -> u32 {
        self.sums.iter().sum()
    }

    /// Average intensity in a bucket, rounded to one decimal.
    pub fn average(&self, bucket: usize) -> f64 {
        match self.counts[bucket] {
            0 => 0.0,
            count => (self.sums[bucket] as f64 / count as f64 * 10.0).round() / 10.0,
        }
    }
}

/// Tag totals in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct TagGroups {
    groups: Vec<TagTotals>,
    index: HashMap<String, usize>,
}

impl TagGroups {
    fn record(&mut self, tag: &str, bucket: usize, intensity: u8) {
        let slot = match self.index.get(tag) {
            Some(&slot) => slot,
            None => {
                self.groups.push(TagTotals::new(tag));
                self.index.insert(tag.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        let totals = &mut self.groups[slot];
        totals.sums[bucket] += u32::from(intensity);
        totals.counts[bucket] += 1;
    }

    pub fn get(&self, tag: &str) -> Option<&TagTotals> {
        self.index.get(tag).map(|&slot| &self.groups[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagTotals> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Tags a symptom contributes to: explicit tags, or the keyword fallback.
pub fn symptom_tags(symptom: &Symptom) -> Vec<String> {
    match symptom.tags.as_deref() {
        Some(tags) if !tags.is_empty() => tags.to_vec(),
        _ => vec![tag_for_description(&symptom.description).to_string()],
    }
}

/// Accumulate symptom intensities per tag and bucket.
///
/// Symptoms without a timestamp, or outside every bucket, are skipped.
pub fn group_by_tag(symptoms: &[Symptom], buckets: &[WeeklyBucket; BUCKET_COUNT]) -> TagGroups {
    let mut groups = TagGroups::default();
    let mut skipped = 0usize;

    for symptom in symptoms {
        let Some(bucket) = symptom.created_at.and_then(|at| bucket_index(buckets, at)) else {
            skipped += 1;
            continue;
        };

        for tag in symptom_tags(symptom) {
            groups.record(&tag, bucket, symptom.intensity);
        }
    }

    if skipped > 0 {
        debug!("Skipped {} symptoms outside the trend window", skipped);
    }

    groups
}

/// Build the trend series: one point per bucket, three tags per point.
pub fn compute_trend(groups: &TagGroups, buckets: &[WeeklyBucket; BUCKET_COUNT]) -> Vec<TrendPoint> {
    if groups.is_empty() {
        return fallback_trend(buckets);
    }

    let mut ranked: Vec<&TagTotals> = groups.iter().collect();
    // sort_by is stable, so ties keep first-seen order
    ranked.sort_by(|a, b| b.total().cmp(&a.total()));

    let mut tags: Vec<&str> = ranked.iter().take(TOP_TAGS).map(|t| t.tag.as_str()).collect();
    for canonical in CANONICAL_TAGS {
        if tags.len() == TOP_TAGS {
            break;
        }
        if !tags.contains(&canonical) {
            tags.push(canonical);
        }
    }

    buckets
        .iter()
        .enumerate()
        .map(|(i, bucket)| TrendPoint {
            bucket_label: bucket.label.clone(),
            values: tags
                .iter()
                .map(|tag| TagAverage {
                    tag: tag.to_string(),
                    average: groups.get(tag).map_or(0.0, |t| t.average(i)),
                })
                .collect(),
        })
        .collect()
}

fn fallback_trend(buckets: &[WeeklyBucket; BUCKET_COUNT]) -> Vec<TrendPoint> {
    buckets
        .iter()
        .map(|bucket| TrendPoint {
            bucket_label: bucket.label.clone(),
            values: CANONICAL_TAGS
                .iter()
                .map(|tag| TagAverage {
                    tag: tag.to_string(),
                    average: 0.0,
                })
                .collect(),
        })
        .collect()
}

/// Share of each predicted label across all predictions.
///
/// Percentages are rounded independently and may not sum to 100.
pub fn compute_distribution(predictions: &[Prediction]) -> Vec<DistributionSlice> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for label in predictions.iter().flat_map(|p| &p.predictions) {
        let key = label.label.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        match index.get(&key) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }

    let total: usize = counts.iter().map(|(_, count)| count).sum();
    if total == 0 {
        return vec![DistributionSlice {
            name: NO_DATA_LABEL.to_string(),
            value: 100,
            color_index: TOP_SLICES - 1,
            color: PALETTE[TOP_SLICES - 1].to_string(),
        }];
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(TOP_SLICES);

    counts
        .into_iter()
        .enumerate()
        .map(|(rank, (label, count))| {
            let color_index = rank % PALETTE.len();
            DistributionSlice {
                name: title_case(&label),
                value: (count as f64 / total as f64 * 100.0).round() as u32,
                color_index,
                color: PALETTE[color_index].to_string(),
            }
        })
        .collect()
}

/// Uppercase the first character, leave the rest alone.
pub fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Advice history from the most recent predictions, newest first.
pub fn build_advice_feed(predictions: &[Prediction]) -> Vec<AdviceItem> {
    let mut ordered: Vec<(usize, &Prediction)> = predictions.iter().enumerate().collect();
    // Undated predictions sort as oldest; later input wins equal timestamps.
    ordered.sort_by(|(ia, a), (ib, b)| (b.created_at, ib).cmp(&(a.created_at, ia)));

    ordered
        .into_iter()
        .take(ADVICE_LIMIT)
        .map(|(_, prediction)| AdviceItem {
            date: format_date(prediction.created_at),
            advice: advice_text(prediction),
            priority: AdvicePriority::from(prediction.overall_risk),
        })
        .collect()
}

fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| "Unknown date".to_string())
}

/// Compose the advice sentence for one prediction.
pub fn advice_text(prediction: &Prediction) -> String {
    let label = prediction
        .top_label()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or("unknown");

    let source = prediction.source_text.trim();
    let subject = if source.is_empty() {
        "Your logged symptoms were".to_string()
    } else {
        format!("\"{}\" was", source)
    };

    format!(
        "{} most consistent with {} ({} overall risk). {}",
        subject,
        label,
        prediction.overall_risk,
        risk_clause(prediction.overall_risk)
    )
}

/// Recommendation appended to advice text.
pub fn risk_clause(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::High => "Consider discussing these symptoms with your clinician soon.",
        RiskLevel::Medium => "Keep monitoring this symptom and note any changes over the next few days.",
        RiskLevel::Low | RiskLevel::Unknown => {
            "Keep tracking your symptoms to build a clearer picture over time."
        }
    }
}

/// Run the full aggregation for one view.
pub fn aggregate(symptoms: &[Symptom], predictions: &[Prediction], now: DateTime<Utc>) -> Insights {
    let buckets = bucketize(now);
    let groups = group_by_tag(symptoms, &buckets);
    debug!(
        "Grouped {} symptoms into {} tags; {} predictions",
        symptoms.len(),
        groups.len(),
        predictions.len()
    );

    Insights {
        trend: compute_trend(&groups, &buckets),
        distribution: compute_distribution(predictions),
        advice: build_advice_feed(predictions),
        buckets: buckets.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PredictionLabel;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 24, 12, 0, 0).unwrap()
    }

    fn symptom(description: &str, tags: Option<&[&str]>, intensity: u8, days_ago: i64) -> Symptom {
        Symptom {
            id: None,
            user_id: "u1".to_string(),
            description: description.to_string(),
            intensity,
            tags: tags.map(|t| t.iter().map(|s| s.to_string()).collect()),
            med_context: vec![],
            created_at: Some(now() - Duration::days(days_ago)),
        }
    }

    fn prediction(labels: &[&str], risk: RiskLevel, days_ago: Option<i64>) -> Prediction {
        Prediction {
            id: None,
            user_id: "u1".to_string(),
            source_text: "pounding head".to_string(),
            predictions: labels
                .iter()
                .map(|l| PredictionLabel {
                    label: l.to_string(),
                    score: 0.5,
                    risk: None,
                })
                .collect(),
            overall_risk: risk,
            created_at: days_ago.map(|d| now() - Duration::days(d)),
        }
    }

    #[test]
    fn test_buckets_are_contiguous_and_end_now() {
        let buckets = bucketize(now());
        assert_eq!(buckets[0].label, "Week 1");
        assert_eq!(buckets[3].label, "Week 4");
        assert_eq!(buckets[3].end, now());
        assert_eq!(buckets[0].start, now() - Duration::weeks(4));
        for pair in buckets.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert!(pair[0].start < pair[0].end);
        }
    }

    #[test]
    fn test_boundary_belongs_to_exactly_one_bucket() {
        let buckets = bucketize(now());
        for bucket in &buckets {
            let hits = buckets
                .iter()
                .filter(|b| b.start <= bucket.start && bucket.start < b.end)
                .count();
            assert_eq!(hits, 1);
        }
        assert_eq!(bucket_index(&buckets, buckets[1].start), Some(1));
        assert_eq!(bucket_index(&buckets, now()), Some(3));
        assert_eq!(bucket_index(&buckets, now() + Duration::seconds(1)), None);
        assert_eq!(bucket_index(&buckets, now() - Duration::weeks(5)), None);
    }

    #[test]
    fn test_single_headache_this_week() {
        let symptoms = vec![symptom("bad head", Some(&["headache"]), 8, 1)];
        let insights = aggregate(&symptoms, &[], now());

        assert_eq!(insights.trend.len(), BUCKET_COUNT);
        assert_eq!(insights.trend[3].value("headache"), Some(8.0));
        for point in &insights.trend[..3] {
            assert_eq!(point.value("headache"), Some(0.0));
        }
        for point in &insights.trend {
            assert_eq!(point.values.len(), TOP_TAGS);
        }
    }

    #[test]
    fn test_empty_input_uses_canonical_fallback() {
        let insights = aggregate(&[], &[], now());
        assert_eq!(insights.trend.len(), BUCKET_COUNT);
        for point in &insights.trend {
            assert_eq!(point.tags(), vec!["headache", "nausea", "fatigue"]);
            assert!(point.values.iter().all(|v| v.average == 0.0));
        }
    }

    #[test]
    fn test_symptoms_outside_window_are_dropped() {
        let symptoms = vec![
            symptom("old", Some(&["migraine"]), 9, 40),
            Symptom {
                created_at: None,
                ..symptom("undated", Some(&["migraine"]), 9, 0)
            },
        ];
        let buckets = bucketize(now());
        let groups = group_by_tag(&symptoms, &buckets);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_keyword_fallback_in_grouping() {
        let symptoms = vec![symptom("I have a dizzy spell", None, 4, 2)];
        let buckets = bucketize(now());
        let groups = group_by_tag(&symptoms, &buckets);
        let dizziness = groups.get("dizziness").unwrap();
        assert_eq!(dizziness.sums[3], 4);
        assert_eq!(dizziness.counts[3], 1);

        let empty_tags = vec![symptom("feeling tired", Some(&[]), 2, 2)];
        let groups = group_by_tag(&empty_tags, &buckets);
        assert!(groups.get("fatigue").is_some());
    }

    #[test]
    fn test_multi_tag_symptom_counts_for_each_tag() {
        let symptoms = vec![symptom("rough day", Some(&["headache", "nausea"]), 6, 3)];
        let buckets = bucketize(now());
        let groups = group_by_tag(&symptoms, &buckets);
        assert_eq!(groups.get("headache").unwrap().total(), 6);
        assert_eq!(groups.get("nausea").unwrap().total(), 6);
    }

    #[test]
    fn test_averages_round_to_one_decimal() {
        let symptoms = vec![
            symptom("a", Some(&["nausea"]), 3, 1),
            symptom("b", Some(&["nausea"]), 4, 2),
            symptom("c", Some(&["nausea"]), 4, 3),
        ];
        let insights = aggregate(&symptoms, &[], now());
        // 11 / 3 = 3.666..
        assert_eq!(insights.trend[3].value("nausea"), Some(3.7));
    }

    #[test]
    fn test_top_three_by_total_with_stable_ties() {
        let symptoms = vec![
            symptom("", Some(&["rash"]), 5, 1),
            symptom("", Some(&["cough"]), 5, 1),
            symptom("", Some(&["fever"]), 5, 1),
            symptom("", Some(&["insomnia"]), 9, 10),
        ];
        let insights = aggregate(&symptoms, &[], now());
        for point in &insights.trend {
            assert_eq!(point.tags(), vec!["insomnia", "rash", "cough"]);
        }
        assert_eq!(insights.trend[2].value("insomnia"), Some(9.0));
        assert_eq!(insights.trend[3].value("rash"), Some(5.0));
    }

    #[test]
    fn test_fewer_than_three_tags_are_padded() {
        let symptoms = vec![
            symptom("", Some(&["nausea"]), 5, 1),
            symptom("", Some(&["rash"]), 2, 1),
        ];
        let insights = aggregate(&symptoms, &[], now());
        assert_eq!(insights.trend[0].tags(), vec!["nausea", "rash", "headache"]);
    }

    #[test]
    fn test_distribution_folds_case() {
        let predictions = vec![
            prediction(&["Nausea"], RiskLevel::Low, Some(1)),
            prediction(&["nausea"], RiskLevel::Low, Some(2)),
        ];
        let slices = compute_distribution(&predictions);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].name, "Nausea");
        assert_eq!(slices[0].value, 100);
        assert_eq!(slices[0].color_index, 0);
    }

    #[test]
    fn test_distribution_no_data() {
        let slices = compute_distribution(&[]);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].name, "No Data");
        assert_eq!(slices[0].value, 100);

        let blank = vec![prediction(&[], RiskLevel::Low, None)];
        assert_eq!(compute_distribution(&blank)[0].name, "No Data");
    }

    #[test]
    fn test_distribution_caps_at_five_and_rounds_independently() {
        let predictions = vec![prediction(
            &["a", "b", "c", "d", "e", "f"],
            RiskLevel::Low,
            Some(1),
        )];
        let slices = compute_distribution(&predictions);
        assert_eq!(slices.len(), TOP_SLICES);
        let names: Vec<_> = slices.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D", "E"]);
        // 1/6 = 16.67 -> 17 each; the slices don't sum to 100
        assert!(slices.iter().all(|s| s.value == 17));
        assert!(slices.iter().all(|s| s.value <= 100));
    }

    #[test]
    fn test_distribution_orders_by_frequency() {
        let predictions = vec![
            prediction(&["fatigue", "headache"], RiskLevel::Low, Some(1)),
            prediction(&["headache"], RiskLevel::Low, Some(2)),
            prediction(&["Headache", "dizziness"], RiskLevel::Low, Some(3)),
        ];
        let slices = compute_distribution(&predictions);
        assert_eq!(slices[0].name, "Headache");
        assert_eq!(slices[0].value, 60);
        assert_eq!(slices[1].name, "Fatigue");
        assert_eq!(slices[2].name, "Dizziness");
        assert_eq!(slices[1].color, PALETTE[1]);
    }

    #[test]
    fn test_title_case_keeps_rest() {
        assert_eq!(title_case("nervous system disorder"), "Nervous system disorder");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_high_risk_advice() {
        let predictions = vec![prediction(&["Cardiac disorder"], RiskLevel::High, Some(1))];
        let feed = build_advice_feed(&predictions);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].priority, AdvicePriority::High);
        assert!(feed[0].advice.contains("clinician"));
        assert!(feed[0].advice.contains("Cardiac disorder"));
        assert!(feed[0].advice.contains("HIGH"));
        assert_eq!(feed[0].date, "Nov 23, 2024");
    }

    #[test]
    fn test_advice_priorities() {
        let medium = build_advice_feed(&[prediction(&["x"], RiskLevel::Medium, Some(1))]);
        assert_eq!(medium[0].priority, AdvicePriority::Medium);
        assert!(medium[0].advice.contains("monitoring"));

        let low = build_advice_feed(&[prediction(&[], RiskLevel::Low, Some(1))]);
        assert_eq!(low[0].priority, AdvicePriority::Positive);
        assert!(low[0].advice.contains("unknown"));
        assert!(low[0].advice.contains("tracking"));
    }

    #[test]
    fn test_advice_feed_caps_and_orders_newest_first() {
        let predictions: Vec<Prediction> = (0..15)
            .map(|d| prediction(&["nausea"], RiskLevel::Low, Some(d)))
            .collect();
        let feed = build_advice_feed(&predictions);
        assert_eq!(feed.len(), ADVICE_LIMIT);
        assert_eq!(feed[0].date, "Nov 24, 2024");
        assert_eq!(feed[9].date, "Nov 15, 2024");
    }

    #[test]
    fn test_advice_feed_handles_oldest_first_input() {
        let predictions = vec![
            prediction(&["old"], RiskLevel::Low, Some(5)),
            prediction(&["undated"], RiskLevel::Low, None),
            prediction(&["new"], RiskLevel::High, Some(1)),
        ];
        let feed = build_advice_feed(&predictions);
        assert!(feed[0].advice.contains("new"));
        assert!(feed[1].advice.contains("old"));
        assert_eq!(feed[2].date, "Unknown date");
    }

    #[test]
    fn test_aggregate_does_not_touch_inputs() {
        let symptoms = vec![symptom("nausea", None, 5, 1)];
        let predictions = vec![prediction(&["Nausea"], RiskLevel::Medium, Some(1))];
        let before = (symptoms.clone(), predictions.clone());
        let insights = aggregate(&symptoms, &predictions, now());
        assert_eq!((symptoms, predictions), before);
        assert_eq!(insights.buckets.len(), BUCKET_COUNT);
        assert_eq!(insights.advice.len(), 1);
    }
}
