use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{ChannelMetrics, Dataset, FunnelStep, KpiSet, Stage, TrendPoint};

// Halves round away from zero, so 0.125 at two places is 0.13.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

pub fn kpis(dataset: &Dataset) -> KpiSet {
    let mut spend = 0.0;
    let mut revenue = 0.0;
    let mut purchases = 0u64;
    let mut visits = 0u64;

    for record in &dataset.records {
        spend += record.spend;
        revenue += record.revenue;
        purchases = purchases.saturating_add(record.purchase);
        visits = visits.saturating_add(record.visits);
    }

    KpiSet {
        spend,
        revenue,
        purchases,
        visits,
        roas: ratio(revenue, spend),
        cac: ratio(spend, purchases as f64),
        cvr: ratio(purchases as f64, visits as f64),
    }
}

impl KpiSet {
    pub fn display_roas(&self) -> f64 {
        self.roas.unwrap_or(0.0)
    }

    pub fn display_cac(&self) -> f64 {
        self.cac.unwrap_or(0.0)
    }

    pub fn display_cvr(&self) -> f64 {
        self.cvr.unwrap_or(0.0)
    }
}

pub fn funnel(dataset: &Dataset) -> [FunnelStep; 5] {
    let counts = Stage::ALL.map(|stage| {
        dataset
            .records
            .iter()
            .fold(0u64, |total, r| total.saturating_add(stage.count_in(r)))
    });

    std::array::from_fn(|i| {
        let count = counts[i];
        let dropoff_pct = counts.get(i + 1).and_then(|&next| {
            ratio(count as f64 - next as f64, count as f64).map(|pct| round_to(pct, 4))
        });
        FunnelStep {
            stage: Stage::ALL[i],
            count,
            dropoff_pct,
        }
    })
}

pub fn trend(dataset: &Dataset) -> Vec<TrendPoint> {
    let mut by_date: BTreeMap<_, (f64, f64, u64)> = BTreeMap::new();

    for record in &dataset.records {
        let entry = by_date.entry(record.date).or_insert((0.0, 0.0, 0));
        entry.0 += record.spend;
        entry.1 += record.revenue;
        entry.2 = entry.2.saturating_add(record.purchase);
    }

    by_date
        .into_iter()
        .map(|(date, (spend, revenue, purchase))| TrendPoint {
            date,
            spend,
            revenue,
            purchase,
        })
        .collect()
}

pub fn channel_performance(dataset: &Dataset) -> Vec<ChannelMetrics> {
    let mut by_channel: BTreeMap<&str, (f64, f64, u64, u64)> = BTreeMap::new();

    for record in &dataset.records {
        let entry = by_channel
            .entry(record.channel.as_str())
            .or_insert((0.0, 0.0, 0, 0));
        entry.0 += record.spend;
        entry.1 += record.revenue;
        entry.2 = entry.2.saturating_add(record.purchase);
        entry.3 = entry.3.saturating_add(record.visits);
    }

    by_channel
        .into_iter()
        .map(|(channel, (spend, revenue, purchase, visits))| ChannelMetrics {
            channel: channel.to_string(),
            spend,
            revenue,
            purchase,
            visits,
            roas: ratio(revenue, spend).map(|v| round_to(v, 2)),
            cac: ratio(spend, purchase as f64).map(|v| round_to(v, 2)),
            cvr: ratio(purchase as f64, visits as f64).map(|v| round_to(v, 4)),
        })
        .collect()
}

pub fn by_roas_desc(channels: &[ChannelMetrics]) -> Vec<ChannelMetrics> {
    let mut sorted = channels.to_vec();
    sorted.sort_by(|a, b| match (a.roas, b.roas) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    sorted
}
