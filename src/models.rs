use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub date: NaiveDate,
    pub channel: String,
    pub visits: u64,
    pub signup: u64,
    pub add_to_cart: u64,
    pub checkout: u64,
    pub purchase: u64,
    pub spend: f64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.first()?.date;
        Some(self.records.iter().fold((first, first), |(lo, hi), r| {
            (lo.min(r.date), hi.max(r.date))
        }))
    }

    pub fn channels(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.channel.clone()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Visits,
    Signup,
    AddToCart,
    Checkout,
    Purchase,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Visits,
        Stage::Signup,
        Stage::AddToCart,
        Stage::Checkout,
        Stage::Purchase,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Visits => "Visits",
            Stage::Signup => "Signup",
            Stage::AddToCart => "Add to Cart",
            Stage::Checkout => "Checkout",
            Stage::Purchase => "Purchase",
        }
    }

    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Visits => Some(Stage::Signup),
            Stage::Signup => Some(Stage::AddToCart),
            Stage::AddToCart => Some(Stage::Checkout),
            Stage::Checkout => Some(Stage::Purchase),
            Stage::Purchase => None,
        }
    }

    pub fn count_in(&self, record: &Record) -> u64 {
        match self {
            Stage::Visits => record.visits,
            Stage::Signup => record.signup,
            Stage::AddToCart => record.add_to_cart,
            Stage::Checkout => record.checkout,
            Stage::Purchase => record.purchase,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelStep {
    pub stage: Stage,
    pub count: u64,
    pub dropoff_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSet {
    pub spend: f64,
    pub revenue: f64,
    pub purchases: u64,
    pub visits: u64,
    pub roas: Option<f64>,
    pub cac: Option<f64>,
    pub cvr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub spend: f64,
    pub revenue: f64,
    pub purchase: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelMetrics {
    pub channel: String,
    pub spend: f64,
    pub revenue: f64,
    pub purchase: u64,
    pub visits: u64,
    pub roas: Option<f64>,
    pub cac: Option<f64>,
    pub cvr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub best_roas: String,
    pub worst_roas: String,
    pub biggest_drop: String,
    pub recommendation: String,
}
