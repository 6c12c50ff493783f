use crate::models::{ChannelMetrics, FunnelStep, Insights};

pub const RECOMMENDATION: &str = "Recommendation: prioritize fixing the biggest drop-off step first, \
then reallocate spend toward higher-ROAS channels.";

const NO_DATA: &str = "no data";

/// Highest defined ROAS; ties keep the earliest channel.
pub fn best_roas(channels: &[ChannelMetrics]) -> Option<&ChannelMetrics> {
    select_roas(channels, |candidate, current| candidate > current)
}

/// Lowest defined ROAS; ties keep the earliest channel.
pub fn worst_roas(channels: &[ChannelMetrics]) -> Option<&ChannelMetrics> {
    select_roas(channels, |candidate, current| candidate < current)
}

fn select_roas(
    channels: &[ChannelMetrics],
    better: impl Fn(f64, f64) -> bool,
) -> Option<&ChannelMetrics> {
    let mut chosen: Option<(&ChannelMetrics, f64)> = None;
    for channel in channels {
        let Some(roas) = channel.roas else {
            continue;
        };
        if chosen.map_or(true, |(_, current)| better(roas, current)) {
            chosen = Some((channel, roas));
        }
    }
    chosen.map(|(channel, _)| channel)
}

/// Stage losing the largest share of its entrants; ties keep the earliest stage.
pub fn biggest_drop(steps: &[FunnelStep]) -> Option<&FunnelStep> {
    let mut chosen: Option<(&FunnelStep, f64)> = None;
    for step in steps {
        let Some(pct) = step.dropoff_pct else {
            continue;
        };
        if chosen.map_or(true, |(_, current)| pct > current) {
            chosen = Some((step, pct));
        }
    }
    chosen.map(|(step, _)| step)
}

fn describe_channel(label: &str, channel: Option<&ChannelMetrics>) -> String {
    match channel.and_then(|c| c.roas.map(|roas| (c, roas))) {
        Some((c, roas)) => format!("{label}: {} ({roas:.2}x)", c.channel),
        None => format!("{label}: {NO_DATA}"),
    }
}

fn describe_drop(step: Option<&FunnelStep>) -> String {
    match step.and_then(|s| s.dropoff_pct.map(|pct| (s, pct))) {
        Some((s, pct)) => {
            let next = s.stage.next().map_or("next step", |n| n.label());
            format!(
                "Biggest funnel drop: {} → {} ({:.0}% drop-off)",
                s.stage,
                next,
                pct * 100.0
            )
        }
        None => format!("Biggest funnel drop: {NO_DATA}"),
    }
}

pub fn generate(channels: &[ChannelMetrics], steps: &[FunnelStep]) -> Insights {
    Insights {
        best_roas: describe_channel("Best ROAS channel", best_roas(channels)),
        worst_roas: describe_channel("Lowest ROAS channel", worst_roas(channels)),
        biggest_drop: describe_drop(biggest_drop(steps)),
        recommendation: RECOMMENDATION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stage;

    fn channel(name: &str, roas: Option<f64>) -> ChannelMetrics {
        ChannelMetrics {
            channel: name.to_string(),
            spend: 100.0,
            revenue: roas.unwrap_or(0.0) * 100.0,
            purchase: 10,
            visits: 1000,
            roas,
            cac: Some(10.0),
            cvr: Some(0.01),
        }
    }

    fn step(stage: Stage, count: u64, dropoff_pct: Option<f64>) -> FunnelStep {
        FunnelStep {
            stage,
            count,
            dropoff_pct,
        }
    }

    #[test]
    fn best_roas_keeps_first_on_tie() {
        let channels = vec![
            channel("A", Some(3.0)),
            channel("B", Some(1.5)),
            channel("C", Some(3.0)),
        ];
        assert_eq!(best_roas(&channels).unwrap().channel, "A");
        assert_eq!(worst_roas(&channels).unwrap().channel, "B");
    }

    #[test]
    fn worst_roas_keeps_first_on_tie() {
        let channels = vec![
            channel("A", Some(2.0)),
            channel("B", Some(0.5)),
            channel("C", Some(0.5)),
        ];
        assert_eq!(worst_roas(&channels).unwrap().channel, "B");
    }

    #[test]
    fn undefined_roas_is_skipped() {
        let channels = vec![channel("A", None), channel("B", Some(1.2))];
        assert_eq!(best_roas(&channels).unwrap().channel, "B");
        assert_eq!(worst_roas(&channels).unwrap().channel, "B");
        assert!(best_roas(&[channel("A", None)]).is_none());
    }

    #[test]
    fn single_channel_is_both_best_and_worst() {
        let channels = vec![channel("X", Some(3.0))];
        let insights = generate(&channels, &[]);
        assert_eq!(insights.best_roas, "Best ROAS channel: X (3.00x)");
        assert_eq!(insights.worst_roas, "Lowest ROAS channel: X (3.00x)");
    }

    #[test]
    fn biggest_drop_prefers_earliest_on_tie() {
        let steps = vec![
            step(Stage::Visits, 100, Some(0.4)),
            step(Stage::Signup, 60, Some(0.5)),
            step(Stage::AddToCart, 30, Some(0.5)),
            step(Stage::Checkout, 15, None),
            step(Stage::Purchase, 0, None),
        ];
        assert_eq!(biggest_drop(&steps).unwrap().stage, Stage::Signup);
        assert_eq!(
            generate(&[], &steps).biggest_drop,
            "Biggest funnel drop: Signup → Add to Cart (50% drop-off)"
        );
    }

    #[test]
    fn empty_inputs_fall_back_to_no_data() {
        let steps = vec![
            step(Stage::Visits, 0, None),
            step(Stage::Signup, 0, None),
            step(Stage::AddToCart, 0, None),
            step(Stage::Checkout, 0, None),
            step(Stage::Purchase, 0, None),
        ];
        let insights = generate(&[], &steps);
        assert_eq!(insights.best_roas, "Best ROAS channel: no data");
        assert_eq!(insights.worst_roas, "Lowest ROAS channel: no data");
        assert_eq!(insights.biggest_drop, "Biggest funnel drop: no data");
        assert_eq!(insights.recommendation, RECOMMENDATION);
    }
}
