use std::fmt::Write;

use crate::metrics;
use crate::models::ChannelMetrics;
use crate::pipeline::Dashboard;

/// Whole-dollar amount with thousands separators, e.g. `$12,345`.
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn optional(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "NA".to_string(), |v| format!("{:.*}", decimals, v))
}

fn channel_row(channel: &ChannelMetrics) -> String {
    format!(
        "| {} | {:.2} | {:.2} | {} | {} | {} | {} | {} |",
        channel.channel,
        channel.spend,
        channel.revenue,
        channel.purchase,
        channel.visits,
        optional(channel.roas, 2),
        optional(channel.cac, 2),
        optional(channel.cvr, 4),
    )
}

fn write_kpis(output: &mut String, dashboard: &Dashboard) {
    let kpis = &dashboard.kpis;
    let _ = writeln!(output, "- Spend: {}", format_currency(kpis.spend));
    let _ = writeln!(output, "- Revenue: {}", format_currency(kpis.revenue));
    let _ = writeln!(output, "- ROAS: {:.2}x", kpis.display_roas());
    let _ = writeln!(output, "- Conversion Rate: {:.2}%", kpis.display_cvr() * 100.0);
    let _ = writeln!(output, "- CAC: {:.2}", kpis.display_cac());
    let _ = writeln!(output, "- Purchases: {}", kpis.purchases);
    let _ = writeln!(output, "- Visits: {}", kpis.visits);
}

fn write_insights(output: &mut String, dashboard: &Dashboard) {
    let insights = &dashboard.insights;
    let _ = writeln!(output, "- {}", insights.best_roas);
    let _ = writeln!(output, "- {}", insights.worst_roas);
    let _ = writeln!(output, "- {}", insights.biggest_drop);
    let _ = writeln!(output, "- {}", insights.recommendation);
}

pub fn build_report(source_label: &str, dashboard: &Dashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Growth Funnel Lab");
    let _ = writeln!(
        output,
        "Funnel drop-offs, channel performance, and business-ready insights"
    );
    let _ = writeln!(output);
    match &dashboard.filters {
        Some(filters) => {
            let channels = filters
                .channels
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(
                output,
                "Source: {} ({} to {}, channels: {})",
                source_label, filters.start, filters.end, channels
            );
        }
        None => {
            let _ = writeln!(output, "Source: {source_label}");
        }
    }
    for warning in &dashboard.warnings {
        let _ = writeln!(output);
        let _ = writeln!(output, "> Warning: {warning}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## KPIs");
    write_kpis(&mut output, dashboard);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Drop-off by step");
    let _ = writeln!(output, "| stage | count | dropoff_% |");
    let _ = writeln!(output, "|---|---|---|");
    for step in &dashboard.funnel {
        let _ = writeln!(
            output,
            "| {} | {} | {} |",
            step.stage,
            step.count,
            optional(step.dropoff_pct, 4)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Trend (Spend / Revenue / Purchases)");
    if dashboard.trend.is_empty() {
        let _ = writeln!(output, "No activity recorded for this selection.");
    } else {
        let _ = writeln!(output, "| date | spend | revenue | purchase |");
        let _ = writeln!(output, "|---|---|---|---|");
        for point in &dashboard.trend {
            let _ = writeln!(
                output,
                "| {} | {:.2} | {:.2} | {} |",
                point.date, point.spend, point.revenue, point.purchase
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Channel Performance");
    if dashboard.channels.is_empty() {
        let _ = writeln!(output, "No channels in this selection.");
    } else {
        let _ = writeln!(
            output,
            "| channel | spend | revenue | purchase | visits | roas | cac | cvr |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|---|---|---|");
        for channel in metrics::by_roas_desc(&dashboard.channels) {
            let _ = writeln!(output, "{}", channel_row(&channel));
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Executive Insights");
    write_insights(&mut output, dashboard);

    output
}

/// Short terminal rendering: KPIs, funnel and insights.
pub fn build_summary(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Rows in selection: {}", dashboard.row_count);
    for warning in &dashboard.warnings {
        let _ = writeln!(output, "Warning: {warning}");
    }
    write_kpis(&mut output, dashboard);

    let _ = writeln!(output, "Funnel:");
    for step in &dashboard.funnel {
        match step.dropoff_pct {
            Some(pct) => {
                let _ = writeln!(
                    output,
                    "- {} {} ({:.0}% drop-off)",
                    step.stage,
                    step.count,
                    pct * 100.0
                );
            }
            None => {
                let _ = writeln!(output, "- {} {}", step.stage, step.count);
            }
        }
    }

    let _ = writeln!(output, "Insights:");
    write_insights(&mut output, dashboard);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterRequest;
    use crate::loader::load_reader;
    use crate::pipeline::{prepare_table, run};
    use chrono::NaiveDate;

    const CSV: &str = "\
date,channel,visits,signup,add_to_cart,checkout,purchase,spend,revenue
2024-04-01,Search,1000,400,200,100,40,2000,9000
2024-04-01,Social,1500,300,90,40,12,1800,2100
2024-04-02,Affiliate,200,20,10,5,0,0,0
";

    fn dashboard(request: &FilterRequest) -> Dashboard {
        let dataset = prepare_table(&load_reader(CSV.as_bytes()).unwrap()).unwrap();
        run(&dataset, request)
    }

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(999.4), "$999");
        assert_eq!(format_currency(1234.5), "$1,235");
        assert_eq!(format_currency(12_345_678.0), "$12,345,678");
    }

    #[test]
    fn report_lists_sections_and_channels_by_roas() {
        let report = build_report("sample", &dashboard(&FilterRequest::default()));
        assert!(report.contains("## KPIs"));
        assert!(report.contains("- Spend: $3,800"));
        assert!(report.contains("| Visits | 2700 | 0.7333 |"));
        assert!(report.contains("| Purchase | 52 | NA |"));

        let search = report.find("| Search |").unwrap();
        let social = report.find("| Social |").unwrap();
        let affiliate = report.find("| Affiliate |").unwrap();
        assert!(search < social && social < affiliate);
        assert!(report.contains("| Affiliate | 0.00 | 0.00 | 0 | 200 | NA | NA | 0.0000 |"));
        assert!(report.contains("Best ROAS channel: Search (4.50x)"));
        assert!(report.contains("Lowest ROAS channel: Social (1.17x)"));
    }

    #[test]
    fn empty_selection_renders_zeroes_and_warning() {
        let request = FilterRequest {
            start: NaiveDate::from_ymd_opt(2025, 1, 1),
            end: NaiveDate::from_ymd_opt(2025, 1, 2),
            channels: None,
        };
        let summary = build_summary(&dashboard(&request));
        assert!(summary.contains("Rows in selection: 0"));
        assert!(summary.contains("Warning: no rows match"));
        assert!(summary.contains("- ROAS: 0.00x"));
        assert!(summary.contains("- Conversion Rate: 0.00%"));
        assert!(summary.contains("Best ROAS channel: no data"));
    }
}
