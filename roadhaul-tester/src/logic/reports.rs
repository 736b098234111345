use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use super::simulation::RunRecord;

/// Per-strategy roll-up across seeds and iterations.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StrategySummary {
    pub strategy: String,
    pub runs: usize,
    pub passed: usize,
    pub mean_deliveries: f64,
    pub mean_final_money: f64,
    pub failed_trip_rate: f64,
    pub breakdowns: u32,
    pub violations: u32,
    pub challenges_completed: usize,
}

#[allow(clippy::cast_precision_loss)]
fn mean<I: Iterator<Item = f64>>(values: I, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    values.sum::<f64>() / count as f64
}

#[must_use]
pub fn summarize(records: &[RunRecord]) -> Vec<StrategySummary> {
    let mut names: Vec<&str> = Vec::new();
    for record in records {
        if !names.contains(&record.strategy.as_str()) {
            names.push(record.strategy.as_str());
        }
    }
    names
        .into_iter()
        .map(|name| {
            let runs: Vec<&RunRecord> = records.iter().filter(|r| r.strategy == name).collect();
            let trips: u32 = runs.iter().map(|r| r.deliveries + r.failed_trips).sum();
            let failed: u32 = runs.iter().map(|r| r.failed_trips).sum();
            #[allow(clippy::cast_precision_loss)]
            let mean_final_money = mean(runs.iter().map(|r| r.final_money as f64), runs.len());
            StrategySummary {
                strategy: name.to_string(),
                runs: runs.len(),
                passed: runs.iter().filter(|r| r.passed()).count(),
                mean_deliveries: mean(runs.iter().map(|r| f64::from(r.deliveries)), runs.len()),
                mean_final_money,
                failed_trip_rate: if trips == 0 {
                    0.0
                } else {
                    f64::from(failed) / f64::from(trips)
                },
                breakdowns: runs.iter().map(|r| r.breakdowns).sum(),
                violations: runs.iter().map(|r| r.violations).sum(),
                challenges_completed: runs.iter().map(|r| r.challenges_completed.len()).sum(),
            }
        })
        .collect()
}

pub fn write_console_report(
    out: &mut dyn Write,
    records: &[RunRecord],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Autopilot Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "============================".cyan())?;

    let passed = records.iter().filter(|r| r.passed()).count();
    writeln!(out, "Total runs: {}", records.len())?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (records.len() - passed).to_string().red())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for record in records {
        let status = if record.passed() {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{} {} seed {}",
            status,
            record.strategy.bold(),
            record.seed
        )?;
        writeln!(
            out,
            "   Deliveries: {} ({} clean), failed trips: {}, abandoned: {}",
            record.deliveries, record.clean_deliveries, record.failed_trips, record.abandoned_trips
        )?;
        writeln!(
            out,
            "   Money: ${} final, ${} peak, ended in {}",
            record.final_money, record.peak_money, record.final_city
        )?;
        writeln!(
            out,
            "   Breakdowns: {} ({} paid), DOT checks: {}, violations: {}",
            record.breakdowns, record.breakdowns_paid, record.dot_checks, record.violations
        )?;
        if !record.challenges_completed.is_empty() {
            writeln!(
                out,
                "   Challenges: {}",
                record.challenges_completed.join(", ").yellow()
            )?;
        }
        for failure in &record.invariant_failures {
            writeln!(out, "     • {}", failure.red())?;
        }
    }

    let summaries = summarize(records);
    if !summaries.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "🚚 Strategy Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "===================".yellow())?;
        for summary in &summaries {
            writeln!(
                out,
                "{}: {:.1} deliveries/run, ${:.0} mean final, {:.1}% failed trips",
                summary.strategy.bold(),
                summary.mean_deliveries,
                summary.mean_final_money,
                summary.failed_trip_rate * 100.0
            )?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    generated_at: String,
    summaries: Vec<StrategySummary>,
    runs: &'a [RunRecord],
}

pub fn write_json_report(out: &mut dyn Write, records: &[RunRecord]) -> Result<()> {
    let report = JsonReport {
        generated_at: Utc::now().to_rfc3339(),
        summaries: summarize(records),
        runs: records,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_markdown_report(out: &mut dyn Write, records: &[RunRecord]) -> Result<()> {
    writeln!(out, "# Roadhaul Autopilot Results\n")?;
    writeln!(out, "_Generated {}_\n", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;

    if records.is_empty() {
        writeln!(out, "_No runs executed._")?;
        return Ok(());
    }

    writeln!(out, "## Summary\n")?;
    writeln!(
        out,
        "| Strategy | Runs | Passed | Deliveries/run | Mean final $ | Failed trips |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|")?;
    for summary in summarize(records) {
        writeln!(
            out,
            "| {} | {} | {} | {:.1} | {:.0} | {:.1}% |",
            summary.strategy,
            summary.runs,
            summary.passed,
            summary.mean_deliveries,
            summary.mean_final_money,
            summary.failed_trip_rate * 100.0
        )?;
    }

    writeln!(out, "\n## Runs\n")?;
    for record in records {
        let status = if record.passed() { "✅" } else { "❌" };
        writeln!(out, "### {status} {} seed {}\n", record.strategy, record.seed)?;
        writeln!(out, "- **Deliveries**: {}", record.deliveries)?;
        writeln!(out, "- **Failed trips**: {}", record.failed_trips)?;
        writeln!(out, "- **Final money**: ${}", record.final_money)?;
        writeln!(out, "- **Miles driven**: {:.0}", record.miles_driven)?;
        if !record.invariant_failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &record.invariant_failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(strategy: &str, deliveries: u32, failed: u32, money: i64) -> RunRecord {
        RunRecord {
            strategy: strategy.to_string(),
            deliveries,
            failed_trips: failed,
            final_money: money,
            ..RunRecord::default()
        }
    }

    #[test]
    fn summaries_group_by_strategy() {
        let records = vec![
            record("Greedy", 4, 1, 1000),
            record("Greedy", 6, 1, 3000),
            record("Cautious", 3, 0, 900),
        ];
        let summaries = summarize(&records);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].strategy, "Greedy");
        assert!((summaries[0].mean_deliveries - 5.0).abs() < f64::EPSILON);
        assert!((summaries[0].mean_final_money - 2000.0).abs() < f64::EPSILON);
        assert!((summaries[0].failed_trip_rate - 2.0 / 12.0).abs() < 1e-9);
        assert!(summaries[1].failed_trip_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn json_report_parses_back() {
        let records = vec![record("Balanced", 2, 0, 1200)];
        let mut buf = Vec::new();
        write_json_report(&mut buf, &records).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["runs"][0]["deliveries"], 2);
        assert_eq!(value["summaries"][0]["strategy"], "Balanced");
        assert!(value["generatedAt"].is_string());
    }

    #[test]
    fn markdown_report_lists_runs() {
        let mut buf = Vec::new();
        write_markdown_report(&mut buf, &[record("Cautious", 1, 0, 10)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("| Cautious | 1 | 1 |"));
        assert!(text.contains("### ✅ Cautious seed 0"));
    }
}
