//! Replay and inspection tools for vesture.
//!
//! - Replay scripted scenarios against the in-memory host and report what each
//!   step did
//! - Dump the actor registry to JSON and read dumps back
//!
//! # Design Principles
//!
//! - **Same engine, fake host** - Scenarios drive the real listener and manager;
//!   only the host is simulated.
//! - **Rejections are data** - An edit the engine refuses is part of the report,
//!   not a failure of the tool.

pub mod dump;
pub mod logging;
pub mod scenario;

use std::fmt::Write as _;

pub use dump::{format_dump_pretty, ActorDump, FieldDump, StateDump};
pub use scenario::{run_scenario, ReplayReport, Scenario, Step, StepReport};

/// Renders a replay report for humans.
pub fn format_report_pretty(report: &ReplayReport) -> String {
    let mut out = String::new();
    for step in &report.steps {
        let outcome = step.error.as_deref().unwrap_or("ok");
        let _ = writeln!(
            out,
            "{:>4} {:<14} effects: {:<3} events: {:<3} {outcome}",
            step.index, step.op, step.effects, step.events
        );
    }
    let _ = writeln!(
        out,
        "steps: {} rejected: {} events: {} rewrites: {}",
        report.steps.len(),
        report.rejected(),
        report.events.len(),
        report.rewrites
    );
    out.push_str(&format_dump_pretty(&report.dump));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_every_step() {
        let scenario = Scenario::from_json(
            r#"{"steps": [
                {"op": "spawn", "actor": 2},
                {"op": "track", "actor": 2},
                {"op": "model", "actor": 9, "id": 1}
            ]}"#,
        )
        .unwrap();
        let report = run_scenario(&scenario).unwrap();
        let text = format_report_pretty(&report);
        assert_eq!(text.lines().filter(|line| line.contains("effects:")).count(), 3);
        assert!(text.contains("rejected: 1"));
        assert!(text.contains("actor 2 overrides: 0"));
    }
}
