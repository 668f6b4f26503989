//! Renders a `Statistics::finalize` result as the human-readable table
//! printed at the end of a sender or controller run.

use crate::stats::Report;

/// Formats a millisecond delay the way the reference implementation does:
/// minutes/seconds/milliseconds/microseconds, whichever reads best at that
/// magnitude.
fn dp(ms: f64) -> String {
    let abs = ms.abs();
    if abs > 60_000.0 {
        format!("{:7.1}min", ms / 60_000.0)
    } else if abs > 10_000.0 {
        format!("{:7.1}sec", ms / 1_000.0)
    } else if abs > 1_000.0 {
        format!("{:7.2}sec", ms / 1_000.0)
    } else if abs > 1.0 {
        format!("{:8.2}ms", ms)
    } else {
        format!("{:8}us", (ms * 1000.0) as i64)
    }
}

/// Prints the three-direction table to stdout.
pub fn print_report(report: &Report) {
    println!(
        "==============================================================================="
    );
    println!("Direction         Min         Max         Avg          Jitter     Loss");
    println!(
        "-------------------------------------------------------------------------------"
    );

    if report.received > 0 {
        print_direction("Outbound", report.outbound);
        print_direction("Inbound", report.inbound);
        print_direction("Roundtrip", report.roundtrip);
    } else {
        println!("  NO STATS AVAILABLE (100% loss)");
    }

    println!(
        "-------------------------------------------------------------------------------"
    );
    println!("                                                    Jitter Algorithm [RFC1889]");
    println!(
        "==============================================================================="
    );
}

fn print_direction(label: &str, d: Option<crate::stats::DirectionReport>) {
    let Some(d) = d else { return };
    println!(
        "  {:<12} {}  {}  {}  {}    {:5.1}%",
        format!("{}:", label),
        dp(d.min_ms),
        dp(d.max_ms),
        dp(d.avg_ms),
        dp(d.jitter_ms),
        d.loss_pct
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dp_picks_microseconds_for_sub_millisecond() {
        assert_eq!(dp(0.5), "     500us");
    }

    #[test]
    fn dp_picks_milliseconds_mid_range() {
        assert!(dp(5.0).ends_with("ms"));
    }

    #[test]
    fn dp_picks_seconds_above_one_thousand_ms() {
        assert!(dp(2000.0).ends_with("sec"));
    }
}
