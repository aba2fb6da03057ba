use std::fmt::Write as _;
use std::io::Write;
use std::time::Duration;

use crate::state::{Hop, Target, TraceResult, TraceStatus};

fn ms(rtt: Duration) -> String {
    format!("{:.3} ms", rtt.as_secs_f64() * 1000.0)
}

fn host_label(hop: &Hop) -> String {
    match (hop.ip, hop.hostnames.first()) {
        (Some(ip), Some(name)) => format!("{} ({})", name, ip),
        (Some(ip), None) => ip.to_string(),
        (None, _) => "*".to_string(),
    }
}

/// One traceroute-style line for a finalized hop.
///
/// Missing replies are shown as `*` up to the number of probes sent.
pub fn format_hop(hop: &Hop) -> String {
    let mut line = format!("{:>3}  {}", hop.ttl, host_label(hop));

    if !hop.asn.is_empty() {
        let _ = write!(line, "  [AS{}", hop.asn);
        if !hop.org.is_empty() {
            let _ = write!(line, " {}", hop.org);
        }
        line.push(']');
    }

    if hop.timeout {
        return line;
    }

    for rtt in &hop.rtts {
        let _ = write!(line, "  {}", ms(*rtt));
    }
    let missing = (hop.sent as usize).saturating_sub(hop.rtts.len());
    for _ in 0..missing {
        line.push_str("  *");
    }
    line
}

/// Header line printed before the first hop
pub fn format_header(target: &Target, max_ttl: u8, payload_size: usize) -> String {
    format!(
        "traceroute to {} ({}), {} hops max, {} byte packets",
        target.original, target.resolved, max_ttl, payload_size
    )
}

/// Generate a text report similar to mtr --report
pub fn generate_report<W: Write>(result: &TraceResult, mut writer: W) -> std::io::Result<()> {
    writeln!(
        writer,
        "hoptrace report for {} ({})",
        result.target.original, result.target.resolved
    )?;
    writeln!(writer, "Started: {}", result.started_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(writer)?;

    writeln!(
        writer,
        "{:>3}  {:<40} {:>8} {:>6} {:>6} {:>10} {:>10} {:>10}",
        "#", "Host", "ASN", "Loss%", "Sent", "Avg", "Min", "Max"
    )?;
    writeln!(writer, "{}", "-".repeat(100))?;

    for hop in &result.hops {
        let asn = if hop.asn.is_empty() {
            "-".to_string()
        } else {
            format!("AS{}", hop.asn)
        };
        let stat = |rtt: Option<Duration>| rtt.map_or_else(|| "-".to_string(), ms);

        writeln!(
            writer,
            "{:>3}  {:<40} {:>8} {:>5.1}% {:>6} {:>10} {:>10} {:>10}",
            hop.ttl,
            host_label(hop),
            asn,
            hop.loss_pct(),
            hop.sent,
            stat(hop.avg_rtt()),
            stat(hop.min_rtt()),
            stat(hop.max_rtt()),
        )?;
    }

    writeln!(writer)?;
    let outcome = match result.status {
        TraceStatus::Reached => "destination reached",
        TraceStatus::MaxTtlExceeded => "max TTL exceeded",
        TraceStatus::Cancelled => "cancelled",
        TraceStatus::ReceiverStopped => "receiver stopped",
    };
    writeln!(
        writer,
        "{} hops, {} in {:.2}s",
        result.hops.len(),
        outcome,
        result.duration.as_secs_f64()
    )?;

    Ok(())
}
