use clap::Parser;
use std::time::Duration;

/// ICMP traceroute with per-hop reverse DNS and optional ASN enrichment
#[derive(Parser, Debug, Clone)]
#[command(name = "hoptrace")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Target host to trace (IPv4 address or hostname)
    pub target: String,

    /// Maximum TTL (hops)
    #[arg(short = 'm', long = "max-ttl", default_value = "30")]
    pub max_ttl: u8,

    /// Probes sent per hop
    #[arg(short = 'q', long = "queries", default_value = "3")]
    pub queries: u8,

    /// Per-hop timeout in seconds
    #[arg(short = 'w', long = "timeout", default_value = "2")]
    pub timeout: f64,

    /// Look up the origin AS of each hop (Team Cymru DNS)
    #[arg(long = "asn")]
    pub asn: bool,

    /// Skip reverse DNS lookups
    #[arg(short = 'n', long = "no-dns")]
    pub no_dns: bool,

    /// Print the final result as JSON instead of streaming hop lines
    #[arg(long = "json")]
    pub json: bool,

    /// Print an mtr-style summary table after the trace
    #[arg(short = 'r', long = "report", conflicts_with = "json")]
    pub report: bool,
}

impl Args {
    /// Get timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }

    /// Validate arguments
    pub fn validate(&self) -> Result<(), String> {
        if !self.timeout.is_finite() || self.timeout <= 0.0 {
            return Err("Timeout must be positive".into());
        }

        if self.max_ttl == 0 {
            return Err("Max TTL must be at least 1".into());
        }

        if self.queries == 0 {
            return Err("Queries must be at least 1".into());
        }

        // Keep the worst case (max_ttl * queries probes) bounded
        const MAX_QUERIES: u8 = 16;
        if self.queries > MAX_QUERIES {
            return Err(format!("Queries cannot exceed {}", MAX_QUERIES));
        }

        Ok(())
    }
}
