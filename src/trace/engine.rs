use chrono::Utc;
use socket2::Socket;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::error::TraceError;
use crate::lookup::{DnsLookup, Resolver, resolve_target};
use crate::probe::{build_echo_request, create_raw_icmp_socket, new_identifier, send_icmp, set_ttl};
use crate::state::{Hop, ProbeId, Target, TraceResult, TraceStatus};
use crate::trace::enrich::HopEnricher;
use crate::trace::pending::{ProbeFilter, SharedTraceState, new_trace_state};
use crate::trace::receiver::{EVENT_CHANNEL_CAPACITY, ReplyEvent, spawn_receiver};

/// Write side of the probe transport
pub trait ProbeSender: Send {
    /// Set the outgoing TTL for subsequent probes
    fn set_ttl(&mut self, ttl: u8) -> Result<(), TraceError>;

    /// Write one Echo Request
    fn send_probe(&mut self, ttl: u8, packet: &[u8], target: Ipv4Addr) -> Result<(), TraceError>;
}

impl ProbeSender for Socket {
    fn set_ttl(&mut self, ttl: u8) -> Result<(), TraceError> {
        set_ttl(self, ttl)
    }

    fn send_probe(&mut self, ttl: u8, packet: &[u8], target: Ipv4Addr) -> Result<(), TraceError> {
        send_icmp(self, packet, target)
            .map(drop)
            .map_err(|source| TraceError::Send { ttl, source })
    }
}

/// How the wait for a hop's replies ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AwaitOutcome {
    /// Every probe for the hop answered
    Complete,
    TimedOut,
    Cancelled,
    /// Event channel closed
    ReceiverGone,
}

/// ICMP traceroute: probes one TTL at a time and reports hops in order
pub struct Tracer<R: Resolver + ?Sized = DnsLookup> {
    config: Config,
    identifier: u16,
    resolver: Arc<R>,
    enricher: HopEnricher<R>,
}

impl Tracer<DnsLookup> {
    /// Tracer using the system DNS configuration
    pub fn new(config: Config) -> Result<Self, TraceError> {
        Self::with_resolver(config, Arc::new(DnsLookup::new()))
    }
}

impl<R: Resolver + ?Sized> Tracer<R> {
    pub fn with_resolver(config: Config, resolver: Arc<R>) -> Result<Self, TraceError> {
        config.validate()?;
        let enricher = HopEnricher::new(
            Arc::clone(&resolver),
            config.resolve_names,
            config.resolve_as,
            config.timeout,
        );
        Ok(Self {
            config,
            identifier: new_identifier(),
            resolver,
            enricher,
        })
    }

    /// Override the random ICMP identifier
    pub fn with_identifier(mut self, identifier: u16) -> Self {
        self.identifier = identifier;
        self
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve a target name or address literal to the IPv4 address to probe
    pub async fn resolve(&self, target: &str) -> Result<Target, TraceError> {
        let resolved = resolve_target(&*self.resolver, target).await?;
        Ok(Target::new(target.to_string(), IpAddr::V4(resolved)))
    }

    /// Trace `target` over a raw ICMP socket.
    ///
    /// `on_hop` is called once per finalized hop in increasing TTL order.
    /// Cancelling `cancel` ends the trace early with the hops finalized so
    /// far and [`TraceStatus::Cancelled`].
    pub async fn run<F>(
        &self,
        target: &str,
        cancel: CancellationToken,
        on_hop: F,
    ) -> Result<TraceResult, TraceError>
    where
        F: FnMut(&Hop),
    {
        let target = self.resolve(target).await?;
        self.run_resolved(target, cancel, on_hop).await
    }

    /// Like [`Tracer::run`] for a target already passed through [`Tracer::resolve`]
    pub async fn run_resolved<F>(
        &self,
        target: Target,
        cancel: CancellationToken,
        on_hop: F,
    ) -> Result<TraceResult, TraceError>
    where
        F: FnMut(&Hop),
    {
        let socket = create_raw_icmp_socket(self.config.poll_interval)?;
        let send_socket = socket.try_clone().map_err(TraceError::SocketCreation)?;

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let receiver_cancel = cancel.child_token();
        // Receiver thread exits within one poll interval and closes its socket
        let _receiver = spawn_receiver(socket, self.identifier, events_tx, receiver_cancel.clone());
        let _stop_receiver = receiver_cancel.drop_guard();

        self.trace(target, send_socket, events_rx, &cancel, on_hop)
            .await
    }

    /// Trace `target` over a caller-supplied transport.
    ///
    /// `events` must carry replies for probes written through `sender`.
    pub async fn run_with<S, F>(
        &self,
        target: &str,
        sender: S,
        events: mpsc::Receiver<ReplyEvent>,
        cancel: CancellationToken,
        on_hop: F,
    ) -> Result<TraceResult, TraceError>
    where
        S: ProbeSender,
        F: FnMut(&Hop),
    {
        let target = self.resolve(target).await?;
        self.run_resolved_with(target, sender, events, cancel, on_hop)
            .await
    }

    /// Like [`Tracer::run_with`] for an already resolved target
    pub async fn run_resolved_with<S, F>(
        &self,
        target: Target,
        sender: S,
        events: mpsc::Receiver<ReplyEvent>,
        cancel: CancellationToken,
        on_hop: F,
    ) -> Result<TraceResult, TraceError>
    where
        S: ProbeSender,
        F: FnMut(&Hop),
    {
        self.trace(target, sender, events, &cancel, on_hop).await
    }

    async fn trace<S, F>(
        &self,
        target: Target,
        mut sender: S,
        mut events: mpsc::Receiver<ReplyEvent>,
        cancel: &CancellationToken,
        mut on_hop: F,
    ) -> Result<TraceResult, TraceError>
    where
        S: ProbeSender,
        F: FnMut(&Hop),
    {
        let resolved = match target.resolved {
            IpAddr::V4(v4) => v4,
            IpAddr::V6(_) => return Err(TraceError::Ipv6Unsupported(target.original)),
        };
        let started_at = Utc::now();
        let start = Instant::now();
        let state = new_trace_state();
        let filter = ProbeFilter {
            identifier: self.identifier,
            max_ttl: self.config.max_ttl,
            queries: self.config.queries,
            destination: target.resolved,
        };

        info!(
            target = %target.original,
            resolved = %resolved,
            max_ttl = self.config.max_ttl,
            queries = self.config.queries,
            identifier = self.identifier,
            "Starting trace"
        );

        let mut hops = Vec::new();
        let mut status = TraceStatus::MaxTtlExceeded;

        for ttl in 1..=self.config.max_ttl {
            if cancel.is_cancelled() {
                status = TraceStatus::Cancelled;
                break;
            }

            state.lock().open_hop(ttl);
            let sent = self.send_probes(ttl, resolved, &mut sender, &state).await;

            let outcome = if sent == 0 {
                AwaitOutcome::TimedOut
            } else {
                self.await_replies(ttl, &state, &filter, &mut events, cancel)
                    .await
            };

            let closed = state.lock().close_hop(ttl);
            if outcome == AwaitOutcome::Cancelled {
                status = TraceStatus::Cancelled;
                break;
            }
            let Some(mut hop) = closed else {
                continue;
            };

            hop.finalize();
            if hop.ip.is_some() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        status = TraceStatus::Cancelled;
                        break;
                    }
                    _ = self.enricher.enrich(&mut hop) => {}
                }
            }

            debug!(
                ttl,
                ip = ?hop.ip,
                received = hop.received(),
                reached = hop.reached,
                timeout = hop.timeout,
                "Hop finalized"
            );
            on_hop(&hop);

            let reached = hop.reached;
            hops.push(hop);

            if reached {
                status = TraceStatus::Reached;
                break;
            }
            if outcome == AwaitOutcome::ReceiverGone {
                warn!(ttl, "Reply channel closed, stopping trace");
                status = TraceStatus::ReceiverStopped;
                break;
            }
        }

        let result = TraceResult {
            target,
            started_at,
            hops,
            duration: start.elapsed(),
            status,
        };
        info!(
            hops = result.hops.len(),
            status = ?result.status,
            duration_ms = result.duration.as_millis() as u64,
            "Trace finished"
        );
        Ok(result)
    }

    /// Send every probe for one TTL; returns how many left the socket
    async fn send_probes<S: ProbeSender>(
        &self,
        ttl: u8,
        target: Ipv4Addr,
        sender: &mut S,
        state: &SharedTraceState,
    ) -> usize {
        if let Err(e) = sender.set_ttl(ttl) {
            warn!(error = %e, "Skipping hop");
            return 0;
        }

        let mut sent = 0;
        for query in 0..self.config.queries {
            let probe_id = ProbeId::new(ttl, query);
            let packet =
                build_echo_request(self.identifier, probe_id.to_sequence(), self.config.payload_size);

            // Register BEFORE sending so a fast reply always finds its send time
            state.lock().register_sent(probe_id, Instant::now());

            match sender.send_probe(ttl, &packet, target) {
                Ok(()) => {
                    state.lock().record_sent(ttl);
                    sent += 1;
                    trace!(ttl, query, "Probe sent");
                }
                Err(e) => warn!(error = %e, query, "Probe not sent"),
            }

            if query + 1 < self.config.queries && !self.config.probe_delay.is_zero() {
                tokio::time::sleep(self.config.probe_delay).await;
            }
        }
        sent
    }

    /// Consume reply events until the hop is complete, times out, or is cancelled
    async fn await_replies(
        &self,
        ttl: u8,
        state: &SharedTraceState,
        filter: &ProbeFilter,
        events: &mut mpsc::Receiver<ReplyEvent>,
        cancel: &CancellationToken,
    ) -> AwaitOutcome {
        let deadline = Instant::now() + self.config.timeout;
        let wanted = self.config.queries as usize;

        loop {
            if state.lock().received(ttl) >= wanted {
                return AwaitOutcome::Complete;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return AwaitOutcome::Cancelled,
                event = events.recv() => match event {
                    Some(event) => {
                        let correlation = state.lock().correlate(&event, filter);
                        trace!(
                            ttl = event.probe_id.ttl,
                            query = event.probe_id.query,
                            responder = %event.responder,
                            ?correlation,
                            "Reply event"
                        );
                    }
                    None => return AwaitOutcome::ReceiverGone,
                },
                _ = tokio::time::sleep_until(deadline) => return AwaitOutcome::TimedOut,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::IcmpResponseType;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;

    const ID: u16 = 0x5151;
    const DEST: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 50);

    struct NoDns;

    #[async_trait]
    impl Resolver for NoDns {
        async fn lookup_host(&self, host: &str) -> Result<Vec<IpAddr>, String> {
            Err(format!("unknown host {}", host))
        }

        async fn reverse_lookup(&self, _ip: IpAddr) -> Vec<String> {
            Vec::new()
        }

        async fn txt_lookup(&self, _name: &str) -> Vec<String> {
            Vec::new()
        }
    }

    /// Simulated path: router `i` answers TTL `i + 1`, the destination answers
    /// any TTL at or beyond `dest_ttl`.
    struct FakeNetwork {
        events: mpsc::Sender<ReplyEvent>,
        ttl: u8,
        dest_ttl: u8,
        rtt: Duration,
        silent_ttls: HashSet<u8>,
        dropped: HashSet<ProbeId>,
        slow_ttls: HashMap<u8, Duration>,
        /// TTLs whose replies arrive twice
        duplicated_ttls: HashSet<u8>,
        identifier: u16,
    }

    impl FakeNetwork {
        fn new(dest_ttl: u8) -> (Self, mpsc::Receiver<ReplyEvent>) {
            let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
            let net = Self {
                events: tx,
                ttl: 0,
                dest_ttl,
                rtt: Duration::from_millis(20),
                silent_ttls: HashSet::new(),
                dropped: HashSet::new(),
                slow_ttls: HashMap::new(),
                duplicated_ttls: HashSet::new(),
                identifier: ID,
            };
            (net, rx)
        }

        fn router(ttl: u8) -> Ipv4Addr {
            Ipv4Addr::new(10, 0, 0, ttl)
        }
    }

    impl ProbeSender for FakeNetwork {
        fn set_ttl(&mut self, ttl: u8) -> Result<(), TraceError> {
            self.ttl = ttl;
            Ok(())
        }

        fn send_probe(&mut self, ttl: u8, packet: &[u8], target: Ipv4Addr) -> Result<(), TraceError> {
            assert_eq!(ttl, self.ttl);
            assert_eq!(target, DEST);
            let sequence = u16::from_be_bytes([packet[6], packet[7]]);
            let probe_id = ProbeId::from_sequence(sequence);
            if self.silent_ttls.contains(&ttl) || self.dropped.contains(&probe_id) {
                return Ok(());
            }

            let (responder, response_type) = if ttl >= self.dest_ttl {
                (DEST, IcmpResponseType::EchoReply)
            } else {
                (Self::router(ttl), IcmpResponseType::TimeExceeded)
            };
            let events = self.events.clone();
            let rtt = self.slow_ttls.get(&ttl).copied().unwrap_or(self.rtt);
            let copies = if self.duplicated_ttls.contains(&ttl) { 2 } else { 1 };
            let event = ReplyEvent {
                responder: IpAddr::V4(responder),
                identifier: self.identifier,
                probe_id,
                received_at: Instant::now(),
                response_type,
            };
            tokio::spawn(async move {
                tokio::time::sleep(rtt).await;
                for _ in 0..copies {
                    let event = ReplyEvent {
                        received_at: Instant::now(),
                        ..event.clone()
                    };
                    let _ = events.send(event).await;
                }
            });
            Ok(())
        }
    }

    fn tracer(config: Config) -> Tracer<NoDns> {
        Tracer::with_resolver(config, Arc::new(NoDns))
            .unwrap()
            .with_identifier(ID)
    }

    fn quick_config() -> Config {
        Config {
            max_ttl: 10,
            resolve_names: false,
            ..Config::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_destination() {
        let (net, rx) = FakeNetwork::new(5);
        let mut seen = Vec::new();

        let result = tracer(quick_config())
            .run_with("203.0.113.50", net, rx, CancellationToken::new(), |hop| {
                seen.push(hop.ttl)
            })
            .await
            .unwrap();

        assert_eq!(result.status, TraceStatus::Reached);
        assert_eq!(result.hops.len(), 5);
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);

        let last = result.hops.last().unwrap();
        assert!(last.reached);
        assert_eq!(last.ip, Some(IpAddr::V4(DEST)));
        for (i, hop) in result.hops.iter().enumerate() {
            assert_eq!(hop.ttl as usize, i + 1);
            assert_eq!(hop.rtts.len(), 3);
            assert_eq!(hop.sent, 3);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rtt_matches_reply_delay() {
        let (net, rx) = FakeNetwork::new(4);
        let result = tracer(quick_config())
            .run_with("203.0.113.50", net, rx, CancellationToken::new(), |_| {})
            .await
            .unwrap();

        // Virtual clock: exactly the simulated 20ms per sample
        let hop3 = result.hop(3).unwrap();
        assert_eq!(hop3.rtts[1], Duration::from_millis(20));
        assert!(hop3.rtts.iter().all(|rtt| *rtt == Duration::from_millis(20)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_hop_times_out() {
        let (mut net, rx) = FakeNetwork::new(4);
        net.silent_ttls.insert(2);

        let result = tracer(quick_config())
            .run_with("203.0.113.50", net, rx, CancellationToken::new(), |_| {})
            .await
            .unwrap();

        let hop2 = result.hop(2).unwrap();
        assert!(hop2.timeout);
        assert!(hop2.rtts.is_empty());
        assert_eq!(hop2.ip, None);
        assert_eq!(hop2.loss_pct(), 100.0);
        assert_eq!(result.hops.len(), 4);
        assert_eq!(result.status, TraceStatus::Reached);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_replies_keep_hop() {
        let (mut net, rx) = FakeNetwork::new(5);
        net.dropped.insert(ProbeId::new(3, 0));
        net.dropped.insert(ProbeId::new(3, 2));

        let result = tracer(quick_config())
            .run_with("203.0.113.50", net, rx, CancellationToken::new(), |_| {})
            .await
            .unwrap();

        let hop3 = result.hop(3).unwrap();
        assert_eq!(hop3.rtts.len(), 1);
        assert!(!hop3.timeout);
        assert_eq!(hop3.ip, Some(IpAddr::V4(FakeNetwork::router(3))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_reply_for_finalized_hop_dropped() {
        let (mut net, rx) = FakeNetwork::new(4);
        // Hop 2 answers only while silent hop 3 is waiting
        net.slow_ttls.insert(2, Duration::from_secs(3));
        net.silent_ttls.insert(3);

        let result = tracer(quick_config())
            .run_with("203.0.113.50", net, rx, CancellationToken::new(), |_| {})
            .await
            .unwrap();

        let hop2 = result.hop(2).unwrap();
        assert!(hop2.timeout);
        assert_eq!(hop2.ip, None);

        let hop3 = result.hop(3).unwrap();
        assert!(hop3.rtts.is_empty());
        assert_eq!(hop3.ip, None);
        assert_eq!(result.status, TraceStatus::Reached);
        assert_eq!(result.hops.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicated_replies_do_not_complete_hop() {
        let (mut net, rx) = FakeNetwork::new(5);
        net.duplicated_ttls.insert(3);
        net.dropped.insert(ProbeId::new(3, 1));

        let result = tracer(quick_config())
            .run_with("203.0.113.50", net, rx, CancellationToken::new(), |_| {})
            .await
            .unwrap();

        let hop3 = result.hop(3).unwrap();
        assert_eq!(hop3.rtts.len(), 2);
        assert_eq!(hop3.sent, 3);
        assert_eq!(result.hop(4).unwrap().rtts.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreign_identifier_ignored() {
        let (mut net, rx) = FakeNetwork::new(3);
        net.identifier = ID ^ 0xFFFF;

        let result = tracer(Config {
            max_ttl: 3,
            ..quick_config()
        })
        .run_with("203.0.113.50", net, rx, CancellationToken::new(), |_| {})
        .await
        .unwrap();

        assert_eq!(result.status, TraceStatus::MaxTtlExceeded);
        assert_eq!(result.hops.len(), 3);
        assert!(result.hops.iter().all(|h| h.timeout && h.ip.is_none()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_second_hop() {
        let (net, rx) = FakeNetwork::new(10);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let mut seen = Vec::new();

        let result = tracer(quick_config())
            .run_with("203.0.113.50", net, rx, cancel, |hop| {
                seen.push(hop.ttl);
                if hop.ttl == 2 {
                    trigger.cancel();
                }
            })
            .await
            .unwrap();

        assert_eq!(result.status, TraceStatus::Cancelled);
        assert_eq!(seen, vec![1, 2]);
        assert_eq!(result.hops.len(), 2);
        assert!(result.hops.iter().all(|h| h.rtts.len() == 3 && !h.timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_waiting_discards_open_hop() {
        let (mut net, rx) = FakeNetwork::new(10);
        net.silent_ttls.insert(3);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        let result = tracer(quick_config())
            .run_with("203.0.113.50", net, rx, cancel, |_| {})
            .await
            .unwrap();

        assert_eq!(result.status, TraceStatus::Cancelled);
        assert_eq!(result.hops.len(), 2);
        assert!(result.duration < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_receiver_gone_stops_trace() {
        let (net, rx) = FakeNetwork::new(10);
        drop(net);

        struct BlackHole;
        impl ProbeSender for BlackHole {
            fn set_ttl(&mut self, _ttl: u8) -> Result<(), TraceError> {
                Ok(())
            }
            fn send_probe(&mut self, _: u8, _: &[u8], _: Ipv4Addr) -> Result<(), TraceError> {
                Ok(())
            }
        }

        let result = tracer(quick_config())
            .run_with("203.0.113.50", BlackHole, rx, CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(result.status, TraceStatus::ReceiverStopped);
        assert_eq!(result.hops.len(), 1);
        assert!(result.hops[0].timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_sends_degrade_hop() {
        struct Unroutable;
        impl ProbeSender for Unroutable {
            fn set_ttl(&mut self, _ttl: u8) -> Result<(), TraceError> {
                Ok(())
            }
            fn send_probe(&mut self, ttl: u8, _: &[u8], _: Ipv4Addr) -> Result<(), TraceError> {
                Err(TraceError::Send {
                    ttl,
                    source: std::io::Error::from(std::io::ErrorKind::NetworkUnreachable),
                })
            }
        }

        let (_tx, rx) = mpsc::channel(1);
        let start = Instant::now();
        let result = tracer(Config {
            max_ttl: 2,
            ..quick_config()
        })
        .run_with("203.0.113.50", Unroutable, rx, CancellationToken::new(), |_| {})
        .await
        .unwrap();

        assert_eq!(result.hops.len(), 2);
        assert!(result.hops.iter().all(|h| h.timeout && h.sent == 0));
        // Nothing in flight, so no per-hop wait
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    /// Answers a different address on every lookup, like round-robin DNS
    struct RoundRobinDns {
        lookups: std::sync::atomic::AtomicU8,
    }

    #[async_trait]
    impl Resolver for RoundRobinDns {
        async fn lookup_host(&self, _host: &str) -> Result<Vec<IpAddr>, String> {
            let n = self.lookups.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if n == 0 {
                Ok(vec![IpAddr::V4(DEST)])
            } else {
                Ok(vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, n))])
            }
        }

        async fn reverse_lookup(&self, _ip: IpAddr) -> Vec<String> {
            Vec::new()
        }

        async fn txt_lookup(&self, _name: &str) -> Vec<String> {
            Vec::new()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolved_target_traced_without_second_lookup() {
        let dns = Arc::new(RoundRobinDns {
            lookups: std::sync::atomic::AtomicU8::new(0),
        });
        let tracer = Tracer::with_resolver(quick_config(), Arc::clone(&dns))
            .unwrap()
            .with_identifier(ID);

        let target = tracer.resolve("rr.example").await.unwrap();
        assert_eq!(target.resolved, IpAddr::V4(DEST));

        let (net, rx) = FakeNetwork::new(2);
        let result = tracer
            .run_resolved_with(target.clone(), net, rx, CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(dns.lookups.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(result.target, target);
        assert_eq!(result.status, TraceStatus::Reached);
    }

    #[tokio::test]
    async fn test_unresolvable_target_is_fatal() {
        let (net, rx) = FakeNetwork::new(3);
        let err = tracer(quick_config())
            .run_with("no-such-host.invalid", net, rx, CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, TraceError::Resolve { .. }));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = Tracer::with_resolver(
            Config {
                queries: 0,
                ..Config::default()
            },
            Arc::new(NoDns),
        )
        .err()
        .unwrap();
        assert!(matches!(err, TraceError::InvalidConfig(_)));
    }
}
