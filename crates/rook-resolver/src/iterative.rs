//! Iterative resolution from the root servers.
//!
//! Each resolution walks the delegation chain one hop at a time:
//!
//! 1. Query the current candidate servers in order until one answers.
//! 2. An authoritative reply ends the walk with its answers and rcode.
//! 3. A reply with an empty authority section ends the walk with NXDOMAIN.
//! 4. Otherwise the NS names in the authority section become the next hop,
//!    addressed through glue in the additional section or, failing that,
//!    through nested lookups that start again from the root.
//!
//! The walk is capped at `max_iterations` hops. Running out of hops yields
//! an inconclusive NOERROR with no answers.

use crate::transport::validate_response;
use crate::{
    ResolutionBudget, Resolver, ResolverConfig, ResolverError, Result, RootHints, Transport,
    UdpTransport,
};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use rook_proto::{Header, Message, Name, Question, ResourceRecord, ResponseCode};
use std::net::{IpAddr, SocketAddr};
use tracing::{debug, instrument, trace, warn};

/// Iterative resolver.
///
/// Holds no per-query state; every call to [`Resolver::resolve`] owns its
/// candidate sets and budget, so one instance may serve any number of
/// concurrent queries.
pub struct IterativeResolver<T = UdpTransport> {
    config: ResolverConfig,
    hints: RootHints,
    transport: T,
}

impl IterativeResolver<UdpTransport> {
    /// Creates a resolver speaking plain UDP.
    pub fn with_udp(config: ResolverConfig, hints: RootHints) -> Self {
        let transport = UdpTransport::new(config.query_timeout);
        Self::new(config, hints, transport)
    }
}

impl<T: Transport> IterativeResolver<T> {
    /// Creates a resolver over the given transport.
    pub fn new(config: ResolverConfig, hints: RootHints, transport: T) -> Self {
        Self {
            config,
            hints,
            transport,
        }
    }

    /// Returns the resolver configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Returns the root hints every walk starts from.
    pub fn hints(&self) -> &RootHints {
        &self.hints
    }

    /// Resolves `question` from the root with a fresh budget.
    #[instrument(skip_all, fields(qname = %question.qname, qtype = %question.qtype))]
    pub async fn resolve_from_root(&self, question: &Question) -> Result<Message> {
        let budget = ResolutionBudget::new(&self.config);
        let result = self.resolve_with_budget(question, &budget).await;

        match &result {
            Ok(msg) => debug!(
                rcode = %msg.rcode(),
                answers = msg.answers().len(),
                exchanges = budget.spent(),
                "Resolution complete"
            ),
            Err(e) => debug!(error = %e, exchanges = budget.spent(), "Resolution failed"),
        }

        result
    }

    /// One walk from the root, charged against `budget`.
    ///
    /// Boxed so that nested nameserver lookups can re-enter it.
    fn resolve_with_budget<'a>(
        &'a self,
        question: &'a Question,
        budget: &'a ResolutionBudget,
    ) -> BoxFuture<'a, Result<Message>> {
        async move {
            let mut servers: Vec<IpAddr> = self.hints.addrs().to_vec();

            for iteration in 1..=self.config.max_iterations {
                let response = self.exchange_with_any(&servers, question, budget).await?;

                trace!(
                    iteration,
                    depth = budget.depth(),
                    aa = response.is_authoritative(),
                    rcode = %response.rcode(),
                    "Processing reply"
                );

                if response.is_authoritative() {
                    return Ok(outcome(
                        question,
                        response.rcode(),
                        response.answers().iter().cloned(),
                    ));
                }

                if response.authority().is_empty() {
                    debug!(iteration, "Empty authority section, name does not exist");
                    return Ok(outcome(question, ResponseCode::NXDomain, Vec::new()));
                }

                let nameservers: Vec<Name> = response.referral_nameservers().cloned().collect();
                let mut next = glue_addresses(&response, &nameservers);

                if next.is_empty() {
                    trace!(count = nameservers.len(), "Referral without glue");
                    next = self.resolve_nameservers(&nameservers, budget).await;
                }

                debug!(
                    iteration,
                    nameservers = nameservers.len(),
                    candidates = next.len(),
                    "Following referral"
                );
                servers = next;
            }

            debug!(
                max = self.config.max_iterations,
                "Iteration limit reached without an answer"
            );
            Ok(outcome(question, ResponseCode::NoError, Vec::new()))
        }
        .boxed()
    }

    /// Sends `question` to each candidate in turn and returns the first
    /// reply that matches the query sent.
    async fn exchange_with_any(
        &self,
        servers: &[IpAddr],
        question: &Question,
        budget: &ResolutionBudget,
    ) -> Result<Message> {
        for &ip in servers {
            budget.charge()?;

            let server = SocketAddr::new(ip, self.config.upstream_port);
            let query = Message::query(question.clone());
            trace!(server = %server, id = query.id(), "Sending query");

            let result = self
                .transport
                .exchange(server, &query)
                .await
                .and_then(|response| validate_response(&query, &response).map(|()| response));

            match result {
                Ok(response) => return Ok(response),
                Err(e) => debug!(server = %server, error = %e, "Server query failed"),
            }
        }

        Err(ResolverError::NoReachableServer {
            attempted: servers.len(),
        })
    }

    /// Looks up the A records of every nameserver, each in a nested walk
    /// from the root, and collects the addresses in order.
    async fn resolve_nameservers(
        &self,
        nameservers: &[Name],
        budget: &ResolutionBudget,
    ) -> Vec<IpAddr> {
        let mut addrs = Vec::new();

        let child = match budget.child() {
            Ok(child) => child,
            Err(e) => {
                warn!(depth = budget.depth(), error = %e, "Not resolving nameserver addresses");
                return addrs;
            }
        };

        for ns in nameservers {
            let question = Question::a(ns.clone());
            match self.resolve_with_budget(&question, &child).await {
                Ok(response) => {
                    for addr in response.a_records() {
                        push_unique(&mut addrs, IpAddr::V4(addr));
                    }
                }
                Err(e) => debug!(ns = %ns, error = %e, "Nameserver lookup failed"),
            }
        }

        addrs
    }
}

#[async_trait]
impl<T: Transport> Resolver for IterativeResolver<T> {
    async fn resolve(&self, question: &Question) -> Result<Message> {
        self.resolve_from_root(question).await
    }
}

/// Collects glue addresses for `nameservers` from the additional section.
fn glue_addresses(response: &Message, nameservers: &[Name]) -> Vec<IpAddr> {
    let mut addrs = Vec::new();
    for ns in nameservers {
        for addr in response.glue_for(ns) {
            push_unique(&mut addrs, IpAddr::V4(addr));
        }
    }
    addrs
}

fn push_unique(addrs: &mut Vec<IpAddr>, addr: IpAddr) {
    if !addrs.contains(&addr) {
        addrs.push(addr);
    }
}

/// Builds the result of a walk. The ID is left at zero for the caller to
/// replace.
fn outcome(
    question: &Question,
    rcode: ResponseCode,
    answers: impl IntoIterator<Item = ResourceRecord>,
) -> Message {
    let mut msg = Message::new(Header::new(0));
    msg.header_mut().set_response(true);
    msg.header_mut().set_recursion_available(true);
    msg.set_rcode(rcode);
    msg.add_question(question.clone());
    msg.add_answers(answers);
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::Ipv4Addr;
    use std::str::FromStr;
    use std::sync::Mutex;

    const ROOT: Ipv4Addr = Ipv4Addr::new(198, 41, 0, 4);
    const NS1: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 1);
    const NS2: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 2);
    const TARGET: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 10);

    type Handler = Box<dyn Fn(&Message) -> Option<Message> + Send + Sync>;

    /// Canned upstream servers keyed by address. Unknown addresses refuse
    /// the connection; a handler returning `None` times out.
    #[derive(Default)]
    struct MockTransport {
        servers: HashMap<IpAddr, Handler>,
        calls: Mutex<Vec<(SocketAddr, Message)>>,
    }

    impl MockTransport {
        fn serve(
            mut self,
            ip: Ipv4Addr,
            handler: impl Fn(&Message) -> Option<Message> + Send + Sync + 'static,
        ) -> Self {
            self.servers.insert(IpAddr::V4(ip), Box::new(handler));
            self
        }

        fn servers_called(&self) -> Vec<IpAddr> {
            self.calls.lock().unwrap().iter().map(|(s, _)| s.ip()).collect()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn exchange(&self, server: SocketAddr, query: &Message) -> Result<Message> {
            self.calls.lock().unwrap().push((server, query.clone()));
            match self.servers.get(&server.ip()) {
                Some(handler) => handler(query).ok_or(ResolverError::Timeout),
                None => Err(ResolverError::Network(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                ))),
            }
        }
    }

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    fn qname(query: &Message) -> Name {
        query.question().unwrap().qname.clone()
    }

    fn authoritative(query: &Message, addr: Ipv4Addr) -> Message {
        let mut response = Message::response_from(query);
        response.header_mut().set_authoritative(true);
        response.add_answer(ResourceRecord::a(qname(query), 300, addr));
        response
    }

    fn referral(query: &Message, ns: &str, glue: Option<Ipv4Addr>) -> Message {
        let mut response = Message::response_from(query);
        response.add_authority(ResourceRecord::ns(name("example."), 172_800, name(ns)));
        if let Some(addr) = glue {
            response.add_additional(ResourceRecord::a(name(ns), 172_800, addr));
        }
        response
    }

    fn resolver(transport: MockTransport) -> IterativeResolver<MockTransport> {
        resolver_with(ResolverConfig::default(), &[ROOT], transport)
    }

    fn resolver_with(
        config: ResolverConfig,
        hints: &[Ipv4Addr],
        transport: MockTransport,
    ) -> IterativeResolver<MockTransport> {
        let hints = RootHints::from_addrs(hints.iter().copied().map(IpAddr::V4));
        IterativeResolver::new(config, hints, transport)
    }

    fn target_question() -> Question {
        Question::a(name("www.example."))
    }

    #[tokio::test]
    async fn test_authoritative_answer_from_root() {
        let transport = MockTransport::default()
            .serve(ROOT, |q| Some(authoritative(q, Ipv4Addr::new(93, 184, 216, 34))));
        let resolver = resolver(transport);

        let response = resolver.resolve(&target_question()).await.unwrap();
        assert_eq!(response.rcode(), ResponseCode::NoError);
        assert!(response.is_response());
        assert_eq!(
            response.a_records().collect::<Vec<_>>(),
            vec![Ipv4Addr::new(93, 184, 216, 34)]
        );
        assert_eq!(response.question(), Some(&target_question()));
    }

    #[tokio::test]
    async fn test_outbound_queries_are_iterative() {
        let transport = MockTransport::default().serve(ROOT, |q| Some(authoritative(q, TARGET)));
        let resolver = resolver(transport);
        resolver.resolve(&target_question()).await.unwrap();

        let calls = resolver.transport.calls.lock().unwrap();
        let (server, query) = &calls[0];
        assert_eq!(server.port(), 53);
        assert!(!query.header().recursion_desired());
        assert!(query.is_query());
        assert_eq!(query.questions(), &[target_question()]);
    }

    #[tokio::test]
    async fn test_referral_with_glue() {
        let transport = MockTransport::default()
            .serve(ROOT, |q| Some(referral(q, "ns1.example.", Some(NS1))))
            .serve(NS1, |q| Some(authoritative(q, TARGET)));
        let resolver = resolver(transport);

        let response = resolver.resolve(&target_question()).await.unwrap();
        assert_eq!(response.a_records().collect::<Vec<_>>(), vec![TARGET]);
        assert_eq!(
            resolver.transport.servers_called(),
            vec![IpAddr::V4(ROOT), IpAddr::V4(NS1)]
        );
    }

    #[tokio::test]
    async fn test_glue_matched_case_insensitively() {
        let transport = MockTransport::default()
            .serve(ROOT, |q| {
                let mut response = Message::response_from(q);
                response.add_authority(ResourceRecord::ns(
                    name("example."),
                    3600,
                    name("NS1.Example."),
                ));
                response.add_additional(ResourceRecord::a(name("ns1.example."), 3600, NS1));
                Some(response)
            })
            .serve(NS1, |q| Some(authoritative(q, TARGET)));
        let resolver = resolver(transport);

        let response = resolver.resolve(&target_question()).await.unwrap();
        assert_eq!(response.a_records().collect::<Vec<_>>(), vec![TARGET]);
    }

    #[tokio::test]
    async fn test_referral_without_glue_resolves_nameserver() {
        let transport = MockTransport::default()
            .serve(ROOT, |q| {
                if qname(q) == name("ns1.example.") {
                    Some(authoritative(q, NS1))
                } else {
                    Some(referral(q, "ns1.example.", None))
                }
            })
            .serve(NS1, |q| Some(authoritative(q, TARGET)));
        let resolver = resolver(transport);

        let response = resolver.resolve(&target_question()).await.unwrap();
        assert_eq!(response.a_records().collect::<Vec<_>>(), vec![TARGET]);
        assert_eq!(
            resolver.transport.servers_called(),
            vec![IpAddr::V4(ROOT), IpAddr::V4(ROOT), IpAddr::V4(NS1)]
        );
    }

    #[tokio::test]
    async fn test_nested_lookups_accumulate_and_tolerate_failure() {
        let transport = MockTransport::default()
            .serve(ROOT, |q| {
                let qname = qname(q);
                if qname == name("ns1.example.") {
                    // Dead end for the first nameserver.
                    Some(Message::response_from(q))
                } else if qname == name("ns2.example.") {
                    Some(authoritative(q, NS2))
                } else {
                    let mut response = referral(q, "ns1.example.", None);
                    response.add_authority(ResourceRecord::ns(
                        name("example."),
                        3600,
                        name("ns2.example."),
                    ));
                    Some(response)
                }
            })
            .serve(NS2, |q| Some(authoritative(q, TARGET)));
        let resolver = resolver(transport);

        let response = resolver.resolve(&target_question()).await.unwrap();
        assert_eq!(response.a_records().collect::<Vec<_>>(), vec![TARGET]);
    }

    #[tokio::test]
    async fn test_empty_authority_is_name_error() {
        let transport = MockTransport::default()
            .serve(ROOT, |q| Some(referral(q, "ns1.example.", Some(NS1))))
            .serve(NS1, |q| Some(Message::response_from(q)));
        let resolver = resolver(transport);

        let response = resolver.resolve(&target_question()).await.unwrap();
        assert_eq!(response.rcode(), ResponseCode::NXDomain);
        assert!(response.answers().is_empty());
    }

    #[tokio::test]
    async fn test_authoritative_rcode_propagates() {
        let transport = MockTransport::default().serve(ROOT, |q| {
            let mut response = Message::response_from(q);
            response.header_mut().set_authoritative(true);
            response.set_rcode(ResponseCode::Refused);
            Some(response)
        });
        let resolver = resolver(transport);

        let response = resolver.resolve(&target_question()).await.unwrap();
        assert_eq!(response.rcode(), ResponseCode::Refused);
    }

    #[tokio::test]
    async fn test_iteration_limit_is_inconclusive() {
        // Every server refers to itself.
        let transport =
            MockTransport::default().serve(ROOT, |q| Some(referral(q, "ns1.example.", Some(ROOT))));
        let resolver = resolver(transport);

        let response = resolver.resolve(&target_question()).await.unwrap();
        assert_eq!(response.rcode(), ResponseCode::NoError);
        assert!(response.answers().is_empty());
        assert_eq!(resolver.transport.servers_called().len(), 3);
    }

    #[tokio::test]
    async fn test_max_iterations_configurable() {
        let transport =
            MockTransport::default().serve(ROOT, |q| Some(referral(q, "ns1.example.", Some(ROOT))));
        let config = ResolverConfig {
            max_iterations: 5,
            ..Default::default()
        };
        let resolver = resolver_with(config, &[ROOT], transport);

        resolver.resolve(&target_question()).await.unwrap();
        assert_eq!(resolver.transport.servers_called().len(), 5);
    }

    #[tokio::test]
    async fn test_no_reachable_server() {
        let resolver = resolver_with(
            ResolverConfig::default(),
            &[ROOT, NS1],
            MockTransport::default(),
        );

        let result = resolver.resolve(&target_question()).await;
        assert!(matches!(
            result,
            Err(ResolverError::NoReachableServer { attempted: 2 })
        ));
    }

    #[tokio::test]
    async fn test_failover_to_next_candidate() {
        let transport = MockTransport::default()
            .serve(NS1, |_| None)
            .serve(ROOT, |q| Some(authoritative(q, TARGET)));
        let resolver = resolver_with(ResolverConfig::default(), &[NS2, NS1, ROOT], transport);

        let response = resolver.resolve(&target_question()).await.unwrap();
        assert_eq!(response.a_records().collect::<Vec<_>>(), vec![TARGET]);
        assert_eq!(
            resolver.transport.servers_called(),
            vec![IpAddr::V4(NS2), IpAddr::V4(NS1), IpAddr::V4(ROOT)]
        );
    }

    #[tokio::test]
    async fn test_mismatched_reply_is_failed_attempt() {
        let transport = MockTransport::default()
            .serve(NS1, |q| {
                let mut response = authoritative(q, Ipv4Addr::new(203, 0, 113, 66));
                response.set_id(q.id().wrapping_add(1));
                Some(response)
            })
            .serve(ROOT, |q| Some(authoritative(q, TARGET)));
        let resolver = resolver_with(ResolverConfig::default(), &[NS1, ROOT], transport);

        let response = resolver.resolve(&target_question()).await.unwrap();
        assert_eq!(response.a_records().collect::<Vec<_>>(), vec![TARGET]);
    }

    #[tokio::test]
    async fn test_referral_without_addresses_is_unreachable() {
        let transport = MockTransport::default().serve(ROOT, |q| {
            if qname(q) == name("ns1.example.") {
                Some(Message::response_from(q))
            } else {
                Some(referral(q, "ns1.example.", None))
            }
        });
        let resolver = resolver(transport);

        let result = resolver.resolve(&target_question()).await;
        assert!(matches!(
            result,
            Err(ResolverError::NoReachableServer { attempted: 0 })
        ));
    }

    #[tokio::test]
    async fn test_depth_limit_stops_nested_lookups() {
        let transport =
            MockTransport::default().serve(ROOT, |q| Some(referral(q, "ns1.example.", None)));
        let config = ResolverConfig {
            max_depth: 0,
            ..Default::default()
        };
        let resolver = resolver_with(config, &[ROOT], transport);

        let result = resolver.resolve(&target_question()).await;
        assert!(matches!(
            result,
            Err(ResolverError::NoReachableServer { attempted: 0 })
        ));
        assert_eq!(resolver.transport.servers_called().len(), 1);
    }

    #[tokio::test]
    async fn test_self_referential_nameserver_terminates() {
        // ns1.example. can only be found through ns1.example.
        let transport =
            MockTransport::default().serve(ROOT, |q| Some(referral(q, "ns1.example.", None)));
        let resolver = resolver(transport);

        let result = resolver.resolve(&target_question()).await;
        assert!(result.is_err());
        let calls = resolver.transport.servers_called().len();
        assert!(calls <= ResolverConfig::default().max_exchanges as usize);
    }

    #[tokio::test]
    async fn test_exchange_budget_exhausted() {
        let transport = MockTransport::default()
            .serve(ROOT, |q| Some(referral(q, "ns1.example.", Some(NS1))))
            .serve(NS1, |q| Some(authoritative(q, TARGET)));
        let config = ResolverConfig {
            max_exchanges: 1,
            ..Default::default()
        };
        let resolver = resolver_with(config, &[ROOT], transport);

        let result = resolver.resolve(&target_question()).await;
        assert!(matches!(result, Err(ResolverError::BudgetExhausted(1))));
        assert_eq!(resolver.transport.servers_called().len(), 1);
    }

    /// Builds a reply the way real servers do, with every name after the
    /// question compressed. `query` must ask for `www.example.`.
    fn compressed_reply(query: &[u8], referral: bool) -> Vec<u8> {
        // Question name at 12, "example." at 16; the record section starts
        // at 29.
        let (flags, an, ns, ar) = if referral {
            (0x80, 0, 1, 1)
        } else {
            (0x84, 1, 0, 0)
        };
        let mut wire = vec![query[0], query[1], flags, 0x00, 0, 1, 0, an, 0, ns, 0, ar];
        wire.extend_from_slice(&query[12..29]);

        if referral {
            // example. NS ns1.example., RDATA at 41.
            wire.extend_from_slice(&[0xC0, 0x10, 0, 2, 0, 1, 0, 0, 0x0E, 0x10, 0, 6]);
            wire.extend_from_slice(b"\x03ns1\xC0\x10");
            // ns1.example. A 127.0.0.1, owner pointing into the NS RDATA.
            wire.extend_from_slice(&[0xC0, 0x29, 0, 1, 0, 1, 0, 0, 0x0E, 0x10, 0, 4]);
            wire.extend_from_slice(&[127, 0, 0, 1]);
        } else {
            wire.extend_from_slice(&[0xC0, 0x0C, 0, 1, 0, 1, 0, 0, 0x0E, 0x10, 0, 4]);
            wire.extend_from_slice(&TARGET.octets());
        }
        wire
    }

    #[tokio::test]
    async fn test_compressed_upstream_replies() {
        let upstream = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = upstream.local_addr().unwrap().port();

        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            for referral in [true, false] {
                let (len, peer) = upstream.recv_from(&mut buf).await.unwrap();
                let reply = compressed_reply(&buf[..len], referral);
                upstream.send_to(&reply, peer).await.unwrap();
            }
        });

        let config = ResolverConfig {
            upstream_port: port,
            query_timeout: std::time::Duration::from_secs(2),
            ..Default::default()
        };
        let hints = RootHints::from_addrs([IpAddr::V4(Ipv4Addr::LOCALHOST)]);
        let resolver = IterativeResolver::with_udp(config, hints);

        let response = resolver.resolve(&target_question()).await.unwrap();
        assert_eq!(response.rcode(), ResponseCode::NoError);
        assert_eq!(response.answers()[0].name(), &name("www.example."));
        assert_eq!(response.a_records().collect::<Vec<_>>(), vec![TARGET]);
    }
}
