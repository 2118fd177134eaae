//! Root server hints.

use std::net::{IpAddr, Ipv4Addr};

/// A root server entry.
#[derive(Debug, Clone, Copy)]
pub struct RootServer {
    /// Hostname of the root server.
    pub name: &'static str,
    /// IPv4 address.
    pub ipv4: Ipv4Addr,
}

/// IANA root servers, the universal starting point for iteration.
pub static ROOT_SERVERS: [RootServer; 13] = [
    RootServer {
        name: "a.root-servers.net",
        ipv4: Ipv4Addr::new(198, 41, 0, 4),
    },
    RootServer {
        name: "b.root-servers.net",
        ipv4: Ipv4Addr::new(199, 9, 14, 201),
    },
    RootServer {
        name: "c.root-servers.net",
        ipv4: Ipv4Addr::new(192, 33, 4, 12),
    },
    RootServer {
        name: "d.root-servers.net",
        ipv4: Ipv4Addr::new(199, 7, 91, 13),
    },
    RootServer {
        name: "e.root-servers.net",
        ipv4: Ipv4Addr::new(192, 203, 230, 10),
    },
    RootServer {
        name: "f.root-servers.net",
        ipv4: Ipv4Addr::new(192, 5, 5, 241),
    },
    RootServer {
        name: "g.root-servers.net",
        ipv4: Ipv4Addr::new(192, 112, 36, 4),
    },
    RootServer {
        name: "h.root-servers.net",
        ipv4: Ipv4Addr::new(198, 97, 190, 53),
    },
    RootServer {
        name: "i.root-servers.net",
        ipv4: Ipv4Addr::new(192, 36, 148, 17),
    },
    RootServer {
        name: "j.root-servers.net",
        ipv4: Ipv4Addr::new(192, 58, 128, 30),
    },
    RootServer {
        name: "k.root-servers.net",
        ipv4: Ipv4Addr::new(193, 0, 14, 129),
    },
    RootServer {
        name: "l.root-servers.net",
        ipv4: Ipv4Addr::new(199, 7, 83, 42),
    },
    RootServer {
        name: "m.root-servers.net",
        ipv4: Ipv4Addr::new(202, 12, 27, 33),
    },
];

/// The ordered set of root addresses a resolution starts from.
///
/// Built once at startup and handed to the resolver; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootHints {
    addrs: Vec<IpAddr>,
}

impl RootHints {
    /// Returns the 13 built-in root server addresses.
    pub fn from_builtin() -> Self {
        Self {
            addrs: ROOT_SERVERS.iter().map(|s| IpAddr::V4(s.ipv4)).collect(),
        }
    }

    /// Uses the given addresses instead of the built-in list.
    ///
    /// An empty list falls back to the built-in roots.
    pub fn from_addrs(addrs: impl IntoIterator<Item = IpAddr>) -> Self {
        let addrs: Vec<IpAddr> = addrs.into_iter().collect();
        if addrs.is_empty() {
            return Self::from_builtin();
        }
        Self { addrs }
    }

    /// Returns the addresses in try order.
    pub fn addrs(&self) -> &[IpAddr] {
        &self.addrs
    }
}

impl Default for RootHints {
    fn default() -> Self {
        Self::from_builtin()
    }
}
