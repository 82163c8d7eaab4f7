//! Entity and graph builders shared by the unit tests.

use attackgraph_core::{
    EntitySet, Exploit, Host, NetworkEdge, Privilege, PrivilegeLevel, Service, Vulnerability,
};

use crate::graph::{build, AttackGraph};

pub fn host(id: &str) -> Host {
    Host {
        id: id.to_string(),
        label: String::new(),
        ip: None,
        zone: None,
        os: None,
        description: None,
    }
}

pub fn privilege(id: &str) -> Privilege {
    Privilege {
        id: id.to_string(),
        label: String::new(),
        level: PrivilegeLevel::User,
        host: None,
    }
}

pub fn vuln(id: &str, severity: f64, affected_host: &str) -> Vulnerability {
    Vulnerability {
        id: id.to_string(),
        label: String::new(),
        severity,
        cve: None,
        description: None,
        affected_host: affected_host.to_string(),
    }
}

pub fn service(id: &str, host: &str) -> Service {
    Service {
        id: id.to_string(),
        label: String::new(),
        host: host.to_string(),
        port: Some(80),
        protocol: "tcp".to_string(),
    }
}

pub fn exploit(id: &str, precondition: &str, postcondition: &str) -> Exploit {
    Exploit {
        id: id.to_string(),
        label: String::new(),
        vulnerability: None,
        precondition: precondition.to_string(),
        postcondition: postcondition.to_string(),
    }
}

pub fn network(from: &str, to: &str) -> NetworkEdge {
    NetworkEdge {
        from: from.to_string(),
        to: to.to_string(),
        label: None,
    }
}

/// A plain digraph: every name becomes a host (in order of first
/// appearance) and every pair a network edge.
pub fn digraph(edges: &[(&str, &str)]) -> AttackGraph {
    digraph_with_nodes(&[], edges)
}

/// Like [`digraph`], with extra isolated or pre-ordered hosts first.
pub fn digraph_with_nodes(nodes: &[&str], edges: &[(&str, &str)]) -> AttackGraph {
    fn add(set: &mut EntitySet, id: &str) {
        if !set.hosts.iter().any(|h| h.id == id) {
            set.hosts.push(host(id));
        }
    }

    let mut set = EntitySet::default();
    for id in nodes {
        add(&mut set, id);
    }
    for (from, to) in edges {
        add(&mut set, from);
        add(&mut set, to);
        set.network_edges.push(network(from, to));
    }
    build(&set).unwrap()
}

/// Hosts `attacker`, `web`, `db`; `attacker → web`; exploit `web_rce`
/// (`attacker → priv_web`) and exploit `pivot` (`priv_web → priv_db`).
pub fn scenario() -> EntitySet {
    EntitySet {
        hosts: vec![host("attacker"), host("web"), host("db")],
        vulnerabilities: Vec::new(),
        privileges: vec![privilege("priv_web"), privilege("priv_db")],
        services: Vec::new(),
        exploits: vec![
            exploit("web_rce", "attacker", "priv_web"),
            exploit("pivot", "priv_web", "priv_db"),
        ],
        network_edges: vec![network("attacker", "web")],
    }
}
