//! Entity model for attack graphs.
//!
//! These records are what a configuration document describes: hosts,
//! vulnerabilities, privileges, services, exploits and the network edges
//! between hosts. They carry no behavior beyond accessors; the graph builder
//! turns them into nodes and edges.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Node Kinds ────────────────────────────────────────────────────

/// The kind tag carried by every graph node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Host,
    Vulnerability,
    Privilege,
    Service,
    Exploit,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Host => "host",
            NodeKind::Vulnerability => "vulnerability",
            NodeKind::Privilege => "privilege",
            NodeKind::Service => "service",
            NodeKind::Exploit => "exploit",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Privilege level held by an attacker, ordered from least to most powerful.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeLevel {
    None,
    #[default]
    User,
    Elevated,
    Admin,
    Root,
}

impl fmt::Display for PrivilegeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivilegeLevel::None => write!(f, "none"),
            PrivilegeLevel::User => write!(f, "user"),
            PrivilegeLevel::Elevated => write!(f, "elevated"),
            PrivilegeLevel::Admin => write!(f, "admin"),
            PrivilegeLevel::Root => write!(f, "root"),
        }
    }
}

// ── Entities ──────────────────────────────────────────────────────

/// A machine in the modelled environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Host {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A weakness present on a host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vulnerability {
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// Severity on the CVSS scale (0.0–10.0).
    #[serde(alias = "cvss_score", alias = "cvss")]
    pub severity: f64,
    #[serde(default)]
    pub cve: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Host id this vulnerability lives on.
    pub affected_host: String,
}

/// An attacker state: a privilege level, optionally scoped to a host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Privilege {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub level: PrivilegeLevel,
    #[serde(default)]
    pub host: Option<String>,
}

/// A network service listening on a host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

/// An attack step that moves the attacker from one state to another.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exploit {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub vulnerability: Option<String>,
    /// Node the attacker must hold before using the exploit.
    pub precondition: String,
    /// Node the attacker holds afterwards.
    pub postcondition: String,
}

/// Directed reachability between two hosts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkEdge {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: Option<String>,
}

fn default_protocol() -> String {
    "tcp".to_string()
}

/// Enum wrapper for every entity that becomes a graph node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entity {
    Host(Host),
    Vulnerability(Vulnerability),
    Privilege(Privilege),
    Service(Service),
    Exploit(Exploit),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::Host(e) => &e.id,
            Entity::Vulnerability(e) => &e.id,
            Entity::Privilege(e) => &e.id,
            Entity::Service(e) => &e.id,
            Entity::Exploit(e) => &e.id,
        }
    }

    /// Display label; falls back to the id when the record has none.
    pub fn label(&self) -> &str {
        let label = match self {
            Entity::Host(e) => &e.label,
            Entity::Vulnerability(e) => &e.label,
            Entity::Privilege(e) => &e.label,
            Entity::Service(e) => &e.label,
            Entity::Exploit(e) => &e.label,
        };
        if label.is_empty() {
            self.id()
        } else {
            label
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Entity::Host(_) => NodeKind::Host,
            Entity::Vulnerability(_) => NodeKind::Vulnerability,
            Entity::Privilege(_) => NodeKind::Privilege,
            Entity::Service(_) => NodeKind::Service,
            Entity::Exploit(_) => NodeKind::Exploit,
        }
    }

    /// Severity of a vulnerability entity, `None` for every other kind.
    pub fn severity(&self) -> Option<f64> {
        match self {
            Entity::Vulnerability(v) => Some(v.severity),
            _ => None,
        }
    }
}

// ── Entity Set ────────────────────────────────────────────────────

/// The six collections handed over by the configuration loader.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntitySet {
    #[serde(default)]
    pub hosts: Vec<Host>,
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(default)]
    pub privileges: Vec<Privilege>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub exploits: Vec<Exploit>,
    #[serde(default)]
    pub network_edges: Vec<NetworkEdge>,
}

impl EntitySet {
    /// All node-bearing entities in insertion order: hosts, vulnerabilities,
    /// privileges, services, then exploits.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.hosts
            .iter()
            .cloned()
            .map(Entity::Host)
            .chain(self.vulnerabilities.iter().cloned().map(Entity::Vulnerability))
            .chain(self.privileges.iter().cloned().map(Entity::Privilege))
            .chain(self.services.iter().cloned().map(Entity::Service))
            .chain(self.exploits.iter().cloned().map(Entity::Exploit))
    }

    /// Number of node-bearing entities.
    pub fn entity_count(&self) -> usize {
        self.hosts.len()
            + self.vulnerabilities.len()
            + self.privileges.len()
            + self.services.len()
            + self.exploits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_count() == 0 && self.network_edges.is_empty()
    }
}
