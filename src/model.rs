//! Row types for the engine's logical tables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::ident::{ActorId, Category, Handle, Memo, Summary, Title};

/// Value of the logical clock supplied by the execution environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalTime(pub u64);

impl fmt::Display for LogicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Ordered privilege level. `Principal` is only ever derived for an entity's
/// controller and is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Tier {
    Blocked = 0,
    Reader = 1,
    Modifier = 2,
    Custodian = 3,
    Principal = 4,
}

impl Tier {
    pub const fn level(self) -> u8 { self as u8 }

    pub fn from_level(level: u8) -> Option<Tier> {
        match level {
            0 => Some(Tier::Blocked),
            1 => Some(Tier::Reader),
            2 => Some(Tier::Modifier),
            3 => Some(Tier::Custodian),
            4 => Some(Tier::Principal),
            _ => None,
        }
    }

    /// Whether the tier may be stored as an explicit grant.
    pub fn is_grantable(self) -> bool { (Tier::Reader..=Tier::Custodian).contains(&self) }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Blocked => "BLOCKED",
            Tier::Reader => "READER",
            Tier::Modifier => "MODIFIER",
            Tier::Custodian => "CUSTODIAN",
            Tier::Principal => "PRINCIPAL",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Tier {
    type Err = FieldError;

    /// Accepts the numeric level or the tier name in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if let Ok(level) = t.parse::<u8>() {
            return Tier::from_level(level).ok_or_else(|| FieldError::Tier(t.to_string()));
        }
        match t.to_ascii_uppercase().as_str() {
            "BLOCKED" => Ok(Tier::Blocked),
            "READER" => Ok(Tier::Reader),
            "MODIFIER" => Ok(Tier::Modifier),
            "CUSTODIAN" => Ok(Tier::Custodian),
            "PRINCIPAL" => Ok(Tier::Principal),
            _ => Err(FieldError::Tier(t.to_string())),
        }
    }
}

/// Kind of action recorded in the activity ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    Register,
    Modify,
    Distribute,
    Retrieve,
    Purge,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Register => "REGISTER",
            OperationKind::Modify => "MODIFY",
            OperationKind::Distribute => "DISTRIBUTE",
            OperationKind::Retrieve => "RETRIEVE",
            OperationKind::Purge => "PURGE",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Opaque 32-byte anchor for content held outside the engine. Never hashed or
/// verified here.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Checksum(pub [u8; 32]);

impl Checksum {
    pub fn as_bytes(&self) -> &[u8; 32] { &self.0 }
    pub fn to_hex(&self) -> String { hex::encode(self.0) }
}

impl From<[u8; 32]> for Checksum {
    fn from(bytes: [u8; 32]) -> Self { Self(bytes) }
}

impl FromStr for Checksum {
    type Err = FieldError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out).map_err(|e| FieldError::Checksum(e.to_string()))?;
        Ok(Self(out))
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.to_hex()) }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Checksum({})", self.to_hex()) }
}

/// The (entity, record) pair keying records, grants and ledger sequences.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub entity: Handle,
    pub record: Handle,
}

impl Scope {
    pub fn new(entity: Handle, record: Handle) -> Self { Self { entity, record } }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}/{}", self.entity, self.record) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub handle: Handle,
    pub controller: ActorId,
    pub title: Title,
    pub registered_at: LogicalTime,
    pub active: bool,
}

/// Caller-supplied fields of a record, shared by deposit and revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordContent {
    pub title: Title,
    pub summary: Summary,
    pub checksum: Checksum,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub entity: Handle,
    pub handle: Handle,
    pub title: Title,
    pub summary: Summary,
    pub checksum: Checksum,
    pub category: Category,
    pub created_at: LogicalTime,
    pub updated_at: LogicalTime,
    /// Starts at 1, grows by exactly 1 per revision.
    pub iteration: u64,
    pub active: bool,
}

/// Explicit, delegated privilege. Controllers never appear here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub entity: Handle,
    pub record: Handle,
    pub actor: ActorId,
    pub tier: Tier,
    pub grantor: ActorId,
    pub granted_at: LogicalTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub entity: Handle,
    pub record: Handle,
    pub sequence: u64,
    pub actor: ActorId,
    pub operation: OperationKind,
    pub occurred_at: LogicalTime,
    pub memo: Memo,
}
