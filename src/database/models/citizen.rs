use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::{CitizenId, TenantId};

/// Self-reported citizen address. Only the fields the linking subsystem reads
/// are modelled; anything else stored alongside them is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, alias = "cidade")]
    pub city: Option<String>,
    #[serde(default, alias = "uf", alias = "estado")]
    pub state: Option<String>,
}

impl Address {
    pub fn new(city: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            city: Some(city.into()),
            state: Some(state.into()),
        }
    }

    /// Parse the stored semi-structured value. `null` means no address on file.
    pub fn from_stored(value: Option<Value>) -> Result<Option<Self>, serde_json::Error> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(v) => serde_json::from_value(v).map(Some),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citizen {
    pub id: CitizenId,
    pub tenant_id: TenantId,
    pub display_name: String,
    pub email: String,
    pub address: Option<Address>,
    pub created_at: DateTime<Utc>,
}

/// Fields collected at registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCitizen {
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub address: Option<Address>,
}

/// A fallback-pool citizen whose stored record could not be read into a `Citizen`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedCitizen {
    pub id: CitizenId,
    pub display_name: String,
    pub reason: String,
}

/// One entry of a candidate listing
pub type CandidateRecord = Result<Citizen, MalformedCitizen>;

/// Row shape of the `citizens` table
#[derive(Debug, Clone, FromRow)]
pub struct CitizenRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub display_name: String,
    pub email: String,
    pub address: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl CitizenRow {
    /// Validate the stored address at the store boundary
    pub fn into_candidate(self) -> CandidateRecord {
        match Address::from_stored(self.address) {
            Ok(address) => Ok(Citizen {
                id: CitizenId(self.id),
                tenant_id: TenantId(self.tenant_id),
                display_name: self.display_name,
                email: self.email,
                address,
                created_at: self.created_at,
            }),
            Err(e) => Err(MalformedCitizen {
                id: CitizenId(self.id),
                display_name: self.display_name,
                reason: format!("unreadable address: {}", e),
            }),
        }
    }
}
