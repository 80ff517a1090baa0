use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::{QueryRequest, Request};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Registration {
    pub id: u64,

    pub event_id: String,

    pub user_id: String,

    #[serde(default)]
    pub team_name: String,

    pub team_members: Vec<TeamMember>,

    #[serde(default)]
    pub custom_input_values: Vec<CustomInputValue>,

    pub registration_time: u64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TeamMember {
    pub name: String,
    pub age: String,
    pub college: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub year_of_passing: String,
}

/// Answer to one of the event's custom inputs, matched by position.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CustomInputValue {
    pub input: usize,

    #[serde(default)]
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct GetRegistrationsRequest {
    pub event_id: String,

    pub query: QueryRequest,
}

impl Request for GetRegistrationsRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.event_id = fields.remove("event_id").unwrap_or_default();
        if self.event_id.is_empty() {
            bail!("event_id is required to get registrations");
        }
        self.query.complete(fields)?;
        Ok(())
    }
}
