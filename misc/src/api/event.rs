use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::parse_from_map;

use super::{decode_json, QueryRequest, Request};

pub const EVENT_PATH: &str = "/v1/event";
pub const EVENT_DETAILS_PATH: &str = "/v1/event/details";
pub const EVENT_REGISTRATIONS_PATH: &str = "/v1/event/registrations";

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Event {
    pub id: String,

    pub name: String,

    /// Id of the owning (society) account.
    pub owner: String,

    pub day: u32,

    pub start_time: String,

    pub end_time: String,

    #[serde(flatten)]
    pub details: EventDetails,

    pub update_time: u64,
}

/// Metadata an event owner may edit on its own event.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct EventDetails {
    #[serde(default)]
    pub venue: String,

    #[serde(default)]
    pub description: String,

    pub category: Category,

    #[serde(default = "EventDetails::default_accepting_registrations")]
    pub accepting_registrations: bool,

    /// Object storage key of the cover image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_key: Option<String>,

    #[serde(default)]
    pub is_team_event: bool,

    #[serde(default = "EventDetails::default_team_members")]
    pub min_team_members: u32,

    #[serde(default = "EventDetails::default_team_members")]
    pub max_team_members: u32,

    #[serde(default)]
    pub custom_inputs: Vec<CustomInput>,
}

impl Default for EventDetails {
    fn default() -> Self {
        Self {
            venue: String::new(),
            description: String::new(),
            category: Category::CreativeArts,
            accepting_registrations: Self::default_accepting_registrations(),
            image_key: None,
            is_team_event: false,
            min_team_members: Self::default_team_members(),
            max_team_members: Self::default_team_members(),
            custom_inputs: vec![],
        }
    }
}

impl EventDetails {
    pub fn validate(&self) -> Result<()> {
        if self.min_team_members == 0 {
            bail!("min_team_members must be at least 1");
        }
        if self.max_team_members < self.min_team_members {
            bail!("max_team_members must not be less than min_team_members");
        }
        if !self.is_team_event && self.max_team_members > 1 {
            bail!("only team events can have more than one member");
        }

        for (idx, input) in self.custom_inputs.iter().enumerate() {
            input
                .validate()
                .with_context(|| format!("custom input {idx}"))?;
        }

        Ok(())
    }

    fn default_accepting_registrations() -> bool {
        true
    }

    fn default_team_members() -> u32 {
        1
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum Category {
    #[serde(rename = "Creative Arts")]
    CreativeArts,
    #[serde(rename = "Music")]
    Music,
    #[serde(rename = "Dance")]
    Dance,
    #[serde(rename = "Theatre")]
    Theatre,
    #[serde(rename = "Culture and Lifestyle")]
    CultureAndLifestyle,
}

/// An extra field shown on the registration form of an event.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CustomInput {
    pub kind: InputKind,

    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
}

impl CustomInput {
    fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            bail!("label is required");
        }

        match self.kind {
            InputKind::Select if self.options.is_empty() => {
                bail!("select input requires options")
            }
            InputKind::File if self.file_type.is_none() => {
                bail!("file input requires file_type")
            }
            _ => {}
        }

        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub enum InputKind {
    ShortText,
    Select,
    Number,
    Email,
    Phone,
    LongText,
    File,
    Date,
    Link,
    Time,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Image,
    Video,
}

/// Schedule fields of an event, managed by staff.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Clone)]
pub struct EventBase {
    pub name: String,
    pub owner: String,
    pub day: u32,
    pub start_time: String,
    pub end_time: String,
}

impl EventBase {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("name is required");
        }
        if self.owner.is_empty() {
            bail!("owner is required");
        }
        if self.day == 0 {
            bail!("day must be at least 1");
        }
        if !is_valid_time(&self.start_time) {
            bail!("start_time must be in HH:MM format");
        }
        if !is_valid_time(&self.end_time) {
            bail!("end_time must be in HH:MM format");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Clone)]
pub struct PutEventRequest {
    #[serde(flatten)]
    pub base: EventBase,

    #[serde(flatten)]
    pub details: EventDetails,
}

impl Request for PutEventRequest {
    fn is_data(&self) -> bool {
        true
    }

    fn set_data(&mut self, data: Vec<u8>) -> Result<()> {
        *self = decode_json(&data)?;
        self.base.validate()?;
        self.details.validate()?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct GetEventRequest {
    pub id: Option<String>,

    /// Only list events owned by the caller.
    pub mine: bool,

    pub day: Option<u32>,

    pub query: QueryRequest,
}

impl Request for GetEventRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.id = fields.remove("id");
        if self.id.is_some() {
            return Ok(());
        }

        self.mine = parse_from_map!(fields, "mine").unwrap_or_default();
        self.day = parse_from_map!(fields, "day");
        self.query.complete(fields)?;

        Ok(())
    }
}

/// Replaces the schedule fields of an event.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Clone)]
pub struct PatchEventRequest {
    pub id: String,

    #[serde(flatten)]
    pub base: EventBase,
}

impl Request for PatchEventRequest {
    fn is_data(&self) -> bool {
        true
    }

    fn set_data(&mut self, data: Vec<u8>) -> Result<()> {
        *self = decode_json(&data)?;
        if self.id.is_empty() {
            bail!("id is required to patch event");
        }
        self.base.validate()?;
        Ok(())
    }
}

/// Replaces the owner-editable metadata of an event.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Clone)]
pub struct PatchEventDetailsRequest {
    pub id: String,

    #[serde(flatten)]
    pub details: EventDetails,
}

impl Request for PatchEventDetailsRequest {
    fn is_data(&self) -> bool {
        true
    }

    fn set_data(&mut self, data: Vec<u8>) -> Result<()> {
        *self = decode_json(&data)?;
        if self.id.is_empty() {
            bail!("id is required to patch event details");
        }
        self.details.validate()?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DeleteEventRequest {
    pub id: String,
}

impl Request for DeleteEventRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.id = fields.remove("id").unwrap_or_default();
        if self.id.is_empty() {
            bail!("id is required to delete event");
        }
        Ok(())
    }
}

static TIME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").unwrap());

fn is_valid_time(s: &str) -> bool {
    TIME_REGEX.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_event_request() {
        let body = r#"{
            "name": "Battle of Bands",
            "owner": "u1",
            "day": 2,
            "start_time": "10:00",
            "end_time": "12:30",
            "venue": "Main Stage",
            "category": "Music",
            "is_team_event": true,
            "max_team_members": 6,
            "custom_inputs": [
                {"kind": "select", "label": "Genre", "options": ["Rock", "Jazz"]},
                {"kind": "file", "label": "Demo", "file_type": "video", "max_size": 1048576}
            ]
        }"#;

        let mut req = PutEventRequest::default();
        req.set_data(body.as_bytes().to_vec()).unwrap();
        assert_eq!(req.base.name, "Battle of Bands");
        assert_eq!(req.details.category, Category::Music);
        assert_eq!(req.details.min_team_members, 1);
        assert_eq!(req.details.max_team_members, 6);
        assert!(req.details.accepting_registrations);
        assert_eq!(req.details.custom_inputs.len(), 2);
        assert_eq!(req.details.custom_inputs[1].file_type, Some(FileType::Video));
    }

    #[test]
    fn test_put_event_request_invalid() {
        let cases = [
            // bad time
            r#"{"name":"a","owner":"u1","day":1,"start_time":"9:00","end_time":"10:00","category":"Music"}"#,
            // day zero
            r#"{"name":"a","owner":"u1","day":0,"start_time":"09:00","end_time":"10:00","category":"Music"}"#,
            // unknown category
            r#"{"name":"a","owner":"u1","day":1,"start_time":"09:00","end_time":"10:00","category":"Sports"}"#,
            // team bounds
            r#"{"name":"a","owner":"u1","day":1,"start_time":"09:00","end_time":"10:00","category":"Dance","is_team_event":true,"min_team_members":4,"max_team_members":2}"#,
            // solo event with team size
            r#"{"name":"a","owner":"u1","day":1,"start_time":"09:00","end_time":"10:00","category":"Dance","max_team_members":2}"#,
            // select without options
            r#"{"name":"a","owner":"u1","day":1,"start_time":"09:00","end_time":"10:00","category":"Dance","custom_inputs":[{"kind":"select","label":"x"}]}"#,
            "",
        ];
        for case in cases {
            let mut req = PutEventRequest::default();
            assert!(req.set_data(case.as_bytes().to_vec()).is_err(), "{case}");
        }
    }

    #[test]
    fn test_get_event_request() {
        let mut req = GetEventRequest::default();
        let fields = HashMap::from([
            (String::from("mine"), String::from("true")),
            (String::from("day"), String::from("3")),
        ]);
        req.complete(fields).unwrap();
        assert!(req.mine);
        assert_eq!(req.day, Some(3));
        assert_eq!(req.query.limit, Some(10));
    }
}
