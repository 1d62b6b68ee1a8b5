//! Meetings (`Event`).

use chrono::{NaiveDate, NaiveDateTime};
use desk_types::{Doctype, Filter, FilterOp, Filters, ListPage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{ListParams, check_range, date_param};
use crate::{DeskClient, DeskError, ListSpec};

pub const MEETINGS: ListSpec = ListSpec {
    doctype: "Event",
    fields: &[
        "name",
        "subject",
        "description",
        "starts_on",
        "ends_on",
        "event_type",
        "status",
    ],
    search_fields: &["subject", "description"],
    order_by: "starts_on asc",
};

/// Backend datetime format (`2024-05-02 09:30:00`).
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    #[serde(default)]
    pub name: String,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub starts_on: Option<String>,
    pub ends_on: Option<String>,
    pub event_type: Option<String>,
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMeeting {
    pub subject: String,
    pub starts_on: NaiveDateTime,
    pub ends_on: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub public: bool,
}

impl NewMeeting {
    fn to_doc(&self) -> Result<Value, DeskError> {
        if self.subject.trim().is_empty() {
            return Err(DeskError::InvalidArgument("subject is required".to_string()));
        }
        if let Some(ends_on) = self.ends_on
            && ends_on < self.starts_on
        {
            return Err(DeskError::InvalidArgument(
                "meeting ends before it starts".to_string(),
            ));
        }
        let mut doc = json!({
            "subject": self.subject.trim(),
            "starts_on": self.starts_on.format(DATETIME_FORMAT).to_string(),
            "event_type": if self.public { "Public" } else { "Private" },
        });
        if let Some(ends_on) = self.ends_on {
            doc["ends_on"] = json!(ends_on.format(DATETIME_FORMAT).to_string());
        }
        if let Some(description) = &self.description {
            doc["description"] = json!(description);
        }
        Ok(doc)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingListParams {
    pub list: ListParams,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl MeetingListParams {
    fn filters(&self) -> Result<Filters, DeskError> {
        let mut filters = Filters::new();
        if let Some(from) = self.from {
            filters.push(Filter::new("starts_on", FilterOp::Gte, date_param(from)));
        }
        if let Some(to) = self.to {
            if let Some(from) = self.from {
                check_range(from, to)?;
            }
            // Whole last day.
            filters.push(Filter::new(
                "starts_on",
                FilterOp::Lte,
                format!("{} 23:59:59", date_param(to)),
            ));
        }
        Ok(filters)
    }
}

fn doctype() -> Doctype {
    MEETINGS.doctype()
}

impl DeskClient {
    pub async fn fetch_meetings(
        &self,
        params: &MeetingListParams,
    ) -> Result<ListPage<Meeting>, DeskError> {
        self.fetch_list(&MEETINGS, params.filters()?, params.list.search(), params.list.page)
            .await
    }

    pub async fn create_meeting(&self, meeting: &NewMeeting) -> Result<Meeting, DeskError> {
        self.insert(&doctype(), meeting.to_doc()?).await
    }

    pub async fn cancel_meeting(&self, name: &str) -> Result<Meeting, DeskError> {
        self.set_value(&doctype(), name, "status", json!("Cancelled"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 2)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap())
    }

    #[test]
    fn new_meeting_formats_backend_datetimes() {
        let meeting = NewMeeting {
            subject: "Quarterly review".to_string(),
            starts_on: at(9),
            ends_on: Some(at(10)),
            description: None,
            public: false,
        };
        assert_eq!(
            meeting.to_doc().unwrap(),
            json!({
                "subject": "Quarterly review",
                "starts_on": "2024-05-02 09:00:00",
                "ends_on": "2024-05-02 10:00:00",
                "event_type": "Private",
            })
        );
    }

    #[test]
    fn meeting_ending_before_start_is_rejected() {
        let meeting = NewMeeting {
            subject: "Standup".to_string(),
            starts_on: at(10),
            ends_on: Some(at(9)),
            description: None,
            public: true,
        };
        assert!(meeting.to_doc().is_err());
    }

    #[test]
    fn date_bounds_cover_the_last_day() {
        let params = MeetingListParams {
            from: NaiveDate::from_ymd_opt(2024, 5, 1),
            to: NaiveDate::from_ymd_opt(2024, 5, 31),
            ..MeetingListParams::default()
        };
        assert_eq!(
            params.filters().unwrap().to_json(),
            r#"[["starts_on",">=","2024-05-01"],["starts_on","<=","2024-05-31 23:59:59"]]"#
        );
    }
}
