//! Resource models as exchanged with the backend
//!
//! Field names follow the backend JSON exactly. Timestamps are naive
//! ISO-8601 date-times (the backend stores UTC without an offset).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramType {
    Preschool,
    EarlyDevelopment,
    IndividualChild,
    IndividualAdult,
    GroupChild,
    GoalSetting,
}

impl ProgramType {
    pub fn label(self) -> &'static str {
        match self {
            ProgramType::Preschool => "Preschool preparation",
            ProgramType::EarlyDevelopment => "Early development",
            ProgramType::IndividualChild => "Individual (children)",
            ProgramType::IndividualAdult => "Individual (adults)",
            ProgramType::GroupChild => "Group (children)",
            ProgramType::GoalSetting => "Goal setting",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: String,
    #[serde(rename = "type")]
    pub program_type: ProgramType,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub goals: Vec<String>,
    pub age_range: String,
    pub price: i64,
    pub duration: String,
    #[serde(default)]
    pub faq: Vec<FaqEntry>,
    #[serde(default)]
    pub image_url: String,
    pub created_at: NaiveDateTime,
}

/// Program as submitted from the admin form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProgram {
    #[serde(rename = "type")]
    pub program_type: ProgramType,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub goals: Vec<String>,
    pub age_range: String,
    pub price: i64,
    pub duration: String,
    #[serde(default)]
    pub faq: Vec<FaqEntry>,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            other => Err(format!(
                "unknown appointment status {other:?} (expected pending, confirmed, completed or cancelled)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub program_id: String,
    pub client_name: String,
    pub client_phone: String,
    pub client_email: String,
    #[serde(default)]
    pub child_name: Option<String>,
    #[serde(default)]
    pub child_age: Option<u32>,
    pub preferred_date: NaiveDateTime,
    pub preferred_time: String,
    #[serde(default)]
    pub message: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
}

/// Booking request from the public appointment form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub program_id: String,
    pub client_name: String,
    pub client_phone: String,
    pub client_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_age: Option<u32>,
    pub preferred_date: NaiveDateTime,
    pub preferred_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsletterSubscription {
    pub id: String,
    pub email: String,
    pub subscribed_at: NaiveDateTime,
}

/// One newsletter mailing composed in the admin panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsletterIssue {
    pub subject: String,
    pub html_content: String,
}

/// Delivery counts reported by the backend after a mailing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsletterReport {
    pub sent: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub published: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBlogPost {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub published: bool,
}

/// Contact details and legal text shown across the public site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub work_schedule: String,
    #[serde(default)]
    pub vk_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_policy: Option<String>,
}

/// Collection sizes shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub appointments: usize,
    pub contacts: usize,
    pub newsletter: usize,
    pub programs: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_deserializes_backend_payload() {
        let json = r#"{
            "id": "7d0c", "type": "early_development", "title": "Early steps",
            "description": "Sensory play", "goals": ["speech", "motor skills"],
            "age_range": "1-3", "price": 2500, "duration": "45 min",
            "faq": [{"question": "Parents present?", "answer": "Yes"}],
            "image_url": "https://cdn/x.jpg", "created_at": "2024-05-01T10:00:00.123456"
        }"#;
        let program: Program = serde_json::from_str(json).unwrap();
        assert_eq!(program.program_type, ProgramType::EarlyDevelopment);
        assert_eq!(program.goals.len(), 2);
        assert_eq!(program.faq[0].answer, "Yes");
    }

    #[test]
    fn new_program_serializes_type_field() {
        let program = NewProgram {
            program_type: ProgramType::GoalSetting,
            title: "Focus".into(),
            description: "d".into(),
            goals: vec![],
            age_range: "18+".into(),
            price: 4000,
            duration: "60 min".into(),
            faq: vec![],
            image_url: String::new(),
        };
        let value = serde_json::to_value(&program).unwrap();
        assert_eq!(value["type"], "goal_setting");
        assert!(value.get("program_type").is_none());
    }

    #[test]
    fn appointment_status_parses_case_insensitively() {
        assert_eq!("Confirmed".parse::<AppointmentStatus>(), Ok(AppointmentStatus::Confirmed));
        assert_eq!("canceled".parse::<AppointmentStatus>(), Ok(AppointmentStatus::Cancelled));
        assert!("archived".parse::<AppointmentStatus>().is_err());
        assert_eq!(AppointmentStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn new_appointment_omits_absent_optionals() {
        let booking = NewAppointment {
            program_id: "p1".into(),
            client_name: "Anna".into(),
            client_phone: "+7 900 000 00 00".into(),
            client_email: "anna@example.com".into(),
            child_name: None,
            child_age: None,
            preferred_date: "2024-06-03T00:00:00".parse().unwrap(),
            preferred_time: "10:00".into(),
            message: None,
        };
        let value = serde_json::to_value(&booking).unwrap();
        assert!(value.get("child_name").is_none());
        assert_eq!(value["preferred_date"], "2024-06-03T00:00:00");
    }

    #[test]
    fn settings_tolerate_missing_fields() {
        let settings: SiteSettings = serde_json::from_str(r#"{"phone":"+7 1"}"#).unwrap();
        assert_eq!(settings.phone, "+7 1");
        assert_eq!(settings.vk_link, "");
        assert!(settings.privacy_policy.is_none());
    }
}
