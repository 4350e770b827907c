//! Documents stored in MongoDB.
//!
//! Field names are camelCase so that documents written by earlier versions of
//! the portal keep deserializing. Everything that is optional or defaulted at
//! write time carries `#[serde(default)]`.

use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod optional_bson_datetime {
    use bson::serde_helpers::chrono_datetime_as_bson_datetime;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => chrono_datetime_as_bson_datetime::serialize(dt, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<bson::DateTime>::deserialize(deserializer).map(|v| v.map(|dt| dt.to_chrono()))
    }
}

// ---------------------------------------------------------------------------
// Achievements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AchievementType {
    Hackathon,
    #[serde(rename = "CTF")]
    Ctf,
    Coding,
    Other,
}

impl AchievementType {
    /// Parse the exact stored spelling (`Hackathon`, `CTF`, `Coding`, `Other`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Hackathon" => Some(Self::Hackathon),
            "CTF" => Some(Self::Ctf),
            "Coding" => Some(Self::Coding),
            "Other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hackathon => "Hackathon",
            Self::Ctf => "CTF",
            Self::Coding => "Coding",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: AchievementType,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub students: Vec<String>,
    /// Free-form date as entered by editors; sorted lexically.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default = "Utc::now", with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Companies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub company_name: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub eligibility_criteria: String,
    #[serde(default)]
    pub salary_package: String,
    /// Cost to company, in LPA.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctc: Option<f64>,
    #[serde(default)]
    pub opportunity_type: Vec<String>,
    #[serde(default)]
    pub selection_process: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview_experience: Option<String>,
    #[serde(default)]
    pub notes_tips: String,
    #[serde(default = "Utc::now", with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Interviews
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionDifficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewQuestion {
    #[serde(default)]
    pub statement: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<QuestionDifficulty>,
    #[serde(default)]
    pub follow_ups: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRound {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub questions: Vec<InterviewQuestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// Days since the first round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_offset: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewInsights {
    #[serde(default)]
    pub prep_strategy: String,
    #[serde(default)]
    pub mistakes: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub time_gap: String,
}

fn default_interview_type() -> String {
    "Internship".to_string()
}

fn default_interview_result() -> String {
    "Selected".to_string()
}

fn default_interview_difficulty() -> String {
    "Medium".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub student_name: String,
    #[serde(default)]
    pub batch: String,
    pub company: String,
    pub role: String,
    #[serde(default)]
    pub domain: String,
    #[serde(rename = "type", default = "default_interview_type")]
    pub kind: String,
    #[serde(default = "default_interview_result")]
    pub result: String,
    #[serde(default = "default_interview_difficulty")]
    pub difficulty: String,
    #[serde(default)]
    pub rounds: Vec<InterviewRound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<InterviewInsights>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub helpful_count: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "Utc::now", with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectLink {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    #[serde(rename = "abstract")]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub links: Vec<ProjectLink>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub contributors: Vec<String>,
    #[serde(default = "Utc::now", with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Roadmaps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopicGroupType {
    MustKnow,
    GoodToKnow,
    Tools,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicGroup {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TopicGroupType>,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapStep {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub topics: Vec<TopicGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roadmap {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub oid: Option<ObjectId>,
    /// Public slug, e.g. `SOC_ANALYST`.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub steps: Vec<RoadmapStep>,
    #[serde(default = "Utc::now", with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Listing projection of a roadmap (no steps).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapSummary {
    #[serde(rename = "_id")]
    pub oid: ObjectId,
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
}

// ---------------------------------------------------------------------------
// Topics & articles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicType {
    Ctf,
    Blog,
    Experiment,
}

impl Default for TopicType {
    fn default() -> Self {
        TopicType::Ctf
    }
}

impl TopicType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ctf" => Some(Self::Ctf),
            "blog" => Some(Self::Blog),
            "experiment" => Some(Self::Experiment),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ctf => "ctf",
            Self::Blog => "blog",
            Self::Experiment => "experiment",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: TopicType,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub created_by: String,
    #[serde(default = "Utc::now", with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Pending,
    Approved,
    Published,
    Rejected,
}

impl Default for ArticleStatus {
    fn default() -> Self {
        ArticleStatus::Draft
    }
}

impl ArticleStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "published" => Some(Self::Published),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Published => "published",
            Self::Rejected => "rejected",
        }
    }

    /// Whether the moderation workflow allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: ArticleStatus) -> bool {
        use ArticleStatus::*;
        matches!(
            (self, next),
            (Draft, Pending)
                | (Rejected, Pending)
                | (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Published)
                | (Approved, Published)
                | (Approved, Rejected)
                | (Published, Approved)
        )
    }

    /// Authors may only edit content that is not under review.
    pub fn is_editable(&self) -> bool {
        matches!(self, ArticleStatus::Draft | ArticleStatus::Rejected)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub slug: String,
    pub topic_id: ObjectId,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub author_uid: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub status: ArticleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "Utc::now", with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "optional_bson_datetime"
    )]
    pub published_at: Option<DateTime<Utc>>,
}
