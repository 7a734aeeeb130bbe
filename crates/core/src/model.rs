#![forbid(unsafe_code)]

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PipelineStage {
    NotContacted,
    ColdCalled,
    FirstDemo,
    SecondDemo,
    OfferSent,
    OfferAccepted,
    OfferRejected,
}

impl PipelineStage {
    /// Board columns, left to right.
    pub const ALL: [PipelineStage; 7] = [
        PipelineStage::NotContacted,
        PipelineStage::ColdCalled,
        PipelineStage::FirstDemo,
        PipelineStage::SecondDemo,
        PipelineStage::OfferSent,
        PipelineStage::OfferAccepted,
        PipelineStage::OfferRejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotContacted => "not_contacted",
            Self::ColdCalled => "cold_called",
            Self::FirstDemo => "first_demo",
            Self::SecondDemo => "second_demo",
            Self::OfferSent => "offer_sent",
            Self::OfferAccepted => "offer_accepted",
            Self::OfferRejected => "offer_rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|stage| stage.as_str() == value)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::NotContacted => "Not Contacted",
            Self::ColdCalled => "Cold Called",
            Self::FirstDemo => "First Demo",
            Self::SecondDemo => "Second Demo",
            Self::OfferSent => "Offer Sent",
            Self::OfferAccepted => "Offer Accepted",
            Self::OfferRejected => "Offer Rejected",
        }
    }

    pub fn demo_kind(self) -> Option<DemoKind> {
        match self {
            Self::FirstDemo => Some(DemoKind::First),
            Self::SecondDemo => Some(DemoKind::Second),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DemoKind {
    First,
    Second,
}

impl DemoKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::First => "First Demo",
            Self::Second => "Second Demo",
        }
    }

    pub fn stage(self) -> PipelineStage {
        match self {
            Self::First => PipelineStage::FirstDemo,
            Self::Second => PipelineStage::SecondDemo,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LeadSource {
    ColdOutreach,
    Inbound,
    Referral,
    Linkedin,
    Website,
    Event,
    Other,
}

impl LeadSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ColdOutreach => "cold_outreach",
            Self::Inbound => "inbound",
            Self::Referral => "referral",
            Self::Linkedin => "linkedin",
            Self::Website => "website",
            Self::Event => "event",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "cold_outreach" => Some(Self::ColdOutreach),
            "inbound" => Some(Self::Inbound),
            "referral" => Some(Self::Referral),
            "linkedin" => Some(Self::Linkedin),
            "website" => Some(Self::Website),
            "event" => Some(Self::Event),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    Task,
    Demo,
    Meeting,
    Call,
    Other,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Demo => "demo",
            Self::Meeting => "meeting",
            Self::Call => "call",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "task" => Some(Self::Task),
            "demo" => Some(Self::Demo),
            "meeting" => Some(Self::Meeting),
            "call" => Some(Self::Call),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Assignee {
    Team,
    Veeti,
    Alppa,
    Ilari,
}

impl Assignee {
    pub const ALL: [Assignee; 4] = [
        Assignee::Team,
        Assignee::Veeti,
        Assignee::Alppa,
        Assignee::Ilari,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Veeti => "veeti",
            Self::Alppa => "alppa",
            Self::Ilari => "ilari",
        }
    }

    /// Case-insensitive; `None` for anything that is not a known person.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|person| person.as_str() == value)
    }

    /// Unknown or missing names fall back to the team entry.
    pub fn resolve(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or(Self::Team)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Team => "Team",
            Self::Veeti => "Veeti",
            Self::Alppa => "Alppa",
            Self::Ilari => "Ilari",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Team => "#A855F7",
            Self::Veeti => "#3B82F6",
            Self::Alppa => "#F97316",
            Self::Ilari => "#10B981",
        }
    }
}

pub fn team_for_org(slug: &str) -> &'static [Assignee] {
    match slug.trim() {
        "funect" => &[Assignee::Team, Assignee::Veeti, Assignee::Alppa],
        "77-football" => &[Assignee::Team, Assignee::Ilari, Assignee::Alppa],
        _ => &[Assignee::Team, Assignee::Alppa],
    }
}
