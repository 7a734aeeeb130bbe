#![forbid(unsafe_code)]

const MAX_ID_LEN: usize = 128;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrganizationId(String);

impl OrganizationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        validate_text_id(&value)?;
        for (index, ch) in value.chars().enumerate() {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                continue;
            }
            return Err(IdError::InvalidChar { ch, index });
        }
        Ok(Self(value))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        validate_text_id(&value)?;
        Ok(Self(value.trim().to_string()))
    }
}

/// Row identifier shared by prospects, todos and calendar events.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        validate_text_id(&value)?;
        Ok(Self(value.trim().to_string()))
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdError {
    Empty,
    TooLong,
    ContainsControl,
    InvalidChar { ch: char, index: usize },
}

impl IdError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "id must not be empty",
            Self::TooLong => "id is too long",
            Self::ContainsControl => "id contains control characters",
            Self::InvalidChar { .. } => "id contains characters outside [A-Za-z0-9._-]",
        }
    }
}

impl std::fmt::Display for IdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidChar { ch, index } => {
                write!(f, "{} (char={ch:?}, index={index})", self.message())
            }
            _ => f.write_str(self.message()),
        }
    }
}

impl std::error::Error for IdError {}

fn validate_text_id(value: &str) -> Result<(), IdError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IdError::Empty);
    }
    if trimmed.len() > MAX_ID_LEN {
        return Err(IdError::TooLong);
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(IdError::ContainsControl);
    }
    Ok(())
}
