use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(PartnerCode);
id_newtype!(TranslationId);

pub trait Resource: Clone + DeserializeOwned + Send + Sync + 'static {
    type Id: Copy + fmt::Display + Send + Sync + 'static;
    type Fields: Serialize + Validate + Send + Sync + 'static;

    const COLLECTION: &'static str;
    const PAGE_SIZE: u32;
    const LABEL: &'static str;

    fn id(&self) -> Self::Id;
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organisation {
    pub partner_code: PartnerCode,
    pub partner_name: String,
    pub partner_inn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_user_fio: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganisationFields {
    pub partner_name: String,
    pub partner_inn: String,
}

impl OrganisationFields {
    pub fn new(name: impl Into<String>, inn: impl Into<String>) -> Self {
        Self {
            partner_name: name.into(),
            partner_inn: inn.into(),
        }
    }
}

impl Validate for OrganisationFields {
    fn validate(&self) -> Result<(), ValidationError> {
        require(&self.partner_name, "partner_name")?;
        require(&self.partner_inn, "partner_inn")
    }
}

impl Resource for Organisation {
    type Id = PartnerCode;
    type Fields = OrganisationFields;

    const COLLECTION: &'static str = "partners";
    const PAGE_SIZE: u32 = 8;
    const LABEL: &'static str = "organisation";

    fn id(&self) -> PartnerCode {
        self.partner_code
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub translation_id: TranslationId,
    pub key: String,
    #[serde(default)]
    pub en: Option<String>,
    #[serde(default)]
    pub ru: Option<String>,
    #[serde(default)]
    pub uz: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_by_fio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

impl Translation {
    pub fn text(&self, language: Language) -> Option<&str> {
        let value = match language {
            Language::En => self.en.as_deref(),
            Language::Ru => self.ru.as_deref(),
            Language::Uz => self.uz.as_deref(),
        };
        value.filter(|text| !text.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationFields {
    pub key: String,
    pub en: String,
    pub ru: String,
    pub uz: String,
}

impl Validate for TranslationFields {
    fn validate(&self) -> Result<(), ValidationError> {
        require(&self.key, "key")
    }
}

impl Resource for Translation {
    type Id = TranslationId;
    type Fields = TranslationFields;

    const COLLECTION: &'static str = "manage-translations";
    const PAGE_SIZE: u32 = 15;
    const LABEL: &'static str = "translation";

    fn id(&self) -> TranslationId {
        self.translation_id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    En,
    Ru,
    Uz,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ru => "ru",
            Language::Uz => "uz",
        }
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "ru" => Ok(Language::Ru),
            "uz" => Ok(Language::Uz),
            _ => Err(ValidationError::UnsupportedLanguage(raw.to_string())),
        }
    }
}
