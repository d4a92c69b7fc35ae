use chrono::{DateTime, Utc};
use modkit::api::problem::ValidationError;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::contract::model::{GenerationType, HoloMember, HoloMemberPatch, NewHoloMember};

/// Generation type as exchanged on the wire. Matching is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum GenerationTypeDto {
    #[serde(rename = "0")]
    Gen0,
    #[serde(rename = "1")]
    Gen1,
    #[serde(rename = "2")]
    Gen2,
    #[serde(rename = "3")]
    Gen3,
    #[serde(rename = "4")]
    Gen4,
    #[serde(rename = "5")]
    Gen5,
    #[serde(rename = "EN")]
    En,
    #[serde(rename = "ID")]
    Id,
    #[serde(rename = "Gamers")]
    Gamers,
}

impl From<GenerationType> for GenerationTypeDto {
    fn from(g: GenerationType) -> Self {
        match g {
            GenerationType::Gen0 => Self::Gen0,
            GenerationType::Gen1 => Self::Gen1,
            GenerationType::Gen2 => Self::Gen2,
            GenerationType::Gen3 => Self::Gen3,
            GenerationType::Gen4 => Self::Gen4,
            GenerationType::Gen5 => Self::Gen5,
            GenerationType::En => Self::En,
            GenerationType::Id => Self::Id,
            GenerationType::Gamers => Self::Gamers,
        }
    }
}

impl From<GenerationTypeDto> for GenerationType {
    fn from(g: GenerationTypeDto) -> Self {
        match g {
            GenerationTypeDto::Gen0 => Self::Gen0,
            GenerationTypeDto::Gen1 => Self::Gen1,
            GenerationTypeDto::Gen2 => Self::Gen2,
            GenerationTypeDto::Gen3 => Self::Gen3,
            GenerationTypeDto::Gen4 => Self::Gen4,
            GenerationTypeDto::Gen5 => Self::Gen5,
            GenerationTypeDto::En => Self::En,
            GenerationTypeDto::Id => Self::Id,
            GenerationTypeDto::Gamers => Self::Gamers,
        }
    }
}

/// A stored holo member as returned by every read and write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HoloMemberDto {
    pub id: i32,
    #[serde(rename = "type")]
    pub generation: GenerationTypeDto,
    pub name: String,
    pub description: String,
    pub twitter: String,
    /// One fractional digit.
    pub age: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<HoloMember> for HoloMemberDto {
    fn from(m: HoloMember) -> Self {
        Self {
            id: m.id,
            generation: m.generation.into(),
            name: m.name,
            description: m.description,
            twitter: m.twitter,
            age: m.age.to_f64().unwrap_or_default(),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Payload for creating a member.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HoloMemberCreateReq {
    #[serde(rename = "type")]
    pub generation: GenerationTypeDto,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub age: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateHoloMemberBody {
    pub new_holo_member: HoloMemberCreateReq,
}

const CREATE_PTR: &str = "/new_holo_member";
const UPDATE_PTR: &str = "/holo_member_update";

fn age_to_decimal(age: f64) -> Option<Decimal> {
    Decimal::from_f64(age)
}

impl HoloMemberCreateReq {
    /// Check required fields and convert; all problems are reported at once.
    pub fn into_new(self) -> Result<NewHoloMember, Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("{CREATE_PTR}/name"),
                "must not be blank",
            ));
        }
        if self.twitter.is_none() {
            errors.push(ValidationError::new(
                format!("{CREATE_PTR}/twitter"),
                "field required",
            ));
        }
        let age = match self.age {
            None => {
                errors.push(ValidationError::new(format!("{CREATE_PTR}/age"), "field required"));
                None
            }
            Some(raw) => {
                let parsed = age_to_decimal(raw);
                if parsed.is_none() {
                    errors.push(ValidationError::new(
                        format!("{CREATE_PTR}/age"),
                        "not a representable number",
                    ));
                }
                parsed
            }
        };

        match (self.twitter, age) {
            (Some(twitter), Some(age)) if errors.is_empty() => Ok(NewHoloMember {
                generation: self.generation.into(),
                name: self.name,
                description: self.description.unwrap_or_default(),
                twitter,
                age,
            }),
            _ => Err(errors),
        }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Partial update payload: only the fields present are changed.
///
/// `"type": null` and `"type": ""` ask to clear the generation type, which the
/// service refuses.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct HoloMemberUpdateReq {
    #[serde(rename = "type", default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub generation: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub twitter: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub age: Option<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateHoloMemberBody {
    pub holo_member_update: HoloMemberUpdateReq,
}

impl HoloMemberUpdateReq {
    pub fn into_patch(self) -> Result<HoloMemberPatch, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let generation = match self.generation {
            None => None,
            Some(None) => Some(None),
            Some(Some(s)) if s.is_empty() => Some(None),
            Some(Some(s)) => match s.parse::<GenerationType>() {
                Ok(g) => Some(Some(g)),
                Err(e) => {
                    errors.push(ValidationError::new(format!("{UPDATE_PTR}/type"), e.to_string()));
                    None
                }
            },
        };

        let age = match self.age {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => match age_to_decimal(raw) {
                Some(d) => Some(Some(d)),
                None => {
                    errors.push(ValidationError::new(
                        format!("{UPDATE_PTR}/age"),
                        "not a representable number",
                    ));
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(HoloMemberPatch {
            generation,
            name: self.name,
            description: self.description,
            twitter: self.twitter,
            age,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_req(v: serde_json::Value) -> HoloMemberCreateReq {
        serde_json::from_value(v).unwrap()
    }

    fn update_req(v: serde_json::Value) -> HoloMemberUpdateReq {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn create_with_all_fields_converts() {
        let new = create_req(json!({
            "type": "EN", "name": "Gura", "description": "shark",
            "twitter": "@gawrgura", "age": 9000.5
        }))
        .into_new()
        .unwrap();
        assert_eq!(new.generation, GenerationType::En);
        assert_eq!(new.description, "shark");
        assert_eq!(new.age, Decimal::new(90005, 1));
    }

    #[test]
    fn create_defaults_description_to_empty() {
        let new = create_req(json!({"type": "0", "name": "Sora", "twitter": "@tokino_sora", "age": 18}))
            .into_new()
            .unwrap();
        assert_eq!(new.description, "");
    }

    #[test]
    fn create_reports_every_missing_field() {
        let errs = create_req(json!({"type": "1", "name": " "}))
            .into_new()
            .unwrap_err();
        let pointers: Vec<_> = errs.iter().map(|e| e.pointer.as_str()).collect();
        assert_eq!(
            pointers,
            ["/new_holo_member/name", "/new_holo_member/twitter", "/new_holo_member/age"]
        );
    }

    #[test]
    fn create_rejects_unknown_or_miscased_type() {
        for t in ["en", "6", "", "Myth"] {
            let r = serde_json::from_value::<HoloMemberCreateReq>(json!({"type": t, "name": "x"}));
            assert!(r.is_err(), "{t}");
        }
    }

    #[test]
    fn create_rejects_non_numeric_age() {
        let r = serde_json::from_value::<HoloMemberCreateReq>(
            json!({"type": "2", "name": "Aqua", "twitter": "@minatoaqua", "age": "old"}),
        );
        assert!(r.is_err());
    }

    #[test]
    fn update_distinguishes_absent_and_null() {
        let req = update_req(json!({"name": "Peko", "description": null}));
        assert_eq!(req.name, Some(Some("Peko".into())));
        assert_eq!(req.description, Some(None));
        assert_eq!(req.twitter, None);
        assert_eq!(req.age, None);
    }

    #[test]
    fn update_empty_or_null_type_means_clear() {
        for v in [json!({"type": ""}), json!({"type": null})] {
            let patch = update_req(v).into_patch().unwrap();
            assert_eq!(patch.generation, Some(None));
        }
    }

    #[test]
    fn update_unknown_type_is_a_validation_error() {
        let errs = update_req(json!({"type": "gamers"})).into_patch().unwrap_err();
        assert_eq!(errs[0].pointer, "/holo_member_update/type");
    }

    #[test]
    fn update_parses_known_type_and_age() {
        let patch = update_req(json!({"type": "ID", "age": 3.14}))
            .into_patch()
            .unwrap();
        assert_eq!(patch.generation, Some(Some(GenerationType::Id)));
        let age = patch.age.flatten().map(|d| d.round_dp(2));
        assert_eq!(age, Some(Decimal::new(314, 2)));
    }

    #[test]
    fn dto_serializes_type_key() {
        let now = Utc::now();
        let dto = HoloMemberDto::from(HoloMember {
            id: 3,
            generation: GenerationType::Gamers,
            name: "Korone".into(),
            description: String::new(),
            twitter: "@inugamikorone".into(),
            age: Decimal::new(22, 1),
            created_at: now,
            updated_at: now,
        });
        let v = serde_json::to_value(&dto).unwrap();
        assert_eq!(v["type"], "Gamers");
        assert_eq!(v["age"], json!(2.2));
        assert!(v.get("generation").is_none());
    }
}
