use sea_orm::ActiveValue::{NotSet, Set, Unchanged};

use crate::contract::model::{GenerationType, HoloMember, NewHoloMember, UnknownGenerationType};
use crate::infra::storage::entity::{ActiveModel, Model};

impl TryFrom<Model> for HoloMember {
    type Error = UnknownGenerationType;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            generation: m.generation.parse::<GenerationType>()?,
            name: m.name,
            description: m.description,
            twitter: m.twitter,
            age: m.age,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

/// Insert model; the id comes from the sequence.
pub fn insert_model(new: NewHoloMember, at: chrono::DateTime<chrono::Utc>) -> ActiveModel {
    ActiveModel {
        id: NotSet,
        generation: Set(new.generation.as_str().to_owned()),
        name: Set(new.name),
        description: Set(new.description),
        twitter: Set(new.twitter),
        age: Set(new.age),
        created_at: Set(at),
        updated_at: Set(at),
    }
}

/// Update model writing every business column plus `updated_at`.
pub fn update_model(m: &HoloMember) -> ActiveModel {
    ActiveModel {
        id: Unchanged(m.id),
        generation: Set(m.generation.as_str().to_owned()),
        name: Set(m.name.clone()),
        description: Set(m.description.clone()),
        twitter: Set(m.twitter.clone()),
        age: Set(m.age),
        created_at: Unchanged(m.created_at),
        updated_at: Set(m.updated_at),
    }
}
