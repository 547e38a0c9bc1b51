use serde::{Deserialize, Serialize};

use crate::{
    constants::MAX_NAME_LENGTH,
    error::ValidationError,
    form::Form,
    schema::{RelatedRecord, Uuid},
};

/// Incoming `{name}` object, for a tag or an ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedPayload {
    pub name: String,
}

pub type TagPayload = RelatedPayload;
pub type IngredientPayload = RelatedPayload;

/// Outgoing `{id, name}` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedData {
    pub id: Uuid,
    pub name: String,
}

pub type TagData = RelatedData;
pub type IngredientData = RelatedData;

impl From<&RelatedRecord> for RelatedData {
    fn from(value: &RelatedRecord) -> Self {
        Self {
            id: value.id,
            name: value.name.to_owned(),
        }
    }
}

impl RelatedPayload {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
        }
    }

    /// `id` is read-only and ignored if present. Returns `None` only for a
    /// partial update that leaves the name untouched.
    pub fn validate(form: &Form, partial: bool) -> Result<Option<Self>, ValidationError> {
        match form.get_str("name", MAX_NAME_LENGTH, false) {
            Some(Ok(name)) => Ok(Some(Self { name })),
            Some(Err(e)) => Err(ValidationError::field("name", e.info())),
            None if partial => Ok(None),
            None => Err(ValidationError::field("name", "This field is required.")),
        }
    }
}
