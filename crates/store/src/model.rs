use crate::error::StoreError;
use crate::schema::{FieldKind, FieldMap, FieldSpec, Schema};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Store-generated record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Mint a fresh identifier. Only the store calls this.
    pub(crate) fn generate() -> Self {
        RecordId(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything the store can persist as a JSON document in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> &RecordId;
}

/// Builds an entity from its assigned id and a schema-cast document.
pub type Constructor<E> = fn(RecordId, FieldMap) -> Result<E, StoreError>;

/// Everything the store needs to persist one kind of entity: a label used in
/// messages, the collection it lives in, its schema and a constructor.
pub struct Model<E> {
    name: &'static str,
    collection: &'static str,
    schema: Schema,
    constructor: Constructor<E>,
}

impl<E: Entity> Model<E> {
    pub fn new(
        name: &'static str,
        collection: &'static str,
        schema: Schema,
        constructor: Constructor<E>,
    ) -> Self {
        Self {
            name,
            collection,
            schema,
            constructor,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Cast `data` against the schema and run the constructor.
    pub fn construct(&self, id: RecordId, data: &FieldMap) -> Result<E, StoreError> {
        let doc = self.schema.apply(self.name, data)?;
        (self.constructor)(id, doc)
    }
}

/// Result of a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRecord {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub message: String,
}

const PERSON_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional("firstName", FieldKind::Text),
    FieldSpec::optional("lastName", FieldKind::Text),
    FieldSpec::optional("address", FieldKind::Text),
    FieldSpec::optional("age", FieldKind::Integer),
];

/// The person record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
}

impl Person {
    pub const MODEL_NAME: &'static str = "Person";
    pub const COLLECTION: &'static str = "people";

    pub fn model() -> Model<Person> {
        Model::new(
            Self::MODEL_NAME,
            Self::COLLECTION,
            Schema::new(PERSON_FIELDS),
            Person::from_document,
        )
    }

    fn from_document(id: RecordId, doc: FieldMap) -> Result<Self, StoreError> {
        let text = |key: &str| doc.get(key).and_then(Value::as_str).map(str::to_string);
        Ok(Self {
            id,
            first_name: text("firstName"),
            last_name: text("lastName"),
            address: text("address"),
            age: doc.get("age").and_then(Value::as_i64),
        })
    }
}

impl Entity for Person {
    fn id(&self) -> &RecordId {
        &self.id
    }
}
