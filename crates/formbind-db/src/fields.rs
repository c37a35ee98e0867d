//! Model metadata: attribute definitions and relations.
//!
//! A [`ModelMeta`] lists the attributes of a model. Relational attributes
//! carry a [`Relation`] describing where the link lives, which is what the
//! nested, formset and checkbox-list form fields consult to find and save
//! related rows.

use formbind_core::{FormError, FormResult};
use serde::{Deserialize, Serialize};

/// How a relational attribute links two models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// The owner's attribute holds the related row's pk.
    ForeignKey,
    /// Reverse side of a unique foreign key: at most one related row whose
    /// `remote_field` holds the owner's pk.
    OneToOne,
    /// Reverse side of a foreign key: any number of related rows whose
    /// `remote_field` holds the owner's pk.
    OneToMany,
    /// Links stored between the owner's pk and the related pks.
    ManyToMany,
}

/// The target of a relational attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// The kind of link.
    pub kind: RelationKind,
    /// The related model name.
    pub related_model: String,
    /// For reverse relations, the attribute on the related model pointing
    /// back at the owner.
    #[serde(default)]
    pub remote_field: Option<String>,
}

/// A single model attribute.
///
/// # Examples
///
/// ```
/// use formbind_db::fields::{FieldDef, RelationKind};
///
/// let jobs = FieldDef::one_to_many("jobs", "job", "person").verbose_name("Jobs");
/// assert!(jobs.is_relation());
/// assert_eq!(jobs.relation.unwrap().kind, RelationKind::OneToMany);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// The attribute name.
    pub name: String,
    /// Human-readable name.
    #[serde(default)]
    pub verbose_name: Option<String>,
    /// Relation target, `None` for plain attributes.
    #[serde(default)]
    pub relation: Option<Relation>,
}

impl FieldDef {
    /// Creates a plain (non-relational) attribute.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verbose_name: None,
            relation: None,
        }
    }

    /// Creates a forward foreign key to `related_model`.
    pub fn foreign_key(name: impl Into<String>, related_model: impl Into<String>) -> Self {
        Self::relational(name, RelationKind::ForeignKey, related_model, None)
    }

    /// Creates the reverse side of a unique foreign key declared on
    /// `related_model` as `remote_field`.
    pub fn one_to_one(
        name: impl Into<String>,
        related_model: impl Into<String>,
        remote_field: impl Into<String>,
    ) -> Self {
        Self::relational(
            name,
            RelationKind::OneToOne,
            related_model,
            Some(remote_field.into()),
        )
    }

    /// Creates the reverse side of a foreign key declared on
    /// `related_model` as `remote_field`.
    pub fn one_to_many(
        name: impl Into<String>,
        related_model: impl Into<String>,
        remote_field: impl Into<String>,
    ) -> Self {
        Self::relational(
            name,
            RelationKind::OneToMany,
            related_model,
            Some(remote_field.into()),
        )
    }

    /// Creates a many-to-many attribute.
    pub fn many_to_many(name: impl Into<String>, related_model: impl Into<String>) -> Self {
        Self::relational(name, RelationKind::ManyToMany, related_model, None)
    }

    fn relational(
        name: impl Into<String>,
        kind: RelationKind,
        related_model: impl Into<String>,
        remote_field: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            verbose_name: None,
            relation: Some(Relation {
                kind,
                related_model: related_model.into(),
                remote_field,
            }),
        }
    }

    /// Sets the human-readable name.
    #[must_use]
    pub fn verbose_name(mut self, name: impl Into<String>) -> Self {
        self.verbose_name = Some(name.into());
        self
    }

    /// Returns `true` for relational attributes.
    pub const fn is_relation(&self) -> bool {
        self.relation.is_some()
    }
}

fn default_pk_field() -> String {
    "id".to_string()
}

/// Metadata about a model: its name, primary key and attributes.
///
/// # Examples
///
/// ```
/// use formbind_db::fields::{FieldDef, ModelMeta};
///
/// let meta = ModelMeta::new("person")
///     .field(FieldDef::new("name"))
///     .field(FieldDef::one_to_many("jobs", "job", "person"));
///
/// assert_eq!(meta.pk_field, "id");
/// assert!(meta.get_field("name").is_some());
/// assert!(meta.relation("jobs").is_ok());
/// assert!(meta.relation("name").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMeta {
    /// The model name in lowercase (e.g. "person").
    pub model_name: String,
    /// The primary key attribute.
    #[serde(default = "default_pk_field")]
    pub pk_field: String,
    /// Attribute definitions, primary key excluded.
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl ModelMeta {
    /// Creates metadata with an `id` primary key and no attributes.
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            pk_field: default_pk_field(),
            fields: Vec::new(),
        }
    }

    /// Parses metadata from its JSON description.
    pub fn from_json(json: &str) -> FormResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            FormError::Config(format!("Invalid model description: {e}"))
        })
    }

    /// Adds an attribute.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Uses a different primary key attribute.
    #[must_use]
    pub fn pk(mut self, pk_field: impl Into<String>) -> Self {
        self.pk_field = pk_field.into();
        self
    }

    /// Looks up an attribute definition by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the relation behind a relational attribute.
    pub fn relation(&self, name: &str) -> FormResult<&Relation> {
        self.get_field(name)
            .and_then(|f| f.relation.as_ref())
            .ok_or_else(|| {
                FormError::Declaration(format!(
                    "'{}.{name}' is not a relational attribute",
                    self.model_name
                ))
            })
    }
}
