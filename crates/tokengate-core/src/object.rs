//! Objects an actor can present to a guarded resource

use crate::credential::{Credential, IdentityToken};
use crate::identifiers::ObjectId;
use serde::{Deserialize, Serialize};

/// Any object that is not an identity token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thing {
    /// Database reference
    pub id: ObjectId,
    /// Display name
    pub name: String,
    /// Engine type name, e.g. `RealThing`
    pub typename: String,
}

impl Thing {
    /// Create a plain object
    pub fn new(id: ObjectId, name: impl Into<String>, typename: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            typename: typename.into(),
        }
    }
}

/// An object as seen by the "use X with Y" dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldObject {
    /// Credential holder
    IdentityToken(IdentityToken),
    /// Anything else
    Thing(Thing),
}

impl WorldObject {
    /// Database reference of the object
    pub fn id(&self) -> ObjectId {
        match self {
            WorldObject::IdentityToken(token) => token.id,
            WorldObject::Thing(thing) => thing.id,
        }
    }

    /// Display name of the object
    pub fn name(&self) -> &str {
        match self {
            WorldObject::IdentityToken(token) => &token.name,
            WorldObject::Thing(thing) => &thing.name,
        }
    }

    /// Engine type name of the object
    pub fn typename(&self) -> &str {
        match self {
            WorldObject::IdentityToken(_) => IdentityToken::TYPENAME,
            WorldObject::Thing(thing) => &thing.typename,
        }
    }

    /// The credential this object carries, if it is an issued identity token
    pub fn credential(&self) -> Option<Credential> {
        match self {
            WorldObject::IdentityToken(token) => token.credential(),
            WorldObject::Thing(_) => None,
        }
    }
}

impl From<IdentityToken> for WorldObject {
    fn from(token: IdentityToken) -> Self {
        WorldObject::IdentityToken(token)
    }
}

impl From<Thing> for WorldObject {
    fn from(thing: Thing) -> Self {
        WorldObject::Thing(thing)
    }
}
