//! Newtype identifiers. Each wraps a [`uuid::Uuid`] so that a
//! `ParticipantId` and an `AttackId` can never be swapped by accident at
//! a call site, the same discipline the teacher applies to its `TypeId`/
//! `PropertyId` wrappers in `contracts::game_system`.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(ParticipantId);
id_type!(AttackId);
id_type!(ScriptId);
id_type!(BattleId);
id_type!(RegistrationId);
