//! [`Role`] and the small [`RoleMap`] container keyed by it.

use serde::{Deserialize, Serialize};

/// One of the two sides of a battle. Identity is relative to a specific
/// [`crate::contracts::battle::Battle`], never global.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    #[default]
    Player1,
    Player2,
}

impl Role {
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Player1 => Self::Player2,
            Self::Player2 => Self::Player1,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Player1 => "player1",
            Self::Player2 => "player2",
        }
    }

    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "player1" => Some(Self::Player1),
            "player2" => Some(Self::Player2),
            _ => None,
        }
    }
}

/// A value present for both roles of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMap<T> {
    pub player1: T,
    pub player2: T,
}

impl<T> RoleMap<T> {
    pub fn new(player1: T, player2: T) -> Self {
        Self { player1, player2 }
    }

    pub fn get(&self, role: Role) -> &T {
        match role {
            Role::Player1 => &self.player1,
            Role::Player2 => &self.player2,
        }
    }

    pub fn get_mut(&mut self, role: Role) -> &mut T {
        match role {
            Role::Player1 => &mut self.player1,
            Role::Player2 => &mut self.player2,
        }
    }

    pub fn set(&mut self, role: Role, value: T) {
        *self.get_mut(role) = value;
    }
}

impl<T: Clone> RoleMap<T> {
    pub fn both(value: T) -> Self {
        Self {
            player1: value.clone(),
            player2: value,
        }
    }
}
