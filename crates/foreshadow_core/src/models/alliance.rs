use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of teams on one alliance.
pub const ALLIANCE_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alliance {
    Red,
    Blue,
}

impl fmt::Display for Alliance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Alliance::Red => write!(f, "red"),
            Alliance::Blue => write!(f, "blue"),
        }
    }
}
