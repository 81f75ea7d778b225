//! Simulated cats

use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("male"),
            Gender::Female => f.write_str("female"),
        }
    }
}

/// Identity a cat is created from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatProfile {
    pub name: String,
    pub eyes: String,
}

impl CatProfile {
    pub fn new(name: impl Into<String>, eyes: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            eyes: eyes.into(),
        }
    }

    /// The household the server ships with
    pub fn default_roster() -> Vec<CatProfile> {
        vec![
            CatProfile::new("Dianusz", "blue"),
            CatProfile::new("Filemon", "red"),
            CatProfile::new("Garfield", "green"),
        ]
    }
}

/// A cat. Attributes are fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cat {
    name: String,
    eyes: String,
    gender: Gender,
}

impl Cat {
    pub fn new(name: impl Into<String>, eyes: impl Into<String>, gender: Gender) -> Self {
        Self {
            name: name.into(),
            eyes: eyes.into(),
            gender,
        }
    }

    /// Create a cat from a profile with a randomly assigned gender
    pub fn from_profile(profile: &CatProfile, random: &dyn RandomSource) -> Self {
        let gender = if random.below(2) == 0 {
            Gender::Male
        } else {
            Gender::Female
        };
        Self::new(profile.name.clone(), profile.eyes.clone(), gender)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn eyes(&self) -> &str {
        &self.eyes
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }
}
