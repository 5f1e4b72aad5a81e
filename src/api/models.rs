use serde::{Deserialize, Serialize};

use crate::scrape::identity::slug_from_name;

// OpenDota /api/heroes entry; also the on-disk shape of heroes.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub localized_name: String,
    #[serde(default)]
    pub primary_attr: String,
    #[serde(default)]
    pub attack_type: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub legs: i32,
}

impl Hero {
    pub fn new(id: i64, localized_name: &str) -> Self {
        Hero {
            id,
            name: String::new(),
            localized_name: localized_name.to_string(),
            primary_attr: String::new(),
            attack_type: String::new(),
            roles: Vec::new(),
            legs: 0,
        }
    }

    /// URL segment identifying this hero on the stats source.
    pub fn slug(&self) -> String {
        slug_from_name(&self.localized_name)
    }
}
