//! Hero directory, current patch and favourite heroes, persisted next to
//! the caches.

use std::path::Path;

use crate::api::models::Hero;
use crate::error::AppError;
use crate::models::{FavoriteHeroes, Patch};
use crate::scrape::identity::{match_by_name, slug_from_name};
use crate::storage::JsonDocument;

pub const HEROES_FILE: &str = "heroes.json";
pub const PATCH_FILE: &str = "patch.json";
pub const FAVORITES_FILE: &str = "favorites.json";

pub struct HeroDirectory {
    document: JsonDocument<Vec<Hero>>,
}

impl HeroDirectory {
    pub fn new(data_dir: &Path) -> Self {
        HeroDirectory {
            document: JsonDocument::new(data_dir.join(HEROES_FILE)),
        }
    }

    /// Empty when no directory has been saved yet.
    pub fn load(&self) -> Result<Vec<Hero>, AppError> {
        Ok(self.document.load()?.unwrap_or_default())
    }

    pub fn save(&self, heroes: &[Hero]) -> Result<(), AppError> {
        self.document.save(&heroes.to_vec())
    }

    /// Looks a hero up by display name ("Nature's Prophet") or slug
    /// ("natures-prophet").
    pub fn find<'h>(heroes: &'h [Hero], query: &str) -> Option<&'h Hero> {
        let query = query.trim();
        match_by_name(query, heroes).or_else(|| {
            let slug = slug_from_name(query);
            heroes.iter().find(|hero| hero.slug() == slug)
        })
    }
}

pub struct PatchStore {
    document: JsonDocument<Patch>,
}

impl PatchStore {
    pub fn new(data_dir: &Path) -> Self {
        PatchStore {
            document: JsonDocument::new(data_dir.join(PATCH_FILE)),
        }
    }

    pub fn current(&self) -> Result<Option<Patch>, AppError> {
        self.document.load()
    }

    pub fn set(&self, version: &str) -> Result<Patch, AppError> {
        let patch = Patch::new(version);
        if patch.version.is_empty() {
            return Err(AppError::ConfigError("Patch version cannot be empty".to_string()));
        }
        self.document.save(&patch)?;
        Ok(patch)
    }
}

pub struct FavoritesStore {
    document: JsonDocument<FavoriteHeroes>,
}

impl FavoritesStore {
    pub fn new(data_dir: &Path) -> Self {
        FavoritesStore {
            document: JsonDocument::new(data_dir.join(FAVORITES_FILE)),
        }
    }

    /// Empty list when nothing has been saved yet.
    pub fn load(&self) -> Result<FavoriteHeroes, AppError> {
        Ok(self.document.load()?.unwrap_or_default())
    }

    /// Returns false, without writing, when the hero already is a favourite.
    pub fn add(&self, hero_id: i64) -> Result<bool, AppError> {
        self.update(|favorites| favorites.add(hero_id))
    }

    /// Returns false, without writing, when the hero is not a favourite.
    pub fn remove(&self, hero_id: i64) -> Result<bool, AppError> {
        self.update(|favorites| favorites.remove(hero_id))
    }

    fn update(&self, change: impl FnOnce(&mut FavoriteHeroes) -> bool) -> Result<bool, AppError> {
        let mut favorites = self.load()?;
        let changed = change(&mut favorites);
        if changed {
            self.document.save(&favorites)?;
        }
        Ok(changed)
    }
}
