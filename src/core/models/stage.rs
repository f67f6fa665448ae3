//! Stages of a protocol's display sequence

use chrono::{DateTime, Utc};

use super::ids;
use super::screen::Screen;

/// One step in a protocol's display sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Creation time
    pub created_date: DateTime<Utc>,
    /// Screens; index 0 is the main screen
    pub screens: Vec<Screen>,
}

impl Stage {
    /// Empty stage with a fresh id
    pub fn new(name: Option<String>) -> Self {
        Self {
            id: ids::generate_id(),
            name,
            created_date: Utc::now(),
            screens: Vec::new(),
        }
    }

    /// Builder: append a screen
    #[must_use]
    pub fn with_screen(mut self, screen: Screen) -> Self {
        self.screens.push(screen);
        self
    }

    /// The main (first) screen
    #[must_use]
    pub fn main_screen(&self) -> Option<&Screen> {
        self.screens.first()
    }

    /// Make `screen` the main screen
    ///
    /// A screen already in the stage (same id) swaps places with the current
    /// main screen; an unknown screen is prepended.
    pub fn set_main_screen(&mut self, screen: Screen) {
        match self.screens.iter().position(|s| s.id == screen.id) {
            Some(0) => {},
            Some(index) => self.screens.swap(0, index),
            None => self.screens.insert(0, screen),
        }
    }

    /// Copy of the stage under a fresh id, optionally renamed
    #[must_use]
    pub fn create_clone(&self, name: Option<&str>) -> Self {
        let mut clone = self.clone();
        clone.id = ids::generate_id();
        if let Some(name) = name {
            clone.name = Some(name.to_string());
        }
        clone
    }
}
