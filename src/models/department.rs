use serde::{Deserialize, Serialize};

use super::Module;

/// An organizational unit holding at most one external report URL per module.
/// A missing URL means "not configured", never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plex_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grd_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ugb_url: Option<String>,
}

impl Department {
    /// Returns the configured report URL for a module, treating empty and
    /// whitespace-only values as unset.
    #[must_use]
    pub fn report_url(&self, module: Module) -> Option<&str> {
        let url = match module {
            Module::Plex => self.plex_url.as_deref(),
            Module::Grd => self.grd_url.as_deref(),
            Module::Ugb => self.ugb_url.as_deref(),
        };
        url.map(str::trim).filter(|u| !u.is_empty())
    }

    /// Modules this department has a report configured for.
    #[must_use]
    pub fn configured_modules(&self) -> Vec<Module> {
        Module::ALL
            .into_iter()
            .filter(|m| self.report_url(*m).is_some())
            .collect()
    }
}
