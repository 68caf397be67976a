//! Hierarchical filter selection (VP → director → team) and the monthly toggle.

use crate::api::payload::RequestParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected filter or export intent. Logged by the controller, never shown to
/// the user: the UI prevents these paths up front.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    EmptyValue(&'static str),

    #[error("a director requires a VP to be selected first")]
    DirectorWithoutVp,

    #[error("a team requires a director to be selected first")]
    TeamWithoutDirector,

    #[error("export is not available: {0}")]
    ExportDisabled(&'static str),
}

/// Hierarchy level that must be selected before the dashboard allows export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequiredLevel {
    #[default]
    Vp,
    Director,
}

impl RequiredLevel {
    /// Hint shown while the required level is missing.
    pub fn prompt(&self) -> &'static str {
        match self {
            RequiredLevel::Vp => "Please select the VP",
            RequiredLevel::Director => "Please select the Director",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSelection {
    pub vp: Option<String>,
    pub director: Option<String>,
    pub team: Option<String>,
    pub monthly: bool,
}

impl FilterSelection {
    pub fn is_baseline(&self) -> bool {
        *self == Self::default()
    }

    pub fn has_level(&self, level: RequiredLevel) -> bool {
        match level {
            RequiredLevel::Vp => self.vp.is_some(),
            RequiredLevel::Director => self.director.is_some(),
        }
    }

    /// Query parameters scoping a backend request to this selection.
    pub fn to_params(&self) -> RequestParams {
        let mut params = RequestParams::new();
        if let Some(vp) = &self.vp {
            params.push("vp", vp.as_str());
        }
        if let Some(director) = &self.director {
            params.push("director", director.as_str());
        }
        if let Some(team) = &self.team {
            params.push("team", team.as_str());
        }
        params.push("monthly", self.monthly.to_string());
        params
    }
}

/// Owner of the current [`FilterSelection`]. Every setter keeps the hierarchy
/// invariant: a lower level is only set when every level above it is.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    selection: FilterSelection,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn set_vp(&mut self, vp: impl Into<String>) -> Result<(), ValidationError> {
        let vp = non_blank(vp.into(), "vp")?;
        self.selection.vp = Some(vp);
        self.selection.director = None;
        self.selection.team = None;
        Ok(())
    }

    /// `None` clears the director (and the team under it).
    pub fn set_director(&mut self, director: Option<String>) -> Result<(), ValidationError> {
        let director = director.map(|d| non_blank(d, "director")).transpose()?;
        if director.is_some() && self.selection.vp.is_none() {
            return Err(ValidationError::DirectorWithoutVp);
        }
        self.selection.director = director;
        self.selection.team = None;
        Ok(())
    }

    /// `None` clears the team.
    pub fn set_team(&mut self, team: Option<String>) -> Result<(), ValidationError> {
        let team = team.map(|t| non_blank(t, "team")).transpose()?;
        if team.is_some() && self.selection.director.is_none() {
            return Err(ValidationError::TeamWithoutDirector);
        }
        self.selection.team = team;
        Ok(())
    }

    pub fn set_monthly_toggle(&mut self, monthly: bool) {
        self.selection.monthly = monthly;
    }

    pub fn reset(&mut self) {
        self.selection = FilterSelection::default();
    }
}

fn non_blank(value: String, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyValue(field));
    }
    Ok(trimmed.to_string())
}
