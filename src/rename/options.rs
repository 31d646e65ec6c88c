//! Rename rules: the user-facing option set and its validated form.

use serde::{Deserialize, Serialize};

use crate::errors::{OrganizeError, Result};

/// Longest zero-padded counter accepted.
pub const MAX_NUMBER_DIGITS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindReplace {
    pub find: String,
    #[serde(default)]
    pub replace: String,
    /// Replace every occurrence instead of only the first.
    #[serde(default)]
    pub all: bool,
    #[serde(default = "default_true")]
    pub match_case: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CaseTransform {
    Lower,
    Upper,
    /// First letter of every word upper, the rest lower.
    Title,
    /// First letter upper, the rest lower.
    Sentence,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NumberPosition {
    Prefix,
    #[default]
    Suffix,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Numbering {
    /// Number given to the first file; later files add their index.
    pub start: u64,
    /// Zero-padded width.
    pub digits: usize,
    #[serde(default)]
    pub position: NumberPosition,
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_separator() -> String {
    "_".to_string()
}

impl Default for Numbering {
    fn default() -> Self {
        Self {
            start: 1,
            digits: 3,
            position: NumberPosition::Suffix,
            separator: default_separator(),
        }
    }
}

/// Raw rename options as supplied by a caller. Turn into `RenameRules` before use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOptions {
    #[serde(default)]
    pub find_replace: Option<FindReplace>,
    #[serde(default)]
    pub case: Option<CaseTransform>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub number: Option<Numbering>,
}

impl RenameOptions {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn with_case(mut self, case: CaseTransform) -> Self {
        self.case = Some(case);
        self
    }

    pub fn with_find_replace(mut self, fr: FindReplace) -> Self {
        self.find_replace = Some(fr);
        self
    }

    pub fn with_number(mut self, number: Numbering) -> Self {
        self.number = Some(number);
        self
    }

    /// Validate once and freeze.
    pub fn validate(self) -> Result<RenameRules> {
        if self.find_replace.is_none()
            && self.case.is_none()
            && self.prefix.as_deref().is_none_or(str::is_empty)
            && self.suffix.as_deref().is_none_or(str::is_empty)
            && self.number.is_none()
        {
            return Err(OrganizeError::InvalidOptions("no rename rule given".into()));
        }
        if let Some(fr) = &self.find_replace {
            if fr.find.is_empty() {
                return Err(OrganizeError::InvalidOptions("find text is empty".into()));
            }
            reject_separators("replacement", &fr.replace)?;
        }
        if let Some(p) = &self.prefix {
            reject_separators("prefix", p)?;
        }
        if let Some(s) = &self.suffix {
            reject_separators("suffix", s)?;
        }
        if let Some(n) = &self.number {
            if n.digits == 0 || n.digits > MAX_NUMBER_DIGITS {
                return Err(OrganizeError::InvalidOptions(format!(
                    "number width must be between 1 and {MAX_NUMBER_DIGITS}, got {}",
                    n.digits
                )));
            }
            reject_separators("number separator", &n.separator)?;
        }
        Ok(RenameRules(self))
    }
}

fn reject_separators(what: &str, value: &str) -> Result<()> {
    if value.contains(['/', '\\']) {
        return Err(OrganizeError::InvalidOptions(format!(
            "{what} must not contain path separators: '{value}'"
        )));
    }
    Ok(())
}

/// Options that passed validation. The only input the rename engine accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameRules(RenameOptions);

impl RenameRules {
    pub fn options(&self) -> &RenameOptions {
        &self.0
    }
}

impl TryFrom<RenameOptions> for RenameRules {
    type Error = OrganizeError;

    fn try_from(options: RenameOptions) -> Result<Self> {
        options.validate()
    }
}
