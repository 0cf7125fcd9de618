//! The rc file holding rules, settings and the synthesized filter.
//!
//! `need.rc` is a flat `key=value` file that Taskwarrior also reads through
//! an `include` line, so every line this module does not own is preserved
//! byte for byte when a value is rewritten.

use crate::error::{NeedError, Result};
use crate::filter::FilterSettings;
use crate::tier::Tier;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key of the tier window width.
pub const SPAN_KEY: &str = "priority.span";
/// Key of the due/scheduled lookahead.
pub const LOOKAHEAD_KEY: &str = "priority.lookahead";
/// Key of the overdue lookback.
pub const LOOKBACK_KEY: &str = "priority.lookback";
/// Key of the tier used when no rule matches.
pub const DEFAULT_KEY: &str = "priority.default";
/// Key of the synthesized context filter.
pub const FILTER_KEY: &str = "context.needs.read";

const TMP_SUFFIX: &str = ".tmp";

/// Settings as read from the store, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub span: String,
    pub lookahead: String,
    pub lookback: String,
    pub default_tier: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            span: "2".to_string(),
            lookahead: "2d".to_string(),
            lookback: "1w".to_string(),
            default_tier: Tier::DEFAULT.to_string(),
        }
    }
}

impl Settings {
    /// Validate span, lookahead and lookback.
    ///
    /// # Errors
    ///
    /// Returns [`NeedError::InvalidConfig`] for any unparseable value.
    pub fn filter_settings(&self) -> Result<FilterSettings> {
        FilterSettings::parse(&self.span, &self.lookahead, &self.lookback)
    }

    /// Validate the default tier.
    ///
    /// # Errors
    ///
    /// Returns [`NeedError::InvalidConfig`] when it is not a tier.
    pub fn default_tier(&self) -> Result<Tier> {
        self.default_tier
            .parse()
            .map_err(|e: crate::tier::ParseTierError| NeedError::invalid(DEFAULT_KEY, e.to_string()))
    }
}

/// Partial settings change. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub span: Option<String>,
    pub lookahead: Option<String>,
    pub lookback: Option<String>,
}

impl SettingsUpdate {
    /// Keys and values to write, in a fixed order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (SPAN_KEY, self.span.as_deref()),
            (LOOKAHEAD_KEY, self.lookahead.as_deref()),
            (LOOKBACK_KEY, self.lookback.as_deref()),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
    }
}

/// Storage for rules, settings and the last synthesized filter.
///
/// Each write is durable on return; multi-key atomicity is not assumed.
pub trait ConfigStore {
    /// Raw text containing the `priority.<tier>.auto` rule lines.
    fn read_rules(&self) -> Result<String>;

    /// Current settings, with defaults for missing keys.
    fn read_settings(&self) -> Result<Settings>;

    /// Last written filter, if any.
    fn read_filter(&self) -> Result<Option<String>>;

    /// Replace the stored filter.
    fn write_filter(&mut self, filter: &str) -> Result<()>;

    /// Apply a partial settings change.
    fn write_settings(&mut self, update: &SettingsUpdate) -> Result<()>;
}

/// Look up the first value for `key` in rc-style text.
#[must_use]
pub fn get_value<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.lines().find_map(|line| {
        let (k, v) = line.trim().split_once('=')?;
        (k.trim() == key).then(|| v.trim())
    })
}

/// Set `key` in rc-style text, replacing its first line or appending one.
#[must_use]
pub fn set_value(text: &str, key: &str, value: &str) -> String {
    let mut found = false;
    let mut out: Vec<String> = text
        .lines()
        .map(|line| {
            let is_key = !found
                && line
                    .trim()
                    .split_once('=')
                    .is_some_and(|(k, _)| k.trim() == key);
            if is_key {
                found = true;
                format!("{key}={value}")
            } else {
                line.to_string()
            }
        })
        .collect();

    if !found {
        out.push(format!("{key}={value}"));
    }

    let mut joined = out.join("\n");
    joined.push('\n');
    joined
}

/// Settings from rc-style text. `priority.span` wins over the bare `span`
/// alias; missing keys fall back to defaults.
#[must_use]
pub fn parse_settings(text: &str) -> Settings {
    let defaults = Settings::default();
    let lookup = |key: &str, alias: &str, default: String| {
        get_value(text, key)
            .or_else(|| get_value(text, alias))
            .map_or(default, str::to_string)
    };

    Settings {
        span: lookup(SPAN_KEY, "span", defaults.span),
        lookahead: lookup(LOOKAHEAD_KEY, "lookahead", defaults.lookahead),
        lookback: lookup(LOOKBACK_KEY, "lookback", defaults.lookback),
        default_tier: get_value(text, DEFAULT_KEY).map_or(defaults.default_tier, str::to_string),
    }
}

/// [`ConfigStore`] backed by a `need.rc` file.
#[derive(Debug, Clone)]
pub struct RcFile {
    path: PathBuf,
}

impl RcFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.task/hooks/priority/need.rc`
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".task")
            .join("hooks")
            .join("priority")
            .join("need.rc")
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the rc file, used for logs.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Whole file contents. A missing file reads as empty.
    pub fn read_text(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the whole file via a temp file and rename.
    pub fn write_text(&self, text: &str) -> Result<()> {
        fs::create_dir_all(self.dir())?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(TMP_SUFFIX);
        let tmp_path = PathBuf::from(tmp_name);

        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(text.as_bytes())?;
        tmp_file.sync_all()?;

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Write the default rc template unless the file exists.
    ///
    /// Returns `true` if a file was written.
    pub fn init(&self, force: bool) -> Result<bool> {
        if self.path.exists() && !force {
            return Ok(false);
        }
        self.write_text(&default_rc())?;
        Ok(true)
    }
}

impl ConfigStore for RcFile {
    fn read_rules(&self) -> Result<String> {
        self.read_text()
    }

    fn read_settings(&self) -> Result<Settings> {
        Ok(parse_settings(&self.read_text()?))
    }

    fn read_filter(&self) -> Result<Option<String>> {
        Ok(get_value(&self.read_text()?, FILTER_KEY)
            .filter(|v| !v.is_empty())
            .map(str::to_string))
    }

    fn write_filter(&mut self, filter: &str) -> Result<()> {
        let text = set_value(&self.read_text()?, FILTER_KEY, filter);
        self.write_text(&text)?;
        debug!(path = %self.path.display(), "Filter written");
        Ok(())
    }

    fn write_settings(&mut self, update: &SettingsUpdate) -> Result<()> {
        let mut text = self.read_text()?;
        for (key, value) in update.entries() {
            text = set_value(&text, key, value);
        }
        self.write_text(&text)
    }
}

/// Taskwarrior configuration for the `priority` UDA and its urgency
/// coefficients.
#[must_use]
pub fn taskrc_snippet() -> String {
    let mut rc = String::from(
        "uda.priority.type=string\n\
         uda.priority.label=Need\n\
         uda.priority.values=1,2,3,4,5,6\n",
    );
    rc.push_str(&format!("uda.priority.default={}\n\n", Tier::DEFAULT));

    for tier in Tier::all() {
        rc.push_str(&format!(
            "urgency.uda.priority.{}.coefficient={:.1}\n",
            tier,
            tier.urgency_coefficient()
        ));
    }
    rc
}

/// Template for a fresh `need.rc`.
#[must_use]
pub fn default_rc() -> String {
    let mut rc = String::from(
        "# need: hierarchy-of-needs priorities for Taskwarrior\n\
         # Include from ~/.taskrc with: include ~/.task/hooks/priority/need.rc\n\
         \n",
    );
    rc.push_str(&taskrc_snippet());

    let settings = Settings::default();
    rc.push_str(&format!(
        "\n{SPAN_KEY}={}\n{LOOKAHEAD_KEY}={}\n{LOOKBACK_KEY}={}\n\n",
        settings.span, settings.lookahead, settings.lookback
    ));

    rc.push_str(
        "# Auto-assignment rules: +tag, proj:name, proj.has:text, desc.has:text\n\
         #priority.1.auto=+meds,desc.has:water\n\
         #priority.2.auto=+bills,proj.has:health\n\
         #priority.3.auto=+family\n\
         #priority.6.auto=+goals\n\
         \n",
    );
    rc.push_str(&format!("{FILTER_KEY}=\n"));
    rc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;
    use tempfile::TempDir;

    #[test]
    fn test_get_value_first_wins() {
        let text = "a=1\npriority.span = 3\npriority.span=4\n";
        assert_eq!(get_value(text, "priority.span"), Some("3"));
        assert_eq!(get_value(text, "missing"), None);
    }

    #[test]
    fn test_set_value_replaces_in_place() {
        let text = "# header\npriority.span=2\nother=x";
        let updated = set_value(text, SPAN_KEY, "3");
        assert_eq!(updated, "# header\npriority.span=3\nother=x\n");
    }

    #[test]
    fn test_set_value_appends_when_missing() {
        let updated = set_value("a=1\n", FILTER_KEY, "priority:1");
        assert_eq!(updated, "a=1\ncontext.needs.read=priority:1\n");
    }

    #[test]
    fn test_set_value_keeps_filter_text_with_equals() {
        let text = set_value("", FILTER_KEY, "a=b");
        assert_eq!(get_value(&text, FILTER_KEY), Some("a=b"));
    }

    #[test]
    fn test_settings_defaults_and_aliases() {
        assert_eq!(parse_settings(""), Settings::default());

        let settings = parse_settings("span=2-4\nlookahead=3d\npriority.lookback=2w\n");
        assert_eq!(settings.span, "2-4");
        assert_eq!(settings.lookahead, "3d");
        assert_eq!(settings.lookback, "2w");

        let settings = parse_settings("span=1\npriority.span=5\n");
        assert_eq!(settings.span, "5");
    }

    #[test]
    fn test_default_tier_validation() {
        let settings = parse_settings("priority.default=9\n");
        assert!(matches!(
            settings.default_tier(),
            Err(NeedError::InvalidConfig { .. })
        ));
        assert_eq!(Settings::default().default_tier().unwrap(), Tier::DEFAULT);
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let temp = TempDir::new().unwrap();
        let rc = RcFile::new(temp.path().join("need.rc"));
        assert_eq!(rc.read_text().unwrap(), "");
        assert_eq!(rc.read_settings().unwrap(), Settings::default());
        assert_eq!(rc.read_filter().unwrap(), None);
    }

    #[test]
    fn test_write_filter_preserves_other_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("need.rc");
        fs::write(&path, "priority.1.auto=+meds\ncontext.needs.read=old\n").unwrap();

        let mut rc = RcFile::new(&path);
        rc.write_filter("priority:1 or priority:2").unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "priority.1.auto=+meds\ncontext.needs.read=priority:1 or priority:2\n"
        );
        assert_eq!(
            rc.read_filter().unwrap().as_deref(),
            Some("priority:1 or priority:2")
        );
        assert!(!temp.path().join("need.rc.tmp").exists());
    }

    #[test]
    fn test_write_settings_partial() {
        let temp = TempDir::new().unwrap();
        let mut rc = RcFile::new(temp.path().join("nested").join("need.rc"));
        rc.write_settings(&SettingsUpdate {
            span: Some("3".into()),
            ..Default::default()
        })
        .unwrap();
        rc.write_settings(&SettingsUpdate {
            lookback: Some("2w".into()),
            ..Default::default()
        })
        .unwrap();

        let settings = rc.read_settings().unwrap();
        assert_eq!(settings.span, "3");
        assert_eq!(settings.lookahead, "2d");
        assert_eq!(settings.lookback, "2w");
    }

    #[test]
    fn test_init_does_not_clobber() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("need.rc");
        let rc = RcFile::new(&path);
        assert!(rc.init(false).unwrap());
        fs::write(&path, "priority.span=5\n").unwrap();
        assert!(!rc.init(false).unwrap());
        assert_eq!(rc.read_settings().unwrap().span, "5");
        assert!(rc.init(true).unwrap());
        assert_eq!(rc.read_settings().unwrap().span, "2");
    }

    #[test]
    fn test_default_rc_is_loadable() {
        let text = default_rc();
        assert!(RuleSet::load(&text).unwrap().is_empty());
        assert!(parse_settings(&text).filter_settings().is_ok());
        assert!(text.contains("urgency.uda.priority.1.coefficient=20.0"));
        assert!(text.contains("urgency.uda.priority.6.coefficient=0.0"));
        assert_eq!(get_value(&text, FILTER_KEY), Some(""));
    }
}
