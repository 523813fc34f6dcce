//! Normalizer configuration

/// Fallback line identifier used when a row carries none
pub const DEFAULT_LINE_ID: &str = "1호기";

/// Default prediction window start offset (hours)
pub const DEFAULT_PREDICTION_START_HOURS: f64 = 24.0;

/// Default prediction window end offset (hours)
pub const DEFAULT_PREDICTION_END_HOURS: f64 = 36.0;

/// Source column names for each canonical field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub timestamp: String,
    pub line: String,
    pub tool: String,
    pub torque: String,
    pub rpm: String,
    pub feed_rate: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            timestamp: "TimeLine".into(),
            line: "ProductionLine".into(),
            tool: "Tool_Num".into(),
            torque: "Troq".into(),
            rpm: "RPM".into(),
            feed_rate: "Feed".into(),
        }
    }
}

impl ColumnMap {
    pub(super) fn names(&self) -> [&str; 6] {
        [
            &self.timestamp,
            &self.line,
            &self.tool,
            &self.torque,
            &self.rpm,
            &self.feed_rate,
        ]
    }
}

/// Normalization options
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeConfig {
    /// Only keep rows whose line field matches exactly (None = all)
    pub line_filter: Option<String>,

    /// Only keep rows whose tool field matches exactly (None = all)
    pub tool_filter: Option<String>,

    /// Line identifier substituted when the row has none
    pub default_line: String,

    /// Prediction window start, hours after the record timestamp
    pub prediction_start_hours: f64,

    /// Prediction window end, hours after the record timestamp
    pub prediction_end_hours: f64,

    /// Source column names
    pub columns: ColumnMap,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            line_filter: None,
            tool_filter: None,
            default_line: DEFAULT_LINE_ID.into(),
            prediction_start_hours: DEFAULT_PREDICTION_START_HOURS,
            prediction_end_hours: DEFAULT_PREDICTION_END_HOURS,
            columns: ColumnMap::default(),
        }
    }
}

impl NormalizeConfig {
    /// Filter by line identifier; an empty string disables the filter
    pub fn line_filter(mut self, line: impl Into<String>) -> Self {
        self.line_filter = non_empty(line.into());
        self
    }

    /// Filter by tool identifier; an empty string disables the filter
    pub fn tool_filter(mut self, tool: impl Into<String>) -> Self {
        self.tool_filter = non_empty(tool.into());
        self
    }

    /// Set the fallback line identifier
    pub fn default_line(mut self, line: impl Into<String>) -> Self {
        self.default_line = line.into();
        self
    }

    /// Set the prediction window offsets in hours
    pub fn prediction_offsets(mut self, start_hours: f64, end_hours: f64) -> Self {
        self.prediction_start_hours = start_hours;
        self.prediction_end_hours = end_hours;
        self
    }

    /// Use custom source column names
    pub fn columns(mut self, columns: ColumnMap) -> Self {
        self.columns = columns;
        self
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NormalizeConfig::default();

        assert!(config.line_filter.is_none());
        assert!(config.tool_filter.is_none());
        assert_eq!(config.default_line, DEFAULT_LINE_ID);
        assert_eq!(config.prediction_start_hours, 24.0);
        assert_eq!(config.prediction_end_hours, 36.0);
        assert_eq!(config.columns.rpm, "RPM");
    }

    #[test]
    fn test_empty_filter_disables() {
        let config = NormalizeConfig::default().line_filter("").tool_filter("4242");

        assert!(config.line_filter.is_none());
        assert_eq!(config.tool_filter.as_deref(), Some("4242"));
    }

    #[test]
    fn test_builder_chaining() {
        let config = NormalizeConfig::default()
            .line_filter("2호기")
            .default_line("line-x")
            .prediction_offsets(1.0, 2.5);

        assert_eq!(config.line_filter.as_deref(), Some("2호기"));
        assert_eq!(config.default_line, "line-x");
        assert_eq!(config.prediction_start_hours, 1.0);
        assert_eq!(config.prediction_end_hours, 2.5);
    }
}
