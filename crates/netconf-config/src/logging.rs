//! Output format for the server's `tracing` events.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How log events are rendered on stderr.
///
/// Set with `--log-format`, `NETCONF_LOG_FORMAT` or `log_format` in a
/// configuration file. Names are matched without regard to case.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, with session and request fields flattened.
    #[default]
    Json,
    /// Single line text for reading a test run in a terminal.
    Compact,
}

/// Error returned when a log format name is not recognised.
pub type LogFormatParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("json", LogFormat::Json)]
    #[case("JSON", LogFormat::Json)]
    #[case("Compact", LogFormat::Compact)]
    fn parses_format_names(#[case] text: &str, #[case] expected: LogFormat) {
        assert_eq!(text.parse::<LogFormat>(), Ok(expected));
    }

    #[test]
    fn json_is_the_default_and_displays_lowercase() {
        assert_eq!(LogFormat::default(), LogFormat::Json);
        assert_eq!(LogFormat::Compact.to_string(), "compact");
        assert!("pretty".parse::<LogFormat>().is_err());
    }
}
