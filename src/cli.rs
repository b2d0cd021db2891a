//! Minimal CLI parsing for configuration overrides.

use std::env;

#[derive(Debug, Default)]
pub struct CliOptions {
    pub debug: bool,
    pub force_black_check: bool,
    pub plex_server: Option<String>,
    pub plex_port: Option<String>,
    pub plex_token: Option<String>,
    pub library_id: Option<String>,
    pub log_file: Option<String>,
    pub time_diff_minutes: Option<String>,
    pub blackness_threshold: Option<String>,
    pub timeout_secs: Option<String>,
}

impl CliOptions {
    pub fn from_args() -> Self {
        Self::parse(env::args().skip(1))
    }

    /// Parse flags; accepts both `--flag value` and `--flag=value`. Unknown flags are ignored.
    pub fn parse<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = CliOptions::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
                None => (arg.clone(), None),
            };

            match flag.as_str() {
                "--debug" => options.debug = true,
                "--force-black-check" => options.force_black_check = true,
                _ => {
                    let Some(slot) = options.value_slot(&flag) else {
                        continue;
                    };
                    if let Some(value) = inline.or_else(|| args.next()) {
                        *slot = Some(value);
                    }
                }
            }
        }
        options
    }

    fn value_slot(&mut self, flag: &str) -> Option<&mut Option<String>> {
        match flag {
            "--plex-server" => Some(&mut self.plex_server),
            "--plex-port" => Some(&mut self.plex_port),
            "--plex-token" => Some(&mut self.plex_token),
            "--library-id" => Some(&mut self.library_id),
            "--log-file" => Some(&mut self.log_file),
            "--time-diff-minutes" => Some(&mut self.time_diff_minutes),
            "--blackness-threshold" => Some(&mut self.blackness_threshold),
            "--timeout" => Some(&mut self.timeout_secs),
            _ => None,
        }
    }
}
