//! Minimal hand-rolled argument parser — a scrub binary's surface is
//! small enough not to need a dependency like `clap` for it.

use anyhow::{bail, Error};

#[derive(Debug)]
pub struct Args {
    pub config_path: String,
    pub quota: Option<usize>,
    pub recency_guard_days: Option<u32>,
    pub autosave_bytes: Option<u64>,
    pub verbose: bool,
}

impl Args {
    pub fn parse<I: IntoIterator<Item = String>>(argv: I) -> Result<Self, Error> {
        let mut config_path = None;
        let mut quota = None;
        let mut recency_guard_days = None;
        let mut autosave_bytes = None;
        let mut verbose = false;

        let mut iter = argv.into_iter();
        let _argv0 = iter.next();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" => {
                    config_path = Some(require_value(&mut iter, "--config")?);
                }
                "--quota" => {
                    quota = Some(require_value(&mut iter, "--quota")?.parse()?);
                }
                "--recency-guard-days" => {
                    recency_guard_days = Some(require_value(&mut iter, "--recency-guard-days")?.parse()?);
                }
                "--autosave-bytes" => {
                    autosave_bytes = Some(require_value(&mut iter, "--autosave-bytes")?.parse()?);
                }
                "-v" | "--verbose" => verbose = true,
                other => bail!("unrecognized argument '{other}'"),
            }
        }

        let config_path = config_path.unwrap_or_else(|| "/etc/snapscrub/array.json".to_string());

        Ok(Args {
            config_path,
            quota,
            recency_guard_days,
            autosave_bytes,
            verbose,
        })
    }
}

fn require_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, Error> {
    iter.next().ok_or_else(|| anyhow::anyhow!("'{flag}' requires a value"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(s: &str) -> Vec<String> {
        std::iter::once("snapscrub".to_string())
            .chain(s.split_whitespace().map(String::from))
            .collect()
    }

    #[test]
    fn parses_quota_and_config() {
        let args = Args::parse(argv("--config /tmp/array.json --quota 20")).unwrap();
        assert_eq!(args.config_path, "/tmp/array.json");
        assert_eq!(args.quota, Some(20));
    }

    #[test]
    fn rejects_unknown_flag() {
        assert!(Args::parse(argv("--bogus")).is_err());
    }

    #[test]
    fn defaults_config_path() {
        let args = Args::parse(argv("")).unwrap();
        assert_eq!(args.config_path, "/etc/snapscrub/array.json");
    }
}
