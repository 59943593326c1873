use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemoMode {
    /// One standalone map, exported as a single image.
    Map,
    /// A streamed walk, exporting one image per generated chunk.
    Walk,
}

#[derive(Clone, Debug)]
pub struct CliOptions {
    pub config_path: PathBuf,
    pub out: Option<PathBuf>,
    pub seed: Option<u32>,
    pub mode: DemoMode,
    pub ticks: u32,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("config.json"),
            out: None,
            seed: None,
            mode: DemoMode::Map,
            ticks: 8,
        }
    }
}

impl CliOptions {
    pub fn from_env_args() -> Result<Self> {
        Self::from_iter(std::env::args_os().skip(1))
    }

    fn from_iter<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut options = Self::default();

        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            let arg_str = arg.to_string_lossy();
            match arg_str.as_ref() {
                "--config" => {
                    let Some(value) = iter.next() else {
                        return Err(anyhow!("--config requires a path"));
                    };
                    options.config_path = PathBuf::from(value);
                }
                "--out" => {
                    let Some(value) = iter.next() else {
                        return Err(anyhow!("--out requires a path"));
                    };
                    options.out = Some(PathBuf::from(value));
                }
                "--seed" => {
                    let Some(value) = iter.next() else {
                        return Err(anyhow!("--seed requires a value"));
                    };
                    let parsed = value
                        .to_string_lossy()
                        .parse()
                        .map_err(|e| anyhow!("--seed expects an unsigned integer: {e}"))?;
                    options.seed = Some(parsed);
                }
                "--mode" => {
                    let Some(value) = iter.next() else {
                        return Err(anyhow!("--mode requires map or walk"));
                    };
                    options.mode = match value.to_string_lossy().as_ref() {
                        "map" => DemoMode::Map,
                        "walk" => DemoMode::Walk,
                        other => {
                            return Err(anyhow!("unknown mode {other:?}, expected map or walk"))
                        }
                    };
                }
                "--ticks" => {
                    let Some(value) = iter.next() else {
                        return Err(anyhow!("--ticks requires a value"));
                    };
                    options.ticks = value
                        .to_string_lossy()
                        .parse()
                        .map_err(|e| anyhow!("--ticks expects an unsigned integer: {e}"))?;
                }
                other => return Err(anyhow!("unknown flag {other:?}")),
            }
        }

        Ok(options)
    }
}
