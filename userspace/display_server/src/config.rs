use crate::consts::DEF_BPP;
use core::fmt;
use log::LevelFilter;

pub const USAGE: &str = "usage: display_server <width> <height> <name> [bpp]";

/// Startup settings taken from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    pub bpp: u8,
    /// Service name the server registers under and tags its log lines with.
    pub name: String,
    pub log_level: LevelFilter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingArgument(&'static str),
    InvalidNumber { argument: &'static str, value: String },
    UnexpectedArgument(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingArgument(name) => write!(f, "missing <{name}>"),
            ConfigError::InvalidNumber { argument, value } => {
                write!(f, "<{argument}> must be a positive number, got {value:?}")
            }
            ConfigError::UnexpectedArgument(arg) => write!(f, "unexpected argument {arg:?}"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl Config {
    /// Parse `<width> <height> <name> [bpp]`. The iterator must not include the program name.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let width = number(args.next(), "width")?;
        let height = number(args.next(), "height")?;
        let name = args.next().ok_or(ConfigError::MissingArgument("name"))?;
        let bpp = match args.next() {
            Some(arg) => number(Some(arg), "bpp")?,
            None => DEF_BPP,
        };
        if let Some(extra) = args.next() {
            return Err(ConfigError::UnexpectedArgument(extra));
        }
        Ok(Config {
            width,
            height,
            bpp,
            name,
            log_level: LevelFilter::Debug,
        })
    }
}

fn number<T: core::str::FromStr + Default + PartialEq>(
    arg: Option<String>,
    argument: &'static str,
) -> Result<T, ConfigError> {
    let value = arg.ok_or(ConfigError::MissingArgument(argument))?;
    match value.parse::<T>() {
        Ok(n) if n != T::default() => Ok(n),
        _ => Err(ConfigError::InvalidNumber { argument, value }),
    }
}
