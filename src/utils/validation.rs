//! Field checks for the config file and for reservation input. Every
//! failure names the offending field; config fields become
//! `InvalidConfigValueError`, user input becomes `ValidationError`.

use crate::utils::error::{DeskError, Result};
use std::fmt::Display;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Config,
    Input,
}

/// A named value under validation.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    name: &'a str,
    origin: Origin,
}

impl<'a> Field<'a> {
    /// A key from the config file, e.g. `api.base_url`.
    pub fn config(name: &'a str) -> Self {
        Self {
            name,
            origin: Origin::Config,
        }
    }

    /// Something the user typed, e.g. a passenger on `create`.
    pub fn input(name: &'a str) -> Self {
        Self {
            name,
            origin: Origin::Input,
        }
    }

    fn reject(&self, value: impl Display, reason: impl Into<String>) -> DeskError {
        let reason = reason.into();
        match self.origin {
            Origin::Config => DeskError::InvalidConfigValueError {
                field: self.name.to_string(),
                value: value.to_string(),
                reason,
            },
            Origin::Input => DeskError::validation(format!("{}: {}", self.name, reason)),
        }
    }

    pub fn url(&self, value: &str) -> Result<()> {
        let url = Url::parse(value).map_err(|e| self.reject(value, format!("not a URL ({e})")))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(self.reject(value, format!("scheme '{scheme}' is not http(s)"))),
        }
    }

    pub fn not_blank(&self, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(self.reject(value, "must not be blank"));
        }
        Ok(())
    }

    /// Loose shape check: one `@` with something on both sides.
    pub fn email(&self, value: &str) -> Result<()> {
        match value.trim().split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
                Ok(())
            }
            _ => Err(self.reject(value, "not an email address")),
        }
    }

    pub fn at_least(&self, value: u64, min: u64) -> Result<()> {
        if value < min {
            return Err(self.reject(value, format!("must be at least {min}")));
        }
        Ok(())
    }

    pub fn between<T: PartialOrd + Display>(&self, value: T, min: T, max: T) -> Result<()> {
        if value < min || value > max {
            return Err(self.reject(&value, format!("must be between {min} and {max}")));
        }
        Ok(())
    }

    pub fn required<'v, T>(&self, value: &'v Option<T>) -> Result<&'v T> {
        value.as_ref().ok_or_else(|| DeskError::MissingConfigError {
            field: self.name.to_string(),
        })
    }

    /// `${VAR}` survives substitution only when the variable was unset.
    pub fn resolved(&self, value: &str) -> Result<()> {
        if value.contains("${") {
            return Err(self.reject(value, "environment variable is not set"));
        }
        Ok(())
    }
}
