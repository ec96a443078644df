use std::fmt::{Debug, Write};
use std::{borrow::Cow, panic::Location};

use serde::{ser::SerializeStruct, Deserialize, Serialize};
use strum_macros::IntoStaticStr;

use crate::{config::ParameterError, graph::GraphInvariantError, validation::ValidationError};

/// User provided input could not be loaded.
#[derive(Debug, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidInputError {
    #[error("Failed to load profile configuration from '{path}'")]
    LoadProfileConfiguration { path: String },
    #[error("Failed to parse profile configuration")]
    ParseProfileConfiguration,
    #[error("Profile configuration sets both 'variant' and 'options', but only one may be given")]
    ConflictingOptions,
    #[error("Parameter override '{raw}' is not of the form NAME=VALUE")]
    InvalidParameterOverride { raw: String },
    #[error("Failed to write output to '{path}'")]
    WriteOutput { path: String },
}

#[derive(Debug, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum InternalError {
    #[error("Failed to declare profile parameters")]
    DeclareParameters,
    #[error("Resource graph violates topology invariants: {0}")]
    InvalidTopology(#[from] GraphInvariantError),
    #[error("Failed to serialize request RSpec")]
    SerializeRspec,
    #[error("Failed to serialize command output")]
    SerializeOutput,
}

/// Each variant of `ErrorKind` corresponds to a different category of error. The categories are
/// meant to tell the caller whether the request or the generator is at fault.
#[derive(Debug, Eq, thiserror::Error, IntoStaticStr, PartialEq)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    /// The configuration or overrides could not be read.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),

    /// A raw parameter value could not be bound to its declaration.
    #[error(transparent)]
    InvalidParameter(#[from] ParameterError),

    /// Bound parameters broke one or more profile rules.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A bug in the generator.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Debug)]
struct ProfileErrorInner {
    kind: ErrorKind,
    location: &'static Location<'static>,
    source: Option<anyhow::Error>,
    context: Vec<(Cow<'static, str>, &'static Location<'static>)>,
}

pub struct ProfileError(Box<ProfileErrorInner>);
impl ProfileError {
    #[track_caller]
    pub fn new(kind: impl Into<ErrorKind>) -> Self {
        ProfileError(Box::new(ProfileErrorInner {
            kind: kind.into(),
            location: Location::caller(),
            source: None,
            context: Vec::new(),
        }))
    }

    /// Returns a reference to the inner ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.0.kind
    }
}

pub trait ReportError<T, K> {
    /// Convert this error into a structured ProfileError.
    fn structured(self, kind: K) -> Result<T, ProfileError>;
}

impl<T, E, K> ReportError<T, K> for Result<T, E>
where
    E: Into<anyhow::Error>,
    K: Into<ErrorKind>,
{
    #[track_caller]
    fn structured(self, kind: K) -> Result<T, ProfileError> {
        match self {
            Ok(o) => Ok(o),
            Err(e) => Err(ProfileError(Box::new(ProfileErrorInner {
                kind: kind.into(),
                location: Location::caller(),
                source: Some(e.into()),
                context: Vec::new(),
            }))),
        }
    }
}

pub trait ProfileResultExt<T> {
    /// Attach a context message to the error.
    fn message(self, context: impl Into<Cow<'static, str>>) -> Result<T, ProfileError>;
}

impl<T> ProfileResultExt<T> for Result<T, ProfileError> {
    #[track_caller]
    fn message(mut self, context: impl Into<Cow<'static, str>>) -> Result<T, ProfileError> {
        if let Err(ref mut e) = self {
            e.0.context.push((context.into(), Location::caller()));
        }
        self
    }
}

impl Serialize for ProfileError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("profile-error", 5)?;
        state.serialize_field("message", &self.0.kind.to_string())?;
        match self.0.kind {
            ErrorKind::InvalidInput(ref e) => state.serialize_field("error", e)?,
            ErrorKind::InvalidParameter(ref e) => state.serialize_field("error", e)?,
            ErrorKind::Validation(ref e) => state.serialize_field("error", e)?,
            ErrorKind::Internal(ref e) => state.serialize_field("error", e)?,
        }
        state.serialize_field("category", <&str>::from(&self.0.kind))?;
        state.serialize_field(
            "location",
            &format!("{}:{}", self.0.location.file(), self.0.location.line()),
        )?;
        match self.0.source {
            Some(ref e) => state.serialize_field("cause", &Some(format!("{:?}", e)))?,
            None => state.serialize_field("cause", &None::<String>)?,
        }
        state.end()
    }
}

impl Debug for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.0.kind,
            self.0.location.file(),
            self.0.location.line()
        )?;

        if !self.0.context.is_empty() {
            writeln!(f, "\n\nContext:")?;
            for (i, (context, location)) in self.0.context.iter().enumerate() {
                for (j, line) in context.split('\n').enumerate() {
                    if j == 0 {
                        write!(f, "{: >5}: ", i)?;
                    } else {
                        f.write_str("\n       ")?;
                    }
                    f.write_str(line)?;
                }
                writeln!(f, " at {}:{}", location.file(), location.line())?;
            }
        }

        if let Some(ref source) = self.0.source {
            writeln!(f, "\n\nCaused by:")?;
            let mut index = 0;
            let mut source: Option<&dyn std::error::Error> = Some(source.as_ref());
            while let Some(e) = source {
                for (i, line) in e.to_string().split('\n').enumerate() {
                    if i == 0 {
                        write!(f, "{: >5}: ", index)?;
                    } else {
                        f.write_str("\n       ")?;
                    }
                    f.write_str(line)?;
                }
                f.write_char('\n')?;
                source = e.source();
                index += 1;
            }
        }
        Ok(())
    }
}
