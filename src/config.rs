use std::path::Path;

use log::debug;

use profile_api::{
    config::ProfileConfig,
    error::{InvalidInputError, ProfileError, ReportError},
};

/// Loads a profile configuration from a YAML file.
pub fn load_profile_config(path: impl AsRef<Path>) -> Result<ProfileConfig, ProfileError> {
    let path = path.as_ref();
    debug!("Loading profile configuration from '{}'", path.display());

    let contents = std::fs::read_to_string(path).structured(
        InvalidInputError::LoadProfileConfiguration {
            path: path.to_string_lossy().to_string(),
        },
    )?;

    serde_yaml::from_str(&contents).structured(InvalidInputError::ParseProfileConfiguration)
}

/// Splits a `NAME=VALUE` override into its name and raw value. The value is kept as a string and
/// coerced to the declared parameter type when bound.
pub fn parse_override(raw: &str) -> Result<(String, serde_yaml::Value), ProfileError> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((
            name.trim().to_string(),
            serde_yaml::Value::String(value.to_string()),
        )),
        _ => Err(ProfileError::new(
            InvalidInputError::InvalidParameterOverride { raw: raw.into() },
        )),
    }
}

/// Applies `NAME=VALUE` overrides on top of `config`, later overrides winning.
pub fn apply_overrides<'a>(
    config: &mut ProfileConfig,
    overrides: impl IntoIterator<Item = &'a str>,
) -> Result<(), ProfileError> {
    for raw in overrides {
        let (name, value) = parse_override(raw)?;
        debug!("Overriding parameter '{name}'");
        config.set_parameter(name, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use indoc::indoc;
    use profile_api::{config::Variant, error::ErrorKind};

    use super::*;

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("num_nodes=3").unwrap(),
            ("num_nodes".into(), serde_yaml::Value::String("3".into()))
        );
        assert_eq!(
            parse_override("ext_uri=urn:a=b").unwrap(),
            (
                "ext_uri".into(),
                serde_yaml::Value::String("urn:a=b".into())
            )
        );
        assert_eq!(
            parse_override("node_type=").unwrap(),
            ("node_type".into(), serde_yaml::Value::String(String::new()))
        );

        for raw in ["num_nodes", "=3", ""] {
            let err = parse_override(raw).unwrap_err();
            assert!(matches!(
                err.kind(),
                ErrorKind::InvalidInput(InvalidInputError::InvalidParameterOverride { .. })
            ));
        }
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = ProfileConfig::default();
        apply_overrides(&mut config, ["num_nodes=3", "agree=no", "num_nodes=5"]).unwrap();
        assert_eq!(config.parameters.len(), 2);
        assert_eq!(
            config.parameters["num_nodes"],
            serde_yaml::Value::String("5".into())
        );
    }

    #[test]
    fn test_load_profile_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            indoc! {r#"
                variant: scratch
                parameters:
                  num_nodes: 3
            "#}
            .as_bytes(),
        )
        .unwrap();

        let config = load_profile_config(file.path()).unwrap();
        assert_eq!(config.variant, Some(Variant::Scratch));
        assert_eq!(config.parameters["num_nodes"], serde_yaml::Value::from(3));
    }

    #[test]
    fn test_load_profile_config_errors() {
        let err = load_profile_config("/non-existent-profile.yaml").unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidInput(InvalidInputError::LoadProfileConfiguration { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"unknown-key: 1\n").unwrap();
        let err = load_profile_config(file.path()).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::InvalidInput(InvalidInputError::ParseProfileConfiguration)
        );
    }
}
