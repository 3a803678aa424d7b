//! Tests for configuration loading and validation errors.

use std::io::Write;

use tempfile::{NamedTempFile, tempdir};

use crate::config::write_default_config;

use super::*;

mod validation {
    use super::*;

    #[test]
    fn zero_ttl_is_rejected() {
        let result = ValidatedConfig::from_raw(&cli(&["--checksum-ttl", "0"]), None);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidDuration {
                field: "checksum_ttl",
                ..
            })
        ));
    }

    #[test]
    fn tunnel_id_bound_must_fit_vni_range() {
        for value in ["0", "16777217"] {
            let result = ValidatedConfig::from_raw(&cli(&["--tunnel-id-max", value]), None);
            assert!(matches!(result, Err(ConfigError::InvalidTunnelIdMax { .. })));
        }
        let config = ValidatedConfig::from_raw(&cli(&["--tunnel-id-max", "16777216"]), None);
        assert!(config.is_ok());
    }

    #[test]
    fn var_without_equals_is_rejected() {
        let result = ValidatedConfig::from_raw(&cli(&["--var", "ntp"]), None);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidVariable { value, .. }) if value == "ntp"
        ));
    }

    #[test]
    fn var_with_bad_name_is_rejected() {
        let result = ValidatedConfig::from_raw(&cli(&["--var", "my-var=1"]), None);

        assert!(matches!(result, Err(ConfigError::InvalidVariable { .. })));
    }

    #[test]
    fn toml_context_names_are_checked() {
        let toml = toml(
            r#"
            [context]
            "bad name" = "x"
        "#,
        );

        let result = ValidatedConfig::from_raw(&cli(&[]), Some(&toml));

        assert!(matches!(result, Err(ConfigError::InvalidVariable { .. })));
    }
}

mod config_load {
    use super::*;

    #[test]
    fn load_reads_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\nttl = 42").unwrap();
        let path = file.path().to_str().unwrap();

        let config = ValidatedConfig::load(&cli(&["--config", path])).unwrap();

        assert_eq!(config.checksum_ttl.as_secs(), 42);
    }

    #[test]
    fn load_without_config_file_uses_defaults() {
        let config = ValidatedConfig::load(&cli(&[])).unwrap();

        assert_eq!(config.checksum_ttl, crate::config::defaults::checksum_ttl());
    }

    #[test]
    fn missing_config_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let result = ValidatedConfig::load(&cli(&["--config", path.to_str().unwrap()]));

        assert!(matches!(result, Err(ConfigError::FileRead { .. })));
    }

    #[test]
    fn invalid_toml_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[cache\nttl = ").unwrap();

        let result = ValidatedConfig::load(&cli(&["--config", file.path().to_str().unwrap()]));

        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn written_default_config_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("devconf.toml");

        write_default_config(&path).unwrap();
        let config = ValidatedConfig::load(&cli(&["--config", path.to_str().unwrap()])).unwrap();

        assert_eq!(config.tunnel_id_max, crate::config::defaults::TUNNEL_ID_MAX);
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("devconf.toml");

        assert!(matches!(
            write_default_config(&path),
            Err(ConfigError::FileWrite { .. })
        ));
    }
}
