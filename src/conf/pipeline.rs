//! Settings of the stdin processing pipeline of the `medea-progressive`
//! binary.

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// Settings of the stdin processing pipeline.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, SmartDefault)]
#[serde(default)]
pub struct Pipeline {
    /// Whether repeated lines should be emitted only once, on their first
    /// occurrence. Defaults to `true`.
    #[default(true)]
    pub distinct: bool,

    /// Whether empty lines should be dropped. Defaults to `false`.
    #[default(false)]
    pub skip_empty: bool,

    /// Maximum number of lines to emit. Unlimited by default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[cfg(test)]
mod pipeline_conf_specs {
    use std::env;

    use serial_test::serial;

    use crate::conf::Conf;

    #[test]
    fn defaults_to_unlimited_distinct_lines() {
        let conf = Conf::default();

        assert!(conf.pipeline.distinct);
        assert!(!conf.pipeline.skip_empty);
        assert_eq!(conf.pipeline.limit, None);
    }

    #[test]
    #[serial]
    fn overrides_defaults() {
        env::set_var("MEDEA_PROGRESSIVE_PIPELINE__LIMIT", "10");
        env::set_var("MEDEA_PROGRESSIVE_PIPELINE__SKIP_EMPTY", "true");
        let env_conf = Conf::parse().unwrap();
        env::remove_var("MEDEA_PROGRESSIVE_PIPELINE__LIMIT");
        env::remove_var("MEDEA_PROGRESSIVE_PIPELINE__SKIP_EMPTY");

        assert_eq!(env_conf.pipeline.limit, Some(10));
        assert!(env_conf.pipeline.skip_empty);
        assert!(env_conf.pipeline.distinct);
    }
}
