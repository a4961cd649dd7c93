// One-shot removal of the configuration variables from the process environment.
//
// Must run exactly once, right after `RunnerSettings::from_env`, before the
// async runtime spawns anything: `remove_var` mutates process-global state.

use crate::constants::ENVIRONMENT_VARIABLES;
use std::sync::Once;

static SCRUB: Once = Once::new();

/// Unset every configuration variable, whether it held a value or not, so
/// child processes cannot inherit the credentials. Later calls are no-ops.
pub fn scrub_environment() {
    SCRUB.call_once(|| {
        remove_variables(ENVIRONMENT_VARIABLES);
        tracing::debug!(
            count = ENVIRONMENT_VARIABLES.len(),
            "Removed configuration variables from the environment"
        );
    });
}

/// Unset each of `names` in the process environment.
pub fn remove_variables(names: &[&str]) {
    for name in names {
        std::env::remove_var(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_variables_unsets_set_and_unset_names() {
        std::env::set_var("PROVISIONER_TEST_SCRUB_A", "secret");
        std::env::remove_var("PROVISIONER_TEST_SCRUB_B");

        remove_variables(&["PROVISIONER_TEST_SCRUB_A", "PROVISIONER_TEST_SCRUB_B"]);

        assert!(std::env::var_os("PROVISIONER_TEST_SCRUB_A").is_none());
        assert!(std::env::var_os("PROVISIONER_TEST_SCRUB_B").is_none());
    }

    // The only test in this crate that touches the RUNNER_* names.
    #[test]
    fn scrub_environment_clears_every_configuration_variable() {
        for (i, name) in ENVIRONMENT_VARIABLES.iter().enumerate() {
            if i % 2 == 0 {
                std::env::set_var(name, "value");
            }
        }

        scrub_environment();

        for name in ENVIRONMENT_VARIABLES {
            assert!(std::env::var_os(name).is_none(), "{name} still set");
        }
    }

    #[test]
    fn variable_list_matches_configuration_surface() {
        assert_eq!(ENVIRONMENT_VARIABLES.len(), 10);
        assert!(ENVIRONMENT_VARIABLES.contains(&"RUNNER_ACCESS_TOKEN"));
        assert!(ENVIRONMENT_VARIABLES.contains(&"RUNNER_APP_PRIVATE_KEY"));
        assert!(ENVIRONMENT_VARIABLES.contains(&"RUNNER_HOME"));
    }
}
