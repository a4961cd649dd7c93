// Well-known names and defaults shared across the provisioner.

/// Environment variables that make up the configuration surface.
pub mod variables {
    pub const NAME: &str = "RUNNER_NAME";
    pub const HOME: &str = "RUNNER_HOME";
    pub const OWNER: &str = "RUNNER_OWNER";
    pub const REPO: &str = "RUNNER_REPO";
    pub const ORG: &str = "RUNNER_ORG";
    pub const ACCESS_TOKEN: &str = "RUNNER_ACCESS_TOKEN";
    pub const APP_ID: &str = "RUNNER_APP_ID";
    pub const APP_INSTALLATION_ID: &str = "RUNNER_APP_INSTALLATION_ID";
    pub const APP_PRIVATE_KEY: &str = "RUNNER_APP_PRIVATE_KEY";
    pub const APP_PRIVATE_KEY_PATH: &str = "RUNNER_APP_PRIVATE_KEY_PATH";
}

/// Every variable read by `RunnerSettings`, in declaration order.
///
/// Scrubbed from the process environment right after the settings load.
pub const ENVIRONMENT_VARIABLES: &[&str] = &[
    variables::NAME,
    variables::HOME,
    variables::OWNER,
    variables::REPO,
    variables::ORG,
    variables::ACCESS_TOKEN,
    variables::APP_ID,
    variables::APP_INSTALLATION_ID,
    variables::APP_PRIVATE_KEY,
    variables::APP_PRIVATE_KEY_PATH,
];

/// Default installation home of the runner toolchain.
pub const DEFAULT_RUNNER_HOME: &str = "/opt/runner";

/// Scripts shipped with the runner toolchain, relative to its home.
pub mod scripts {
    pub const CONFIG: &str = "config.sh";
    pub const RUN: &str = "run.sh";
}

/// Public GitHub endpoints.
pub mod github {
    /// Base for runner registration URLs handed to `config.sh`.
    pub const WEB_URL: &str = "https://github.com";
    /// REST API base.
    pub const API_URL: &str = "https://api.github.com";
    /// Pinned REST API version header value.
    pub const API_VERSION: &str = "2022-11-28";
    /// Media type for REST API requests.
    pub const ACCEPT: &str = "application/vnd.github+json";
}

/// Process return codes.
pub mod return_code {
    pub const SUCCESS: i32 = 0;
    pub const TERMINATED_ERROR: i32 = 1;
}
