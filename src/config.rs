//! Runner configuration
//!
//! Discovery and the run coordinator read their labels, placeholders and the failure-message
//! policy from here. The CLI builds one from its flags.

/// Which failure reason a record keeps when a test fails more than once in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FailureMessagePolicy {
    /// Keep the first reason reported in the run
    #[default]
    First,
    /// Overwrite with every new reason
    Latest,
}

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Base test-case type whose direct subclasses are discovered
    pub base_type: String,
    /// Failure message policy for repeated failures
    pub failure_message_policy: FailureMessagePolicy,
    /// Message shown while a test is executing
    pub executing_placeholder: String,
    /// Message shown before a test ever ran
    pub not_run_message: String,
    /// Label of the composite request built by `run_all`
    pub run_all_label: String,
    /// Label of the singleton request built by `run_one`
    pub run_one_label: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_type: "XCTestCase".to_string(),
            failure_message_policy: FailureMessagePolicy::First,
            executing_placeholder: "executing..".to_string(),
            not_run_message: "Not yet executed".to_string(),
            run_all_label: "RunAll-TestSuiteRunner".to_string(),
            run_one_label: "RunOne-TestSuiteRunner".to_string(),
        }
    }
}

impl RunnerConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base test-case type
    pub fn with_base_type(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = base_type.into();
        self
    }

    /// Set the failure message policy
    pub fn with_failure_message_policy(mut self, policy: FailureMessagePolicy) -> Self {
        self.failure_message_policy = policy;
        self
    }

    /// Set the executing placeholder
    pub fn with_executing_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.executing_placeholder = placeholder.into();
        self
    }
}
