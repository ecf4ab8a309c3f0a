//! Invocation context and Lambda environment configuration

use crate::Error;
use std::env;

/// Configuration derived from the Lambda execution environment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    /// The name of the function.
    pub function_name: String,
    /// The amount of memory available to the function in MB.
    pub memory: i32,
    /// The version of the function being executed.
    pub version: String,
    /// The name of the Amazon CloudWatch Logs stream for the function.
    pub log_stream: String,
    /// The name of the Amazon CloudWatch Logs group for the function.
    pub log_group: String,
}

impl Config {
    /// Attempts to read configuration from environment variables set by the
    /// Lambda runtime. Missing or unparseable required variables are an error.
    pub fn from_env() -> Result<Self, Error> {
        let conf = Config {
            function_name: env::var("AWS_LAMBDA_FUNCTION_NAME")?,
            memory: env::var("AWS_LAMBDA_FUNCTION_MEMORY_SIZE")?.parse::<i32>()?,
            version: env::var("AWS_LAMBDA_FUNCTION_VERSION")?,
            log_stream: env::var("AWS_LAMBDA_LOG_STREAM_NAME").unwrap_or_default(),
            log_group: env::var("AWS_LAMBDA_LOG_GROUP_NAME").unwrap_or_default(),
        };
        Ok(conf)
    }
}

/// Metadata describing one invocation, supplied by the hosting runtime.
///
/// Passed through to handlers unmodified. `Context::default()` supports local
/// invocation without a live runtime.
#[derive(Clone, Debug, Default)]
pub struct Context {
    /// The AWS request ID generated by the Lambda service.
    pub request_id: String,
    /// The execution deadline for the current invocation in milliseconds.
    pub deadline: u64,
    /// The ARN of the Lambda function being invoked.
    pub invoked_function_arn: String,
    /// The X-Ray trace ID for the current invocation, when tracing is active.
    pub xray_trace_id: Option<String>,
    /// Lambda function configuration from the local environment.
    pub env_config: Config,
}

impl Context {
    /// Attach environment configuration to this context.
    pub fn with_config(mut self, config: Config) -> Self {
        self.env_config = config;
        self
    }
}
