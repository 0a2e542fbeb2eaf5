use bon::bon;

const NUMERICAL_CHECK_ENV: &str = "GEMMTUNE_NUMERICAL_CHECK";
const DUPLICATE_INPUTS_ENV: &str = "GEMMTUNE_DUPLICATE_INPUTS";

/// How candidate trials are run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuningConfig {
    /// Verify every candidate's output against the reference.
    pub numerical_check: bool,
    /// Give every clone private copies of `a` and `b`, for kernels that may
    /// write their inputs.
    pub duplicate_inputs: bool,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self { numerical_check: true, duplicate_inputs: false }
    }
}

#[bon]
impl TuningConfig {
    #[builder]
    pub fn new(#[builder(default = true)] numerical_check: bool, #[builder(default)] duplicate_inputs: bool) -> Self {
        Self { numerical_check, duplicate_inputs }
    }

    /// Defaults overridden by environment variables:
    /// - `GEMMTUNE_NUMERICAL_CHECK`: `0` skips verification
    /// - `GEMMTUNE_DUPLICATE_INPUTS`: `1` duplicates inputs per clone
    ///
    /// Unrecognized values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |name: &str, default: bool| lookup(name).as_deref().and_then(parse_flag).unwrap_or(default);

        Self {
            numerical_check: flag(NUMERICAL_CHECK_ENV, defaults.numerical_check),
            duplicate_inputs: flag(DUPLICATE_INPUTS_ENV, defaults.duplicate_inputs),
        }
    }
}

pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
